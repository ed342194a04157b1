mod common;
use common::*;

use proptest::prelude::*;

use loris_dsl::ast::{Process, Program};
use loris_dsl::proptest_generators::arb_process;
use loris_engine::congruence::{canonicalize, config_key};
use loris_engine::{explore, ExploreOptions};

fn canonical(source: &str) -> String {
    let program = loris_dsl::parse(source, "test.pi").expect("parse");
    let mut p = Process::Root {
        next: Box::new(program.root),
    };
    canonicalize(&mut p);
    p.to_string()
}

#[test]
fn congruent_terms_share_a_canonical_form() {
    let pairs = [
        ("a'<b>.0 | c'<d>.0", "c'<d>.0 | a'<b>.0"),
        ("(a'<a>.0 + b'<b>.0) + c'<c>.0", "c'<c>.0 + (b'<b>.0 + a'<a>.0)"),
        ("($x.x'<x>.0) | a'<a>.0", "a'<a>.0 | $y.y'<y>.0"),
        ("a(x).x'<x>.0", "a(y).y'<y>.0"),
        ("[a=a]b'<b>.0", "b'<b>.0"),
        ("b'<b>.0 | [a!=a]c'<c>.0", "b'<b>.0"),
    ];
    for (left, right) in pairs {
        assert_eq!(
            canonical(left),
            canonical(right),
            "congruent terms {left:?} and {right:?} got different canonical forms"
        );
    }
}

#[test]
fn distinct_terms_keep_distinct_canonical_forms() {
    let pairs = [
        ("a'<b>.0", "b'<a>.0"),
        ("a'<b>.0 | a(x).0", "a'<b>.a(x).0"),
        ("$x.a'<x>.0", "a'<b>.0"),
    ];
    for (left, right) in pairs {
        assert_ne!(
            canonical(left),
            canonical(right),
            "distinct terms {left:?} and {right:?} collided"
        );
    }
}

fn wrap(p: Process) -> Program {
    Program {
        defs: Vec::new(),
        root: p,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn canonicalization_is_idempotent(p in arb_process()) {
        let mut once = Process::Root { next: Box::new(p) };
        canonicalize(&mut once);
        let mut twice = once.clone();
        canonicalize(&mut twice);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn commuted_parallel_keys_agree(a in arb_process(), b in arb_process()) {
        let mut left = Process::Par { left: Box::new(a.clone()), right: Box::new(b.clone()) };
        let mut right = Process::Par { left: Box::new(b), right: Box::new(a) };
        canonicalize(&mut left);
        canonicalize(&mut right);
        prop_assert_eq!(left.to_string(), right.to_string());
    }

    #[test]
    fn exploration_invariants_hold(p in arb_process()) {
        let lts = explore(&wrap(p), ExploreOptions::new(40)).expect("exploration failed");

        // Keys are unique across states.
        let mut keys: Vec<String> = lts.states.values().map(config_key).collect();
        keys.sort();
        let before = keys.len();
        keys.dedup();
        prop_assert_eq!(before, keys.len());

        // The root is state 0 and every transition connects known states.
        prop_assert!(lts.states.contains_key(&0));
        for t in &lts.transitions {
            prop_assert!(lts.states.contains_key(&t.source));
            prop_assert!(lts.states.contains_key(&t.destination));
        }
        prop_assert!(lts.transitions.len() <= lts.states_generated);
        prop_assert!(lts.states_explored <= 40);

        // Register bijection in every reachable state.
        for conf in lts.states.values() {
            for (label, name) in conf.register.entries() {
                prop_assert_eq!(conf.register.label_of(name), Some(label));
            }
        }
    }
}
