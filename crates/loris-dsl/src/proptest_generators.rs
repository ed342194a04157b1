//! Proptest strategies for generating closed process terms.

use proptest::prelude::*;

use crate::ast::{Name, Process};

const NAME_POOL: &[&str] = &["a", "b", "c", "d", "e"];

fn arb_free_name() -> impl Strategy<Value = Name> {
    (0..NAME_POOL.len()).prop_map(|i| Name::free(NAME_POOL[i]))
}

/// Strategy for a process term whose free names are drawn from a small fixed
/// pool, so that generated configurations stay explorable under tight
/// budgets.
///
/// Binders reuse names from the same pool, which exercises shadowing in
/// substitution and alpha-renaming.
pub fn arb_process() -> impl Strategy<Value = Process> {
    let leaf = prop_oneof![
        Just(Process::Nil),
        (arb_free_name(), arb_free_name()).prop_map(|(chan, msg)| Process::Output {
            chan,
            msg,
            next: Box::new(Process::Nil),
        }),
        (arb_free_name(), arb_free_name()).prop_map(|(chan, var)| Process::Input {
            chan,
            var,
            next: Box::new(Process::Nil),
        }),
    ];
    leaf.prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (arb_free_name(), arb_free_name(), inner.clone()).prop_map(|(chan, msg, next)| {
                Process::Output {
                    chan,
                    msg,
                    next: Box::new(next),
                }
            }),
            (arb_free_name(), arb_free_name(), inner.clone()).prop_map(|(chan, var, next)| {
                Process::Input {
                    chan,
                    var,
                    next: Box::new(next),
                }
            }),
            (arb_free_name(), arb_free_name(), any::<bool>(), inner.clone()).prop_map(
                |(left, right, negated, next)| Process::Match {
                    left,
                    right,
                    negated,
                    next: Box::new(next),
                }
            ),
            (arb_free_name(), inner.clone()).prop_map(|(name, next)| Process::Restrict {
                name,
                next: Box::new(next),
            }),
            (inner.clone(), inner.clone()).prop_map(|(left, right)| Process::Sum {
                left: Box::new(left),
                right: Box::new(right),
            }),
            (inner.clone(), inner).prop_map(|(left, right)| Process::Par {
                left: Box::new(left),
                right: Box::new(right),
            }),
        ]
    })
}
