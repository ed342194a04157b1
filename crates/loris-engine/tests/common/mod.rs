#![allow(dead_code)]

use loris_engine::{explore, ExploreOptions, Lts};

pub fn lts_of(source: &str, max_states: usize) -> Lts {
    let program = loris_dsl::parse(source, "test.pi")
        .unwrap_or_else(|e| panic!("failed to parse {source:?}: {e}"));
    explore(&program, ExploreOptions::new(max_states))
        .unwrap_or_else(|e| panic!("failed to explore {source:?}: {e}"))
}

pub fn lts_with_register(source: &str, register_size: usize, max_states: usize) -> Lts {
    let program = loris_dsl::parse(source, "test.pi")
        .unwrap_or_else(|e| panic!("failed to parse {source:?}: {e}"));
    explore(
        &program,
        ExploreOptions {
            register_size,
            max_states,
        },
    )
    .unwrap_or_else(|e| panic!("failed to explore {source:?}: {e}"))
}

pub fn register_pairs(lts: &Lts, state: usize) -> Vec<(usize, String)> {
    lts.states[&state]
        .register
        .entries()
        .map(|(label, name)| (label, name.to_string()))
        .collect()
}

pub fn process_of(lts: &Lts, state: usize) -> String {
    lts.states[&state].process.to_string()
}
