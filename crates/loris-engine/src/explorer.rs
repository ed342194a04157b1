//! Breadth-first exploration of the configuration space.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use loris_dsl::ast::{Name, Process, Program};

use crate::congruence::{canonicalize, config_key};
use crate::error::EngineError;
use crate::lts::{Configuration, Lts, Transition};
use crate::register::{Register, DEFAULT_REGISTER_SIZE};
use crate::transition::{successors, DefinitionEnv};

/// Exploration bounds.
#[derive(Debug, Clone, Copy)]
pub struct ExploreOptions {
    /// Register capacity; a configuration at capacity is flagged and not
    /// expanded.
    pub register_size: usize,
    /// Budget on the number of configurations dequeued for expansion.
    pub max_states: usize,
}

impl ExploreOptions {
    pub fn new(max_states: usize) -> Self {
        ExploreOptions {
            register_size: DEFAULT_REGISTER_SIZE,
            max_states,
        }
    }
}

/// Names the root register is seeded with: the free names of the root term,
/// then the free names of each definition body (parameters excluded), in
/// left-to-right first-occurrence order.
pub fn seeded_names(program: &Program) -> Vec<Name> {
    let mut names = program.root.free_names();
    for def in &program.defs {
        for name in def.body.free_names() {
            if let Name::Free(id) = &name {
                if def.params.iter().any(|p| p == id) {
                    continue;
                }
            }
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

/// The canonical root configuration of `program`.
pub fn root_configuration(program: &Program, register_size: usize) -> Configuration {
    let register = Register::seed(seeded_names(program), register_size);
    let mut process = Process::Root {
        next: Box::new(program.root.clone()),
    };
    canonicalize(&mut process);
    Configuration { register, process }
}

/// Compute the labeled transition system reachable from `program`'s root.
///
/// States are identified up to structural congruence via their canonical
/// keys. The traversal is breadth-first and stops when the queue drains or
/// `max_states` configurations have been expanded; both are normal outcomes
/// and the returned [`Lts`] carries the counters either way.
pub fn explore(program: &Program, opts: ExploreOptions) -> Result<Lts, EngineError> {
    let env = DefinitionEnv::new(&program.defs);
    let root = root_configuration(program, opts.register_size);

    let mut visited: HashMap<String, usize> = HashMap::new();
    let mut seen_transitions: HashSet<Transition> = HashSet::new();
    let mut states: BTreeMap<usize, Configuration> = BTreeMap::new();
    let mut transitions: Vec<Transition> = Vec::new();
    let mut reg_size_reached: BTreeSet<usize> = BTreeSet::new();
    let mut next_id = 0usize;

    let root_key = config_key(&root);
    visited.insert(root_key, next_id);
    states.insert(next_id, root.clone());
    next_id += 1;

    let mut queue: VecDeque<Configuration> = VecDeque::new();
    queue.push_back(root);

    let mut states_explored = 0usize;
    let mut states_generated = 0usize;

    while let Some(conf) = queue.pop_front() {
        if states_explored >= opts.max_states {
            queue.push_front(conf);
            break;
        }
        let src = visited[&config_key(&conf)];

        if conf.register.len() >= opts.register_size {
            reg_size_reached.insert(src);
            states_explored += 1;
            continue;
        }

        for (label, mut succ) in successors(&conf, &env)? {
            states_generated += 1;
            canonicalize(&mut succ.process);
            let key = config_key(&succ);
            let dst = match visited.get(&key) {
                Some(&id) => id,
                None => {
                    let id = next_id;
                    next_id += 1;
                    visited.insert(key, id);
                    states.insert(id, succ.clone());
                    queue.push_back(succ);
                    id
                }
            };
            let transition = Transition {
                source: src,
                destination: dst,
                label,
            };
            if seen_transitions.insert(transition.clone()) {
                transitions.push(transition);
            }
        }
        states_explored += 1;
    }

    tracing::debug!(
        states = states.len(),
        transitions = transitions.len(),
        explored = states_explored,
        generated = states_generated,
        "exploration finished"
    );

    Ok(Lts {
        states,
        transitions,
        reg_size_reached,
        states_explored,
        states_generated,
    })
}
