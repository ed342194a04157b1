use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use loris_dsl::ast::Process;

use crate::register::Register;

/// A state of the transition system: a register paired with a process term.
///
/// Two configurations are the same state exactly when their canonical keys
/// are equal (see [`crate::congruence::config_key`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub register: Register,
    pub process: Process,
}

/// The kind of an action symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    /// A name already tracked by the register.
    Known,
    /// A name minted for an input from the environment.
    FreshInput,
    /// A restricted name opened by a bound output.
    FreshOutput,
    /// The subject channel of an input action.
    Input,
    /// The subject channel of an output action.
    Output,
    /// Internal synchronization; the value is unused.
    Tau,
}

/// One action symbol: a kind plus a register label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub value: usize,
}

impl Symbol {
    pub fn known(value: usize) -> Self {
        Symbol {
            kind: SymbolKind::Known,
            value,
        }
    }

    pub fn fresh_input(value: usize) -> Self {
        Symbol {
            kind: SymbolKind::FreshInput,
            value,
        }
    }

    pub fn fresh_output(value: usize) -> Self {
        Symbol {
            kind: SymbolKind::FreshOutput,
            value,
        }
    }

    pub fn input(value: usize) -> Self {
        Symbol {
            kind: SymbolKind::Input,
            value,
        }
    }

    pub fn output(value: usize) -> Self {
        Symbol {
            kind: SymbolKind::Output,
            value,
        }
    }

    pub fn tau() -> Self {
        Symbol {
            kind: SymbolKind::Tau,
            value: 0,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SymbolKind::Known | SymbolKind::Input => write!(f, "{}", self.value),
            SymbolKind::Output => write!(f, "{}'", self.value),
            SymbolKind::FreshInput => write!(f, "{}*", self.value),
            SymbolKind::FreshOutput => write!(f, "{}^", self.value),
            SymbolKind::Tau => write!(f, "t"),
        }
    }
}

/// The operational rule that completed a derivation.
///
/// Only completing rules appear on transitions; the commitment rules and the
/// context rules (Res, Sum, Par, Match, Rec) inherit the completing label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RuleTag {
    /// Input of an already-known name.
    Inp2A,
    /// Input of a name the environment has never sent before.
    Inp2B,
    /// Output of an already-known name.
    Out2,
    /// Bound output: a restricted name escapes and is registered.
    OpenOut,
    /// Internal communication of a known name.
    Comm,
    /// Internal communication of a restricted name (scope extrusion).
    Close,
}

/// The label of one transition: the completing rule plus its symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TransitionLabel {
    pub rule: RuleTag,
    pub subject: Symbol,
    pub object: Symbol,
}

impl TransitionLabel {
    pub fn tau(rule: RuleTag) -> Self {
        TransitionLabel {
            rule,
            subject: Symbol::tau(),
            object: Symbol::tau(),
        }
    }

    pub fn is_tau(&self) -> bool {
        self.subject.kind == SymbolKind::Tau
    }
}

impl fmt::Display for TransitionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_tau() {
            write!(f, "t")
        } else {
            write!(f, "{} {}", self.subject, self.object)
        }
    }
}

/// A labeled edge between two state ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Transition {
    pub source: usize,
    pub destination: usize,
    pub label: TransitionLabel,
}

/// The labeled transition system produced by exploration.
#[derive(Debug, Clone)]
pub struct Lts {
    /// State id to configuration; id 0 is the root.
    pub states: BTreeMap<usize, Configuration>,
    /// Transitions in discovery order, deduplicated.
    pub transitions: Vec<Transition>,
    /// States whose register hit capacity; their successors were pruned.
    pub reg_size_reached: BTreeSet<usize>,
    /// Number of configurations dequeued and expanded (or pruned).
    pub states_explored: usize,
    /// Number of successor configurations produced by the generator.
    pub states_generated: usize,
}

impl Lts {
    /// Transitions leaving `state`, in discovery order.
    pub fn outgoing(&self, state: usize) -> impl Iterator<Item = &Transition> {
        self.transitions.iter().filter(move |t| t.source == state)
    }
}
