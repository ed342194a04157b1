#![doc = include_str!("../README.md")]

//! loris exploration engine.
//!
//! This crate holds the semantics of the tool: the name register, structural
//! congruence and configuration keys, the one-step transition generator, the
//! breadth-first LTS explorer, and the text/dot/TeX/JSON renderings of the
//! result.

pub mod congruence;
pub mod error;
pub mod explorer;
pub mod export;
pub mod lts;
pub mod pretty;
pub mod register;
pub mod transition;

pub use error::EngineError;
pub use explorer::{explore, ExploreOptions};
pub use lts::{Configuration, Lts, RuleTag, Symbol, SymbolKind, Transition, TransitionLabel};
pub use register::{Register, DEFAULT_REGISTER_SIZE};
