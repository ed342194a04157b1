#![doc = include_str!("../README.md")]

pub mod ast;
pub mod errors;
pub mod parser;
#[cfg(any(test, feature = "proptest"))]
pub mod proptest_generators;

pub use parser::parse;
