//! Weighted context-free grammars with executable rule semantics.
//!
//! A [`Grammar`](grammar::Grammar) is a set of named, weighted rules, each
//! carrying a function implementing its semantics. From a grammar one can
//! sample random derivation trees, exhaustively enumerate all trees up to a
//! depth (with memoization and optional key-based deduplication), and parse
//! trees back from their `name(child, child)` printed form. Trees evaluate
//! against a universe of referents to produce meanings.

pub mod grammar;
pub mod semantics;
pub mod utils;

pub use grammar::{Expression, Grammar, Rule};
pub use semantics::{Evaluator, Meaning, Universe};

#[cfg(test)]
pub(crate) mod fixtures;
