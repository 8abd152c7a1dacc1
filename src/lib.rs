//! Small regular expression engine.
//!
//! Pattern text is parsed into an [`Ast`], compiled into a Thompson
//! [`Nfa`], and simulated by a [`Runner`] that tracks every active state at
//! once.

pub mod ast;
pub mod compiler;
pub mod error;
pub mod matcher;
pub mod nfa;
pub mod parser;
pub mod regex;

pub use ast::Ast;
pub use error::Error;
pub use matcher::Runner;
pub use nfa::{CharPredicate, Nfa, Node, NodeId, Relocation, Transition};
pub use parser::{Config, Parser, SimpleParser, DEFAULT_MAX_DEPTH};
pub use regex::RegularExpression;

/// Checks whether the whole of `input` matches `pattern`.
pub fn accept(pattern: &str, input: &str) -> bool {
    let nfa = SimpleParser::new().compile(pattern);
    Runner::new(&nfa).full_match(input)
}
