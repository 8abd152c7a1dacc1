use std::fmt;

use crate::matcher::Runner;
use crate::nfa::Nfa;
use crate::parser::{Parser, SimpleParser};

/// A pattern together with its lazily compiled automaton.
pub struct RegularExpression {
    pattern: String,
    compiled: Option<Nfa>,
    parser: Box<dyn Parser>,
}

impl RegularExpression {
    /// Creates an expression using the permissive [`SimpleParser`].
    pub fn new(pattern: impl Into<String>) -> Self {
        Self::with_parser(pattern, Box::new(SimpleParser::new()))
    }

    /// Creates an expression compiled by `parser`.
    pub fn with_parser(pattern: impl Into<String>, parser: Box<dyn Parser>) -> Self {
        Self {
            pattern: pattern.into(),
            compiled: None,
            parser,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Replaces the pattern and drops the compiled automaton.
    pub fn set_pattern(&mut self, pattern: impl Into<String>) {
        self.pattern = pattern.into();
        self.compiled = None;
    }

    /// Compiles the pattern unless it is already compiled.
    pub fn compile(&mut self) -> &Nfa {
        let nfa = match self.compiled.take() {
            Some(nfa) => nfa,
            None => {
                let nfa = self.parser.compile(&self.pattern);
                log::debug!(
                    "compiled pattern {:?} into {} states",
                    self.pattern,
                    nfa.len()
                );
                nfa
            }
        };
        self.compiled.insert(nfa)
    }

    /// Compiled automaton, if [`RegularExpression::compile`] ran since the
    /// pattern was last set.
    pub fn compiled(&self) -> Option<&Nfa> {
        self.compiled.as_ref()
    }

    /// Whether the parser reported an anomaly for the last compilation.
    pub fn error(&self) -> bool {
        self.parser.error()
    }

    /// Checks whether the entire `text` matches the pattern.
    pub fn full_match(&mut self, text: &str) -> bool {
        Runner::new(self.compile()).full_match(text)
    }
}

impl fmt::Debug for RegularExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegularExpression")
            .field("pattern", &self.pattern)
            .field("compiled", &self.compiled.is_some())
            .finish()
    }
}
