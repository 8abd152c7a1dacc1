use thiserror::Error;

/// Syntax anomalies reported by a strict parser.
///
/// Positions are byte offsets into the pattern.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("trailing backslash at position {position}")]
    DanglingEscape { position: usize },

    #[error("bracket expression opened at position {position} is never closed")]
    UnterminatedBracket { position: usize },

    #[error("group opened at position {position} is never closed")]
    UnterminatedGroup { position: usize },

    #[error("unmatched `)` at position {position}")]
    UnmatchedParenthesis { position: usize },

    #[error("empty alternative at position {position}")]
    EmptyAlternative { position: usize },

    #[error("empty group at position {position}")]
    EmptyGroup { position: usize },

    #[error("unknown group flag at position {position}")]
    UnknownGroupFlag { position: usize },

    #[error("invalid range `{start}-{end}` at position {position}")]
    InvalidRange {
        position: usize,
        start: char,
        end: char,
    },

    #[error("quantifier at position {position} has nothing to repeat")]
    NothingToRepeat { position: usize },

    #[error("group at position {position} is nested deeper than {limit} levels")]
    NestingTooDeep { position: usize, limit: usize },
}

impl Error {
    /// Byte offset where the anomaly was detected.
    pub fn position(&self) -> usize {
        match self {
            Error::DanglingEscape { position }
            | Error::UnterminatedBracket { position }
            | Error::UnterminatedGroup { position }
            | Error::UnmatchedParenthesis { position }
            | Error::EmptyAlternative { position }
            | Error::EmptyGroup { position }
            | Error::UnknownGroupFlag { position }
            | Error::InvalidRange { position, .. }
            | Error::NothingToRepeat { position }
            | Error::NestingTooDeep { position, .. } => *position,
        }
    }
}
