use std::fmt;
use thiserror::Error;

/// Malformed pattern text.
///
/// The position is a character offset into the source, not a byte offset.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message} at position {position}")]
pub struct SyntaxError {
    pub message: String,
    pub position: usize,
}

impl SyntaxError {
    pub(crate) fn new<S: Into<String>>(message: S, position: usize) -> SyntaxError {
        SyntaxError {
            message: message.into(),
            position,
        }
    }
}

/// The piece of a rule definition a syntax error was found in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Pattern,
    RewriteMatch,
    RewriteReplacement,
    Exclusion,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Field::Pattern => "pattern",
            Field::RewriteMatch => "rewrite match",
            Field::RewriteReplacement => "rewrite replacement",
            Field::Exclusion => "exclusion",
        };
        write!(f, "{}", s)
    }
}

/// Reasons a `Config` cannot be turned into a `Grammar`.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum CompileError {
    #[error("rule {rule}: invalid {field}: {source}")]
    Syntax {
        rule: String,
        field: Field,
        source: SyntaxError,
    },
    #[error("Unknown rule {0}")]
    UnknownRule(String),
    #[error("rule {0} is defined more than once")]
    DuplicateRule(String),
    #[error("{0:?} is not a valid rule name")]
    InvalidRuleName(String),
    #[error("rule {rule}: invalid weight {weight}")]
    InvalidWeight { rule: String, weight: f64 },
}

/// Failures of a single generation call.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error("Root rule {0} not found")]
    RootNotFound(String),
    #[error("Exclusion rules of {0} are too restrictive")]
    ExclusionTooRestrictive(String),
    #[error("match placeholder #{index}# refers to a segment that does not exist; only {available} were captured")]
    MatchIndexOutOfRange { index: usize, available: usize },
}
