//! Unified error types.

use thiserror::Error;

/// The error type returned by apis' fallible startup operations.
///
/// Request-level outcomes (404, 500, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// infrastructure failures such as a malformed route template or a failed
/// bind.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("bundled data is malformed: {0}")]
    Data(#[from] serde_json::Error),

    #[error("invalid route `{template}`: {source}")]
    InvalidPattern {
        template: String,
        #[source]
        source: PatternError,
    },
}

/// Why a path template was rejected by [`PathPattern::compile`](crate::PathPattern::compile).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("template must start with `/`")]
    MissingLeadingSlash,

    #[error("unbalanced `{{` or `}}` at byte {0}")]
    UnbalancedBraces(usize),

    #[error("parameter name is empty or not an identifier: `{0}`")]
    BadParamName(String),

    #[error("parameter `{0}` is used more than once")]
    DuplicateParam(String),

    #[error("parameter `{0}` must occupy a whole path segment")]
    PartialSegment(String),

    #[error("optional parameter `{0}` must be trailing")]
    OptionalNotTrailing(String),
}
