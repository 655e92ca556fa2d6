//! Error taxonomy of the engine.
//!
//! `StructuralError` comes from the html crate and means the input markup is
//! unusable. `RangeError` is a caller mistake about line addressing.
//! `MergeConflict` is an expected business outcome that a human resolves.

use std::path::PathBuf;

use html::StructuralError;
use thiserror::Error;

use crate::types::ChangeRecommendation;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("fragment contains no line numbers and no line context was given")]
    NoLineNumbers,

    #[error("inverted line range {from}-{to}")]
    Inverted { from: u32, to: u32 },

    #[error("line range {from}-{to} is outside of lines {first}-{last}")]
    OutOfBounds {
        from: u32,
        to: u32,
        first: u32,
        last: u32,
    },

    #[error("line range {from}-{to} crosses a paragraph boundary")]
    SpansParagraphs { from: u32, to: u32 },

    #[error("line numbers start at 1, not 0")]
    ZeroStartLine,

    #[error("line number overflow after line {last}")]
    LineOverflow { last: u32 },
}

/// Two recommendations whose line ranges overlap. `a` starts first.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("change recommendations for lines {} and {} overlap", .a.range(), .b.range())]
pub struct MergeConflict {
    pub a: ChangeRecommendation,
    pub b: ChangeRecommendation,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DiffError {
    #[error(transparent)]
    Conflict(#[from] MergeConflict),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    Structural(#[from] StructuralError),
}

/// Umbrella error for callers that do not care which stage failed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LineNumberingError {
    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    Conflict(#[from] MergeConflict),
}

impl From<LineNumberingError> for DiffError {
    fn from(err: LineNumberingError) -> Self {
        match err {
            LineNumberingError::Conflict(c) => DiffError::Conflict(c),
            LineNumberingError::Range(r) => DiffError::Range(r),
            LineNumberingError::Structural(s) => DiffError::Structural(s),
        }
    }
}

impl From<DiffError> for LineNumberingError {
    fn from(err: DiffError) -> Self {
        match err {
            DiffError::Conflict(c) => LineNumberingError::Conflict(c),
            DiffError::Range(r) => LineNumberingError::Range(r),
            DiffError::Structural(s) => LineNumberingError::Structural(s),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config value for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}
