//! Error type shared by the library modules.
//!
//! Rendering never fails: malformed blocks degrade to inline error
//! affordances. These errors cover loading input, parsing ids and
//! dispatching user interactions or saving the config.

use std::path::PathBuf;

/// Errors produced by `hmtree`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read stdin: {0}")]
    Stdin(#[source] std::io::Error),

    #[error("invalid document json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid hypermedia id: {0}")]
    InvalidHmId(String),

    #[error("annotation range {index} is invalid: {reason}")]
    InvalidAnnotation { index: usize, reason: String },

    #[error("block {0} is not part of the rendered tree")]
    UnknownBlock(String),

    #[error("could not determine config directory")]
    NoConfigDir,

    #[error("failed to encode config: {0}")]
    ConfigEncode(#[from] toml::ser::Error),

    #[error("failed to write html: {0}")]
    Render(#[from] std::fmt::Error),

    #[error("the {0} affordance is not available for this view")]
    AffordanceUnavailable(crate::render::Affordance),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
