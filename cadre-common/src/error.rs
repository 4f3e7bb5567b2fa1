use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum CadreError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("Semantic Versioning Error: {0}")]
    SemVer(#[from] Arc<semver::Error>),

    #[error("Unsupported dependency notation: {0}")]
    UnsupportedNotation(String),

    #[error("Parsing Error in {0}: {1}")]
    ParseError(&'static str, String),

    #[error("Bucket '{role}' of '{owner}' is closed for configuration; entry '{entry}' rejected")]
    ClosedBucket {
        owner: String,
        role: String,
        entry: String,
    },

    #[error("Version catalog has no alias '{alias}' ({context})")]
    MissingAlias { alias: String, context: String },

    #[error("Resolution failed for suite '{suite}' ({kind}): {reason}")]
    Resolution {
        suite: String,
        kind: String,
        reason: String,
    },

    #[error("A test suite named '{0}' is already registered")]
    DuplicateSuiteName(String),

    #[error("No test suite named '{0}' is registered")]
    UnknownSuite(String),

    #[error("Dependency Error: {0}")]
    DependencyError(String),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Generic Error: {0}")]
    Generic(String),
}

impl From<std::io::Error> for CadreError {
    fn from(err: std::io::Error) -> Self {
        CadreError::Io(Arc::new(err))
    }
}

impl From<semver::Error> for CadreError {
    fn from(err: semver::Error) -> Self {
        CadreError::SemVer(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, CadreError>;
