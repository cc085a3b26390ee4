use std::path::PathBuf;

pub type VignetteResult<T> = Result<T, VignetteError>;

#[derive(thiserror::Error, Debug)]
pub enum VignetteError {
    /// The calling execution context is not allowed to drive the rendering
    /// backend. Terminal for the invocation; never retried.
    #[error("render denied: thread '{identity}' does not own the rendering context")]
    AffinityDenied { identity: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    /// The post-render check found the configured output missing or pointing
    /// at a different path than the one the scope established.
    #[error("artifact mismatch: expected output at '{}'", .expected.display())]
    ArtifactMismatch {
        expected: PathBuf,
        found: Option<PathBuf>,
    },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("encode error: {0}")]
    Encode(String),

    /// A thread or process worker failed at the execution boundary.
    #[error("worker error: {0}")]
    Worker(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VignetteError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn worker(msg: impl Into<String>) -> Self {
        Self::Worker(msg.into())
    }

    pub fn affinity_denied(identity: impl Into<String>) -> Self {
        Self::AffinityDenied {
            identity: identity.into(),
        }
    }
}
