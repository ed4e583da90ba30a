use thiserror::Error;

/// Errors reported by the resource cache and the resources it owns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    #[error("invalid resource path {path:?}: {reason}")]
    PathInvalid { path: String, reason: &'static str },

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("corrupt header in {path}: {reason}")]
    HeaderCorrupt { path: String, reason: String },

    #[error("failed to allocate {0}")]
    AllocationFailed(String),

    #[error("resource handle does not refer to a live cache entry")]
    UnknownResource,

    #[error("{path} is cached as {cached}, requested as {requested}")]
    TypeMismatch {
        path: String,
        cached: &'static str,
        requested: &'static str,
    },

    #[error("{type_name} cannot be loaded from {source_kind}")]
    Unsupported {
        type_name: &'static str,
        source_kind: &'static str,
    },
}

impl ResourceError {
    pub(crate) fn corrupt(path: &str, reason: impl Into<String>) -> Self {
        ResourceError::HeaderCorrupt {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = ResourceError> = std::result::Result<T, E>;
