use thiserror::Error;

/// Every failure the request layer can hand back. None of them are fatal;
/// callers recover at the UI boundary.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Network unreachable, connection reset, timeout.
    #[error("transport error: {0}")]
    Transport(String),

    /// Backend answered with a non-2xx status.
    #[error("{message} (status {status})")]
    Http { status: u16, message: String },

    /// A lookup the caller expected might miss did miss.
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// Rejected on the client before anything was sent.
    #[error("invalid request: {0}")]
    Validation(String),

    /// A 2xx response whose body did not match the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(404),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Turn a raw 404 into the semantic [`ApiError::NotFound`]; everything else
    /// passes through unchanged.
    pub fn into_not_found(self, resource: impl Into<String>) -> Self {
        match self {
            Self::Http { status: 404, .. } => Self::NotFound {
                resource: resource.into(),
            },
            other => other,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
