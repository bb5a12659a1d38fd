use thiserror::Error;

/// Failure of a single `fetch` call.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The operation was superseded by a newer request or by teardown.
    #[error("request cancelled")]
    Cancelled,
    #[error("HTTP error: {status}")]
    Status { status: u16 },
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("network error: {message}")]
    Network { message: String },
    #[error("invalid request URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("failed to decode response body: {message}")]
    Decode { message: String },
    #[error("failed to map response: {message}")]
    Mapping { message: String },
}

/// Coarse classification used for propagation and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Cancellation,
    Transport,
    Mapping,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cancellation => "cancellation",
            Self::Transport => "transport",
            Self::Mapping => "mapping",
        }
    }
}

impl LoaderError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn mapping(message: impl Into<String>) -> Self {
        Self::Mapping {
            message: message.into(),
        }
    }

    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Cancelled => ErrorKind::Cancellation,
            Self::Mapping { .. } => ErrorKind::Mapping,
            Self::Status { .. }
            | Self::Http(_)
            | Self::Network { .. }
            | Self::InvalidUrl { .. }
            | Self::Decode { .. } => ErrorKind::Transport,
        }
    }

    pub fn is_cancellation(&self) -> bool {
        self.kind() == ErrorKind::Cancellation
    }
}
