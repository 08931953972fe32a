// Error types for deployments

use serde_json::Value;

/// Result type alias using [`DeployError`].
pub type DeployResult<T> = Result<T, DeployError>;

/// Failures talking to a hosting provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider answered with a non-success status.
    #[error("provider returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, as JSON when it parses, otherwise as a string.
        body: Value,
    },

    /// The request never produced a response (connect, timeout, ...).
    #[error("request to provider failed: {0}")]
    Transport(String),

    /// A success response whose body is not JSON.
    #[error("unreadable provider response: {0}")]
    Decode(String),

    /// The configured API base cannot be used to build endpoint URLs.
    #[error("invalid provider base URL: {0}")]
    InvalidBaseUrl(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Transport(err.to_string())
    }
}

impl ProviderError {
    /// Detail suitable for returning to the caller: the provider's body when
    /// there is one, otherwise the error message.
    #[must_use]
    pub fn details(&self) -> Value {
        match self {
            ProviderError::Status { body, .. } => body.clone(),
            other => Value::String(other.to_string()),
        }
    }
}

/// Everything that can go wrong handling a deploy request.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Neither the request nor the server supplied a token.
    #[error("No Vercel token provided. Set VERCEL_TOKEN on server or send token in form.")]
    MissingCredential,

    /// The upload carried no file.
    #[error("No file uploaded")]
    MissingFile,

    /// A required text field was empty or absent.
    #[error("{0} required")]
    MissingField(&'static str),

    /// The creation call failed.
    #[error("deployment submission failed: {0}")]
    ProviderSubmissionFailed(#[source] ProviderError),

    /// A status poll failed; the whole request is abandoned.
    #[error("polling deployment {id} failed: {source}")]
    ProviderPollFailed {
        /// Deployment being polled.
        id: String,
        /// Underlying provider failure.
        #[source]
        source: ProviderError,
    },

    /// Any other runtime failure.
    #[error("{0}")]
    DeploymentFailed(String),
}

impl DeployError {
    /// Create a generic deployment failure.
    #[must_use]
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::DeploymentFailed(msg.into())
    }

    /// Whether the caller sent a bad request, as opposed to a remote or
    /// runtime failure.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DeployError::MissingCredential | DeployError::MissingFile | DeployError::MissingField(_)
        )
    }

    /// Detail reported alongside a failed deployment.
    #[must_use]
    pub fn details(&self) -> Value {
        match self {
            DeployError::ProviderSubmissionFailed(source)
            | DeployError::ProviderPollFailed { source, .. } => source.details(),
            other => Value::String(other.to_string()),
        }
    }
}
