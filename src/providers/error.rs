use thiserror::Error;

/// Errors raised by external capability providers.
///
/// Every variant is treated as a transient, task-local failure by the pipeline.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("upstream returned status {status}")]
    Status { status: u16 },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("provider returned an empty response")]
    EmptyResponse,

    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => ProviderError::Status {
                status: status.as_u16(),
            },
            None if e.is_decode() => ProviderError::Decode(e.to_string()),
            None => ProviderError::Request(e.to_string()),
        }
    }
}

/// Convenience result type for provider calls.
pub type ProviderResult<T> = Result<T, ProviderError>;
