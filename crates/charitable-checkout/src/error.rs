use thiserror::Error;

use charitable_api::ApiError;

#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Rejected before any network call.
    #[error("{0}")]
    Validation(String),

    /// The backend did not hand out a checkout session. Not retried.
    #[error("failed to start donation, try again")]
    SessionCreation(#[source] ApiError),

    #[error("could not open checkout page: {0}")]
    Browser(String),

    /// Another checkout is already running on this flow.
    #[error("a checkout is already in progress")]
    Busy,
}

impl CheckoutError {
    /// Whether starting over with the same input makes sense.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::SessionCreation(_) | Self::Browser(_) | Self::Busy)
    }
}
