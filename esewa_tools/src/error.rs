use thiserror::Error;

#[derive(Debug, Error)]
pub enum EsewaApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("The eSewa secret key is empty. Signing requests is impossible without it")]
    MissingSecret,
    #[error("Could not compute request signature: {0}")]
    SigningError(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("The status request to eSewa timed out")]
    Timeout,
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Status query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Could not decode the callback payload: {0}")]
    MalformedCallback(String),
    #[error("Invalid currency amount: {0}")]
    InvalidCurrencyAmount(String),
}

impl EsewaApiError {
    /// True when the failure is on the transport path and the caller may simply try again later.
    pub fn is_retryable(&self) -> bool {
        match self {
            EsewaApiError::Timeout => true,
            EsewaApiError::RestResponseError(_) => true,
            EsewaApiError::QueryError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
