use soap_client::{PathError, SoapError};
use thiserror::Error;

/// High-level API errors for ONVIF operations
///
/// Transport failures keep the category they had in the SOAP layer so callers
/// can tell a rejected password from an unreachable camera. Response fields
/// that are missing or malformed surface as [`ApiError::Field`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection failure or an unexpected HTTP status
    #[error("Transport error: {0}")]
    Transport(String),

    /// The device refused the credentials
    #[error("Authentication error: {0}")]
    Auth(String),

    /// SOAP fault returned by the device
    #[error("SOAP fault: {0}")]
    Fault(String),

    /// The response body is not well-formed XML
    #[error("Parse error: {0}")]
    Parse(String),

    /// A response field is absent or does not have the expected form
    #[error("Response field error: {0}")]
    Field(#[from] PathError),

    /// The response does not contain the expected `{Action}Response` element
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Invalid request parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Type alias for results that can return an ApiError
pub type Result<T> = std::result::Result<T, ApiError>;

impl From<SoapError> for ApiError {
    fn from(error: SoapError) -> Self {
        match error {
            SoapError::Transport(msg) => ApiError::Transport(msg),
            SoapError::Auth(msg) => ApiError::Auth(msg),
            SoapError::Fault(msg) => ApiError::Fault(msg),
            SoapError::Parse(msg) => ApiError::Parse(msg),
        }
    }
}
