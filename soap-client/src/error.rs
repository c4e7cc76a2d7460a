//! Error types for the SOAP client

use thiserror::Error;

/// Errors that can occur during SOAP communication
#[derive(Debug, Error)]
pub enum SoapError {
    /// Connection failure, invalid service address, or an HTTP status other than 200/401
    #[error("Transport error: {0}")]
    Transport(String),

    /// No usable challenge, missing credentials, or the retried request was rejected again
    #[error("Authentication error: {0}")]
    Auth(String),

    /// SOAP fault returned by the device, carrying `Fault.Reason.Text`
    #[error("SOAP fault: {0}")]
    Fault(String),

    /// XML parsing error
    #[error("XML parsing error: {0}")]
    Parse(String),
}

/// Convenience alias for SOAP client results
pub type Result<T> = std::result::Result<T, SoapError>;
