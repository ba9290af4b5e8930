//! Error types for the job service transport.
//!
//! [`TransportError`] covers everything that can go wrong between sending a
//! request and holding a decoded response. Whether a given variant is fatal
//! is decided one layer up, in [`AsyncJobClient`](crate::lifecycle::AsyncJobClient).

use thiserror::Error;

/// Errors raised by a [`JobService`](super::JobService) implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Underlying network failure (DNS, connection refused, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The service answered with a non-success HTTP status.
    /// `message` is the error description from the response body, if any.
    #[error("service returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body could not be decoded into the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Local I/O failure while talking to the service.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display() {
        let err = TransportError::Status {
            status: 400,
            message: "Invalid parameters: email".into(),
        };
        assert_eq!(
            err.to_string(),
            "service returned status 400: Invalid parameters: email"
        );
    }

    #[test]
    fn io_error_display() {
        let err = TransportError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        ));
        assert_eq!(err.to_string(), "I/O error: refused");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TransportError>();
    }
}
