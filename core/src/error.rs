//! Error types for the compiler service client.
//!
//! # Design
//! Only two things can make a compile call fail: the HTTP exchange itself
//! (`Transport`) or a body that is not the expected JSON document (`Decode`).
//! Diagnostics about the submitted source, and errors the service reports
//! in `serverErrors`, are data on a successful `CompileOutput`.

use thiserror::Error;

/// Errors returned by `CompilerClient`.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Connection refused, DNS or TLS failure, timeout, or a body that could
    /// not be read to the end.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body is not valid JSON or does not have the shape of a
    /// compile response. `status` is the HTTP status it arrived with.
    #[error("decode error (HTTP {status}): {message}")]
    Decode { status: u16, message: String },
}

impl ApiError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, ApiError::Decode { .. })
    }
}

impl From<ureq::Error> for ApiError {
    fn from(err: ureq::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}
