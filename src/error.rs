use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForensicsError {
    #[error("Image decode error: {0}")]
    Decode(image::ImageError),

    #[error("Image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Lossy re-encode failed: {0}")]
    Encode(String),

    #[error("Cannot write image: {0}")]
    Write(image::ImageError),
}

impl ForensicsError {
    /// True for failures that mean there is no image to analyze at all.
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, ForensicsError::Decode(_) | ForensicsError::EmptyImage { .. })
    }
}

pub type Result<T> = std::result::Result<T, ForensicsError>;

/// Failures of the external AI-detection call. These never abort an
/// analysis; the hybrid pipeline turns them into a reported error payload.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExternalServiceError {
    #[error("Request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Could not connect to {0}")]
    Connection(String),

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("Detector returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Detector rejected the request: {0}")]
    Rejected(String),

    #[error("Malformed detector response: {0}")]
    MalformedResponse(String),
}
