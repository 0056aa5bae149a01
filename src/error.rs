//! Codec error types

/// Error type for sync-framed base64 encoding and decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Encoded content contains a reserved sentinel or page marker string
    Conflict { marker: String },

    /// Reassembled text is not a legal base64 stream
    InvalidEncoding { reason: String },

    /// Framing configuration cannot produce a well-formed artifact
    InvalidConfig { reason: String },
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecError::Conflict { marker } => {
                write!(f, "Encoded content collides with reserved marker '{}'", marker)
            }
            CodecError::InvalidEncoding { reason } => {
                write!(f, "Reassembled content is not valid base64: {}", reason)
            }
            CodecError::InvalidConfig { reason } => {
                write!(f, "Invalid framing configuration: {}", reason)
            }
        }
    }
}

impl std::error::Error for CodecError {}

impl From<base64::DecodeError> for CodecError {
    fn from(err: base64::DecodeError) -> Self {
        CodecError::InvalidEncoding { reason: err.to_string() }
    }
}
