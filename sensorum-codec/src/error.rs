//! Error types for measurement encoding and decoding

use thiserror::Error;

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors that can occur while encoding or decoding a measurement
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    /// Nothing to decode
    #[error("Empty payload")]
    Empty,

    /// Input ended before a complete CBOR item was read
    #[error("Truncated payload: {message}")]
    Truncated { message: String },

    /// Input is not the expected CBOR structure
    #[error("Malformed payload: {message}")]
    Malformed { message: String },

    /// The schema version key is absent or not an integer
    #[error("Missing or invalid schema version")]
    MissingVersion,

    /// The payload was written for a schema this build does not understand
    #[error("Unsupported schema version {found} (expected {expected})")]
    UnsupportedVersion { found: u64, expected: u64 },

    /// Extra bytes follow the encoded measurement
    #[error("{count} trailing bytes after measurement")]
    TrailingBytes { count: usize },

    /// A float field is NaN or infinite
    #[error("Non-finite value for field '{field}'")]
    NonFinite { field: &'static str },

    /// Serialization error
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl CodecError {
    /// Create a malformed payload error
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

impl From<ciborium::de::Error<std::io::Error>> for CodecError {
    fn from(err: ciborium::de::Error<std::io::Error>) -> Self {
        match err {
            ciborium::de::Error::Io(e) => Self::Truncated {
                message: e.to_string(),
            },
            ciborium::de::Error::Syntax(offset) => {
                Self::malformed(format!("invalid CBOR at offset {offset}"))
            }
            ciborium::de::Error::Semantic(_, msg) => Self::malformed(msg),
            ciborium::de::Error::RecursionLimitExceeded => {
                Self::malformed("nesting too deep")
            }
        }
    }
}

impl From<ciborium::ser::Error<std::io::Error>> for CodecError {
    fn from(err: ciborium::ser::Error<std::io::Error>) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<ciborium::value::Error> for CodecError {
    fn from(err: ciborium::value::Error) -> Self {
        Self::malformed(err.to_string())
    }
}
