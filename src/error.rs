//! Error types for sstkit.

use std::io;
use thiserror::Error;

/// The result type used throughout sstkit.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for table and MemTable operations.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O error occurred in the underlying storage.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The file does not have the expected layout: bad magic number,
    /// unexpected block type, truncated payload or inconsistent lengths.
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// A block payload failed CRC-32 verification.
    #[error("Checksum mismatch: expected {expected:#x}, got {actual:#x}")]
    ChecksumMismatch {
        /// The checksum recorded in the block metadata.
        expected: u32,
        /// The checksum computed over the payload read from disk.
        actual: u32,
    },

    /// The requested key is not present in the table.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An invalid argument was provided.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A format feature that is declared but not implemented was encountered.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// An internal invariant was violated.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Creates a new corruption error.
    pub fn corruption(msg: impl Into<String>) -> Self {
        Error::Corruption(msg.into())
    }

    /// Creates a new not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Creates a new invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Creates a new not implemented error.
    pub fn not_implemented(msg: impl Into<String>) -> Self {
        Error::NotImplemented(msg.into())
    }

    /// Creates a new internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }

    /// Returns `true` if this error only reports an absent key.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::corruption("test corruption");
        assert_eq!(err.to_string(), "Data corruption: test corruption");

        let err = Error::ChecksumMismatch { expected: 0x12345678, actual: 0x87654321 };
        assert!(err.to_string().contains("0x12345678"));
        assert!(err.to_string().contains("0x87654321"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        // An I/O "not found" is not an absent key.
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::not_found("key1").is_not_found());
        assert!(!Error::corruption("bad").is_not_found());
    }
}
