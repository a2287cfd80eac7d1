//! Error types for AVI building

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for AVI build operations
pub type Result<T> = std::result::Result<T, AviBuildError>;

/// Errors that can occur while building an AVI file
#[derive(Error, Debug)]
pub enum AviBuildError {
    /// Output file could not be opened at construction
    #[error("cannot open output file {}: {source}", path.display())]
    CannotOpenFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A write or seek on the output sink failed; the file is left in an
    /// indeterminate state
    #[error("write to output failed: {0}")]
    WriteFailure(#[from] io::Error),

    /// Caller referenced an audio channel outside the configured set
    #[error("no audio channel with index {0}")]
    UnknownChannel(usize),

    /// Append or close attempted after the file was finalized
    #[error("avi file already closed")]
    AlreadyClosed,

    /// Neither audio samples nor a declared framerate are available to
    /// derive the video timing at finalization
    #[error("cannot derive frame rate: no framerate in media type and no audio samples")]
    MissingFrameRate,

    /// Media type descriptor string is malformed
    #[error("invalid media type: {0}")]
    InvalidMediaType(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AviBuildError::UnknownChannel(3);
        assert!(err.to_string().contains('3'));

        let err = AviBuildError::InvalidMediaType("framerate=30".into());
        assert!(err.to_string().contains("framerate=30"));

        let err = AviBuildError::AlreadyClosed;
        assert!(err.to_string().contains("closed"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::WriteZero, "disk full");
        let err: AviBuildError = io_err.into();
        assert!(matches!(err, AviBuildError::WriteFailure(_)));
    }
}
