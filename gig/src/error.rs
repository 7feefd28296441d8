//! Error types for gig
//!
//! Front-end errors using thiserror. Everything crossing into the session
//! converts to [`gig_common::Error`].

use crate::scanner::ScanError;
use thiserror::Error;

/// Main error type for the gig front end
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration or command-line errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Data directory scanning errors
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    /// cfitsio failures while reading a data asset
    #[error("FITS I/O error: {0}")]
    FitsIo(#[from] fitsio::errors::Error),

    /// FITS data that reads but does not make sense
    #[error("FITS error: {0}")]
    Fits(String),

    /// External viewer process errors
    #[error("Viewer error: {0}")]
    Viewer(String),
}

/// Convenience Result type using the gig Error
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for gig_common::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::Config(message) => gig_common::Error::Config(message),
            Error::Io(e) => gig_common::Error::Io(e),
            Error::Scan(e) => e.into(),
            Error::FitsIo(e) => gig_common::Error::Fits(e.to_string()),
            Error::Fits(message) => gig_common::Error::Fits(message),
            Error::Viewer(message) => gig_common::Error::Viewer(message),
        }
    }
}
