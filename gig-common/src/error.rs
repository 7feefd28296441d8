//! Common error types for GIG

use crate::types::ObjectKey;
use std::path::PathBuf;
use thiserror::Error;

/// Common result type for GIG operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types shared by the inspection core and its front ends
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Existing ledger holds no parsable rows, so no resume point can be chosen
    #[error("Found no inspected objects in {}", .0.display())]
    EmptyLedger(PathBuf),

    /// Ledger line that cannot be decoded
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// The resume point is the final object of the list.
    ///
    /// Not a failure: the session goes straight to quitting.
    #[error("The last object in the ledger ({0}) is the last in the object list")]
    ResumeExhausted(ObjectKey),

    /// The ledger's last key does not occur in the object list
    #[error("Last object in the ledger ({0}) is not part of the object list")]
    ResumeKeyNotFound(ObjectKey),

    /// No image or spectrum files for an object
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// Record refused by the per-kind validation rules
    #[error("Incomplete record: {0}")]
    IncompleteRecord(String),

    /// Operation not allowed in the current ledger or session state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Unreadable FITS data asset
    #[error("FITS error: {0}")]
    Fits(String),

    /// External viewer could not be started or stopped
    #[error("Viewer error: {0}")]
    Viewer(String),
}
