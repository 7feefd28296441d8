//! # GiG Common Library
//!
//! Shared code for the GLASS inspection tools:
//! - Field catalogs and record model for the three inspection kinds
//! - Ledger file codec, resume and duplicate handling
//! - Session state machine and its collaborator traits
//! - Configuration loading
//! - Spectral coverage and contamination estimates

pub mod catalog;
pub mod codec;
pub mod config;
pub mod cursor;
pub mod display;
pub mod error;
pub mod fields;
pub mod ledger;
pub mod metrics;
pub mod record;
pub mod selection;
pub mod session;
pub mod time;
pub mod types;

pub use error::{Error, Result};
pub use fields::SessionKind;
pub use types::{ObjectKey, RecordKey};
