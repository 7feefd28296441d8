//! # GiG: GLASS inspection GUI, console edition
//!
//! Front end for the inspection sessions in `gig-common`:
//! - Data directory scanners for spectra and postage stamps
//! - FITS-backed coverage and contamination estimates
//! - External image and ds9 viewers
//! - Line-oriented console

pub mod clusters;
pub mod console;
pub mod error;
pub mod objinfo;
pub mod scanner;
pub mod spectra;
pub mod viewer;

pub use error::{Error, Result};
