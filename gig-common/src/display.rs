//! Viewer collaborator
//!
//! Viewers are fire-and-forget: the session logs a failed call and carries on.

use crate::catalog::ObjectAssets;
use crate::types::ObjectKey;
use crate::Result;

/// External image and FITS viewers
pub trait DisplayDriver {
    fn open_images(&mut self, object: &ObjectKey, assets: &ObjectAssets) -> Result<()>;

    fn open_fits_overlay(&mut self, object: &ObjectKey, assets: &ObjectAssets) -> Result<()>;

    /// Show the object's H-alpha maps next to the images already open
    fn open_halpha(&mut self, object: &ObjectKey, assets: &ObjectAssets) -> Result<()>;

    /// Close everything opened since the last call
    fn close_viewers(&mut self) -> Result<()>;
}

/// Driver that shows nothing, for headless runs
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDisplay;

impl DisplayDriver for NullDisplay {
    fn open_images(&mut self, _object: &ObjectKey, _assets: &ObjectAssets) -> Result<()> {
        Ok(())
    }

    fn open_fits_overlay(&mut self, _object: &ObjectKey, _assets: &ObjectAssets) -> Result<()> {
        Ok(())
    }

    fn open_halpha(&mut self, _object: &ObjectKey, _assets: &ObjectAssets) -> Result<()> {
        Ok(())
    }

    fn close_viewers(&mut self) -> Result<()> {
        Ok(())
    }
}
