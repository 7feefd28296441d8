//! External image and FITS viewers
//!
//! Preview images go to the platform image viewer; FITS files go to ds9 with
//! one labelled frame per extension. Every process started for an object is
//! killed, and its region files removed, when the object is left.

use crate::{Error, Result};
use gig_common::catalog::{FitsAsset, ObjectAssets};
use gig_common::config::ViewerConfig;
use gig_common::display::DisplayDriver;
use gig_common::types::ObjectKey;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use tracing::{debug, info, warn};

const REGION_PREFIX: &str = "temp_ds9_forinspection";

/// 2-D spectrum extensions shown per position angle
const SPECTRUM_EXTENSIONS: [&str; 3] = ["DSCI", "SCI", "CONTAM"];

/// Program and arguments of one viewer invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerCommand {
    pub program: String,
    pub args: Vec<String>,
}

/// ds9 invocation plus the region files it reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FitsPlan {
    pub command: ViewerCommand,
    /// (path, label) of each text region to write before launching
    pub regions: Vec<(PathBuf, String)>,
}

/// Platform default image viewer
fn default_image_viewer() -> Vec<String> {
    if cfg!(target_os = "macos") {
        vec!["open".to_string(), "-n".to_string(), "-F".to_string()]
    } else {
        vec!["gthumb".to_string()]
    }
}

/// Region file content placing `label` in the top-left corner
pub fn text_region(label: &str, x: u32, y: u32) -> String {
    format!(
        "physical\n# text({},{}) textangle=0 textrotate=0 font=\"helvetica 12 normal roman\" text={{{}}}",
        x, y, label
    )
}

/// Image viewer invocation for `images`
pub fn image_command(config: &ViewerConfig, images: &[PathBuf]) -> Option<ViewerCommand> {
    let mut words: Vec<String> = match &config.image_viewer {
        Some(command) => command.split_whitespace().map(str::to_string).collect(),
        None => default_image_viewer(),
    };
    if words.is_empty() || images.is_empty() {
        return None;
    }
    let program = words.remove(0);
    words.extend(images.iter().map(|path| path.display().to_string()));
    Some(ViewerCommand {
        program,
        args: words,
    })
}

/// ds9 invocation for the FITS assets of one object
///
/// Spectra get DSCI, SCI and CONTAM frames per file. Postage stamps get one
/// frame each, labelled with the band.
pub fn fits_plan(config: &ViewerConfig, assets: &ObjectAssets, region_dir: &Path) -> Option<FitsPlan> {
    if assets.fits.is_empty() {
        return None;
    }
    let spectra = assets.fits.iter().any(|fits| fits.position_angle.is_some());

    let mut args: Vec<String> = Vec::new();
    let geometry = if spectra { "1200x600" } else { "1000x600" };
    args.extend(["-geometry", geometry, "-scale", "zscale"].map(str::to_string));
    if config.lock_frames {
        args.extend(["-lock", "frame", "physical"].map(str::to_string));
    }
    let rows = if spectra {
        (2 * assets.position_angles.len().max(1)).to_string()
    } else {
        "1".to_string()
    };
    args.extend(["-tile", "grid", "layout", "4"].map(str::to_string));
    args.push(rows);

    let mut regions = Vec::new();
    for FitsAsset {
        position_angle,
        path,
    } in &assets.fits
    {
        match position_angle {
            Some(pa) => {
                for extension in SPECTRUM_EXTENSIONS {
                    let region = region_dir.join(format!("{}-{}-{}.reg", REGION_PREFIX, pa, extension));
                    args.push(format!("{}[{}]", path.display(), extension));
                    args.push("-region".to_string());
                    args.push(region.display().to_string());
                    regions.push((region, format!("{} PA={}", extension, pa.0)));
                }
            }
            None => {
                let label = stamp_label(path);
                let region = region_dir.join(format!("{}{}.reg", REGION_PREFIX, label));
                args.push(format!("{}[0]", path.display()));
                args.push("-region".to_string());
                args.push(region.display().to_string());
                regions.push((region, label));
            }
        }
    }
    if !spectra {
        args.extend(["-tile", "yes", "-zoom", "to", "fit"].map(str::to_string));
    }

    Some(FitsPlan {
        command: ViewerCommand {
            program: config.fits_viewer.clone(),
            args,
        },
        regions,
    })
}

/// Band part of a stamp name: `A370_00007_f140w.fits` gives `f140w`
fn stamp_label(path: &Path) -> String {
    let stem = path
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.split('.').next())
        .unwrap_or("");
    stem.split('_').skip(2).collect::<Vec<_>>().join("_")
}

/// [`DisplayDriver`] launching external viewer processes
pub struct ViewerDisplay {
    config: ViewerConfig,
    region_dir: PathBuf,
    children: Vec<(String, Child)>,
    region_files: Vec<PathBuf>,
}

impl ViewerDisplay {
    /// Region files are written to `region_dir`
    pub fn new(config: ViewerConfig, region_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            region_dir: region_dir.into(),
            children: Vec::new(),
            region_files: Vec::new(),
        }
    }

    fn spawn(&mut self, command: &ViewerCommand) -> Result<()> {
        debug!("Launching {} {}", command.program, command.args.join(" "));
        let child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    Error::Viewer(format!("{} not found in PATH", command.program))
                }
                _ => Error::Viewer(format!("could not start {}: {}", command.program, e)),
            })?;
        self.children.push((command.program.clone(), child));
        Ok(())
    }
}

impl DisplayDriver for ViewerDisplay {
    fn open_images(&mut self, object: &ObjectKey, assets: &ObjectAssets) -> gig_common::Result<()> {
        if !self.config.open_images {
            return Ok(());
        }
        match image_command(&self.config, &assets.images) {
            Some(command) => Ok(self.spawn(&command)?),
            None => {
                info!("No images to show for {}", object);
                Ok(())
            }
        }
    }

    fn open_halpha(&mut self, object: &ObjectKey, assets: &ObjectAssets) -> gig_common::Result<()> {
        if !self.config.open_images {
            return Ok(());
        }
        match image_command(&self.config, &assets.halpha_images) {
            Some(command) => Ok(self.spawn(&command)?),
            None => {
                debug!("No H-alpha maps for {}", object);
                Ok(())
            }
        }
    }

    fn open_fits_overlay(
        &mut self,
        object: &ObjectKey,
        assets: &ObjectAssets,
    ) -> gig_common::Result<()> {
        let Some(plan) = fits_plan(&self.config, assets, &self.region_dir) else {
            info!("No FITS files to show for {}", object);
            return Ok(());
        };
        let (x, y) = if assets.position_angles.is_empty() {
            (30, 5)
        } else {
            (130, 10)
        };
        for (path, label) in &plan.regions {
            fs::write(path, text_region(label, x, y))?;
            self.region_files.push(path.clone());
        }
        Ok(self.spawn(&plan.command)?)
    }

    fn close_viewers(&mut self) -> gig_common::Result<()> {
        let mut failures = Vec::new();
        for (program, mut child) in self.children.drain(..) {
            if let Err(e) = child.kill() {
                // InvalidInput means the process already exited
                if e.kind() != ErrorKind::InvalidInput {
                    failures.push(format!("{}: {}", program, e));
                }
            }
            let _ = child.wait();
        }
        for path in self.region_files.drain(..) {
            if let Err(e) = fs::remove_file(&path) {
                if e.kind() != ErrorKind::NotFound {
                    failures.push(format!("{}: {}", path.display(), e));
                }
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::Viewer(failures.join("; ")).into())
        }
    }
}

impl Drop for ViewerDisplay {
    fn drop(&mut self) {
        if let Err(e) = self.close_viewers() {
            warn!("Error while closing viewer windows: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gig_common::types::PositionAngle;

    fn spectra_assets() -> ObjectAssets {
        ObjectAssets {
            position_angles: vec![PositionAngle(10), PositionAngle(250)],
            images: vec![PathBuf::from("a.png")],
            fits: vec![
                FitsAsset {
                    position_angle: Some(PositionAngle(10)),
                    path: PathBuf::from("/data/A2744-010-G102_00005.2D.fits"),
                },
                FitsAsset {
                    position_angle: Some(PositionAngle(250)),
                    path: PathBuf::from("/data/A2744-250-G141_00005.2D.fits"),
                },
            ],
            halpha_images: Vec::new(),
        }
    }

    #[test]
    fn test_text_region_format() {
        assert_eq!(
            text_region("SCI PA=10", 130, 10),
            "physical\n# text(130,10) textangle=0 textrotate=0 font=\"helvetica 12 normal roman\" text={SCI PA=10}"
        );
    }

    #[test]
    fn test_image_command_uses_configured_viewer() {
        let config = ViewerConfig {
            image_viewer: Some("eog --new-instance".to_string()),
            ..Default::default()
        };
        let command = image_command(&config, &[PathBuf::from("x.png"), PathBuf::from("y.pdf")]).unwrap();
        assert_eq!(command.program, "eog");
        assert_eq!(command.args, vec!["--new-instance", "x.png", "y.pdf"]);
        assert!(image_command(&config, &[]).is_none());
    }

    #[test]
    fn test_fits_plan_for_spectra() {
        let plan = fits_plan(&ViewerConfig::default(), &spectra_assets(), Path::new("/tmp")).unwrap();
        assert_eq!(plan.command.program, "ds9");
        let args = plan.command.args.join(" ");
        assert!(args.starts_with(
            "-geometry 1200x600 -scale zscale -lock frame physical -tile grid layout 4 4 "
        ));
        assert!(args.contains(
            "/data/A2744-010-G102_00005.2D.fits[DSCI] -region /tmp/temp_ds9_forinspection-010-DSCI.reg"
        ));
        assert!(args.contains("/data/A2744-250-G141_00005.2D.fits[CONTAM]"));
        assert_eq!(plan.regions.len(), 6);
        assert_eq!(plan.regions[1].1, "SCI PA=10");
    }

    #[test]
    fn test_fits_plan_for_stamps_without_lock() {
        let config = ViewerConfig {
            lock_frames: false,
            ..Default::default()
        };
        let assets = ObjectAssets {
            fits: vec![FitsAsset {
                position_angle: None,
                path: PathBuf::from("/stamps/A370_00007_f140w.fits"),
            }],
            ..Default::default()
        };
        let plan = fits_plan(&config, &assets, Path::new("/tmp")).unwrap();
        assert_eq!(
            plan.command.args.join(" "),
            "-geometry 1000x600 -scale zscale -tile grid layout 4 1 \
             /stamps/A370_00007_f140w.fits[0] -region /tmp/temp_ds9_forinspectionf140w.reg \
             -tile yes -zoom to fit"
        );
        assert_eq!(plan.regions[0].1, "f140w");
    }

    #[test]
    fn test_no_fits_no_plan() {
        assert!(fits_plan(&ViewerConfig::default(), &ObjectAssets::default(), Path::new(".")).is_none());
    }

    #[test]
    fn test_missing_viewer_binary_is_viewer_error() {
        let config = ViewerConfig {
            image_viewer: Some("gig-test-no-such-viewer-binary".to_string()),
            ..Default::default()
        };
        let mut display = ViewerDisplay::new(config, std::env::temp_dir());
        let result = display.open_images(&ObjectKey::new(5), &spectra_assets());
        assert!(matches!(result, Err(gig_common::Error::Viewer(_))));
        assert!(display.close_viewers().is_ok());
    }

    #[test]
    fn test_halpha_maps_use_the_image_viewer() {
        let config = ViewerConfig {
            image_viewer: Some("gig-test-no-such-viewer-binary".to_string()),
            ..Default::default()
        };
        let mut display = ViewerDisplay::new(config, std::env::temp_dir());
        let object = ObjectKey::in_cluster(7, "A370");

        // Nothing to show, so no process is started
        assert!(display.open_halpha(&object, &ObjectAssets::default()).is_ok());

        let assets = ObjectAssets {
            halpha_images: vec![PathBuf::from("A370_00007_ha.png")],
            ..Default::default()
        };
        assert!(matches!(
            display.open_halpha(&object, &assets),
            Err(gig_common::Error::Viewer(_))
        ));
    }
}
