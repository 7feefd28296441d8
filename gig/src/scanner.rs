//! Data directory scanners
//!
//! [`GlassScanner`] finds grism spectra products (PNG previews plus 1-D and
//! 2-D FITS spectra) for the flag and redshift inspections;
//! [`StampScanner`] finds postage stamps for the morphology inspection.
//!
//! Only the top level of the data directory is scanned. File patterns use
//! `*` wildcards matched against file names.

use gig_common::catalog::{CatalogScanner, FitsAsset, ObjectAssets};
use gig_common::types::{ObjectId, ObjectKey, PositionAngle};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Data directory scanner errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// No files for an object
    #[error("Did not find any files matching {0}")]
    NoFiles(String),
}

impl From<ScanError> for gig_common::Error {
    fn from(error: ScanError) -> Self {
        match error {
            ScanError::NoFiles(_) => gig_common::Error::AssetNotFound(error.to_string()),
            other => gig_common::Error::Config(other.to_string()),
        }
    }
}

/// Field names with a negative declination carry an extra `-` before the PA
const NEGATIVE_DEC_PREFIXES: [&str; 3] = ["MACS0416.1", "MACS2129.4", "RXJ1347.5"];

/// Match `name` against a pattern where `*` stands for any run of characters
pub fn wildcard_match(pattern: &str, name: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == name;
    }

    let first = parts[0];
    let last = parts[parts.len() - 1];
    if name.len() < first.len() + last.len() || !name.starts_with(first) || !name.ends_with(last)
    {
        return false;
    }
    let mut rest = &name[first.len()..name.len() - last.len()];
    for part in &parts[1..parts.len() - 1] {
        match rest.find(part) {
            Some(index) => rest = &rest[index + part.len()..],
            None => return false,
        }
    }
    true
}

/// Sorted list of the regular files directly inside `dir`
fn list_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Error accessing entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|name| name.to_str()).unwrap_or("")
}

fn check_directory(dir: &Path) -> Result<(), ScanError> {
    if !dir.exists() {
        return Err(ScanError::PathNotFound(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(ScanError::NotADirectory(dir.to_path_buf()));
    }
    Ok(())
}

/// File naming scheme of a spectra directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Naming {
    /// `<field>-<pa>-<...>_<id>.<GRISM>.2D.png`
    Glass,
    /// MAST high-level science products: `..._<id>..-pa<pa>_..._<grism>_<version>_2d.png`
    Mast,
}

impl Naming {
    fn two_d_png(self) -> &'static str {
        match self {
            Naming::Glass => ".2D.png",
            Naming::Mast => "_2d.png",
        }
    }

    fn one_d_png(self) -> &'static str {
        match self {
            Naming::Glass => ".1D.png",
            Naming::Mast => "_1d.png",
        }
    }

    /// Byte range, counted from the end, holding the object id of a 2-D png
    fn id_range(self) -> (usize, usize) {
        match self {
            Naming::Glass => (17, 12),
            Naming::Mast => (28, 23),
        }
    }

    fn fits_pattern(self, id: ObjectId, pa: PositionAngle, dimension: &str) -> String {
        match self {
            Naming::Glass => format!("*-{}-*{}*{}D.fits", pa, id, dimension),
            Naming::Mast => format!("*{}*-pa{}_*{}d.fits", id, pa, dimension),
        }
    }
}

/// Scanner for grism spectra products
#[derive(Debug, Clone)]
pub struct GlassScanner {
    dir: PathBuf,
    naming: Naming,
}

impl GlassScanner {
    pub fn new(dir: impl Into<PathBuf>, mast: bool) -> Result<Self, ScanError> {
        let dir = dir.into();
        check_directory(&dir)?;
        let naming = if mast { Naming::Mast } else { Naming::Glass };
        Ok(Self { dir, naming })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn matching(&self, pattern: &str) -> Vec<PathBuf> {
        list_files(&self.dir)
            .into_iter()
            .filter(|path| wildcard_match(pattern, file_name(path)))
            .collect()
    }

    /// Object id encoded in a 2-D png file name
    fn id_from_png(&self, name: &str) -> Option<u32> {
        let (start, end) = self.naming.id_range();
        let len = name.len();
        if len < start {
            return None;
        }
        name.get(len - start..len - end)?.parse().ok()
    }

    /// Position angle encoded in a 1-D png file name
    fn pa_from_png(&self, name: &str) -> Option<PositionAngle> {
        match self.naming {
            Naming::Mast => {
                let tail = name.rsplit("-pa").next()?;
                PositionAngle::parse(tail.get(..3)?)
            }
            Naming::Glass => {
                let parts: Vec<&str> = name.split('-').collect();
                let index = if NEGATIVE_DEC_PREFIXES.contains(parts.first()?) {
                    2
                } else {
                    1
                };
                PositionAngle::parse(parts.get(index)?)
            }
        }
    }

    /// Distinct, sorted position angles with a 1-D png for `id`
    pub fn position_angles(&self, id: ObjectId) -> Vec<PositionAngle> {
        let pattern = format!("*{}*{}", id, self.naming.one_d_png());
        let mut angles: Vec<PositionAngle> = self
            .matching(&pattern)
            .iter()
            .filter_map(|path| {
                let angle = self.pa_from_png(file_name(path));
                if angle.is_none() {
                    debug!("No position angle in {}", path.display());
                }
                angle
            })
            .collect();
        angles.sort();
        angles.dedup();
        angles
    }

    /// Preview images of `id` in display order
    ///
    /// 1-D then 2-D per grism (G102, G141, G800L), then redshift fits,
    /// stacks and mosaics. Files matching none of these are left out.
    pub fn ordered_images(&self, id: ObjectId) -> Vec<PathBuf> {
        let files: Vec<PathBuf> = self
            .matching(&format!("*{}*.png", id))
            .into_iter()
            .chain(self.matching(&format!("*{}*.pdf", id)))
            .collect();

        // (substring, suffix) per grism product
        let grism_products: [(&str, &str); 6] = match self.naming {
            Naming::Glass => [
                ("G102.1D.png", ""),
                ("G102.2D.png", ""),
                ("G141.1D.png", ""),
                ("G141.2D.png", ""),
                ("G800L.1D.png", ""),
                ("G800L.2D.png", ""),
            ],
            Naming::Mast => [
                ("g102_", "_1d.png"),
                ("g102_", "_2d.png"),
                ("g141_", "_1d.png"),
                ("g141_", "_2d.png"),
                ("g800l_", "_1d.png"),
                ("g800l_", "_2d.png"),
            ],
        };

        let mut ordered = Vec::new();
        for (needle, suffix) in grism_products {
            ordered.extend(
                files
                    .iter()
                    .filter(|path| {
                        let name = file_name(path);
                        name.contains(needle) && name.ends_with(suffix)
                    })
                    .cloned(),
            );
        }
        for marker in ["zfit", "stack", "mosaic"] {
            ordered.extend(
                files
                    .iter()
                    .filter(|path| file_name(path).contains(marker))
                    .cloned(),
            );
        }
        ordered
    }

    /// 2-D spectra FITS files of `id` at `pa`
    pub fn spectra_2d(&self, id: ObjectId, pa: PositionAngle) -> Vec<PathBuf> {
        self.matching(&self.naming.fits_pattern(id, pa, "2"))
    }

    /// 1-D spectra FITS files of `id` at `pa`
    pub fn spectra_1d(&self, id: ObjectId, pa: PositionAngle) -> Vec<PathBuf> {
        let files = self.matching(&self.naming.fits_pattern(id, pa, "1"));
        if files.len() > 2 {
            warn!(
                "Found {} 1-D spectra for {} at PA {}; expected at most 2",
                files.len(),
                id,
                pa
            );
        }
        files
    }
}

impl CatalogScanner for GlassScanner {
    fn list_objects(&self) -> gig_common::Result<Vec<ObjectKey>> {
        let suffix = self.naming.two_d_png();
        let ids = list_files(&self.dir)
            .iter()
            .map(|path| file_name(path))
            .filter(|name| name.ends_with(suffix) && !name.contains("zfit"))
            .filter_map(|name| self.id_from_png(name))
            .map(ObjectKey::new)
            .collect();
        Ok(ids)
    }

    fn assets_for(&self, object: &ObjectKey) -> gig_common::Result<ObjectAssets> {
        let id = object.id;
        let images = self.ordered_images(id);
        if images.is_empty() {
            return Err(ScanError::NoFiles(format!("{}/*{}*.png", self.dir.display(), id)).into());
        }

        let position_angles = self.position_angles(id);
        let fits = position_angles
            .iter()
            .flat_map(|pa| {
                self.spectra_2d(id, *pa).into_iter().map(|path| FitsAsset {
                    position_angle: Some(*pa),
                    path,
                })
            })
            .collect();

        Ok(ObjectAssets {
            position_angles,
            images,
            fits,
            halpha_images: Vec::new(),
        })
    }

    fn retain_available(&self, objects: Vec<ObjectKey>) -> gig_common::Result<Vec<ObjectKey>> {
        let suffix = match self.naming {
            Naming::Glass => "2D.png",
            Naming::Mast => "_2d.png",
        };
        let files = list_files(&self.dir);
        Ok(objects
            .into_iter()
            .filter(|object| {
                let pattern = match self.naming {
                    Naming::Glass => format!("*_{}*{}", object.id, suffix),
                    Naming::Mast => format!("*{}*{}", object.id, suffix),
                };
                let found = files
                    .iter()
                    .any(|path| wildcard_match(&pattern, file_name(path)));
                if !found {
                    debug!("No 2-D spectra for {}; dropping it", object);
                }
                found
            })
            .collect())
    }
}

/// Postage stamp bands in display order
const STAMP_BANDS: [&str; 4] = ["f475w", "f105w", "f140w", "f160w"];

/// Scanner for morphology postage stamps named `<cluster>_<id>_<band>.png`
#[derive(Debug, Clone)]
pub struct StampScanner {
    dir: PathBuf,
}

impl StampScanner {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ScanError> {
        let dir = dir.into();
        check_directory(&dir)?;
        Ok(Self { dir })
    }

    fn stamps(&self, object: &ObjectKey) -> Vec<PathBuf> {
        let prefix = format!("{}_{}", cluster_name(object), object.id);
        list_files(&self.dir)
            .into_iter()
            .filter(|path| {
                let name = file_name(path);
                name.starts_with(&prefix) && name.ends_with(".png")
            })
            .collect()
    }

    /// Stamps ending in one of `suffixes` in that order, then the rest
    fn order_stamps(stamps: Vec<PathBuf>, suffixes: impl Iterator<Item = String>) -> Vec<PathBuf> {
        let mut ordered: Vec<PathBuf> = Vec::with_capacity(stamps.len());
        for suffix in suffixes {
            ordered.extend(
                stamps
                    .iter()
                    .filter(|path| file_name(path).ends_with(&suffix))
                    .cloned(),
            );
        }
        let remaining: Vec<PathBuf> = stamps
            .into_iter()
            .filter(|path| !ordered.contains(path))
            .collect();
        ordered.extend(remaining);
        ordered
    }
}

fn cluster_name(object: &ObjectKey) -> &str {
    object.cluster.as_ref().map(|cluster| cluster.as_str()).unwrap_or("")
}

impl CatalogScanner for StampScanner {
    fn list_objects(&self) -> gig_common::Result<Vec<ObjectKey>> {
        let objects = list_files(&self.dir)
            .iter()
            .map(|path| file_name(path))
            .filter(|name| name.ends_with("_rgb.png"))
            .filter_map(|name| {
                let mut parts = name.split('_');
                let cluster = parts.next()?;
                let id = parts.next()?.parse::<u32>().ok()?;
                Some(ObjectKey::in_cluster(id, cluster))
            })
            .collect();
        Ok(objects)
    }

    fn assets_for(&self, object: &ObjectKey) -> gig_common::Result<ObjectAssets> {
        let stamps = self.stamps(object);
        if stamps.is_empty() {
            return Err(ScanError::NoFiles(format!(
                "{}/{}_{}*.png",
                self.dir.display(),
                cluster_name(object),
                object.id
            ))
            .into());
        }


        let fits = stamps
            .iter()
            .filter(|path| {
                let name = file_name(path);
                !name.ends_with("_ha.png") && !name.contains("rgb")
            })
            .map(|path| path.with_extension("fits"))
            .filter(|path| {
                let exists = path.is_file();
                if !exists {
                    debug!("No FITS stamp {}", path.display());
                }
                exists
            })
            .map(|path| FitsAsset {
                position_angle: None,
                path,
            })
            .collect();

        let (halpha, plain): (Vec<PathBuf>, Vec<PathBuf>) = stamps
            .into_iter()
            .partition(|path| file_name(path).ends_with("_ha.png"));
        let images = Self::order_stamps(
            plain,
            std::iter::once("rgb.png".to_string())
                .chain(STAMP_BANDS.iter().map(|band| format!("{}.png", band))),
        );
        let halpha_images = Self::order_stamps(
            halpha,
            STAMP_BANDS.iter().map(|band| format!("{}_ha.png", band)),
        );

        Ok(ObjectAssets {
            position_angles: Vec::new(),
            images,
            fits,
            halpha_images,
        })
    }

    fn retain_available(&self, objects: Vec<ObjectKey>) -> gig_common::Result<Vec<ObjectKey>> {
        Ok(objects
            .into_iter()
            .filter(|object| !self.stamps(object).is_empty())
            .collect())
    }
}
