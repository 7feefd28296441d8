//! Catalog collaborator and object-list construction

use crate::selection::{self, Selection};
use crate::types::{KeyStyle, ObjectKey, PositionAngle};
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A FITS file to show in the FITS viewer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FitsAsset {
    /// Position angle of a 2-D grism spectrum; `None` for a plain image stamp
    pub position_angle: Option<PositionAngle>,
    pub path: PathBuf,
}

/// Files belonging to one object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectAssets {
    /// Sorted, distinct
    pub position_angles: Vec<PositionAngle>,
    /// Images for the image viewer, in display order
    pub images: Vec<PathBuf>,
    pub fits: Vec<FitsAsset>,
    /// H-alpha maps, kept back until the image classification is done
    pub halpha_images: Vec<PathBuf>,
}

impl ObjectAssets {
    pub fn has_halpha_maps(&self) -> bool {
        !self.halpha_images.is_empty()
    }
}

/// Discovers inspectable objects and their files
pub trait CatalogScanner {
    /// Every object with data, in any order
    fn list_objects(&self) -> Result<Vec<ObjectKey>>;

    /// Files for one object; `AssetNotFound` when there are none
    fn assets_for(&self, object: &ObjectKey) -> Result<ObjectAssets>;

    /// Drop objects of an explicit list that have no data
    fn retain_available(&self, objects: Vec<ObjectKey>) -> Result<Vec<ObjectKey>> {
        Ok(objects)
    }
}

/// Where the object list comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectSource {
    /// Every object the scanner finds
    Scan,
    /// Whitespace-separated list file: `id` or `id cluster` per line
    ListFile(PathBuf),
    /// Objects selected from an earlier flag-inspection ledger
    FlagLedger { path: PathBuf, selection: Selection },
}

/// Build the ordered, de-duplicated object list
pub fn resolve_object_list(
    source: &ObjectSource,
    style: KeyStyle,
    scanner: &dyn CatalogScanner,
) -> Result<Vec<ObjectKey>> {
    let objects = match source {
        ObjectSource::Scan => scanner.list_objects()?,
        ObjectSource::ListFile(path) => {
            let listed = read_object_list(path, style)?;
            let count = listed.len();
            let available = scanner.retain_available(listed)?;
            if available.len() < count {
                warn!(
                    "{} of {} listed objects have no data and were dropped",
                    count - available.len(),
                    count
                );
            }
            available
        }
        ObjectSource::FlagLedger { path, selection } => {
            let selected = selection::select_objects(path, *selection)?;
            scanner.retain_available(selected)?
        }
    };

    let objects = normalize(objects);
    if objects.is_empty() {
        return Err(Error::Config(
            "No valid IDs found; check the directory and object list".to_string(),
        ));
    }
    info!("Found {} objects to inspect", objects.len());
    Ok(objects)
}

/// Sort ascending and drop repeats
pub fn normalize(mut objects: Vec<ObjectKey>) -> Vec<ObjectKey> {
    objects.sort();
    objects.dedup();
    objects
}

/// Read an explicit object list
///
/// Blank lines and `#` comments are ignored. Cluster-keyed lists need a
/// cluster name after each id.
pub fn read_object_list(path: &Path, style: KeyStyle) -> Result<Vec<ObjectKey>> {
    let contents = fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Cannot read object list {}: {}", path.display(), e))
    })?;

    let mut objects = Vec::new();
    for (number, line) in contents.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let id = tokens
            .next()
            .and_then(parse_id)
            .ok_or_else(|| bad_line(path, number, line))?;
        let key = match style {
            KeyStyle::PositionAngle => ObjectKey::new(id),
            KeyStyle::Cluster => {
                let cluster = tokens.next().ok_or_else(|| bad_line(path, number, line))?;
                ObjectKey::in_cluster(id, cluster)
            }
        };
        objects.push(key);
    }
    Ok(objects)
}

/// Ids may be written as integers or as whole floats (`12.0`)
fn parse_id(token: &str) -> Option<u32> {
    token.parse::<u32>().ok().or_else(|| {
        token
            .parse::<f64>()
            .ok()
            .filter(|value| value.fract() == 0.0 && *value >= 0.0 && *value <= u32::MAX as f64)
            .map(|value| value as u32)
    })
}

fn bad_line(path: &Path, number: usize, line: &str) -> Error {
    Error::Config(format!(
        "{}:{}: invalid object list entry '{}'",
        path.display(),
        number + 1,
        line
    ))
}
