//! Morphology object-info table
//!
//! Whitespace-separated columns named on the first line (optionally behind
//! `#`): `id cluster environment redshift mag_band mag mag_err`.

use crate::{Error, Result};
use gig_common::types::ObjectKey;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

const COLUMNS: [&str; 7] = ["id", "cluster", "environment", "redshift", "mag_band", "mag", "mag_err"];

/// Catalogue entry for one object
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectInfo {
    pub environment: String,
    pub redshift: String,
    pub mag_band: String,
    pub mag: f64,
    pub mag_err: f64,
}

impl fmt::Display for ObjectInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Environment = {}, redshift = {}, {}  = {:.2}+/-{:.2}",
            self.environment, self.redshift, self.mag_band, self.mag, self.mag_err
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObjectInfoTable {
    rows: HashMap<ObjectKey, ObjectInfo>,
}

impl ObjectInfoTable {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let mut lines = contents.lines().filter(|line| !line.trim().is_empty());
        let header = lines
            .next()
            .ok_or_else(|| Error::Config("empty object-info table".to_string()))?;
        let names: Vec<&str> = header.trim_start_matches('#').split_whitespace().collect();

        let mut positions = [0usize; COLUMNS.len()];
        for (slot, column) in COLUMNS.iter().enumerate() {
            positions[slot] = names
                .iter()
                .position(|name| name == column)
                .ok_or_else(|| Error::Config(format!("object-info table has no '{}' column", column)))?;
        }

        let mut rows = HashMap::new();
        for line in lines.filter(|line| !line.trim_start().starts_with('#')) {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let field = |slot: usize| {
                tokens
                    .get(positions[slot])
                    .copied()
                    .ok_or_else(|| Error::Config(format!("short object-info row '{}'", line)))
            };
            let number = |slot: usize| -> Result<f64> {
                let token = field(slot)?;
                token
                    .parse()
                    .map_err(|_| Error::Config(format!("invalid {} '{}'", COLUMNS[slot], token)))
            };

            let id = number(0)? as u32;
            let key = ObjectKey::in_cluster(id, field(1)?);
            rows.insert(
                key,
                ObjectInfo {
                    environment: field(2)?.to_string(),
                    redshift: field(3)?.to_string(),
                    mag_band: field(4)?.to_string(),
                    mag: number(5)?,
                    mag_err: number(6)?,
                },
            );
        }
        Ok(Self { rows })
    }

    pub fn get(&self, object: &ObjectKey) -> Option<&ObjectInfo> {
        self.rows.get(object)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
