//! Object selection from an earlier flag-inspection ledger
//!
//! Redshift inspections usually run on the objects a flag inspection marked
//! as having emission lines or continuum.

use crate::fields::SessionKind;
use crate::ledger::Ledger;
use crate::types::ObjectKey;
use crate::Result;
use std::path::Path;
use tracing::{info, warn};

/// Which flag-ledger rows select an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    /// Any row with an emission-line or continuum flag in either grism
    #[default]
    EmissionLineObjects,
    /// Every object in the ledger
    All,
}

impl Selection {
    /// Parse a selection name; unknown names fall back to `All` with a warning
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "emissionlineobjects" | "emission-line-objects" | "emission_line_objects" => {
                Selection::EmissionLineObjects
            }
            "all" | "allentries" => Selection::All,
            other => {
                warn!(
                    "Selection '{}' is not valid; selecting all objects in the ledger",
                    other
                );
                Selection::All
            }
        }
    }
}

const SELECTING_FLAGS: [&str; 4] = [
    "G102_Emission_Line",
    "G141_Emission_Line",
    "G102_Continuum",
    "G141_Continuum",
];

/// Sorted, distinct objects of a flag ledger matching `selection`
pub fn select_objects(path: &Path, selection: Selection) -> Result<Vec<ObjectKey>> {
    let rows = Ledger::latest_rows(path, SessionKind::Flags)?;
    let mut objects: Vec<ObjectKey> = rows
        .iter()
        .filter(|record| match selection {
            Selection::All => true,
            Selection::EmissionLineObjects => {
                SELECTING_FLAGS.iter().any(|name| record.is_set(name))
            }
        })
        .map(|record| ObjectKey {
            id: record.key.object_id(),
            cluster: None,
        })
        .collect();
    objects.sort();
    objects.dedup();

    info!(
        "Found {} objects ({:?}) in {}",
        objects.len(),
        selection,
        path.display()
    );
    Ok(objects)
}
