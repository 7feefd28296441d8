//! Test doubles for the session collaborators
//!
//! Scanner, spectrum source and display driver backed by in-memory data, so
//! sessions can run without an image directory or external viewers.

#![allow(dead_code)]

use gig_common::catalog::{CatalogScanner, ObjectAssets};
use gig_common::display::DisplayDriver;
use gig_common::metrics::{ContaminationMaps, Grism, SpectrumSource};
use gig_common::session::{Collaborators, SessionSettings};
use gig_common::types::{ObjectId, ObjectKey, PositionAngle};
use gig_common::{Error, Result, SessionKind};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Scanner returning canned assets per object
#[derive(Debug, Clone, Default)]
pub struct FakeScanner {
    pub objects: BTreeMap<ObjectKey, ObjectAssets>,
}

impl FakeScanner {
    /// Every object gets the same position angles
    pub fn with_position_angles(ids: &[u32], angles: &[u16]) -> Self {
        let objects = ids
            .iter()
            .map(|id| {
                let assets = ObjectAssets {
                    position_angles: angles.iter().map(|pa| PositionAngle(*pa)).collect(),
                    images: vec![PathBuf::from(format!("obj_{:05}.2D.png", id))],
                    ..Default::default()
                };
                (ObjectKey::new(*id), assets)
            })
            .collect();
        Self { objects }
    }

    /// Morphology stamps; `halpha` lists ids that have H-alpha maps
    pub fn with_stamps(objects: &[(u32, &str)], halpha: &[u32]) -> Self {
        let objects = objects
            .iter()
            .map(|(id, cluster)| {
                let assets = ObjectAssets {
                    images: vec![PathBuf::from(format!("{}_{:05}_F140W.png", cluster, id))],
                    halpha_images: if halpha.contains(id) {
                        vec![PathBuf::from(format!("{}_{:05}_ha.png", cluster, id))]
                    } else {
                        Vec::new()
                    },
                    ..Default::default()
                };
                (ObjectKey::in_cluster(*id, *cluster), assets)
            })
            .collect();
        Self { objects }
    }
}

impl CatalogScanner for FakeScanner {
    fn list_objects(&self) -> Result<Vec<ObjectKey>> {
        Ok(self.objects.keys().cloned().collect())
    }

    fn assets_for(&self, object: &ObjectKey) -> Result<ObjectAssets> {
        self.objects
            .get(object)
            .cloned()
            .ok_or_else(|| Error::AssetNotFound(format!("no files for {}", object)))
    }

    fn retain_available(&self, objects: Vec<ObjectKey>) -> Result<Vec<ObjectKey>> {
        Ok(objects
            .into_iter()
            .filter(|object| self.objects.contains_key(object))
            .collect())
    }
}

/// Spectrum source with a fixed trace and contamination maps for every PA
#[derive(Debug, Clone)]
pub struct FakeSpectra {
    pub trace: Vec<f64>,
    pub model: Vec<f64>,
    pub contamination: Vec<f64>,
    /// Reading the spectra of this (id, PA) fails
    pub unreadable: Option<(ObjectId, PositionAngle)>,
}

impl FakeSpectra {
    fn check(&self, id: ObjectId, pa: PositionAngle) -> Result<()> {
        if self.unreadable == Some((id, pa)) {
            return Err(Error::Fits(format!("spectrum of {} at PA {} is unreadable", id, pa)));
        }
        Ok(())
    }
}

impl Default for FakeSpectra {
    fn default() -> Self {
        Self {
            trace: vec![1.0, 1.0, 0.0, 1.0],
            model: vec![1.0; 4],
            contamination: vec![0.0, 0.0, 0.0, 1.0],
            unreadable: None,
        }
    }
}

impl SpectrumSource for FakeSpectra {
    fn traces(&self, id: ObjectId, pa: PositionAngle) -> Result<Vec<(Grism, Vec<f64>)>> {
        self.check(id, pa)?;
        Ok(vec![(Grism::G102, self.trace.clone())])
    }

    fn contamination_maps(&self, id: ObjectId, pa: PositionAngle) -> Result<Vec<ContaminationMaps>> {
        self.check(id, pa)?;
        Ok(vec![ContaminationMaps {
            grism: Grism::G102,
            model: self.model.clone(),
            contamination: self.contamination.clone(),
        }])
    }
}

/// Display call recorded by [`RecordingDisplay`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayCall {
    Images(ObjectKey),
    Fits(ObjectKey),
    Halpha(ObjectKey),
    Close,
}

/// Display driver remembering every call; clones share the log
#[derive(Debug, Clone, Default)]
pub struct RecordingDisplay {
    pub calls: Arc<Mutex<Vec<DisplayCall>>>,
    /// Fail every `open_images` call
    pub fail_images: bool,
}

impl RecordingDisplay {
    pub fn calls(&self) -> Vec<DisplayCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl DisplayDriver for RecordingDisplay {
    fn open_images(&mut self, object: &ObjectKey, _assets: &ObjectAssets) -> Result<()> {
        self.calls.lock().unwrap().push(DisplayCall::Images(object.clone()));
        if self.fail_images {
            return Err(Error::Viewer("image viewer not installed".to_string()));
        }
        Ok(())
    }

    fn open_fits_overlay(&mut self, object: &ObjectKey, _assets: &ObjectAssets) -> Result<()> {
        self.calls.lock().unwrap().push(DisplayCall::Fits(object.clone()));
        Ok(())
    }

    fn open_halpha(&mut self, object: &ObjectKey, _assets: &ObjectAssets) -> Result<()> {
        self.calls.lock().unwrap().push(DisplayCall::Halpha(object.clone()));
        Ok(())
    }

    fn close_viewers(&mut self) -> Result<()> {
        self.calls.lock().unwrap().push(DisplayCall::Close);
        Ok(())
    }
}

pub fn collaborators(scanner: FakeScanner, display: RecordingDisplay) -> Collaborators {
    collaborators_with_spectra(scanner, FakeSpectra::default(), display)
}

pub fn collaborators_with_spectra(
    scanner: FakeScanner,
    spectra: FakeSpectra,
    display: RecordingDisplay,
) -> Collaborators {
    Collaborators {
        scanner: Box::new(scanner),
        spectra: Box::new(spectra),
        display: Box::new(display),
    }
}

/// Settings with every optional behaviour off
pub fn settings(kind: SessionKind, output: &Path) -> SessionSettings {
    SessionSettings {
        kind,
        output: output.to_path_buf(),
        inspector: "Test Inspector".to_string(),
        check_for_duplicates: false,
        skip_empty: false,
        output_check: false,
        open_fits_auto: false,
        text_edit_threshold: 10,
        contamination_cutoff: 1e-3,
    }
}

/// Non-comment lines of a ledger
pub fn data_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|line| !line.trim_start().starts_with('#') && !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

pub fn keys(ids: &[u32]) -> Vec<ObjectKey> {
    ids.iter().map(|id| ObjectKey::new(*id)).collect()
}
