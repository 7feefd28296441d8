//! Spectrum source backed by the FITS products of a spectra directory
//!
//! 1-D spectra carry the extraction trace in column `etrace` of HDU 1.
//! 2-D spectra carry the model in HDU 6 and the contamination in HDU 7
//! (`MODEL` and `CONTAM` when the extensions are named).

use crate::scanner::GlassScanner;
use crate::{Error, Result};
use fitsio::hdu::FitsHdu;
use fitsio::FitsFile;
use gig_common::metrics::{ContaminationMaps, Grism, SpectrumSource};
use gig_common::types::{ObjectId, PositionAngle};
use std::path::Path;
use tracing::{debug, warn};

const TRACE_HDU: usize = 1;
const MODEL_HDU: usize = 6;
const CONTAM_HDU: usize = 7;

pub struct FitsSpectrumSource {
    scanner: GlassScanner,
}

impl FitsSpectrumSource {
    pub fn new(scanner: GlassScanner) -> Self {
        Self { scanner }
    }
}

fn grism_of(path: &Path) -> Option<Grism> {
    let grism = path
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(Grism::from_file_name);
    if grism.is_none() {
        warn!("No grism in file name {}; ignoring it", path.display());
    }
    grism
}

/// Extension `name`, or the HDU at `index` when no extension carries that name
fn extension(fptr: &mut FitsFile, name: &str, index: usize) -> Result<FitsHdu> {
    match fptr.hdu(name) {
        Ok(hdu) => Ok(hdu),
        Err(_) => {
            debug!("No {} extension; using HDU {}", name, index);
            Ok(fptr.hdu(index)?)
        }
    }
}

fn read_trace(path: &Path) -> Result<Vec<f64>> {
    let mut fptr = FitsFile::open(path)?;
    let hdu = fptr.hdu(TRACE_HDU)?;
    Ok(hdu.read_col::<f64>(&mut fptr, "etrace")?)
}

fn read_maps(path: &Path, grism: Grism) -> Result<ContaminationMaps> {
    let mut fptr = FitsFile::open(path)?;
    let model: Vec<f64> = extension(&mut fptr, "MODEL", MODEL_HDU)?.read_image(&mut fptr)?;
    let contamination: Vec<f64> =
        extension(&mut fptr, "CONTAM", CONTAM_HDU)?.read_image(&mut fptr)?;
    if model.len() != contamination.len() {
        return Err(Error::Fits(format!(
            "{}: model has {} pixels, contamination {}",
            path.display(),
            model.len(),
            contamination.len()
        )));
    }
    Ok(ContaminationMaps {
        grism,
        model,
        contamination,
    })
}

impl SpectrumSource for FitsSpectrumSource {
    fn traces(
        &self,
        id: ObjectId,
        pa: PositionAngle,
    ) -> gig_common::Result<Vec<(Grism, Vec<f64>)>> {
        let mut traces = Vec::new();
        for path in self.scanner.spectra_1d(id, pa) {
            let Some(grism) = grism_of(&path) else {
                continue;
            };
            debug!("Reading trace from {}", path.display());
            traces.push((grism, read_trace(&path)?));
        }
        Ok(traces)
    }

    fn contamination_maps(
        &self,
        id: ObjectId,
        pa: PositionAngle,
    ) -> gig_common::Result<Vec<ContaminationMaps>> {
        let mut maps = Vec::new();
        for path in self.scanner.spectra_2d(id, pa) {
            let Some(grism) = grism_of(&path) else {
                continue;
            };
            debug!("Reading contamination maps from {}", path.display());
            maps.push(read_maps(&path, grism)?);
        }
        Ok(maps)
    }
}
