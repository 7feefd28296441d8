//! Spectral coverage and contamination estimates
//!
//! Both estimates are reported per grism. A grism without a data asset
//! reports [`NO_ASSET`]; an asset with no samples reports [`NO_SAMPLES`].

use crate::fields::{FieldKind, MetricSlot};
use crate::record::{FieldValue, Record};
use crate::types::{ObjectId, PositionAngle};
use crate::Result;

/// Sentinel for a grism with no data file
pub const NO_ASSET: f64 = 9.99;

/// Sentinel for a data file with zero usable samples
pub const NO_SAMPLES: f64 = -99.0;

/// Absolute contamination level above which a pixel counts as contaminated
pub const DEFAULT_CONTAMINATION_CUTOFF: f64 = 1e-3;

/// Estimator variant written into the `*_Type` columns
pub const ESTIMATOR_TYPE: u8 = 1;

/// HST WFC3 grisms inspected by the flag tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grism {
    G102,
    G141,
}

impl Grism {
    /// Grism named in a file name, either case
    pub fn from_file_name(name: &str) -> Option<Self> {
        let upper = name.to_ascii_uppercase();
        if upper.contains("G102") {
            Some(Grism::G102)
        } else if upper.contains("G141") {
            Some(Grism::G141)
        } else {
            None
        }
    }
}

/// One value per grism
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrismPair {
    pub g102: f64,
    pub g141: f64,
}

impl GrismPair {
    pub fn missing() -> Self {
        Self {
            g102: NO_ASSET,
            g141: NO_ASSET,
        }
    }

    fn set(&mut self, grism: Grism, value: f64) {
        match grism {
            Grism::G102 => self.g102 = value,
            Grism::G141 => self.g141 = value,
        }
    }
}

/// Model and contamination images of one 2-D spectrum, same pixel order
#[derive(Debug, Clone, PartialEq)]
pub struct ContaminationMaps {
    pub grism: Grism,
    pub model: Vec<f64>,
    pub contamination: Vec<f64>,
}

/// Source of the per-object spectral data the estimates are computed from
pub trait SpectrumSource {
    /// 1-D extraction traces, one per grism found
    fn traces(&self, id: ObjectId, pa: PositionAngle) -> Result<Vec<(Grism, Vec<f64>)>>;

    /// 2-D model and contamination images, one per grism found
    fn contamination_maps(&self, id: ObjectId, pa: PositionAngle)
        -> Result<Vec<ContaminationMaps>>;
}

/// Source with no data; every estimate reports [`NO_ASSET`]
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSpectra;

impl SpectrumSource for NullSpectra {
    fn traces(&self, _id: ObjectId, _pa: PositionAngle) -> Result<Vec<(Grism, Vec<f64>)>> {
        Ok(Vec::new())
    }

    fn contamination_maps(
        &self,
        _id: ObjectId,
        _pa: PositionAngle,
    ) -> Result<Vec<ContaminationMaps>> {
        Ok(Vec::new())
    }
}

/// Fraction of non-zero trace samples
pub fn coverage_from_trace(trace: &[f64]) -> f64 {
    if trace.is_empty() {
        return NO_SAMPLES;
    }
    let zeros = trace.iter().filter(|value| **value == 0.0).count();
    1.0 - zeros as f64 / trace.len() as f64
}

/// Fraction of modelled pixels whose contamination exceeds `cutoff`
pub fn contamination_from_maps(model: &[f64], contamination: &[f64], cutoff: f64) -> f64 {
    let (modelled, contaminated) = model
        .iter()
        .zip(contamination)
        .filter(|(model, _)| **model != 0.0)
        .fold((0usize, 0usize), |(modelled, contaminated), (_, contam)| {
            (
                modelled + 1,
                contaminated + usize::from(contam.abs() > cutoff),
            )
        });
    if modelled == 0 {
        return NO_SAMPLES;
    }
    contaminated as f64 / modelled as f64
}

pub fn spectral_coverage(
    source: &dyn SpectrumSource,
    id: ObjectId,
    pa: PositionAngle,
) -> Result<GrismPair> {
    let mut pair = GrismPair::missing();
    for (grism, trace) in source.traces(id, pa)? {
        pair.set(grism, coverage_from_trace(&trace));
    }
    Ok(pair)
}

pub fn contamination_level(
    source: &dyn SpectrumSource,
    id: ObjectId,
    pa: PositionAngle,
    cutoff: f64,
) -> Result<GrismPair> {
    let mut pair = GrismPair::missing();
    for maps in source.contamination_maps(id, pa)? {
        pair.set(
            maps.grism,
            contamination_from_maps(&maps.model, &maps.contamination, cutoff),
        );
    }
    Ok(pair)
}

/// Write the estimates into the record's computed columns
pub fn apply_metrics(record: &mut Record, coverage: GrismPair, contamination: GrismPair) {
    for (field, value) in record.kind.fields().iter().zip(record.values.iter_mut()) {
        let FieldKind::Computed(slot) = field.kind else {
            continue;
        };
        let text = match slot {
            MetricSlot::G102Coverage => format!("{:.5}", coverage.g102),
            MetricSlot::G141Coverage => format!("{:.5}", coverage.g141),
            MetricSlot::G102Contamination => format!("{:.5}", contamination.g102),
            MetricSlot::G141Contamination => format!("{:.5}", contamination.g141),
            MetricSlot::CoverageType | MetricSlot::ContaminationType => {
                ESTIMATOR_TYPE.to_string()
            }
        };
        *value = FieldValue::Text(text);
    }
}
