//! In-memory inspection record
//!
//! A `Record` is built blank when an object becomes current, edited by
//! session commands, and consumed once by the commit.

use crate::fields::{FieldGroup, FieldKind, Section, SessionKind};
use crate::types::RecordKey;
use crate::{Error, Result};
use std::fmt;

/// Value of one column
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Flag(bool),
    Slider(u8),
    /// Placeholder or computed text token
    Text(String),
    /// `-1` sentinel for disabled columns
    Disabled,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Flag(true) => f.write_str("1"),
            FieldValue::Flag(false) => f.write_str("0"),
            FieldValue::Slider(value) => write!(f, "{}", value),
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Disabled => f.write_str("-1"),
        }
    }
}

/// By-hand redshift block shared by both position angles of a redshift row
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ByHandRedshift {
    /// `None` is written as `-99`
    pub redshift: Option<f64>,
    pub quality: u8,
    pub multiple_solutions: bool,
}

impl ByHandRedshift {
    pub const NO_REDSHIFT: &'static str = "-99";
    pub const MAX_QUALITY: u8 = 4;

    pub fn is_default(&self) -> bool {
        self.redshift.is_none() && self.quality == 0 && !self.multiple_solutions
    }

    pub fn cycle_quality(&mut self) {
        self.quality = if self.quality >= Self::MAX_QUALITY {
            0
        } else {
            self.quality + 1
        };
    }
}

/// One (object, position angle) or (object, cluster) inspection result
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub kind: SessionKind,
    pub key: RecordKey,
    pub values: Vec<FieldValue>,
    /// Text of each section in `kind.sections()` order
    pub sections: Vec<String>,
    pub by_hand: Option<ByHandRedshift>,
}

impl Record {
    /// Record with every column at its initial value
    pub fn blank(kind: SessionKind, key: RecordKey) -> Self {
        let values = kind
            .fields()
            .iter()
            .map(|field| match field.kind {
                FieldKind::Flag => match field.group {
                    Some(group) if group.starts_disabled() => FieldValue::Disabled,
                    _ => FieldValue::Flag(false),
                },
                FieldKind::Slider { .. } => FieldValue::Slider(0),
                FieldKind::Disabled => FieldValue::Disabled,
                FieldKind::Computed(_) => FieldValue::Text(field.name.to_string()),
            })
            .collect();

        Self {
            kind,
            key,
            values,
            sections: vec![String::new(); kind.sections().len()],
            by_hand: kind.has_by_hand_redshift().then(ByHandRedshift::default),
        }
    }

    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.kind.field_named(name).and_then(|index| self.values.get(index))
    }

    pub fn is_set(&self, name: &str) -> bool {
        matches!(self.value(name), Some(FieldValue::Flag(true)))
    }

    fn set_flag(&mut self, name: &str) {
        if let Some(index) = self.kind.field_named(name) {
            if let Some(FieldValue::Flag(value)) = self.values.get_mut(index) {
                *value = true;
            }
        }
    }

    pub fn section(&self, section: Section) -> Option<&str> {
        self.kind
            .sections()
            .iter()
            .position(|s| *s == section)
            .and_then(|index| self.sections.get(index))
            .map(String::as_str)
    }

    pub fn set_section(&mut self, section: Section, text: &str) -> Result<()> {
        let index = self
            .kind
            .sections()
            .iter()
            .position(|s| *s == section)
            .ok_or_else(|| {
                Error::InvalidState(format!("no #{}# section for this kind", section.tag()))
            })?;
        self.sections[index] = text.trim().to_string();
        Ok(())
    }

    /// Flip a flag or advance a slider; returns the new value
    ///
    /// Disabled and computed columns are not editable.
    pub fn toggle(&mut self, index: usize) -> Result<&FieldValue> {
        let field = self
            .kind
            .fields()
            .get(index)
            .ok_or_else(|| Error::InvalidState(format!("no column {}", index)))?;
        let value = &mut self.values[index];
        match (field.kind, &mut *value) {
            (FieldKind::Flag, FieldValue::Flag(set)) => *set = !*set,
            (FieldKind::Slider { max }, FieldValue::Slider(current)) => {
                *current = if *current >= max { 0 } else { *current + 1 };
            }
            _ => {
                return Err(Error::InvalidState(format!(
                    "column {} is not editable",
                    field.name
                )))
            }
        }
        Ok(&self.values[index])
    }

    /// Whether the H-alpha and process columns accept input
    pub fn halpha_enabled(&self) -> bool {
        self.kind
            .fields()
            .iter()
            .zip(&self.values)
            .filter(|(field, _)| field.group.map_or(false, FieldGroup::starts_disabled))
            .all(|(_, value)| *value != FieldValue::Disabled)
    }

    /// Switch the H-alpha and process columns from `-1` to unset flags
    pub fn enable_halpha_group(&mut self) {
        for (field, value) in self.kind.fields().iter().zip(self.values.iter_mut()) {
            if field.group.map_or(false, FieldGroup::starts_disabled) && *value == FieldValue::Disabled
            {
                *value = FieldValue::Flag(false);
            }
        }
    }

    /// Make flags consistent with each other and with the wavelength lists
    ///
    /// A multiple-lines flag implies the single-line flag. One wavelength in a
    /// grism's list sets its emission-line flag, more than one sets its
    /// multiple-lines flag.
    pub fn normalize(&mut self) {
        if self.kind != SessionKind::Flags {
            return;
        }
        for (grism, section) in [("G102", Section::G102Wave), ("G141", Section::G141Wave)] {
            let single = format!("{}_Emission_Line", grism);
            let multiple = format!("{}_Emission_Lines_Multiple", grism);

            if self.is_set(&multiple) {
                self.set_flag(&single);
            }
            let waves = self
                .section(section)
                .map(|text| text.split_whitespace().count())
                .unwrap_or(0);
            if waves == 1 {
                self.set_flag(&single);
            }
            if waves > 1 {
                self.set_flag(&multiple);
            }
        }
    }

    /// Reject morphology rows without exactly one choice per active group
    pub fn validate(&self) -> Result<()> {
        if self.kind != SessionKind::Morphology {
            return Ok(());
        }
        let count = |group: FieldGroup| {
            self.kind
                .fields()
                .iter()
                .zip(&self.values)
                .filter(|(field, value)| {
                    field.group == Some(group) && **value == FieldValue::Flag(true)
                })
                .count()
        };

        let mut groups = vec![FieldGroup::Image];
        if self.halpha_enabled() {
            groups.push(FieldGroup::Halpha);
            groups.push(FieldGroup::Process);
        }
        for group in groups {
            let set = count(group);
            if set != 1 {
                return Err(Error::IncompleteRecord(format!(
                    "{}: {} {:?} flags set; set exactly one before advancing",
                    self.key, set, group
                )));
            }
        }
        Ok(())
    }
}
