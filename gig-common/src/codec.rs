//! Ledger line codec
//!
//! Row layout:
//!
//! ```text
//!  <id:05> <pa:03|cluster> v1 ... vN [<z> <zq> <multi>]  #TAG# text ... <space>
//! ```

use crate::fields::{FieldKind, SessionKind};
use crate::record::{ByHandRedshift, FieldValue, Record};
use crate::types::{KeyStyle, RecordKey};
use crate::{Error, Result};

/// Default length above which a text column is treated as a reused placeholder
pub const DEFAULT_TEXT_EDIT_THRESHOLD: usize = 10;

/// Encode a record as one ledger line, without the newline
pub fn encode(record: &Record) -> String {
    let mut line = format!(" {}", record.key);
    for value in &record.values {
        line.push(' ');
        line.push_str(&value.to_string());
    }
    if let Some(by_hand) = &record.by_hand {
        let redshift = match by_hand.redshift {
            Some(z) => format!("{:?}", z),
            None => ByHandRedshift::NO_REDSHIFT.to_string(),
        };
        line.push_str(&format!(
            " {} {} {}",
            redshift,
            by_hand.quality,
            u8::from(by_hand.multiple_solutions)
        ));
    }
    for (section, text) in record.kind.sections().iter().zip(&record.sections) {
        line.push_str(&format!("  {} {}", section.marker(), text.trim()));
    }
    line.push(' ');
    line
}

/// Whether a line is a header or comment line
pub fn is_comment(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Parse only the leading key of a data line
///
/// Returns `None` for comment lines and for lines whose key does not parse.
pub fn parse_key(style: KeyStyle, line: &str) -> Option<RecordKey> {
    if is_comment(line) {
        return None;
    }
    let mut tokens = line.split_whitespace();
    let id = tokens.next()?;
    let second = tokens.next()?;
    RecordKey::parse(style, id, second).ok()
}

/// Decode one ledger line; `Ok(None)` for header and comment lines
pub fn decode(kind: SessionKind, line: &str) -> Result<Option<Record>> {
    let line = line.trim_end_matches(['\n', '\r']);
    if is_comment(line) {
        return Ok(None);
    }

    let (head, sections) = split_sections(kind, line);
    let tokens: Vec<&str> = head.split_whitespace().collect();
    if tokens.len() < 2 {
        return Err(Error::MalformedRecord(format!(
            "expected at least 2 tokens, found {}: '{}'",
            tokens.len(),
            line.trim()
        )));
    }
    let key = RecordKey::parse(kind.key_style(), tokens[0], tokens[1])?;

    let fields = kind.fields();
    let by_hand_columns = if kind.has_by_hand_redshift() { 3 } else { 0 };
    let expected = 2 + fields.len() + by_hand_columns;
    if tokens.len() < expected {
        return Err(Error::MalformedRecord(format!(
            "{}: expected {} columns, found {}",
            key,
            expected,
            tokens.len()
        )));
    }

    let mut values = Vec::with_capacity(fields.len());
    for (field, token) in fields.iter().zip(&tokens[2..]) {
        values.push(decode_value(field.kind, token).ok_or_else(|| {
            Error::MalformedRecord(format!("{}: invalid {} value '{}'", key, field.name, token))
        })?);
    }

    let by_hand = if kind.has_by_hand_redshift() {
        let rest = &tokens[2 + fields.len()..];
        Some(decode_by_hand(rest).ok_or_else(|| {
            Error::MalformedRecord(format!("{}: invalid by-hand redshift block", key))
        })?)
    } else {
        None
    };

    Ok(Some(Record {
        kind,
        key,
        values,
        sections,
        by_hand,
    }))
}

/// Markers are matched in declaration order, each after the end of the
/// previous one, so section text may quote another section's marker.
fn split_sections(kind: SessionKind, line: &str) -> (&str, Vec<String>) {
    let mut cursor = 0;
    let mut spans: Vec<Option<(usize, usize)>> = Vec::new();
    for section in kind.sections() {
        let marker = section.marker();
        let span = line[cursor..].find(&marker).map(|offset| {
            let start = cursor + offset;
            (start, start + marker.len())
        });
        if let Some((_, end)) = span {
            cursor = end;
        }
        spans.push(span);
    }

    let head_end = spans
        .iter()
        .flatten()
        .map(|(start, _)| *start)
        .next()
        .unwrap_or(line.len());

    let sections = spans
        .iter()
        .enumerate()
        .map(|(index, span)| match span {
            None => String::new(),
            Some((_, end)) => {
                let stop = spans[index + 1..]
                    .iter()
                    .flatten()
                    .map(|(start, _)| *start)
                    .next()
                    .unwrap_or(line.len());
                line[*end..stop].trim().to_string()
            }
        })
        .collect();

    (&line[..head_end], sections)
}

fn decode_value(kind: FieldKind, token: &str) -> Option<FieldValue> {
    if token == "-1" {
        return Some(FieldValue::Disabled);
    }
    match kind {
        FieldKind::Flag => match token {
            "1" => Some(FieldValue::Flag(true)),
            "0" => Some(FieldValue::Flag(false)),
            _ => None,
        },
        FieldKind::Slider { max } => token
            .parse::<u8>()
            .ok()
            .filter(|value| *value <= max)
            .map(FieldValue::Slider),
        FieldKind::Disabled | FieldKind::Computed(_) => Some(FieldValue::Text(token.to_string())),
    }
}

fn decode_by_hand(tokens: &[&str]) -> Option<ByHandRedshift> {
    let redshift = tokens.first()?.parse::<f64>().ok()?;
    let quality = tokens.get(1)?.parse::<u8>().ok()?;
    let multiple_solutions = match *tokens.get(2)? {
        "1" => true,
        "0" => false,
        _ => return None,
    };
    Some(ByHandRedshift {
        redshift: (redshift != -99.0).then_some(redshift),
        quality,
        multiple_solutions,
    })
}

/// Whether a record is still at its defaults
///
/// Computed columns are ignored. A text column longer than
/// `text_threshold` is a reused placeholder and counts as unedited. Any
/// non-empty section or a changed by-hand block counts as an edit.
pub fn is_empty(record: &Record, text_threshold: usize) -> bool {
    let columns_default = record
        .kind
        .fields()
        .iter()
        .zip(&record.values)
        .filter(|(field, _)| !matches!(field.kind, FieldKind::Computed(_)))
        .all(|(_, value)| match value {
            FieldValue::Flag(set) => !set,
            FieldValue::Slider(level) => *level == 0,
            FieldValue::Disabled => true,
            FieldValue::Text(text) => text.len() > text_threshold || text == "0",
        });

    columns_default
        && record.sections.iter().all(|text| text.trim().is_empty())
        && record.by_hand.map_or(true, |by_hand| by_hand.is_default())
}
