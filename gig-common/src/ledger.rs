//! Append-only inspection ledger
//!
//! The ledger is a plain text file: three `#` header lines followed by one
//! row per committed record. The handle stays open in append mode between
//! commits; every row is flushed and synced before `append` returns.
//!
//! Rewrites (duplicate purge) go through a sibling temp file that is renamed
//! over the ledger, so a failed rewrite leaves the previous contents intact.

use crate::codec;
use crate::fields::SessionKind;
use crate::record::Record;
use crate::time;
use crate::types::{KeyStyle, RecordKey};
use crate::{Error, Result};
use chrono::{DateTime, Local};
use std::collections::{HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// How `Ledger::open` treats the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Create with header lines when absent, otherwise append
    CreateIfAbsent,
    /// Append to an existing file without reading it
    AppendExisting,
    /// Scan the existing file for the resume point, then append
    ResumeFindLast,
}

/// Header lines written when a ledger is created
#[derive(Debug, Clone)]
pub struct LedgerHeader {
    pub kind: SessionKind,
    pub inspector: String,
    pub started: DateTime<Local>,
}

impl LedgerHeader {
    pub fn new(kind: SessionKind, inspector: impl Into<String>) -> Self {
        Self {
            kind,
            inspector: inspector.into(),
            started: time::now(),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        vec![
            format!(
                "# {} {} ",
                self.kind.header_title(),
                time::header_timestamp(&self.started)
            ),
            format!("# Inspector: {} ", self.inspector),
            self.kind.column_header(),
        ]
    }
}

/// Result of scanning an existing ledger
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeScan {
    /// Key of the last parsable row
    pub last_key: RecordKey,
    /// Number of distinct object ids in the file
    pub distinct_objects: usize,
    pub rows: usize,
    /// Non-comment lines whose key could not be parsed
    pub skipped_lines: usize,
}

/// Row counts compared against the object list when a session ends
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VerifyReport {
    pub objects_found: usize,
    pub objects_expected: usize,
    /// Distinct position angles in the file; `None` for cluster-keyed ledgers
    pub position_angles_found: Option<usize>,
    pub position_angles_expected: Option<usize>,
}

impl VerifyReport {
    pub fn is_consistent(&self) -> bool {
        self.objects_found == self.objects_expected
            && match (self.position_angles_found, self.position_angles_expected) {
                (Some(found), Some(expected)) => found == expected,
                _ => true,
            }
    }
}

/// Open or closed handle on a ledger file
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    style: KeyStyle,
    file: Option<File>,
}

impl Ledger {
    pub fn open(
        path: &Path,
        mode: OpenMode,
        header: &LedgerHeader,
    ) -> Result<(Self, Option<ResumeScan>)> {
        let style = header.kind.key_style();
        let mut resume = None;

        match mode {
            OpenMode::CreateIfAbsent => {
                if path.exists() {
                    info!("The file {} already exists (appending)", path.display());
                } else {
                    let mut file = File::create(path)?;
                    for line in header.lines() {
                        writeln!(file, "{}", line)?;
                    }
                    file.sync_data()?;
                    info!("The file {} was created (did not exist)", path.display());
                }
            }
            OpenMode::AppendExisting => {
                if !path.is_file() {
                    return Err(Error::Config(format!(
                        "Ledger {} does not exist",
                        path.display()
                    )));
                }
            }
            OpenMode::ResumeFindLast => {
                let scan = scan_rows(path, style)?;
                info!(
                    rows = scan.rows,
                    objects = scan.distinct_objects,
                    "The file {} already exists (resuming after {})",
                    path.display(),
                    scan.last_key
                );
                resume = Some(scan);
            }
        }

        let ledger = Self {
            path: path.to_path_buf(),
            style,
            file: Some(open_append(path)?),
        };
        Ok((ledger, resume))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Append one encoded row and sync it to disk
    pub fn append(&mut self, line: &str) -> Result<()> {
        let file = self.file.as_mut().ok_or_else(|| closed(&self.path))?;
        writeln!(file, "{}", line.trim_end_matches(['\n', '\r']))?;
        file.flush()?;
        file.sync_data()?;
        Ok(())
    }

    /// Remove every row keyed `key`; returns the number removed
    pub fn purge_duplicates(&mut self, key: &RecordKey) -> Result<usize> {
        let file = self.file.take().ok_or_else(|| closed(&self.path))?;
        drop(file);

        let result = self.rewrite_without(key);
        // Reopen even when the rewrite failed so the session can keep appending
        self.file = Some(open_append(&self.path)?);
        let removed = result?;
        if removed > 0 {
            info!("Found {} duplicate entries for {}; deleted them", removed, key);
        }
        Ok(removed)
    }

    fn rewrite_without(&self, key: &RecordKey) -> Result<usize> {
        let contents = fs::read_to_string(&self.path)?;
        let mut kept = String::with_capacity(contents.len());
        let mut removed = 0;
        for line in contents.split_inclusive('\n') {
            if codec::parse_key(self.style, line).as_ref() == Some(key) {
                removed += 1;
            } else {
                kept.push_str(line);
            }
        }
        if removed == 0 {
            return Ok(0);
        }

        let temp_path = temp_sibling(&self.path);
        let written = (|| -> Result<()> {
            let mut temp = File::create(&temp_path)?;
            temp.write_all(kept.as_bytes())?;
            temp.sync_all()?;
            fs::rename(&temp_path, &self.path)?;
            Ok(())
        })();
        if written.is_err() && temp_path.exists() {
            let _ = fs::remove_file(&temp_path);
        }
        written.map(|_| removed)
    }

    /// Compare row counts with the expected totals; never fails
    ///
    /// Reads the file by path, so it also works after `close`.
    pub fn verify(&self, expected_objects: usize, expected_max_pa: Option<usize>) -> VerifyReport {
        let mut report = VerifyReport {
            objects_expected: expected_objects,
            position_angles_expected: match self.style {
                KeyStyle::PositionAngle => expected_max_pa,
                KeyStyle::Cluster => None,
            },
            ..VerifyReport::default()
        };

        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("OUTPUTCHECK: could not read {}: {}", self.path.display(), e);
                return report;
            }
        };

        let mut objects = HashSet::new();
        let mut angles = HashSet::new();
        for key in contents.lines().filter_map(|line| codec::parse_key(self.style, line)) {
            objects.insert(key.object_id());
            if let Some(pa) = key.position_angle() {
                angles.insert(pa);
            }
        }
        report.objects_found = objects.len();
        if self.style == KeyStyle::PositionAngle {
            report.position_angles_found = Some(angles.len());
        }

        info!(
            "OUTPUTCHECK: Found {} objects in output. Input objlist contained {} objects",
            report.objects_found, report.objects_expected
        );
        if let (Some(found), Some(expected)) =
            (report.position_angles_found, report.position_angles_expected)
        {
            info!(
                "OUTPUTCHECK: Found {} PAs in output. Input objlist had {} PAs",
                found, expected
            );
        }
        if !report.is_consistent() {
            warn!("OUTPUTCHECK: ledger does not match the object list");
        }
        report
    }

    pub fn close(&mut self) -> Result<()> {
        let file = self.file.take().ok_or_else(|| closed(&self.path))?;
        file.sync_all()?;
        debug!("Closed ledger {}", self.path.display());
        Ok(())
    }

    /// Delete an existing ledger after the operator agreed to overwrite it
    pub fn clobber(path: &Path) -> Result<bool> {
        if path.exists() {
            fs::remove_file(path)?;
            info!("Removed {} to start a new ledger", path.display());
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Decode a ledger keeping the most recent row per key
    ///
    /// Rows keep the position of their first occurrence. Undecodable rows
    /// are skipped with a warning.
    pub fn latest_rows(path: &Path, kind: SessionKind) -> Result<Vec<Record>> {
        let contents = fs::read_to_string(path)?;
        let mut rows: Vec<Record> = Vec::new();
        let mut index: HashMap<RecordKey, usize> = HashMap::new();
        for (number, line) in contents.lines().enumerate() {
            match codec::decode(kind, line) {
                Ok(Some(record)) => match index.get(&record.key) {
                    Some(position) => rows[*position] = record,
                    None => {
                        index.insert(record.key.clone(), rows.len());
                        rows.push(record);
                    }
                },
                Ok(None) => {}
                Err(e) => warn!("{}:{}: skipping row: {}", path.display(), number + 1, e),
            }
        }
        Ok(rows)
    }
}

fn scan_rows(path: &Path, style: KeyStyle) -> Result<ResumeScan> {
    let contents = fs::read_to_string(path)?;
    let mut last_key = None;
    let mut objects = HashSet::new();
    let mut rows = 0;
    let mut skipped_lines = 0;

    for line in contents.lines() {
        if codec::is_comment(line) {
            continue;
        }
        match codec::parse_key(style, line) {
            Some(key) => {
                objects.insert(key.object_id());
                rows += 1;
                last_key = Some(key);
            }
            None => {
                skipped_lines += 1;
                debug!("Skipping unparsable ledger line: {}", line.trim());
            }
        }
    }

    let last_key = last_key.ok_or_else(|| Error::EmptyLedger(path.to_path_buf()))?;
    Ok(ResumeScan {
        last_key,
        distinct_objects: objects.len(),
        rows,
        skipped_lines,
    })
}

fn open_append(path: &Path) -> Result<File> {
    Ok(OpenOptions::new().append(true).open(path)?)
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn closed(path: &Path) -> Error {
    Error::InvalidState(format!("ledger {} is closed", path.display()))
}
