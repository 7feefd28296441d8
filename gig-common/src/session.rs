//! Inspection session orchestrator
//!
//! Owns the ledger, the cursor and the draft records of the current object.
//! State machine:
//!
//! ```text
//! Initializing -> Active -> Committing -> Active
//!                                     \-> Quitting -> Closed
//! ```
//!
//! Every navigation commits the current drafts exactly once (as a write or
//! as a skip) before the cursor moves.

use crate::catalog::{CatalogScanner, ObjectAssets};
use crate::codec;
use crate::cursor::{SessionCursor, Step};
use crate::display::DisplayDriver;
use crate::fields::{FieldKind, Section, SessionKind};
use crate::ledger::{Ledger, LedgerHeader, OpenMode, ResumeScan, VerifyReport};
use crate::metrics::{self, SpectrumSource};
use crate::record::Record;
use crate::types::{KeyStyle, ObjectKey, RecordKey};
use crate::{Error, Result};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Per-session behaviour switches
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub kind: SessionKind,
    /// Ledger path
    pub output: PathBuf,
    pub inspector: String,
    pub check_for_duplicates: bool,
    pub skip_empty: bool,
    pub output_check: bool,
    pub open_fits_auto: bool,
    pub text_edit_threshold: usize,
    pub contamination_cutoff: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Initializing,
    Active,
    Committing,
    Quitting,
    Closed,
}

/// Collaborators the session drives
pub struct Collaborators {
    pub scanner: Box<dyn CatalogScanner>,
    pub spectra: Box<dyn SpectrumSource>,
    pub display: Box<dyn DisplayDriver>,
}

/// Edit or navigation request from the front end
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Commit and move to the next object (quit after the last one)
    Next,
    /// Commit and move to the previous object
    Previous,
    /// Move on without writing
    Skip,
    /// Commit and end the session
    Quit,
    OpenFits,
    /// Flip a flag or advance a slider of sub-record `slot`
    Toggle { slot: usize, shortcut: char },
    SetSection {
        slot: usize,
        section: Section,
        text: String,
    },
    /// By-hand redshift for every sub-record; `None` clears it
    SetRedshift(Option<f64>),
    CycleRedshiftQuality,
    ToggleMultipleSolutions,
}

/// What the front end should do after a command
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Continue,
    Finished(SessionReport),
}

/// Counts for one commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommitSummary {
    pub written: usize,
    /// Left at defaults while skip-empty is on
    pub suppressed: usize,
    pub skipped: usize,
    pub duplicates_removed: usize,
}

/// Summary handed back when the session closes
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub ledger: PathBuf,
    pub rows_written: usize,
    /// Object list was exhausted before the session started
    pub resume_exhausted: bool,
    pub verify: Option<VerifyReport>,
}

pub struct InspectionSession {
    settings: SessionSettings,
    scanner: Box<dyn CatalogScanner>,
    spectra: Box<dyn SpectrumSource>,
    display: Box<dyn DisplayDriver>,
    ledger: Ledger,
    cursor: SessionCursor,
    state: SessionState,
    resume: Option<ResumeScan>,
    resume_exhausted: bool,
    assets: ObjectAssets,
    drafts: Vec<Record>,
    halpha_revealed: bool,
    rows_written: usize,
}

impl InspectionSession {
    /// Open the ledger, position the cursor and load the first object
    ///
    /// When the ledger already covers the whole list the session starts in
    /// `Quitting`; call [`finish`](Self::finish) to close it.
    pub fn start(
        settings: SessionSettings,
        objects: Vec<ObjectKey>,
        collaborators: Collaborators,
    ) -> Result<Self> {
        let mut state = SessionState::Initializing;
        debug!(?state, "Starting {:?} inspection", settings.kind);

        let mut cursor = SessionCursor::new(crate::catalog::normalize(objects))?;
        let header = LedgerHeader::new(settings.kind, settings.inspector.clone());
        let mode = if settings.output.is_file() {
            OpenMode::ResumeFindLast
        } else {
            OpenMode::CreateIfAbsent
        };
        let (ledger, resume) = Ledger::open(&settings.output, mode, &header)?;

        let mut resume_exhausted = false;
        if let Some(scan) = &resume {
            match cursor.resume_after(&scan.last_key.object_key()) {
                Ok(()) => {
                    info!(
                        "{} of {} objects still need to be inspected; found {} objects already inspected",
                        cursor.remaining(),
                        cursor.len(),
                        scan.distinct_objects
                    );
                }
                Err(Error::ResumeExhausted(last)) => {
                    info!(
                        "The last object in the output file ({}) is the last in the object list",
                        last
                    );
                    resume_exhausted = true;
                }
                Err(e) => return Err(e),
            }
        }

        let Collaborators {
            scanner,
            spectra,
            display,
        } = collaborators;

        let mut session = Self {
            settings,
            scanner,
            spectra,
            display,
            ledger,
            cursor,
            state,
            resume,
            resume_exhausted,
            assets: ObjectAssets::default(),
            drafts: Vec::new(),
            halpha_revealed: false,
            rows_written: 0,
        };

        if resume_exhausted {
            state = SessionState::Quitting;
        } else {
            session.load_current()?;
            state = SessionState::Active;
        }
        session.state = state;
        Ok(session)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn kind(&self) -> SessionKind {
        self.settings.kind
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn current(&self) -> &ObjectKey {
        self.cursor.current()
    }

    pub fn cursor(&self) -> &SessionCursor {
        &self.cursor
    }

    pub fn assets(&self) -> &ObjectAssets {
        &self.assets
    }

    /// Draft records of the current object, one per position angle
    pub fn drafts(&self) -> &[Record] {
        &self.drafts
    }

    pub fn resume_scan(&self) -> Option<&ResumeScan> {
        self.resume.as_ref()
    }

    pub fn halpha_revealed(&self) -> bool {
        self.halpha_revealed
    }

    /// Apply one front-end command
    pub fn dispatch(&mut self, command: Command) -> Result<Outcome> {
        if self.state == SessionState::Quitting {
            return self.finish().map(Outcome::Finished);
        }
        match command {
            Command::Next => self.advance_or_finish(false),
            Command::Skip => self.advance_or_finish(true),
            Command::Previous => self.retreat_to_previous(),
            Command::Quit => self.quit().map(Outcome::Finished),
            Command::OpenFits => {
                self.ensure_active()?;
                self.open_fits();
                Ok(Outcome::Continue)
            }
            Command::Toggle { slot, shortcut } => {
                self.toggle(slot, shortcut)?;
                Ok(Outcome::Continue)
            }
            Command::SetSection {
                slot,
                section,
                text,
            } => {
                self.ensure_active()?;
                match self.drafts.get_mut(slot) {
                    Some(draft) => draft.set_section(section, &text)?,
                    None => warn!("No second position angle for {}; ignoring", self.cursor.current()),
                }
                Ok(Outcome::Continue)
            }
            Command::SetRedshift(redshift) => {
                self.edit_by_hand(|by_hand| by_hand.redshift = redshift)?;
                Ok(Outcome::Continue)
            }
            Command::CycleRedshiftQuality => {
                self.edit_by_hand(|by_hand| by_hand.cycle_quality())?;
                Ok(Outcome::Continue)
            }
            Command::ToggleMultipleSolutions => {
                self.edit_by_hand(|by_hand| by_hand.multiple_solutions = !by_hand.multiple_solutions)?;
                Ok(Outcome::Continue)
            }
        }
    }

    fn toggle(&mut self, slot: usize, shortcut: char) -> Result<()> {
        self.ensure_active()?;
        let kind = self.settings.kind;
        let Some(index) = kind.field_index(shortcut) else {
            debug!("No column for shortcut '{}'", shortcut);
            return Ok(());
        };
        let field = kind.fields()[index];
        if matches!(field.kind, FieldKind::Disabled | FieldKind::Computed(_)) {
            debug!("Column {} is not editable", field.name);
            return Ok(());
        }
        let current = self.cursor.current().clone();
        let Some(draft) = self.drafts.get_mut(slot) else {
            warn!("No second position angle for {}; ignoring", current);
            return Ok(());
        };
        if field.group.map_or(false, |group| group.starts_disabled()) && !draft.halpha_enabled() {
            info!("H-alpha columns are enabled once the H-alpha maps are shown");
            return Ok(());
        }
        let value = draft.toggle(index)?;
        debug!("{} {} = {}", draft_label(&current, slot), field.name, value);
        Ok(())
    }

    fn edit_by_hand(&mut self, edit: impl Fn(&mut crate::record::ByHandRedshift)) -> Result<()> {
        self.ensure_active()?;
        if !self.settings.kind.has_by_hand_redshift() {
            warn!("By-hand redshift only applies to redshift inspections");
            return Ok(());
        }
        for draft in &mut self.drafts {
            if let Some(by_hand) = draft.by_hand.as_mut() {
                edit(by_hand);
            }
        }
        Ok(())
    }

    /// Write the current drafts
    ///
    /// With `skip` nothing is written. Otherwise each draft is normalized and
    /// validated; a validation failure leaves the drafts in place and writes
    /// nothing. Drafts at their defaults are suppressed under skip-empty.
    pub fn commit(&mut self, skip: bool) -> Result<CommitSummary> {
        self.ensure_active()?;
        self.state = SessionState::Committing;
        let result = self.commit_drafts(skip);
        self.state = SessionState::Active;
        let summary = result?;

        debug!(?summary, "Committed {}", self.cursor.current());
        self.rows_written += summary.written;
        self.reset_drafts()?;
        self.close_viewers();
        Ok(summary)
    }

    fn commit_drafts(&mut self, skip: bool) -> Result<CommitSummary> {
        let mut summary = CommitSummary::default();
        if skip {
            summary.skipped = self.drafts.len();
            return Ok(summary);
        }

        for draft in &mut self.drafts {
            draft.normalize();
        }
        for draft in &self.drafts {
            draft.validate()?;
        }

        // Every row is built before any is written, so a failure leaves no
        // half-committed object in the ledger
        let mut rows = Vec::with_capacity(self.drafts.len());
        for draft in &self.drafts {
            if self.settings.skip_empty && codec::is_empty(draft, self.settings.text_edit_threshold)
            {
                debug!("{} left at defaults; not written", draft.key);
                summary.suppressed += 1;
                continue;
            }

            let mut row = draft.clone();
            if self.settings.kind.computes_metrics() {
                if let RecordKey::Pa(id, pa) = row.key {
                    let coverage = metrics::spectral_coverage(self.spectra.as_ref(), id, pa)?;
                    let contamination = metrics::contamination_level(
                        self.spectra.as_ref(),
                        id,
                        pa,
                        self.settings.contamination_cutoff,
                    )?;
                    metrics::apply_metrics(&mut row, coverage, contamination);
                }
            }
            rows.push((row.key.clone(), codec::encode(&row)));
        }

        if self.settings.check_for_duplicates {
            for (key, _) in &rows {
                summary.duplicates_removed += self.ledger.purge_duplicates(key)?;
            }
        }
        for (_, line) in &rows {
            self.ledger.append(line)?;
            summary.written += 1;
        }
        Ok(summary)
    }

    /// Commit, then load the next object or finish after the last one
    ///
    /// For morphology objects with H-alpha maps, the first `Next` shows the
    /// maps and enables the H-alpha columns without committing.
    pub fn advance_or_finish(&mut self, skip: bool) -> Result<Outcome> {
        self.ensure_active()?;
        if !skip && self.reveal_halpha() {
            return Ok(Outcome::Continue);
        }

        self.commit(skip)?;
        match self.cursor.advance() {
            Step::Moved => {
                self.load_current()?;
                Ok(Outcome::Continue)
            }
            Step::EndOfList | Step::StartOfList => {
                info!(
                    "Object {} was the last in the list; quitting",
                    self.cursor.current()
                );
                self.state = SessionState::Quitting;
                self.finish().map(Outcome::Finished)
            }
        }
    }

    /// Commit, then load the previous object (or reload the first one)
    pub fn retreat_to_previous(&mut self) -> Result<Outcome> {
        self.ensure_active()?;
        self.commit(false)?;
        if self.cursor.retreat() == Step::StartOfList {
            info!("At first object of list");
        }
        self.load_current()?;
        Ok(Outcome::Continue)
    }

    /// Commit the current drafts and end the session
    pub fn quit(&mut self) -> Result<SessionReport> {
        self.ensure_active()?;
        self.commit(false)?;
        self.state = SessionState::Quitting;
        self.finish()
    }

    /// Stop without writing the current object
    pub fn abandon(&mut self) -> Result<SessionReport> {
        self.ensure_active()?;
        warn!("Leaving {} unrecorded", self.cursor.current());
        self.state = SessionState::Quitting;
        self.finish()
    }

    /// Close the ledger and viewers; verify the ledger when configured
    pub fn finish(&mut self) -> Result<SessionReport> {
        if self.state != SessionState::Quitting {
            return Err(Error::InvalidState(format!(
                "cannot finish a session in state {:?}",
                self.state
            )));
        }
        self.ledger.close()?;
        self.close_viewers();

        let verify = if self.settings.output_check {
            let max_pa = match self.settings.kind.key_style() {
                KeyStyle::PositionAngle => Some(self.max_position_angles()),
                KeyStyle::Cluster => None,
            };
            Some(self.ledger.verify(self.cursor.len(), max_pa))
        } else {
            None
        };

        self.state = SessionState::Closed;
        info!("Quit GiG successfully; {} rows written", self.rows_written);
        Ok(SessionReport {
            ledger: self.ledger.path().to_path_buf(),
            rows_written: self.rows_written,
            resume_exhausted: self.resume_exhausted,
            verify,
        })
    }

    fn max_position_angles(&self) -> usize {
        self.cursor
            .objects()
            .iter()
            .filter_map(|object| match self.scanner.assets_for(object) {
                Ok(assets) => Some(assets.position_angles.len()),
                Err(e) => {
                    warn!("OUTPUTCHECK: {}", e);
                    None
                }
            })
            .max()
            .unwrap_or(0)
    }

    fn ensure_active(&self) -> Result<()> {
        if self.state == SessionState::Active {
            Ok(())
        } else {
            Err(Error::InvalidState(format!(
                "session is {:?}, not Active",
                self.state
            )))
        }
    }

    /// Scan assets, build blank drafts and open the viewers for the current object
    fn load_current(&mut self) -> Result<()> {
        let object = self.cursor.current().clone();
        self.assets = self.scanner.assets_for(&object)?;
        self.halpha_revealed = false;
        self.reset_drafts()?;

        if let Err(e) = self.display.open_images(&object, &self.assets) {
            warn!("Could not open images for {}: {}", object, e);
        }
        if self.settings.open_fits_auto {
            self.open_fits();
        }
        info!(
            "Currently looking at object {} ({} of {}), PA(s) = {:?}",
            object,
            self.cursor.index() + 1,
            self.cursor.len(),
            self.assets
                .position_angles
                .iter()
                .map(|pa| pa.0)
                .collect::<Vec<_>>()
        );
        Ok(())
    }

    fn reset_drafts(&mut self) -> Result<()> {
        let object = self.cursor.current();
        let kind = self.settings.kind;
        let mut drafts: Vec<Record> = match kind.key_style() {
            KeyStyle::PositionAngle => {
                if self.assets.position_angles.len() > 2 {
                    warn!(
                        "{} has {} position angles; inspecting the first two",
                        object,
                        self.assets.position_angles.len()
                    );
                }
                self.assets
                    .position_angles
                    .iter()
                    .take(2)
                    .map(|pa| Record::blank(kind, RecordKey::Pa(object.id, *pa)))
                    .collect()
            }
            KeyStyle::Cluster => {
                let cluster = object.cluster.clone().ok_or_else(|| {
                    Error::Config(format!("object {} has no cluster", object))
                })?;
                vec![Record::blank(kind, RecordKey::Cluster(object.id, cluster))]
            }
        };
        if drafts.is_empty() {
            return Err(Error::AssetNotFound(format!(
                "no position angles found for object {}",
                object
            )));
        }
        if self.halpha_revealed {
            drafts.iter_mut().for_each(Record::enable_halpha_group);
        }
        self.drafts = drafts;
        Ok(())
    }

    /// Enable the H-alpha columns when maps exist and are not yet shown
    fn reveal_halpha(&mut self) -> bool {
        if self.settings.kind != SessionKind::Morphology
            || !self.assets.has_halpha_maps()
            || self.halpha_revealed
        {
            return false;
        }
        self.halpha_revealed = true;
        for draft in &mut self.drafts {
            draft.enable_halpha_group();
        }
        let object = self.cursor.current();
        info!(
            "Showing H-alpha maps for {}; H-alpha and process columns enabled",
            object
        );
        if let Err(e) = self.display.open_halpha(object, &self.assets) {
            warn!("Could not open H-alpha maps for {}: {}", object, e);
        }
        true
    }

    fn open_fits(&mut self) {
        let object = self.cursor.current();
        if let Err(e) = self.display.open_fits_overlay(object, &self.assets) {
            warn!("Could not open FITS files for {}: {}", object, e);
        }
    }

    fn close_viewers(&mut self) {
        if let Err(e) = self.display.close_viewers() {
            warn!("Error while closing viewer windows: {}", e);
        }
    }
}

fn draft_label(object: &ObjectKey, slot: usize) -> String {
    format!("{} [PA slot {}]", object, slot + 1)
}
