//! Line-oriented console front end
//!
//! Each input line holds one or more commands:
//! - shortcut letters toggle columns (lower case: first PA, upper case: second)
//! - `next`, `prev`, `skip`, `quit`, `fits`, `show`, `help`
//! - `8` next, `7` previous, `0` open FITS files
//! - a section letter followed by text sets that section (`l` comment, `c`/`g`
//!   G102/G141 wavelengths for flags, `p` comment for morphology)
//! - redshift only: `q` cycles the by-hand quality, `t` toggles multiple
//!   solutions, `u <z>` sets the by-hand redshift

use crate::clusters::cluster_redshift;
use crate::objinfo::ObjectInfoTable;
use gig_common::codec;
use gig_common::fields::{FieldKind, Section, SessionKind};
use gig_common::session::{Command, InspectionSession, Outcome, SessionReport};
use gig_common::types::KeyStyle;
use gig_common::{Error, Result};
use std::io::{BufRead, Write};
use tracing::{debug, warn};

/// One parsed input line
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Commands(Vec<Command>),
    Show,
    Help,
    Empty,
    Invalid(String),
}

/// Operator's answer to the overwrite prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClobberAnswer {
    Overwrite,
    Append,
    Abort,
}

impl ClobberAnswer {
    pub fn parse(answer: &str) -> Self {
        match answer.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => ClobberAnswer::Overwrite,
            "n" | "no" => ClobberAnswer::Append,
            _ => ClobberAnswer::Abort,
        }
    }
}

/// Section set by a letter followed by text, if any
fn section_for(kind: SessionKind, letter: char) -> Option<Section> {
    match (kind, letter.to_ascii_lowercase()) {
        (SessionKind::Flags, 'l') | (SessionKind::Redshift, 'l') => Some(Section::Comment),
        (SessionKind::Flags, 'c') => Some(Section::G102Wave),
        (SessionKind::Flags, 'g') => Some(Section::G141Wave),
        (SessionKind::Morphology, 'p') => Some(Section::Comment),
        _ => None,
    }
}

fn slot_for(kind: SessionKind, letter: char) -> usize {
    match kind.key_style() {
        KeyStyle::Cluster => 0,
        KeyStyle::PositionAngle => usize::from(letter.is_ascii_uppercase()),
    }
}

/// Parse one console line for a session of `kind`
pub fn parse_input(kind: SessionKind, line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }

    match line.to_ascii_lowercase().as_str() {
        "next" | "8" => return Input::Commands(vec![Command::Next]),
        "prev" | "previous" | "7" => return Input::Commands(vec![Command::Previous]),
        "skip" => return Input::Commands(vec![Command::Skip]),
        "quit" | "exit" => return Input::Commands(vec![Command::Quit]),
        "fits" | "0" => return Input::Commands(vec![Command::OpenFits]),
        "show" => return Input::Show,
        "help" | "?" => return Input::Help,
        _ => {}
    }

    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    // Letter followed by free text
    let mut letters = head.chars();
    if let (Some(letter), None) = (letters.next(), letters.next()) {
        if let Some(section) = section_for(kind, letter) {
            return Input::Commands(vec![Command::SetSection {
                slot: slot_for(kind, letter),
                section,
                text: rest.to_string(),
            }]);
        }
        if kind == SessionKind::Redshift && letter == 'u' {
            let redshift = match rest.parse::<f64>() {
                Ok(z) => Some(z),
                Err(_) => {
                    warn!("Invalid by-hand redshift '{}'; storing -99", rest);
                    None
                }
            };
            return Input::Commands(vec![Command::SetRedshift(redshift)]);
        }
    }

    let mut commands = Vec::new();
    for letter in line.chars().filter(|c| !c.is_whitespace()) {
        if !letter.is_ascii_alphabetic() {
            return Input::Invalid(format!("'{}' is not a shortcut", letter));
        }
        let command = match (kind, letter) {
            (SessionKind::Redshift, 'q') => Command::CycleRedshiftQuality,
            (SessionKind::Redshift, 't') => Command::ToggleMultipleSolutions,
            _ if kind.field_index(letter).is_some() => Command::Toggle {
                slot: slot_for(kind, letter),
                shortcut: letter,
            },
            _ => return Input::Invalid(format!("'{}' is not a shortcut", letter)),
        };
        commands.push(command);
    }
    Input::Commands(commands)
}

/// Shortcut table for `help`
pub fn help_text(kind: SessionKind) -> String {
    let mut text = String::from("Shortcuts (lower case: first PA, upper case: second PA)\n");
    for field in kind.fields() {
        let note = match field.kind {
            FieldKind::Flag => "",
            FieldKind::Slider { .. } => " (cycles 0-4)",
            FieldKind::Disabled => " (unused)",
            FieldKind::Computed(_) => " (computed)",
        };
        text.push_str(&format!("  {}  {}{}\n", field.shortcut, field.name, note));
    }
    match kind {
        SessionKind::Flags => {
            text.push_str("  l <text>  comment   c <waves>  G102 wavelengths   g <waves>  G141 wavelengths\n")
        }
        SessionKind::Redshift => text.push_str(
            "  l <text>  comment   q  by-hand quality   t  multiple solutions   u <z>  by-hand redshift\n",
        ),
        SessionKind::Morphology => text.push_str("  p <text>  comment\n"),
    }
    text.push_str("  next (8)  prev (7)  skip  fits (0)  show  quit\n");
    text
}

/// Status line for the object under the cursor
pub fn info_line(session: &InspectionSession, info: Option<&ObjectInfoTable>) -> String {
    let object = session.current();
    match session.kind().key_style() {
        KeyStyle::Cluster => {
            let details = info
                .and_then(|table| table.get(object))
                .map(|row| row.to_string())
                .unwrap_or_else(|| "Environment = None, redshift = None, mag = None".to_string());
            format!("--- Currently looking at object {}:: {} ---", object, details)
        }
        KeyStyle::PositionAngle => {
            let assets = session.assets();
            let file = assets
                .images
                .first()
                .and_then(|path| path.file_name())
                .and_then(|name| name.to_str())
                .unwrap_or("");
            let (cluster, redshift) = cluster_redshift(file);
            let angles: Vec<String> = assets
                .position_angles
                .iter()
                .map(|pa| pa.0.to_string())
                .collect();
            format!(
                "--- Currently looking at object {}, PA(s) = [{}]  ({} redshift = {}) ---",
                object.id.0,
                angles.join(", "),
                cluster,
                redshift
            )
        }
    }
}

/// Interactive console driving one session
pub struct Console<R, W> {
    input: R,
    output: W,
    info: Option<ObjectInfoTable>,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            info: None,
        }
    }

    pub fn with_info(mut self, info: ObjectInfoTable) -> Self {
        self.info = Some(info);
        self
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    /// Ask whether an existing ledger should be overwritten
    pub fn confirm_clobber(&mut self, path: &std::path::Path) -> Result<ClobberAnswer> {
        write!(
            self.output,
            "The file {} already exists; overwrite it? (y/n, anything else aborts) ",
            path.display()
        )?;
        self.output.flush()?;
        let answer = self.read_line()?.unwrap_or_default();
        Ok(ClobberAnswer::parse(&answer))
    }

    /// Read and apply commands until the session finishes
    ///
    /// End of input quits, committing the current object.
    pub fn run(&mut self, session: &mut InspectionSession) -> Result<SessionReport> {
        let mut shown = None;
        loop {
            if shown.as_ref() != Some(session.current()) {
                writeln!(self.output, "{}", info_line(session, self.info.as_ref()))?;
                shown = Some(session.current().clone());
            }
            write!(self.output, "> ")?;
            self.output.flush()?;

            let commands = match self.read_line()? {
                None => return self.quit_at_end_of_input(session),
                Some(line) => match parse_input(session.kind(), &line) {
                    Input::Commands(commands) => commands,
                    Input::Empty => continue,
                    Input::Show => {
                        for draft in session.drafts() {
                            writeln!(self.output, "{}", codec::encode(draft))?;
                        }
                        continue;
                    }
                    Input::Help => {
                        write!(self.output, "{}", help_text(session.kind()))?;
                        continue;
                    }
                    Input::Invalid(message) => {
                        writeln!(self.output, "{}; type 'help' for shortcuts", message)?;
                        continue;
                    }
                },
            };

            for command in commands {
                debug!(?command, "Dispatching");
                match session.dispatch(command) {
                    Ok(Outcome::Continue) => {}
                    Ok(Outcome::Finished(report)) => return Ok(report),
                    Err(Error::IncompleteRecord(message)) => {
                        warn!("{}", message);
                        writeln!(self.output, "WARNING: {}", message)?;
                        break;
                    }
                    Err(e) => return Err(e),
                }
            }
        }
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    /// Quit when input runs out; an incomplete current object is dropped
    fn quit_at_end_of_input(&mut self, session: &mut InspectionSession) -> Result<SessionReport> {
        match session.dispatch(Command::Quit) {
            Ok(Outcome::Finished(report)) => Ok(report),
            Ok(Outcome::Continue) => session.finish(),
            Err(Error::IncompleteRecord(message)) => {
                writeln!(self.output, "WARNING: {}", message)?;
                session.abandon()
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toggle(slot: usize, shortcut: char) -> Command {
        Command::Toggle { slot, shortcut }
    }

    #[test]
    fn test_words_and_digits() {
        for (line, command) in [
            ("next", Command::Next),
            ("8", Command::Next),
            (" prev ", Command::Previous),
            ("7", Command::Previous),
            ("skip", Command::Skip),
            ("QUIT", Command::Quit),
            ("0", Command::OpenFits),
        ] {
            assert_eq!(
                parse_input(SessionKind::Flags, line),
                Input::Commands(vec![command])
            );
        }
        assert_eq!(parse_input(SessionKind::Flags, "   "), Input::Empty);
        assert_eq!(parse_input(SessionKind::Flags, "help"), Input::Help);
    }

    #[test]
    fn test_letters_toggle_by_case() {
        assert_eq!(
            parse_input(SessionKind::Flags, "aB z"),
            Input::Commands(vec![toggle(0, 'a'), toggle(1, 'B'), toggle(0, 'z')])
        );
        assert!(matches!(
            parse_input(SessionKind::Flags, "a1"),
            Input::Invalid(_)
        ));
    }

    #[test]
    fn test_sections_with_text() {
        assert_eq!(
            parse_input(SessionKind::Flags, "C 9050 9800"),
            Input::Commands(vec![Command::SetSection {
                slot: 1,
                section: Section::G102Wave,
                text: "9050 9800".to_string(),
            }])
        );
        assert_eq!(
            parse_input(SessionKind::Morphology, "P tidal tail"),
            Input::Commands(vec![Command::SetSection {
                slot: 0,
                section: Section::Comment,
                text: "tidal tail".to_string(),
            }])
        );
    }

    #[test]
    fn test_redshift_commands() {
        assert_eq!(
            parse_input(SessionKind::Redshift, "u 1.342"),
            Input::Commands(vec![Command::SetRedshift(Some(1.342))])
        );
        assert_eq!(
            parse_input(SessionKind::Redshift, "u abc"),
            Input::Commands(vec![Command::SetRedshift(None)])
        );
        assert_eq!(
            parse_input(SessionKind::Redshift, "aqt"),
            Input::Commands(vec![
                toggle(0, 'a'),
                Command::CycleRedshiftQuality,
                Command::ToggleMultipleSolutions
            ])
        );
        // Redshift records have no column behind 'z'
        assert!(matches!(
            parse_input(SessionKind::Redshift, "z"),
            Input::Invalid(_)
        ));
    }

    #[test]
    fn test_morphology_uppercase_maps_to_single_record() {
        assert_eq!(
            parse_input(SessionKind::Morphology, "A"),
            Input::Commands(vec![toggle(0, 'A')])
        );
    }

    #[test]
    fn test_clobber_answers() {
        assert_eq!(ClobberAnswer::parse("Yes\n"), ClobberAnswer::Overwrite);
        assert_eq!(ClobberAnswer::parse("n"), ClobberAnswer::Append);
        assert_eq!(ClobberAnswer::parse("maybe"), ClobberAnswer::Abort);
    }

    #[test]
    fn test_help_lists_every_field() {
        let text = help_text(SessionKind::Redshift);
        assert!(text.contains("a  G102_zfit_quality (cycles 0-4)"));
        assert!(text.contains("u <z>"));
    }
}
