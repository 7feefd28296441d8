//! Shared fixtures for gig integration tests
//!
//! Builds spectra and stamp directories with minimal FITS products and
//! runs the console over scripted input.

#![allow(dead_code)]

use fitsio::images::{ImageDescription, ImageType};
use fitsio::tables::{ColumnDataType, ColumnDescription};
use fitsio::FitsFile;
use gig::console::Console;
use gig::scanner::{GlassScanner, StampScanner};
use gig::spectra::FitsSpectrumSource;
use gig_common::catalog::{self, CatalogScanner, ObjectSource};
use gig_common::display::NullDisplay;
use gig_common::metrics::{NullSpectra, DEFAULT_CONTAMINATION_CUTOFF};
use gig_common::session::{Collaborators, InspectionSession, SessionReport, SessionSettings};
use gig_common::SessionKind;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// 1-D spectrum whose trace covers three of four pixels
pub fn write_one_d_fits(path: &Path) {
    let mut fptr = FitsFile::create(path).open().unwrap();
    let column = ColumnDescription::new("etrace")
        .with_type(ColumnDataType::Float)
        .create()
        .unwrap();
    let hdu = fptr.create_table("SPEC".to_string(), &[column]).unwrap();
    hdu.write_col(&mut fptr, "etrace", &[1.0f32, 1.0, 0.0, 1.0]).unwrap();
}

/// 2-D spectrum with one of four model pixels contaminated
pub fn write_two_d_fits(path: &Path) {
    let mut fptr = FitsFile::create(path).open().unwrap();
    let description = ImageDescription {
        data_type: ImageType::Float,
        dimensions: &[4],
    };
    let model = fptr.create_image("MODEL".to_string(), &description).unwrap();
    model.write_image(&mut fptr, &[1.0f32, 1.0, 1.0, 1.0]).unwrap();
    let contam = fptr.create_image("CONTAM".to_string(), &description).unwrap();
    contam.write_image(&mut fptr, &[0.0f32, 0.0, 0.0, 1.0]).unwrap();
}

pub fn touch(dir: &Path, names: &[&str]) {
    for name in names {
        fs::write(dir.join(name), b"").unwrap();
    }
}

/// Spectra directory: object 5 with G102 FITS products at PA 010, object 12
/// with previews only
pub fn glass_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    touch(
        dir.path(),
        &[
            "A2744-010-G102_00005.G102.1D.png",
            "A2744-010-G102_00005.G102.2D.png",
            "A2744-010-G102_00012.G102.1D.png",
            "A2744-010-G102_00012.G102.2D.png",
        ],
    );
    write_one_d_fits(&dir.path().join("A2744-010-G102_00005.G102.1D.fits"));
    write_two_d_fits(&dir.path().join("A2744-010-G102_00005.G102.2D.fits"));
    dir
}

/// Stamp directory: A370 object 7 without H-alpha maps
pub fn stamp_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    touch(
        dir.path(),
        &["A370_00007_rgb.png", "A370_00007_f140w.png", "A370_00007_f140w.fits"],
    );
    dir
}

pub fn settings(kind: SessionKind, output: PathBuf) -> SessionSettings {
    SessionSettings {
        kind,
        output,
        inspector: "Test Inspector".to_string(),
        check_for_duplicates: false,
        skip_empty: false,
        output_check: false,
        open_fits_auto: false,
        text_edit_threshold: 10,
        contamination_cutoff: DEFAULT_CONTAMINATION_CUTOFF,
    }
}

/// Session over every object of a spectra directory
pub fn glass_session(dir: &Path, kind: SessionKind) -> InspectionSession {
    let scanner = GlassScanner::new(dir, false).unwrap();
    let objects =
        catalog::resolve_object_list(&ObjectSource::Scan, kind.key_style(), &scanner).unwrap();
    let collaborators = Collaborators {
        spectra: Box::new(FitsSpectrumSource::new(scanner.clone())),
        scanner: Box::new(scanner),
        display: Box::new(NullDisplay),
    };
    InspectionSession::start(settings(kind, dir.join("ledger.txt")), objects, collaborators).unwrap()
}

/// Session over every object of a stamp directory
pub fn stamp_session(dir: &Path) -> InspectionSession {
    let scanner = StampScanner::new(dir).unwrap();
    let objects = catalog::resolve_object_list(
        &ObjectSource::Scan,
        SessionKind::Morphology.key_style(),
        &scanner,
    )
    .unwrap();
    let collaborators = Collaborators {
        scanner: Box::new(scanner) as Box<dyn CatalogScanner>,
        spectra: Box::new(NullSpectra),
        display: Box::new(NullDisplay),
    };
    InspectionSession::start(
        settings(SessionKind::Morphology, dir.join("ledger.txt")),
        objects,
        collaborators,
    )
    .unwrap()
}

/// Feed `input` to a console; returns the report and everything printed
pub fn run_console(session: &mut InspectionSession, input: &str) -> (SessionReport, String) {
    let mut console = Console::new(Cursor::new(input.to_string()), Vec::new());
    let report = console.run(session).unwrap();
    let output = String::from_utf8(console.into_output()).unwrap();
    (report, output)
}

pub fn data_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|line| !line.trim_start().starts_with('#') && !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}
