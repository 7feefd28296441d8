//! Ledger file tests: selection from a flag ledger and resume edge cases

mod helpers;

use gig_common::catalog::{resolve_object_list, ObjectSource};
use gig_common::fields::SessionKind;
use gig_common::ledger::{Ledger, LedgerHeader, OpenMode};
use gig_common::selection::Selection;
use gig_common::types::{KeyStyle, ObjectId, PositionAngle};
use gig_common::{Error, ObjectKey, RecordKey};
use helpers::{keys, FakeScanner};
use std::fs;
use tempfile::TempDir;

const FLAG_LEDGER: &str = "\
# Results from Visual Inspection initiated on 2015-03-02 10:11:12 
# Inspector: Test 
# ID PA ...
 00005 010 1 0 0.9 0.8 0 0 0.1 0.2 0 0 0 1 0 0 0 1 0 0 0 -1 0 0 0 0 0 0  #G102wave# 9050  #G141wave#   #C#  
 00012 010 0 0 0.9 0.8 0 0 0.1 0.2 0 0 0 1 0 0 0 1 0 0 0 -1 0 0 0 0 0 0  #G102wave#   #G141wave#   #C# nothing 
 00047 250 0 0 0.9 0.8 0 0 0.1 0.2 0 0 0 1 0 0 0 1 0 0 0 -1 0 0 0 0 0 1  #G102wave#   #G141wave#   #C#  
 00005 010 0 0 0.9 0.8 0 0 0.1 0.2 0 0 0 1 0 0 0 1 0 0 0 -1 0 0 0 0 0 0  #G102wave#   #G141wave#   #C# redone 
";

#[test]
fn test_flag_ledger_selection_uses_latest_rows() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("flags.txt");
    fs::write(&path, FLAG_LEDGER).unwrap();

    let rows = Ledger::latest_rows(&path, SessionKind::Flags).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].sections[2], "redone");

    // 00005 was re-inspected without flags; only the continuum object remains
    let scanner = FakeScanner::with_position_angles(&[5, 12, 47], &[10]);
    let source = ObjectSource::FlagLedger {
        path: path.clone(),
        selection: Selection::EmissionLineObjects,
    };
    let objects = resolve_object_list(&source, KeyStyle::PositionAngle, &scanner).unwrap();
    assert_eq!(objects, keys(&[47]));

    let source = ObjectSource::FlagLedger {
        path,
        selection: Selection::All,
    };
    let objects = resolve_object_list(&source, KeyStyle::PositionAngle, &scanner).unwrap();
    assert_eq!(objects, keys(&[5, 12, 47]));
}

#[test]
fn test_list_file_drops_objects_without_data() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("objects.txt");
    fs::write(&path, "47\n5\n999\n5\n").unwrap();

    let scanner = FakeScanner::with_position_angles(&[5, 47], &[10]);
    let objects = resolve_object_list(
        &ObjectSource::ListFile(path),
        KeyStyle::PositionAngle,
        &scanner,
    )
    .unwrap();
    assert_eq!(objects, vec![ObjectKey::new(5), ObjectKey::new(47)]);
}

#[test]
fn test_empty_object_list_is_config_error() {
    let scanner = FakeScanner::default();
    let result = resolve_object_list(&ObjectSource::Scan, KeyStyle::PositionAngle, &scanner);
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_resume_on_header_only_ledger_is_empty_ledger() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("flags.txt");
    let header = LedgerHeader::new(SessionKind::Flags, "Test");
    let (mut ledger, _) = Ledger::open(&path, OpenMode::CreateIfAbsent, &header).unwrap();
    ledger.close().unwrap();

    let result = Ledger::open(&path, OpenMode::ResumeFindLast, &header);
    assert!(matches!(result, Err(Error::EmptyLedger(_))));
}

#[test]
fn test_resume_skips_garbage_lines() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("flags.txt");
    fs::write(&path, format!("{}garbage line\n", FLAG_LEDGER)).unwrap();

    let header = LedgerHeader::new(SessionKind::Flags, "Test");
    let (_ledger, scan) = Ledger::open(&path, OpenMode::ResumeFindLast, &header).unwrap();
    let scan = scan.unwrap();
    assert_eq!(scan.rows, 4);
    assert_eq!(scan.distinct_objects, 3);
    assert_eq!(scan.skipped_lines, 1);
    assert_eq!(scan.last_key.object_key(), ObjectKey::new(5));
}

#[test]
fn test_purge_keeps_order_of_interleaved_rows() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("flags.txt");
    let other_pa = " 00005 250 0 1 0.9 0.8 0 0 0.1 0.2 0 0 0 1 0 0 0 1 0 0 0 -1 0 0 0 0 0 0  \
                    #G102wave#   #G141wave#   #C#  \n";
    fs::write(&path, format!("{}{}", FLAG_LEDGER, other_pa)).unwrap();

    let header = LedgerHeader::new(SessionKind::Flags, "Test");
    let (mut ledger, _) = Ledger::open(&path, OpenMode::AppendExisting, &header).unwrap();
    let removed = ledger
        .purge_duplicates(&RecordKey::Pa(ObjectId(5), PositionAngle(10)))
        .unwrap();
    assert_eq!(removed, 2);
    let redone = " 00005 010 0 0 0.9 0.8 0 0 0.1 0.2 0 0 0 1 0 0 0 1 0 0 0 -1 0 0 0 0 0 0  \
                  #G102wave#   #G141wave#   #C# third ";
    ledger.append(redone).unwrap();
    ledger.close().unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 7);
    assert!(lines[0].starts_with("# Results from Visual Inspection"));
    assert!(lines[3].starts_with(" 00012 010"));
    assert!(lines[4].starts_with(" 00047 250"));
    assert!(lines[5].starts_with(" 00005 250"));
    assert!(lines[6].starts_with(" 00005 010"));
    assert!(lines[6].ends_with("third "));
}
