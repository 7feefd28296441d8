//! Unit tests for configuration loading
//!
//! Tests manipulating GIG_CONFIG are marked #[serial] so they do not race.

use gig_common::catalog::ObjectSource;
use gig_common::config::{config_file_path, load_config, InspectConfig, CONFIG_ENV_VAR};
use gig_common::selection::Selection;
use gig_common::{Error, SessionKind};
use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_defaults_when_fields_missing() {
    let config = InspectConfig::from_toml_str("").unwrap();
    assert_eq!(config.output_file, "DEFAULT");
    assert_eq!(config.inspector_name, "John Doe");
    assert_eq!(config.text_edit_threshold, 10);
    assert_eq!(config.contamination_cutoff, 1e-3);
    assert_eq!(config.viewers.fits_viewer, "ds9");
    assert!(config.viewers.lock_frames);
    assert_eq!(config.logging.level, "info");
    assert!(!config.skip_empty);
}

#[test]
fn test_parse_full_config() {
    let toml = r#"
        directory = "/data/glass"
        output_file = "flags_kt.txt"
        inspector_name = "K. T."
        check_for_duplicates = true
        skip_empty = true
        gig_file = "/data/glass/flags.txt"
        gig_selection = "all"

        [viewers]
        image_viewer = "eog"
        lock_frames = false

        [logging]
        level = "debug"
    "#;
    let config = InspectConfig::from_toml_str(toml).unwrap();
    assert_eq!(config.inspector_name, "K. T.");
    assert!(config.check_for_duplicates);
    assert_eq!(config.viewers.image_viewer.as_deref(), Some("eog"));
    assert!(!config.viewers.lock_frames);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(
        config.object_source(),
        ObjectSource::FlagLedger {
            path: "/data/glass/flags.txt".into(),
            selection: Selection::All,
        }
    );
}

#[test]
fn test_invalid_toml_is_config_error() {
    assert!(matches!(
        InspectConfig::from_toml_str("skip_empty = maybe"),
        Err(Error::Config(_))
    ));
}

#[test]
fn test_output_path_uses_kind_default_name() {
    let dir = TempDir::new().unwrap();
    let config = InspectConfig {
        directory: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    assert_eq!(
        config.output_path(SessionKind::Redshift).unwrap(),
        dir.path().join("visualinspection_z_defaultoutput.txt")
    );

    let config = InspectConfig {
        output_file: "mine.txt".to_string(),
        ..config
    };
    assert_eq!(
        config.output_path(SessionKind::Flags).unwrap(),
        dir.path().join("mine.txt")
    );
}

#[test]
fn test_missing_directory_is_rejected() {
    let config = InspectConfig {
        directory: Some("/definitely/not/a/glass/dir".into()),
        ..Default::default()
    };
    assert!(matches!(config.directory(), Err(Error::Config(_))));
    assert!(matches!(
        InspectConfig::default().directory(),
        Err(Error::Config(_))
    ));
}

#[test]
fn test_negative_cutoff_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = InspectConfig {
        directory: Some(dir.path().to_path_buf()),
        contamination_cutoff: -1.0,
        ..Default::default()
    };
    assert!(matches!(
        config.session_settings(SessionKind::Flags),
        Err(Error::Config(_))
    ));
}

#[test]
fn test_object_list_source_when_no_flag_ledger() {
    let config = InspectConfig {
        object_list: Some("objects.txt".into()),
        ..Default::default()
    };
    assert_eq!(
        config.object_source(),
        ObjectSource::ListFile("objects.txt".into())
    );
    assert_eq!(InspectConfig::default().object_source(), ObjectSource::Scan);
}

#[test]
#[serial]
fn test_cli_path_wins_over_env_var() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");
    let path = config_file_path(Some(std::path::Path::new("/tmp/from-cli.toml")));
    assert_eq!(path, Some("/tmp/from-cli.toml".into()));

    let path = config_file_path(None);
    assert_eq!(path, Some("/tmp/from-env.toml".into()));
    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_load_config_reads_env_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gig.toml");
    fs::write(&path, "inspector_name = \"From Env\"\n").unwrap();

    env::set_var(CONFIG_ENV_VAR, &path);
    let config = load_config(None).unwrap();
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(config.inspector_name, "From Env");
}

#[test]
#[serial]
fn test_load_config_unreadable_file_is_error() {
    env::remove_var(CONFIG_ENV_VAR);
    let result = load_config(Some(std::path::Path::new("/nonexistent/gig.toml")));
    assert!(matches!(result, Err(Error::Config(_))));
}
