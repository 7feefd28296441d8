//! Configuration loading
//!
//! Settings come from an optional TOML file; command-line flags override
//! individual values afterwards. The file is located in this order:
//! 1. Command-line argument (highest priority)
//! 2. `GIG_CONFIG` environment variable
//! 3. `<platform config dir>/gig/config.toml` when it exists
//! 4. Built-in defaults

use crate::catalog::ObjectSource;
use crate::codec::DEFAULT_TEXT_EDIT_THRESHOLD;
use crate::fields::SessionKind;
use crate::metrics::DEFAULT_CONTAMINATION_CUTOFF;
use crate::selection::Selection;
use crate::session::SessionSettings;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "GIG_CONFIG";

/// Output file value meaning "per-kind default name in the data directory"
pub const DEFAULT_OUTPUT: &str = "DEFAULT";

/// Inspection settings loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct InspectConfig {
    /// Directory holding the object files (spectra or postage stamps)
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Ledger file name, relative to `directory`
    ///
    /// Default: `DEFAULT` (per-kind name)
    #[serde(default = "default_output_file")]
    pub output_file: String,

    /// Explicit object list; every object found in `directory` otherwise
    #[serde(default)]
    pub object_list: Option<PathBuf>,

    #[serde(default = "default_inspector_name")]
    pub inspector_name: String,

    /// Overwrite an existing ledger after confirmation
    #[serde(default)]
    pub clobber: bool,

    /// Remove earlier rows for the same key before appending
    #[serde(default)]
    pub check_for_duplicates: bool,

    /// Do not write records left at their defaults
    #[serde(default)]
    pub skip_empty: bool,

    /// Compare ledger contents with the object list when quitting
    #[serde(default)]
    pub output_check: bool,

    /// Open the FITS viewer whenever a new object is loaded
    #[serde(default)]
    pub open_fits_auto: bool,

    /// Directory uses the MAST (HLSP) file naming scheme
    #[serde(default)]
    pub mast_files: bool,

    /// Text columns longer than this are treated as placeholders
    #[serde(default = "default_text_edit_threshold")]
    pub text_edit_threshold: usize,

    #[serde(default = "default_contamination_cutoff")]
    pub contamination_cutoff: f64,

    /// Flag ledger to select redshift-inspection objects from
    #[serde(default)]
    pub gig_file: Option<PathBuf>,

    /// `emissionlineobjects` or `all`
    #[serde(default = "default_gig_selection")]
    pub gig_selection: String,

    /// Morphology object-info table (id cluster environment redshift mag_band mag mag_err)
    #[serde(default)]
    pub info_file: Option<PathBuf>,

    #[serde(default)]
    pub viewers: ViewerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// External viewer commands
#[derive(Debug, Clone, Deserialize)]
pub struct ViewerConfig {
    /// Image viewer command line; platform default when unset
    #[serde(default)]
    pub image_viewer: Option<String>,

    #[serde(default = "default_fits_viewer")]
    pub fits_viewer: String,

    /// Lock frames on physical coordinates (ds9 7 and later)
    #[serde(default = "default_true")]
    pub lock_frames: bool,

    /// Show images in the image viewer at all
    #[serde(default = "default_true")]
    pub open_images: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_output_file() -> String {
    DEFAULT_OUTPUT.to_string()
}

fn default_inspector_name() -> String {
    "John Doe".to_string()
}

fn default_text_edit_threshold() -> usize {
    DEFAULT_TEXT_EDIT_THRESHOLD
}

fn default_contamination_cutoff() -> f64 {
    DEFAULT_CONTAMINATION_CUTOFF
}

fn default_gig_selection() -> String {
    "emissionlineobjects".to_string()
}

fn default_fits_viewer() -> String {
    "ds9".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            directory: None,
            output_file: default_output_file(),
            object_list: None,
            inspector_name: default_inspector_name(),
            clobber: false,
            check_for_duplicates: false,
            skip_empty: false,
            output_check: false,
            open_fits_auto: false,
            mast_files: false,
            text_edit_threshold: default_text_edit_threshold(),
            contamination_cutoff: default_contamination_cutoff(),
            gig_file: None,
            gig_selection: default_gig_selection(),
            info_file: None,
            viewers: ViewerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            image_viewer: None,
            fits_viewer: default_fits_viewer(),
            lock_frames: true,
            open_images: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl InspectConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Data directory; must exist
    pub fn directory(&self) -> Result<&Path> {
        let directory = self
            .directory
            .as_deref()
            .ok_or_else(|| Error::Config("No data directory configured".to_string()))?;
        if !directory.is_dir() {
            return Err(Error::Config(format!(
                "The directory {} does not exist",
                directory.display()
            )));
        }
        Ok(directory)
    }

    /// Ledger location for `kind`
    pub fn output_path(&self, kind: SessionKind) -> Result<PathBuf> {
        let directory = self.directory()?;
        if self.output_file == DEFAULT_OUTPUT {
            Ok(directory.join(kind.default_output_name()))
        } else {
            Ok(directory.join(&self.output_file))
        }
    }

    /// Where the object list comes from; a flag ledger wins over a list file
    pub fn object_source(&self) -> ObjectSource {
        if let Some(path) = &self.gig_file {
            ObjectSource::FlagLedger {
                path: path.clone(),
                selection: Selection::from_name(&self.gig_selection),
            }
        } else if let Some(path) = &self.object_list {
            ObjectSource::ListFile(path.clone())
        } else {
            ObjectSource::Scan
        }
    }

    pub fn session_settings(&self, kind: SessionKind) -> Result<SessionSettings> {
        if self.contamination_cutoff < 0.0 {
            return Err(Error::Config(format!(
                "contamination_cutoff must not be negative (got {})",
                self.contamination_cutoff
            )));
        }
        Ok(SessionSettings {
            kind,
            output: self.output_path(kind)?,
            inspector: self.inspector_name.clone(),
            check_for_duplicates: self.check_for_duplicates,
            skip_empty: self.skip_empty,
            output_check: self.output_check,
            open_fits_auto: self.open_fits_auto,
            text_edit_threshold: self.text_edit_threshold,
            contamination_cutoff: self.contamination_cutoff,
        })
    }
}

/// Locate the config file, if any
pub fn config_file_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: platform config directory
    dirs::config_dir()
        .map(|d| d.join("gig").join("config.toml"))
        .filter(|path| path.exists())
}

/// Load the config file, or built-in defaults when there is none
pub fn load_config(cli_arg: Option<&Path>) -> Result<InspectConfig> {
    match config_file_path(cli_arg) {
        Some(path) => {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
            })?;
            tracing::info!("Loaded configuration from {}", path.display());
            InspectConfig::from_toml_str(&content)
        }
        None => Ok(InspectConfig::default()),
    }
}
