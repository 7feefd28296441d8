//! GiG - GLASS inspection tool
//!
//! Walks an inspector through every object of a GLASS data directory,
//! opening the object's images and spectra and recording flags, redshifts
//! or morphologies in a plain-text ledger.

use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gig::console::{ClobberAnswer, Console};
use gig::objinfo::ObjectInfoTable;
use gig::scanner::{GlassScanner, StampScanner};
use gig::spectra::FitsSpectrumSource;
use gig::viewer::ViewerDisplay;
use gig_common::catalog::{self, CatalogScanner};
use gig_common::config::{self, InspectConfig};
use gig_common::ledger::Ledger;
use gig_common::metrics::{NullSpectra, SpectrumSource};
use gig_common::session::{Collaborators, InspectionSession, SessionState};
use gig_common::SessionKind;

/// Inspection to run
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Quality flags for grism spectra
    Flags,
    /// Redshift fit qualities and line detections
    Redshift,
    /// Morphologies from postage stamps
    Morphology,
}

impl From<Mode> for SessionKind {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Flags => SessionKind::Flags,
            Mode::Redshift => SessionKind::Redshift,
            Mode::Morphology => SessionKind::Morphology,
        }
    }
}

/// Command-line arguments for gig
#[derive(Parser, Debug)]
#[command(name = "gig")]
#[command(about = "Visual inspection of GLASS grism spectra and postage stamps")]
#[command(version)]
struct Args {
    /// Inspection to run
    #[arg(value_enum)]
    mode: Mode,

    /// Config file (TOML)
    #[arg(short, long, env = "GIG_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the spectra or postage stamps
    #[arg(short, long, env = "GIG_DIRECTORY")]
    directory: Option<PathBuf>,

    /// Ledger file name inside the directory (DEFAULT for the per-mode name)
    #[arg(short, long)]
    output: Option<String>,

    /// Object list file
    #[arg(long)]
    object_list: Option<PathBuf>,

    /// Inspector name written to the ledger header
    #[arg(short, long, env = "GIG_INSPECTOR")]
    inspector: Option<String>,

    /// Offer to overwrite an existing ledger
    #[arg(long)]
    clobber: bool,

    /// Remove earlier rows for an object before writing it again
    #[arg(long)]
    check_duplicates: bool,

    /// Do not write records left at their defaults
    #[arg(long)]
    skip_empty: bool,

    /// Compare the ledger with the object list when quitting
    #[arg(long)]
    output_check: bool,

    /// Open ds9 for every new object
    #[arg(long)]
    open_fits_auto: bool,

    /// Directory uses MAST file names
    #[arg(long)]
    mast: bool,

    /// Flag ledger to select redshift objects from
    #[arg(long)]
    gig_file: Option<PathBuf>,

    /// emissionlineobjects or all
    #[arg(long)]
    gig_selection: Option<String>,

    /// Morphology object-info table
    #[arg(long)]
    info_file: Option<PathBuf>,

    /// Do not start any viewer
    #[arg(long)]
    no_viewers: bool,
}

impl Args {
    /// Command-line values override the config file
    fn apply(&self, config: &mut InspectConfig) {
        if let Some(directory) = &self.directory {
            config.directory = Some(directory.clone());
        }
        if let Some(output) = &self.output {
            config.output_file = output.clone();
        }
        if let Some(list) = &self.object_list {
            config.object_list = Some(list.clone());
        }
        if let Some(inspector) = &self.inspector {
            config.inspector_name = inspector.clone();
        }
        if let Some(gig_file) = &self.gig_file {
            config.gig_file = Some(gig_file.clone());
        }
        if let Some(selection) = &self.gig_selection {
            config.gig_selection = selection.clone();
        }
        if let Some(info_file) = &self.info_file {
            config.info_file = Some(info_file.clone());
        }
        config.clobber |= self.clobber;
        config.check_for_duplicates |= self.check_duplicates;
        config.skip_empty |= self.skip_empty;
        config.output_check |= self.output_check;
        config.open_fits_auto |= self.open_fits_auto;
        config.mast_files |= self.mast;
        if self.no_viewers {
            config.viewers.open_images = false;
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = config::load_config(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply(&mut config);

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("gig={0},gig_common={0}", config.logging.level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    info!(
        "GiG v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let kind = SessionKind::from(args.mode);
    let settings = config.session_settings(kind)?;
    let directory = config.directory()?.to_path_buf();
    info!("Starting {:?} inspection of {}", kind, directory.display());

    let stdin = io::stdin();
    let mut console = Console::new(stdin.lock(), io::stdout());

    if config.clobber && settings.output.exists() {
        match console.confirm_clobber(&settings.output)? {
            ClobberAnswer::Overwrite => {
                Ledger::clobber(&settings.output)?;
            }
            ClobberAnswer::Append => info!("Appending to {}", settings.output.display()),
            ClobberAnswer::Abort => bail!("Aborted; {} left untouched", settings.output.display()),
        }
    }

    let (scanner, spectra): (Box<dyn CatalogScanner>, Box<dyn SpectrumSource>) = match kind {
        SessionKind::Flags | SessionKind::Redshift => {
            let scanner = GlassScanner::new(&directory, config.mast_files)?;
            let spectra: Box<dyn SpectrumSource> = if kind.computes_metrics() {
                Box::new(FitsSpectrumSource::new(scanner.clone()))
            } else {
                Box::new(NullSpectra)
            };
            (Box::new(scanner), spectra)
        }
        SessionKind::Morphology => (Box::new(StampScanner::new(&directory)?), Box::new(NullSpectra)),
    };

    let objects = catalog::resolve_object_list(&config.object_source(), kind.key_style(), scanner.as_ref())
        .context("Failed to build the object list")?;

    if kind == SessionKind::Morphology {
        match &config.info_file {
            Some(path) => {
                let table = ObjectInfoTable::load(path)
                    .with_context(|| format!("Failed to load object info from {}", path.display()))?;
                info!("Loaded object info for {} objects", table.len());
                console = console.with_info(table);
            }
            None => warn!("No object-info table given; object details will show as None"),
        }
    }

    let display = ViewerDisplay::new(config.viewers.clone(), std::env::current_dir()?);
    let collaborators = Collaborators {
        scanner,
        spectra,
        display: Box::new(display),
    };

    let mut session = InspectionSession::start(settings, objects, collaborators)
        .context("Failed to start the inspection session")?;

    let report = if session.state() == SessionState::Quitting {
        session.finish()?
    } else {
        console.run(&mut session)?
    };

    info!(
        "Wrote {} rows to {}",
        report.rows_written,
        report.ledger.display()
    );
    if let Some(verify) = &report.verify {
        if !verify.is_consistent() {
            warn!("Ledger does not cover the full object list: {:?}", verify);
        }
    }
    Ok(())
}
