//! Configuration management for jlcprep
//!
//! This module handles CLI argument parsing, the fixed project folder layout
//! and application settings.

use anyhow::{anyhow, Context, Result};
use clap::builder::styling;
use clap::error::ErrorKind;
use clap::{value_parser, Arg, ColorChoice, Command};
use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::info;

/// Build the CLI command
pub fn build_cli() -> Command {
    let styles = styling::Styles::styled()
        .header(styling::AnsiColor::Green.on_default() | styling::Effects::BOLD)
        .usage(styling::AnsiColor::Green.on_default() | styling::Effects::BOLD)
        .literal(styling::AnsiColor::Blue.on_default() | styling::Effects::BOLD)
        .placeholder(styling::AnsiColor::Cyan.on_default());

    Command::new("jlcprep")
        .about("jlcprep - Convert BOM, Pick-and-Place and Gerber exports for JLCPCB assembly")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("project_path")
                .help("Project export directory containing BOM, Pick Place, Gerber and NC Drill")
                .value_name("PROJECT_PATH")
                .value_parser(value_parser!(PathBuf))
                .required(true),
        )
}

/// Folder and file names of a project export and of the generated output
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub const BOM_DIR: &'static str = "BOM";
    pub const PICK_PLACE_DIR: &'static str = "Pick Place";
    pub const GERBER_DIR: &'static str = "Gerber";
    pub const DRILL_DIR: &'static str = "NC Drill";
    pub const OUTPUT_DIR: &'static str = "JLCPCB";

    pub const BOM_OUTPUT: &'static str = "BOM.csv";
    pub const PICK_PLACE_OUTPUT: &'static str = "PickAndPlace.csv";
    pub const GERBER_OUTPUT: &'static str = "jlcpcb_gerber.zip";

    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn bom_dir(&self) -> PathBuf {
        self.root.join(Self::BOM_DIR)
    }

    pub fn pick_place_dir(&self) -> PathBuf {
        self.root.join(Self::PICK_PLACE_DIR)
    }

    /// Archive source folders in processing order; later folders win name collisions
    pub fn archive_dirs(&self) -> [PathBuf; 2] {
        [
            self.root.join(Self::GERBER_DIR),
            self.root.join(Self::DRILL_DIR),
        ]
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join(Self::OUTPUT_DIR)
    }

    pub fn bom_output(&self) -> PathBuf {
        self.output_dir().join(Self::BOM_OUTPUT)
    }

    pub fn pick_place_output(&self) -> PathBuf {
        self.output_dir().join(Self::PICK_PLACE_OUTPUT)
    }

    pub fn gerber_output(&self) -> PathBuf {
        self.output_dir().join(Self::GERBER_OUTPUT)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Project export directory
    pub project_path: PathBuf,

    /// Show progress indicators
    pub show_progress: bool,
}

impl Config {
    /// Create a configuration for a project directory without touching the CLI
    pub fn new<P: AsRef<Path>>(project_path: P) -> Self {
        Self {
            project_path: project_path.as_ref().to_path_buf(),
            show_progress: false,
        }
    }

    /// Parse process arguments and initialize logging
    pub fn from_args() -> Result<Self> {
        let config = Self::from_arg_list(std::env::args_os())?;

        // Set up tracing with environment variable support
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("off"));

        tracing_subscriber::fmt().with_env_filter(env_filter).init();

        info!("Configuration: {:?}", config);
        Ok(config)
    }

    /// Parse an explicit argument list (program name first)
    pub fn from_arg_list<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = match build_cli().try_get_matches_from(args) {
            Ok(matches) => matches,
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                e.exit()
            }
            Err(e) => return Err(anyhow!("{}", e.render())),
        };

        let project_path = matches
            .get_one::<PathBuf>("project_path")
            .cloned()
            .ok_or_else(|| anyhow!("Please provide project path"))?;

        Ok(Config {
            project_path,
            show_progress: std::io::stderr().is_terminal(),
        })
    }

    /// Folder layout rooted at the project path
    pub fn layout(&self) -> ProjectLayout {
        ProjectLayout::new(&self.project_path)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.layout().output_dir()
    }

    /// Validate configuration settings and prepare the output directory
    pub fn validate(&self) -> Result<()> {
        if !self.project_path.is_dir() {
            return Err(anyhow!(
                "Project path is not a directory: {}",
                self.project_path.display()
            ));
        }

        let output_dir = self.output_dir();
        if !output_dir.exists() {
            std::fs::create_dir_all(&output_dir).with_context(|| {
                format!("Failed to create output directory: {}", output_dir.display())
            })?;
            info!("Created output directory: {}", output_dir.display());
        }

        info!("Configuration validation completed successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = ProjectLayout::new("/tmp/board");

        assert_eq!(layout.bom_dir(), PathBuf::from("/tmp/board/BOM"));
        assert_eq!(
            layout.pick_place_dir(),
            PathBuf::from("/tmp/board/Pick Place")
        );
        assert_eq!(
            layout.gerber_output(),
            PathBuf::from("/tmp/board/JLCPCB/jlcpcb_gerber.zip")
        );
        assert_eq!(
            layout.archive_dirs(),
            [
                PathBuf::from("/tmp/board/Gerber"),
                PathBuf::from("/tmp/board/NC Drill")
            ]
        );
    }

    #[test]
    fn test_project_path_argument() {
        let config = Config::from_arg_list(["jlcprep", "/tmp/board"]).unwrap();
        assert_eq!(config.project_path, PathBuf::from("/tmp/board"));
        assert_eq!(config.output_dir(), PathBuf::from("/tmp/board/JLCPCB"));
    }

    #[test]
    fn test_missing_project_path_is_error() {
        assert!(Config::from_arg_list(["jlcprep"]).is_err());
    }

    #[test]
    fn test_extra_arguments_are_error() {
        assert!(Config::from_arg_list(["jlcprep", "a", "b"]).is_err());
        assert!(Config::from_arg_list(["jlcprep", "a", "--zip"]).is_err());
    }

    #[test]
    fn test_validate_creates_output_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = Config::new(temp.path());

        config.validate().unwrap();
        assert!(temp.path().join("JLCPCB").is_dir());

        // Idempotent
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_missing_project() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = Config::new(temp.path().join("missing"));

        assert!(config.validate().is_err());
        assert!(!temp.path().join("missing").exists());
    }
}
