//! Core conversion engine for jlcprep
//!
//! This module runs the BOM, Pick-and-Place and Gerber steps in order. Each
//! step is isolated: its error is classified and reported, and the next step
//! still runs.

use crate::{
    archive,
    bom,
    config::Config,
    error::{ConvertError, Result},
    pick_place,
    progress::ProgressTracker,
};
use anyhow::Context;
use std::path::PathBuf;
use tracing::{info, warn};

/// What a completed step produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSummary {
    pub step: &'static str,
    pub output: PathBuf,
    pub rows_written: usize,
    pub rows_skipped: usize,
    pub files_archived: usize,
}

/// Result of running one step
#[derive(Debug)]
pub enum StepOutcome {
    Completed(StepSummary),
    /// The step had no input; carries the warning shown to the user
    Skipped(String),
    Failed(anyhow::Error),
}

impl StepOutcome {
    /// Classify a step result; missing input is a skip, anything else a failure
    pub fn from_result(result: Result<StepSummary>) -> Self {
        match result {
            Ok(summary) => StepOutcome::Completed(summary),
            Err(e) => match e.downcast_ref::<ConvertError>() {
                Some(convert_error) if convert_error.is_skip() => {
                    StepOutcome::Skipped(convert_error.to_string())
                }
                _ => StepOutcome::Failed(e),
            },
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, StepOutcome::Completed(_))
    }
}

/// Statistics about a conversion run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionStats {
    pub steps_completed: usize,
    pub steps_skipped: usize,
    pub steps_failed: usize,
    pub rows_written: usize,
    pub rows_skipped: usize,
    pub files_archived: usize,
}

/// The main conversion engine
pub struct Converter {
    config: Config,
    progress_tracker: ProgressTracker,
    outcomes: Vec<(&'static str, StepOutcome)>,
}

impl Converter {
    /// Create a new converter with the given configuration
    pub fn new(config: Config) -> Self {
        let progress_enabled = config.show_progress;

        Self {
            config,
            progress_tracker: ProgressTracker::new(progress_enabled),
            outcomes: Vec::new(),
        }
    }

    /// Run every conversion step
    ///
    /// Only an invalid project directory is an error here; step failures are
    /// recorded in the outcomes.
    pub fn run(&mut self) -> Result<()> {
        let start = std::time::Instant::now();
        info!("Starting conversion of {}", self.config.project_path.display());

        self.config
            .validate()
            .context("Configuration validation failed")?;

        let layout = self.config.layout();

        self.run_step(bom::STEP_NAME, bom::convert_bom(&layout));
        self.run_step(pick_place::STEP_NAME, pick_place::convert_pick_place(&layout));
        let gerber = archive::package_gerbers(&layout, &self.progress_tracker);
        self.run_step(archive::STEP_NAME, gerber);

        info!("Conversion completed in {} ms", start.elapsed().as_millis());
        Ok(())
    }

    /// Record and report a step's outcome
    fn run_step(&mut self, step: &'static str, result: Result<StepSummary>) {
        let outcome = StepOutcome::from_result(result);

        match &outcome {
            StepOutcome::Completed(summary) => {
                info!("{} step completed: {:?}", step, summary);
                println!("✅ {} written: {}", step, summary.output.display());
            }
            StepOutcome::Skipped(reason) => {
                warn!("{} step skipped: {}", step, reason);
                println!("⚠️ {}", reason);
            }
            StepOutcome::Failed(e) => {
                warn!("{} step failed: {:#}", step, e);
                eprintln!("❌ {} step failed: {:#}", step, e);
            }
        }

        self.outcomes.push((step, outcome));
    }

    /// Outcomes of the steps run so far, in run order
    pub fn outcomes(&self) -> &[(&'static str, StepOutcome)] {
        &self.outcomes
    }

    /// Get conversion statistics
    pub fn get_conversion_stats(&self) -> ConversionStats {
        let mut stats = ConversionStats::default();

        for (_, outcome) in &self.outcomes {
            match outcome {
                StepOutcome::Completed(summary) => {
                    stats.steps_completed += 1;
                    stats.rows_written += summary.rows_written;
                    stats.rows_skipped += summary.rows_skipped;
                    stats.files_archived += summary.files_archived;
                }
                StepOutcome::Skipped(_) => stats.steps_skipped += 1,
                StepOutcome::Failed(_) => stats.steps_failed += 1,
            }
        }

        stats
    }
}
