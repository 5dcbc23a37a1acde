//! Gerber and drill archive packaging
//!
//! Collects the flat contents of the Gerber and NC Drill folders and writes
//! them into a single ZIP file for upload.

use crate::{
    config::ProjectLayout,
    converter::StepSummary,
    error::{Result, ResultExt},
    progress::ProgressTracker,
};
use anyhow::Context;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const STEP_NAME: &str = "Gerber";

/// Map archive entry names to source files across `folders`
///
/// Folders are read in order and only their direct regular files are taken.
/// A name already collected from an earlier folder is replaced by the later
/// one. Absent folders contribute nothing.
pub fn collect_entries<P: AsRef<Path>>(folders: &[P]) -> Result<BTreeMap<String, PathBuf>> {
    let mut entries = BTreeMap::new();

    for folder in folders {
        let folder = folder.as_ref();
        if !folder.is_dir() {
            debug!("Skipping absent folder: {}", folder.display());
            continue;
        }

        for entry in fs::read_dir(folder).with_path_context("read directory", folder)? {
            let path = entry.with_path_context("read directory entry", folder)?.path();
            if !path.is_file() {
                continue;
            }

            let name = path
                .file_name()
                .and_then(|name| name.to_str())
                .with_context(|| format!("Invalid filename: {}", path.display()))?
                .to_string();

            if let Some(previous) = entries.insert(name.clone(), path) {
                debug!(
                    "Archive entry {} from {} replaced by {}",
                    name,
                    previous.display(),
                    folder.display()
                );
            }
        }
    }

    Ok(entries)
}

/// Archive creator for building output ZIP files
pub struct ArchiveCreator;

impl ArchiveCreator {
    /// Create a ZIP file with one entry per name, in name order
    pub fn create_zip(
        entries: &BTreeMap<String, PathBuf>,
        output_path: &Path,
        progress: &ProgressTracker,
    ) -> Result<()> {
        info!("Creating ZIP archive: {}", output_path.display());

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).with_path_context("create output directory", parent)?;
        }

        let file =
            fs::File::create(output_path).with_path_context("create ZIP file", output_path)?;

        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .unix_permissions(0o644);

        let pb = progress.create_file_progress(entries.len(), "Creating archive");

        for (name, source) in entries {
            let content = match fs::read(source).with_path_context("read file for ZIP", source) {
                Ok(content) => content,
                Err(e) => {
                    ProgressTracker::finish_with_error(pb, "Archive creation failed");
                    return Err(e);
                }
            };

            zip.start_file(name.as_str(), options)
                .context("Failed to start ZIP file entry")?;
            zip.write_all(&content)
                .context("Failed to write file content to ZIP")?;

            ProgressTracker::update_progress(&pb, 1, Some(name.as_str()));
        }

        zip.finish().context("Failed to finalize ZIP file")?;
        ProgressTracker::finish_progress(pb, "ZIP file created successfully");

        info!("ZIP file created successfully: {}", output_path.display());
        Ok(())
    }
}

/// Zip the project's Gerber and NC Drill folders into `JLCPCB/jlcpcb_gerber.zip`
pub fn package_gerbers(layout: &ProjectLayout, progress: &ProgressTracker) -> Result<StepSummary> {
    let entries = collect_entries(&layout.archive_dirs())?;
    info!("Collected {} files for the Gerber archive", entries.len());

    let output = layout.gerber_output();
    ArchiveCreator::create_zip(&entries, &output, progress)?;

    Ok(StepSummary {
        step: STEP_NAME,
        output,
        rows_written: 0,
        rows_skipped: 0,
        files_archived: entries.len(),
    })
}
