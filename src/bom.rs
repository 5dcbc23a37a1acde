//! BOM conversion
//!
//! Remaps a CAD bill of materials to the four columns JLCPCB expects. Source
//! columns are located by case-insensitive name; the part number column is
//! filled from the comment until a real part lookup exists.

use crate::{
    config::ProjectLayout,
    converter::StepSummary,
    csv_io,
    error::{ConvertError, Result},
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const STEP_NAME: &str = "BOM";

pub const OUTPUT_HEADER: [&str; 4] = ["Comment", "Designator", "Footprint", "JLCPCB Part #"];

/// Indices of the required source columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BomColumns {
    pub comment: usize,
    pub designator: usize,
    pub footprint: usize,
}

impl BomColumns {
    /// Locate the required columns in a raw header row
    pub fn resolve(header: &[String], file: &Path) -> std::result::Result<Self, ConvertError> {
        let header: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |name: &str| header.iter().position(|h| h == name);

        match (find("comment"), find("designator"), find("footprint")) {
            (Some(comment), Some(designator), Some(footprint)) => Ok(Self {
                comment,
                designator,
                footprint,
            }),
            found => {
                let missing = [
                    ("comment", found.0),
                    ("designator", found.1),
                    ("footprint", found.2),
                ]
                .into_iter()
                .filter(|(_, index)| index.is_none())
                .map(|(name, _)| name.to_string())
                .collect();

                Err(ConvertError::MissingColumns {
                    file: file.display().to_string(),
                    missing,
                    header,
                })
            }
        }
    }

    /// Minimum row length that holds every required column
    pub fn required_len(&self) -> usize {
        self.comment.max(self.designator).max(self.footprint) + 1
    }
}

/// Remap data rows, dropping rows too short to hold every required column
///
/// Returns the output rows and the number of rows dropped.
pub fn remap_rows(columns: &BomColumns, rows: &[Vec<String>]) -> (Vec<[String; 4]>, usize) {
    let required = columns.required_len();
    let mut skipped = 0;

    let remapped = rows
        .iter()
        .filter_map(|row| {
            if row.len() < required {
                skipped += 1;
                return None;
            }

            let comment = row[columns.comment].trim().to_string();
            let designator = row[columns.designator].trim().to_string();
            let footprint = row[columns.footprint].trim().to_string();
            let part_number = comment.clone();

            Some([comment, designator, footprint, part_number])
        })
        .collect();

    (remapped, skipped)
}

/// First `.csv` file in the BOM folder; the extension match is case-sensitive
pub fn find_bom_file(dir: &Path) -> Result<Option<PathBuf>> {
    csv_io::find_csv_file(dir, false)
}

/// Convert the project's BOM export into `JLCPCB/BOM.csv`
pub fn convert_bom(layout: &ProjectLayout) -> Result<StepSummary> {
    let bom_dir = layout.bom_dir();
    let input = find_bom_file(&bom_dir)?.ok_or_else(|| {
        ConvertError::MissingInput {
            kind: STEP_NAME.to_string(),
            folder: bom_dir.display().to_string(),
        }
    })?;
    info!("Converting BOM from {}", input.display());

    let rows = csv_io::read_rows(&input)?;
    let (header, data) = rows.split_first().ok_or_else(|| ConvertError::EmptyInput {
        file: input.display().to_string(),
    })?;

    let columns = BomColumns::resolve(header, &input)?;
    debug!("Resolved BOM columns: {:?}", columns);

    let (remapped, skipped) = remap_rows(&columns, data);
    if skipped > 0 {
        debug!("Dropped {} incomplete BOM rows", skipped);
    }

    let output = layout.bom_output();
    csv_io::write_csv(&output, &OUTPUT_HEADER, &remapped)?;

    info!("BOM written: {} ({} rows)", output.display(), remapped.len());
    Ok(StepSummary {
        step: STEP_NAME,
        output,
        rows_written: remapped.len(),
        rows_skipped: skipped,
        files_archived: 0,
    })
}
