//! Pick-and-Place conversion
//!
//! CAD placement exports often start with free-form metadata (board name,
//! units, export date) before the real column header. The header is located
//! by scanning for the first line that names the key columns and tokenizes
//! to a full row; everything from that line on is parsed as CSV.

use crate::{
    config::ProjectLayout,
    converter::StepSummary,
    csv_io,
    error::{ConvertError, Result},
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const STEP_NAME: &str = "Pick & Place";

pub const OUTPUT_HEADER: [&str; 5] = ["Designator", "Mid X", "Mid Y", "Layer", "Rotation"];

/// Substrings a header line must contain
const HEADER_MARKERS: [&str; 3] = ["Designator", "Center-X", "Rotation"];

/// Minimum number of CSV fields on a header line
const MIN_HEADER_FIELDS: usize = 5;

/// Whether a raw line looks like the placement column header
pub fn is_header_line(line: &str) -> bool {
    if !HEADER_MARKERS.iter().all(|marker| line.contains(marker)) {
        return false;
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());

    match reader.records().next() {
        Some(Ok(record)) => record.len() >= MIN_HEADER_FIELDS,
        _ => false,
    }
}

/// Index of the first header line, if any
pub fn find_header_line(lines: &[&str]) -> Option<usize> {
    lines.iter().position(|line| is_header_line(line))
}

/// Indices of the required source columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementColumns {
    pub designator: usize,
    pub center_x: usize,
    pub center_y: usize,
    pub layer: usize,
    pub rotation: usize,
}

impl PlacementColumns {
    /// Locate the required columns by exact name in a cleaned header
    pub fn resolve(header: &[String], file: &Path) -> std::result::Result<Self, ConvertError> {
        let find = |name: &str| header.iter().position(|h| h == name);
        let lookups = [
            ("Designator", find("Designator")),
            ("Center-X(mm)", find("Center-X(mm)")),
            ("Center-Y(mm)", find("Center-Y(mm)")),
            ("Layer", find("Layer")),
            ("Rotation", find("Rotation")),
        ];

        if let [(_, Some(designator)), (_, Some(center_x)), (_, Some(center_y)), (_, Some(layer)), (_, Some(rotation))] =
            lookups
        {
            return Ok(Self {
                designator,
                center_x,
                center_y,
                layer,
                rotation,
            });
        }

        Err(ConvertError::MissingColumns {
            file: file.display().to_string(),
            missing: lookups
                .iter()
                .filter(|(_, index)| index.is_none())
                .map(|(name, _)| name.to_string())
                .collect(),
            header: header.to_vec(),
        })
    }

    fn indices(&self) -> [usize; 5] {
        [
            self.designator,
            self.center_x,
            self.center_y,
            self.layer,
            self.rotation,
        ]
    }

    /// Minimum row length that holds every required column
    pub fn required_len(&self) -> usize {
        self.indices().into_iter().max().unwrap_or(0) + 1
    }
}

/// Remap data rows, dropping rows too short to hold every required column
///
/// Returns the output rows and the number of rows dropped.
pub fn remap_rows(columns: &PlacementColumns, rows: &[Vec<String>]) -> (Vec<[String; 5]>, usize) {
    let required = columns.required_len();
    let mut skipped = 0;

    let remapped = rows
        .iter()
        .filter_map(|row| {
            if row.len() < required {
                skipped += 1;
                return None;
            }
            Some(columns.indices().map(|index| row[index].trim().to_string()))
        })
        .collect();

    (remapped, skipped)
}

/// Split text into lines ending at `\r\n`, `\r` or `\n`
///
/// Each line is paired with its starting byte offset; terminators are excluded.
pub fn split_lines(text: &str) -> Vec<(usize, &str)> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push((start, &text[start..i]));
                i += 1;
                start = i;
            }
            b'\r' => {
                lines.push((start, &text[start..i]));
                i += if bytes.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                start = i;
            }
            _ => i += 1,
        }
    }
    if start < bytes.len() {
        lines.push((start, &text[start..]));
    }

    lines
}

/// Parse placement rows from the detected header onward
///
/// Returns the cleaned header and the data rows after it.
pub fn parse_from_header(text: &str, file: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let (offsets, lines): (Vec<usize>, Vec<&str>) = split_lines(text).into_iter().unzip();

    let start = find_header_line(&lines).ok_or_else(|| ConvertError::NoValidHeader {
        file: file.display().to_string(),
    })?;
    debug!("Header found on line {}: {}", start + 1, lines[start]);

    let mut rows = csv_io::parse_rows(&text[offsets[start]..])?.into_iter();
    let header: Vec<String> = rows
        .next()
        .map(|header| header.iter().map(|h| csv_io::clean_header(h)).collect())
        .unwrap_or_default();

    Ok((header, rows.collect()))
}

/// First `.csv` file in the Pick Place folder, matching the extension in any case
pub fn find_pick_place_file(dir: &Path) -> Result<Option<PathBuf>> {
    csv_io::find_csv_file(dir, true)
}

/// Convert the project's placement export into `JLCPCB/PickAndPlace.csv`
pub fn convert_pick_place(layout: &ProjectLayout) -> Result<StepSummary> {
    let pick_place_dir = layout.pick_place_dir();
    let input = find_pick_place_file(&pick_place_dir)?.ok_or_else(|| {
        ConvertError::MissingInput {
            kind: STEP_NAME.to_string(),
            folder: pick_place_dir.display().to_string(),
        }
    })?;
    info!("Converting Pick & Place from {}", input.display());

    let text = csv_io::read_text(&input)?;
    let (header, data) = parse_from_header(&text, &input)?;

    let columns = PlacementColumns::resolve(&header, &input)?;
    debug!("Resolved placement columns: {:?}", columns);

    let (remapped, skipped) = remap_rows(&columns, &data);
    if skipped > 0 {
        debug!("Dropped {} incomplete placement rows", skipped);
    }

    let output = layout.pick_place_output();
    csv_io::write_csv(&output, &OUTPUT_HEADER, &remapped)?;

    info!(
        "Pick & Place written: {} ({} rows)",
        output.display(),
        remapped.len()
    );
    Ok(StepSummary {
        step: STEP_NAME,
        output,
        rows_written: remapped.len(),
        rows_skipped: skipped,
        files_archived: 0,
    })
}
