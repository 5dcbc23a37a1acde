//! CSV reading with encoding fallback, and CSV writing
//!
//! CAD exports arrive as UTF-8 (often with a byte-order mark) or as a legacy
//! single-byte encoding. Text is decoded as UTF-8 first and falls back to
//! Latin-1 when the bytes are not valid UTF-8. Output is always UTF-8
//! without a byte-order mark.

use crate::error::{Result, ResultExt};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Encoding a file was decoded with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Latin1,
}

/// First regular file in `dir`, in name order, whose name ends with `.csv`
///
/// An absent directory yields `None`, the same as a directory without a match.
pub fn find_csv_file<P: AsRef<Path>>(dir: P, case_insensitive: bool) -> Result<Option<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        debug!("Input folder not found: {}", dir.display());
        return Ok(None);
    }

    let mut candidates = Vec::new();
    for entry in fs::read_dir(dir).with_path_context("read directory", dir)? {
        let path = entry.with_path_context("read directory entry", dir)?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let is_csv = if case_insensitive {
            name.to_lowercase().ends_with(".csv")
        } else {
            name.ends_with(".csv")
        };
        if is_csv {
            candidates.push(path);
        }
    }

    candidates.sort();
    debug!("CSV candidates in {}: {:?}", dir.display(), candidates);
    Ok(candidates.into_iter().next())
}

/// Decode raw bytes, stripping a UTF-8 byte-order mark if present
pub fn decode_text(bytes: &[u8]) -> (String, TextEncoding) {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    match std::str::from_utf8(body) {
        Ok(text) => (text.to_string(), TextEncoding::Utf8),
        // Latin-1 maps every byte to the code point of the same value
        Err(_) => (
            bytes.iter().map(|&b| char::from(b)).collect(),
            TextEncoding::Latin1,
        ),
    }
}

/// Read a whole file as text using the encoding fallback
pub fn read_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_path_context("read", path)?;
    let (text, encoding) = decode_text(&bytes);

    debug!("Decoded {} as {:?}", path.display(), encoding);
    Ok(text)
}

/// Tokenize CSV text into raw rows of varying length
pub fn parse_rows(text: &str) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Read a CSV file into raw rows
pub fn read_rows<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<String>>> {
    let path = path.as_ref();
    let text = read_text(path)?;
    parse_rows(&text).with_path_context("parse CSV", path)
}

/// Normalize a header cell: surrounding whitespace, then surrounding quotes
pub fn clean_header(name: &str) -> String {
    name.trim().trim_matches('"').to_string()
}

/// Key each data row by the cleaned header names of the first row
pub fn rows_to_records(rows: Vec<Vec<String>>) -> Vec<HashMap<String, String>> {
    let mut rows = rows.into_iter();
    let Some(header) = rows.next() else {
        return Vec::new();
    };
    let header: Vec<String> = header.iter().map(|h| clean_header(h)).collect();

    rows.map(|row| {
        header
            .iter()
            .cloned()
            .zip(row.iter().map(|cell| cell.trim().to_string()))
            .collect()
    })
    .collect()
}

/// Read a CSV file into header-keyed records
pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<HashMap<String, String>>> {
    Ok(rows_to_records(read_rows(path)?))
}

/// Write a header and rows as a comma-delimited CSV file with CRLF terminators
pub fn write_csv<P, R>(path: P, header: &[&str], rows: &[R]) -> Result<()>
where
    P: AsRef<Path>,
    R: AsRef<[String]>,
{
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_path_context("create output directory", parent)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_path(path)
        .with_path_context("create", path)?;

    writer
        .write_record(header)
        .with_path_context("write", path)?;
    for row in rows {
        writer
            .write_record(row.as_ref())
            .with_path_context("write", path)?;
    }
    writer.flush().with_path_context("flush", path)?;

    debug!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_strips_bom() {
        let (text, encoding) = decode_text(b"\xEF\xBB\xBFComment,Designator");
        assert_eq!(text, "Comment,Designator");
        assert_eq!(encoding, TextEncoding::Utf8);
    }

    #[test]
    fn test_decode_falls_back_to_latin1() {
        // "10µF" with µ as the single Latin-1 byte 0xB5
        let (text, encoding) = decode_text(b"10\xB5F,C1");
        assert_eq!(text, "10\u{b5}F,C1");
        assert_eq!(encoding, TextEncoding::Latin1);
    }

    #[test]
    fn test_parse_rows_is_flexible() {
        let rows = parse_rows("a,b,c\n1,2\n\n\"x, y\",z,w\n").unwrap();
        assert_eq!(
            rows,
            vec![
                vec!["a", "b", "c"],
                vec!["1", "2"],
                vec!["x, y", "z", "w"],
            ]
        );
    }

    #[test]
    fn test_clean_header() {
        assert_eq!(clean_header("  \"Center-X(mm)\" "), "Center-X(mm)");
        assert_eq!(clean_header("Layer"), "Layer");
    }

    #[test]
    fn test_rows_to_records() {
        let rows = parse_rows("\" Designator\",Layer\n R1 , Top \nR2\n").unwrap();
        let records = rows_to_records(rows);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["Designator"], "R1");
        assert_eq!(records[0]["Layer"], "Top");
        assert_eq!(records[1]["Designator"], "R2");
        assert!(!records[1].contains_key("Layer"));
    }

    #[test]
    fn test_read_records_from_latin1_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("bom.csv");
        fs::write(&path, b"Comment,Designator\n4.7\xB5F,C3\n").unwrap();

        let records = read_records(&path).unwrap();
        assert_eq!(records[0]["Comment"], "4.7\u{b5}F");
        assert_eq!(records[0]["Designator"], "C3");
    }

    #[test]
    fn test_write_csv_quotes_only_when_needed() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("out.csv");
        let rows = vec![[
            "100nF".to_string(),
            "C1,C2".to_string(),
            "0402".to_string(),
        ]];

        write_csv(&path, &["Comment", "Designator", "Footprint"], &rows).unwrap();

        let written = fs::read(&path).unwrap();
        assert!(!written.starts_with(UTF8_BOM));
        assert_eq!(
            String::from_utf8(written).unwrap(),
            "Comment,Designator,Footprint\r\n100nF,\"C1,C2\",0402\r\n"
        );
    }

    #[test]
    fn test_find_csv_file_case_sensitivity() {
        let temp = tempfile::TempDir::new().unwrap();
        fs::write(temp.path().join("b.csv"), "").unwrap();
        fs::write(temp.path().join("a.CSV"), "").unwrap();
        fs::write(temp.path().join("notes.txt"), "").unwrap();
        fs::create_dir(temp.path().join("0.csv")).unwrap();

        let exact = find_csv_file(temp.path(), false).unwrap();
        assert_eq!(exact, Some(temp.path().join("b.csv")));

        let relaxed = find_csv_file(temp.path(), true).unwrap();
        assert_eq!(relaxed, Some(temp.path().join("a.CSV")));
    }

    #[test]
    fn test_find_csv_file_absent_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        assert_eq!(find_csv_file(temp.path().join("BOM"), false).unwrap(), None);
    }

    #[test]
    fn test_write_csv_creates_output_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("JLCPCB").join("BOM.csv");
        let rows: Vec<Vec<String>> = Vec::new();

        write_csv(&path, &["Comment"], &rows).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "Comment\r\n");
    }

    #[test]
    fn test_read_rows_missing_file_has_path_context() {
        let err = read_rows("/nonexistent/bom.csv").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/bom.csv"));
    }
}
