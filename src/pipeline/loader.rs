//! Reads the upstream spreadsheet export into a [`DataFrame`].
//!
//! Spreadsheet tools on Windows usually save CSV as Windows-1252, so that
//! decoding is tried first and UTF-8 second. No schema checks happen here.

use crate::error::{Result, StoreAuditError};
use encoding_rs::WINDOWS_1252;
use polars::prelude::*;
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Bytes that Windows-1252 leaves unassigned.
const WINDOWS_1252_UNDEFINED: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];

/// Text encoding the input was successfully decoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    Windows1252,
    Utf8,
}

impl fmt::Display for SourceEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Windows1252 => write!(f, "windows-1252"),
            Self::Utf8 => write!(f, "utf-8"),
        }
    }
}

/// CSV reader settings.
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub delimiter: u8,
    pub infer_schema_length: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            infer_schema_length: 10_000,
        }
    }
}

/// A freshly loaded table and how it was decoded.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub frame: DataFrame,
    pub encoding: SourceEncoding,
    pub path: PathBuf,
}

/// Loads a delimited table, trying Windows-1252 before UTF-8.
///
/// # Errors
///
/// Returns [`StoreAuditError::Load`] if the file cannot be read or neither
/// decoding yields a parseable table.
pub fn load_table(path: &Path, options: &LoadOptions) -> Result<LoadedTable> {
    tracing::info!("Loading cleaned data from {}", path.display());

    let bytes = std::fs::read(path).map_err(|e| StoreAuditError::load(path, e.to_string()))?;

    let attempts: Vec<(SourceEncoding, std::result::Result<String, String>)> =
        if let Some(body) = bytes.strip_prefix(UTF8_BOM) {
            vec![(SourceEncoding::Utf8, decode_utf8(body))]
        } else {
            vec![
                (SourceEncoding::Windows1252, decode_windows_1252(&bytes)),
                (SourceEncoding::Utf8, decode_utf8(&bytes)),
            ]
        };

    let mut failures = Vec::new();
    for (encoding, decoded) in attempts {
        let parsed = decoded.and_then(|text| parse_csv(text, options).map_err(|e| e.to_string()));
        match parsed {
            Ok(frame) => {
                tracing::info!(
                    rows = frame.height(),
                    columns = frame.width(),
                    %encoding,
                    "Loaded {} rows and {} columns",
                    frame.height(),
                    frame.width()
                );
                return Ok(LoadedTable {
                    frame,
                    encoding,
                    path: path.to_path_buf(),
                });
            }
            Err(reason) => {
                tracing::debug!(%encoding, "Decode attempt failed: {reason}");
                failures.push(format!("{encoding}: {reason}"));
            }
        }
    }

    Err(StoreAuditError::load(path, failures.join("; ")))
}

fn decode_windows_1252(bytes: &[u8]) -> std::result::Result<String, String> {
    if let Some(pos) = bytes
        .iter()
        .position(|b| WINDOWS_1252_UNDEFINED.contains(b))
    {
        return Err(format!("undefined byte at offset {pos}"));
    }
    let (text, had_errors) = WINDOWS_1252.decode_without_bom_handling(bytes);
    if had_errors {
        return Err("malformed byte sequence".to_owned());
    }
    Ok(text.into_owned())
}

fn decode_utf8(bytes: &[u8]) -> std::result::Result<String, String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| format!("invalid UTF-8: {e}"))
}

fn parse_csv(text: String, options: &LoadOptions) -> PolarsResult<DataFrame> {
    let delimiter = options.delimiter;
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(options.infer_schema_length))
        .map_parse_options(|parse| parse.with_separator(delimiter))
        .into_reader_with_file_handle(Cursor::new(text.into_bytes()))
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .expect("create temp file");
        file.write_all(bytes).expect("write temp file");
        file
    }

    #[test]
    fn test_windows_1252_is_tried_first() -> Result<()> {
        // 0xE9 is "é" in Windows-1252 and invalid as a lone UTF-8 byte
        let file = write_temp(b"Region,Sales\nQu\xE9bec,10.5\n");
        let loaded = load_table(file.path(), &LoadOptions::default())?;

        assert_eq!(loaded.encoding, SourceEncoding::Windows1252);
        let regions = crate::table::string_values(&loaded.frame, "Region")?;
        assert_eq!(regions, vec![Some("Québec".to_owned())]);
        Ok(())
    }

    #[test]
    fn test_falls_back_to_utf8() -> Result<()> {
        // "\u{201D}" encodes as E2 80 9D; 0x9D is unassigned in Windows-1252
        let file = write_temp("Region,Note\nEast,\u{201D}quoted\n".as_bytes());
        let loaded = load_table(file.path(), &LoadOptions::default())?;

        assert_eq!(loaded.encoding, SourceEncoding::Utf8);
        assert_eq!(loaded.frame.height(), 1);
        Ok(())
    }

    #[test]
    fn test_bom_means_utf8() -> Result<()> {
        let file = write_temp(b"\xEF\xBB\xBFOrder ID,Sales\nCA-1,1.0\n");
        let loaded = load_table(file.path(), &LoadOptions::default())?;

        assert_eq!(loaded.encoding, SourceEncoding::Utf8);
        assert!(crate::table::has_column(&loaded.frame, "Order ID"));
        Ok(())
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let err = load_table(Path::new("does/not/exist.csv"), &LoadOptions::default())
            .expect_err("missing file must fail");
        assert!(matches!(err, StoreAuditError::Load { .. }));
    }

    #[test]
    fn test_custom_delimiter() -> Result<()> {
        let file = write_temp(b"Region;Sales\nEast;1\nWest;2\n");
        let options = LoadOptions {
            delimiter: b';',
            ..LoadOptions::default()
        };
        let loaded = load_table(file.path(), &options)?;
        assert_eq!(loaded.frame.width(), 2);
        assert_eq!(loaded.frame.height(), 2);
        Ok(())
    }
}
