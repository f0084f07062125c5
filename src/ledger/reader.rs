//! Decoding of uploaded NF-e exports
//!
//! The exports are UTF-16LE text (usually with a BOM), tab-delimited, with
//! every field double-quoted. Header names come padded and sometimes keep
//! stray quotes, so they are normalized before lookup.

use crate::error::{Error, Result};

/// A file as it arrived in the upload request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-side relative path, e.g. `2024/jan.csv`
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Raw rows of one file, cells still as text.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

fn decode_utf16le(bytes: &[u8]) -> std::result::Result<String, String> {
    if bytes.len() % 2 != 0 {
        return Err(format!("{} bytes não formam texto UTF-16", bytes.len()));
    }

    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    let text = String::from_utf16(&units).map_err(|e| e.to_string())?;
    Ok(text.trim_start_matches('\u{feff}').to_string())
}

fn normalize_header(raw: &str) -> String {
    raw.trim().replace('"', "")
}

/// Decode and tokenize one uploaded file.
pub fn read_table(file: &UploadedFile) -> Result<Table> {
    let read_error = |reason: String| Error::Read {
        file: file.name.clone(),
        reason,
    };

    let text = decode_utf16le(&file.bytes).map_err(read_error)?;

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quote(b'"')
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = rdr
        .headers()
        .map_err(|e| read_error(e.to_string()))?
        .iter()
        .map(normalize_header)
        .collect();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| read_error(e.to_string()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    log::info!("Arquivo {} lido com sucesso", file.name);
    Ok(Table { headers, rows })
}

/// Numeric cells: trimmed, unquoted, `,` as decimal point. Empty is zero.
pub fn parse_amount(raw: &str) -> std::result::Result<f64, String> {
    let cleaned = raw.trim().replace('"', "").replace(',', ".");
    if cleaned.is_empty() {
        return Ok(0.0);
    }
    cleaned
        .parse::<f64>()
        .map_err(|_| format!("não foi possível converter '{}' para número", raw.trim()))
}

/// Encode text the way the exporter does. Used by tests and demos.
pub fn encode_utf16le(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes
}
