//! CSV Data Loader Module
//! Parses uploaded wildfire incident exports into typed records.

use serde::Deserialize;
use std::io::Read;
use thiserror::Error;

/// Columns the upload must carry. Anything else in the file is ignored.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "STATE",
    "STAT_CAUSE_DESCR",
    "FIRE_SIZE",
    "LATITUDE",
    "LONGITUDE",
];

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing required column: {0}")]
    MissingColumn(String),
    #[error("Malformed row at line {line}: {source}")]
    Row {
        line: u64,
        #[source]
        source: csv::Error,
    },
}

/// One row of the wildfire incident table. Coordinates are nullable in
/// the source data; everything downstream of the cleaner sees them as
/// present and finite.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FireRecord {
    #[serde(rename = "STATE")]
    pub state: String,
    #[serde(rename = "STAT_CAUSE_DESCR")]
    pub cause: String,
    #[serde(rename = "FIRE_SIZE")]
    pub fire_size: Option<f64>,
    #[serde(rename = "LATITUDE")]
    pub latitude: Option<f64>,
    #[serde(rename = "LONGITUDE")]
    pub longitude: Option<f64>,
}

impl FireRecord {
    /// True when both coordinates are present and finite.
    pub fn has_coordinates(&self) -> bool {
        matches!(
            (self.latitude, self.longitude),
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite()
        )
    }
}

/// Handles CSV parsing for uploaded incident files.
pub struct DataLoader;

impl DataLoader {
    /// Parse a CSV stream into an ordered record set.
    ///
    /// The header must contain every column in [`REQUIRED_COLUMNS`]; a
    /// single malformed row aborts the whole load so the caller never
    /// builds a partial dashboard.
    pub fn load<R: Read>(input: R) -> Result<Vec<FireRecord>, ParseError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(input);

        let headers = reader.headers()?.clone();
        for required in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == required) {
                return Err(ParseError::MissingColumn(required.to_string()));
            }
        }

        let mut records = Vec::new();
        for result in reader.deserialize() {
            let record: FireRecord = result.map_err(|source| {
                let line = source.position().map(|p| p.line()).unwrap_or(0);
                ParseError::Row { line, source }
            })?;
            records.push(record);
        }

        log::info!("loaded {} wildfire records", records.len());
        Ok(records)
    }
}
