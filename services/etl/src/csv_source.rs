//! Vaccination CSV reader.

use crate::error::{EtlError, Result};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

const REQUIRED_COLUMNS: &[&str] = &["location", "date"];

/// A CSV row before normalization; every cell is kept as text
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVaccinationRow {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub total_vaccinations: Option<String>,
    #[serde(default)]
    pub people_vaccinated: Option<String>,
    #[serde(default)]
    pub people_fully_vaccinated: Option<String>,
}

/// Read a vaccination CSV from disk
pub async fn read_vaccination_csv(path: &Path) -> Result<Vec<RawVaccinationRow>> {
    info!(path = %path.display(), "Reading vaccination CSV");
    let content = fs::read_to_string(path).await?;
    parse_vaccination_csv(&content)
}

/// Parse vaccination CSV content; malformed rows are skipped with a warning
pub fn parse_vaccination_csv(content: &str) -> Result<Vec<RawVaccinationRow>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == *column) {
            return Err(EtlError::MalformedInput(format!(
                "CSV is missing required column '{}'",
                column
            )));
        }
    }

    let mut rows = Vec::new();
    for (line_idx, result) in reader.deserialize::<RawVaccinationRow>().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => warn!(line = line_idx + 2, error = %e, "Skipping malformed CSV row"),
        }
    }

    info!(rows = rows.len(), "Parsed vaccination CSV");
    Ok(rows)
}
