//! Ingestion orchestrators.
//!
//! API path: fetch -> normalize -> date filter -> write `daily_cases`
//! CSV path: read -> normalize -> write `vaccination_data`

use crate::csv_source::read_vaccination_csv;
use crate::db::Store;
use crate::error::Result;
use crate::fetch::{is_empty_payload, CovidApi};
use crate::filter::filter_by_range;
use crate::normalize::{normalize_cases, normalize_vaccinations, CsvDedup};
use crate::store::{initialize_schema, write, TableRow};
use chrono::NaiveDate;
use std::path::Path;
use tracing::info;

/// Parameters of one `fetch_data` run
#[derive(Debug, Clone, Default)]
pub struct CaseRequest {
    pub country: String,
    /// Forwarded to the API as-is
    pub date: Option<String>,
    /// Applied locally after normalization
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl CaseRequest {
    pub fn query_params(&self) -> Vec<(&'static str, &str)> {
        let mut params = vec![("country", self.country.as_str())];
        if let Some(date) = &self.date {
            params.push(("date", date.as_str()));
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The source returned nothing
    NoData,
    /// The source had data but nothing survived normalization/filtering
    NoRecords,
    /// Records were ready but there is no store connection to write them to
    NoStore { candidates: usize },
    Loaded { candidates: usize, inserted: u64 },
}

async fn load<R: TableRow>(store: &Store, records: &[R]) -> Result<IngestOutcome> {
    let candidates = records.len();
    let Some(pool) = store.pool() else {
        return Ok(IngestOutcome::NoStore { candidates });
    };

    initialize_schema(pool).await?;
    let inserted = write(pool, records).await;
    Ok(IngestOutcome::Loaded { candidates, inserted })
}

pub async fn ingest_cases(api: &CovidApi, store: &Store, request: &CaseRequest) -> Result<IngestOutcome> {
    let payload = api.get_data(&request.query_params(), "").await;
    if is_empty_payload(&payload) {
        return Ok(IngestOutcome::NoData);
    }

    let records = normalize_cases(&payload)?;
    let records = filter_by_range(records, request.start_date, request.end_date);
    info!(country = %request.country, records = records.len(), "Cleaned and transformed data.");

    if records.is_empty() {
        return Ok(IngestOutcome::NoRecords);
    }
    load(store, &records).await
}

pub async fn ingest_vaccinations(store: &Store, path: &Path, mode: CsvDedup) -> Result<IngestOutcome> {
    let rows = read_vaccination_csv(path).await?;
    if rows.is_empty() {
        return Ok(IngestOutcome::NoData);
    }

    let records = normalize_vaccinations(rows, mode);
    info!(records = records.len(), ?mode, "Normalized vaccination rows");

    if records.is_empty() {
        return Ok(IngestOutcome::NoRecords);
    }
    load(store, &records).await
}
