//! Row Normalizer - turns raw API payloads and CSV rows into canonical records
//!
//! Both functions are pure and DETERMINISTIC: the same input always yields the
//! same records in the same order (ascending by date).

use crate::csv_source::RawVaccinationRow;
use crate::error::{EtlError, Result};
use crate::model::{CaseRecord, VaccinationRecord};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

const I64_MIN_F64: f64 = i64::MIN as f64;
const I64_MAX_F64: f64 = i64::MAX as f64;

/// How the CSV path collapses rows sharing a country
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CsvDedup {
    /// Keep only the most recent row per country
    #[default]
    LatestPerCountry,
    /// Keep one row per (country, date), the last one in file order
    PerCountryDate,
}

/// Parse a calendar date, accepting a few common layouts and timestamps
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|ts| ts.date())
}

/// Parse a count cell; integral decimals ("1200.0") are truncated
pub fn parse_count(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<i64>() {
        return Some(n);
    }
    raw.parse::<f64>().ok().and_then(float_count)
}

/// Truncate a float count; NaN, infinities and values outside `i64` are rejected
fn float_count(value: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, hence the exclusive upper bound
    (I64_MIN_F64..I64_MAX_F64)
        .contains(&value)
        .then(|| value.trunc() as i64)
}

/// Coerce an API count field, defaulting to 0 when absent or unusable
pub fn coerce_count(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(float_count))
            .unwrap_or(0),
        Some(Value::String(s)) => parse_count(s).unwrap_or(0),
        _ => 0,
    }
}

fn malformed(detail: &str) -> EtlError {
    EtlError::MalformedInput(format!("Unexpected API data format: {}", detail))
}

/// Normalize a COVID-19 API payload into daily case records.
///
/// The payload is either the API's array shape (only the first element is
/// used) or a single country object of the form
/// `{"country": .., "cases": {"YYYY-MM-DD": {"total": .., "new": ..}}}`.
/// Entries whose date key cannot be parsed are dropped. When two keys resolve
/// to the same date, the last one seen wins.
pub fn normalize_cases(payload: &Value) -> Result<Vec<CaseRecord>> {
    let entry = match payload {
        Value::Array(items) => items.first(),
        Value::Object(_) => Some(payload),
        _ => None,
    }
    .ok_or_else(|| malformed("empty payload"))?
    .as_object()
    .ok_or_else(|| malformed("first element is not an object"))?;

    let country_name = entry
        .get("country")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| malformed("missing 'country' field"))?;

    let cases = entry
        .get("cases")
        .ok_or_else(|| malformed("missing 'cases' field"))?
        .as_object()
        .ok_or_else(|| malformed("'cases' is not an object"))?;

    // One country per payload, so the date alone is the batch key
    let mut by_date: BTreeMap<NaiveDate, CaseRecord> = BTreeMap::new();
    for (date_key, stats) in cases {
        let Some(report_date) = parse_date(date_key) else {
            debug!(date = %date_key, "dropping case entry with unparsable date");
            continue;
        };

        by_date.insert(
            report_date,
            CaseRecord {
                country_name: country_name.to_string(),
                report_date,
                total_cases: coerce_count(stats.get("total")),
                new_cases: coerce_count(stats.get("new")),
            },
        );
    }

    Ok(by_date.into_values().collect())
}

/// Normalize raw CSV rows into vaccination records.
///
/// Rows without a usable date or country are dropped. Remaining rows are
/// sorted by date (stable, so file order breaks ties) and collapsed per `mode`.
pub fn normalize_vaccinations(rows: Vec<RawVaccinationRow>, mode: CsvDedup) -> Vec<VaccinationRecord> {
    let mut records: Vec<VaccinationRecord> = rows
        .into_iter()
        .filter_map(|row| {
            let country_name = row.location.as_deref().map(str::trim).filter(|c| !c.is_empty())?;
            let report_date = row.date.as_deref().and_then(parse_date)?;
            Some(VaccinationRecord {
                country_name: country_name.to_string(),
                report_date,
                total_vaccinations: row.total_vaccinations.as_deref().and_then(parse_count),
                people_vaccinated: row.people_vaccinated.as_deref().and_then(parse_count),
                people_fully_vaccinated: row.people_fully_vaccinated.as_deref().and_then(parse_count),
            })
        })
        .collect();

    records.sort_by_key(|r| r.report_date);

    let mut kept: Vec<VaccinationRecord> = match mode {
        CsvDedup::LatestPerCountry => {
            let mut latest: BTreeMap<String, VaccinationRecord> = BTreeMap::new();
            for record in records {
                latest.insert(record.country_name.clone(), record);
            }
            latest.into_values().collect()
        }
        CsvDedup::PerCountryDate => {
            let mut by_key: BTreeMap<(String, NaiveDate), VaccinationRecord> = BTreeMap::new();
            for record in records {
                by_key.insert((record.country_name.clone(), record.report_date), record);
            }
            by_key.into_values().collect()
        }
    };

    kept.sort_by(|a, b| {
        a.report_date
            .cmp(&b.report_date)
            .then_with(|| a.country_name.cmp(&b.country_name))
    });
    kept
}
