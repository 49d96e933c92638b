use crate::error::{EtlError, Result};
use crate::model::KeyedRecord;
use chrono::NaiveDate;

/// Keep records dated within `[from_date, to_date]`; either bound may be open
pub fn filter_by_range<R: KeyedRecord>(
    records: Vec<R>,
    from_date: Option<NaiveDate>,
    to_date: Option<NaiveDate>,
) -> Vec<R> {
    if from_date.is_none() && to_date.is_none() {
        return records;
    }

    records
        .into_iter()
        .filter(|r| {
            let day = r.report_date();
            from_date.map_or(true, |from| day >= from) && to_date.map_or(true, |to| day <= to)
        })
        .collect()
}

/// Parse a `YYYY-MM-DD` range bound given on the command line
pub fn parse_bound(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
        EtlError::MalformedInput(format!("invalid date '{}' (expected YYYY-MM-DD): {}", raw, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CaseRecord;

    fn record(day: u32) -> CaseRecord {
        CaseRecord {
            country_name: "India".to_string(),
            report_date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            total_cases: day as i64,
            new_cases: 1,
        }
    }

    fn days(records: &[CaseRecord]) -> Vec<u32> {
        use chrono::Datelike;
        records.iter().map(|r| r.report_date.day()).collect()
    }

    #[test]
    fn test_no_bounds_is_noop() {
        let records = vec![record(3), record(1), record(2)];
        let filtered = filter_by_range(records.clone(), None, None);
        assert_eq!(filtered, records);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let records = (1..=5).map(record).collect();
        let filtered = filter_by_range(
            records,
            Some(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()),
            Some(NaiveDate::from_ymd_opt(2024, 1, 4).unwrap()),
        );
        assert_eq!(days(&filtered), vec![2, 3, 4]);
    }

    #[test]
    fn test_open_upper_bound() {
        let records = (1..=5).map(record).collect();
        let filtered = filter_by_range(records, Some(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()), None);
        assert_eq!(days(&filtered), vec![5]);
    }

    #[test]
    fn test_open_lower_bound() {
        let records = (1..=5).map(record).collect();
        let filtered = filter_by_range(records, None, Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
        assert_eq!(days(&filtered), vec![1]);
    }

    #[test]
    fn test_inverted_bounds_yield_nothing() {
        let records = (1..=5).map(record).collect();
        let filtered = filter_by_range(
            records,
            Some(NaiveDate::from_ymd_opt(2024, 1, 4).unwrap()),
            Some(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()),
        );
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_parse_bound() {
        assert_eq!(parse_bound("2024-03-09").unwrap(), NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert!(matches!(parse_bound("09/03/2024"), Err(EtlError::MalformedInput(_))));
    }
}
