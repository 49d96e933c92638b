//! Reporting queries over the stored tables.

use crate::error::{EtlError, Result};
use crate::model::Table;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::{debug, warn};

pub const TOP_N_QUERY: &str = "top_n_countries_by_metric";
pub const TREND_QUERY: &str = "daily_trends";

/// Tables searched, in order, by the top-N report
pub const TOP_N_CANDIDATES: [Table; 2] = [Table::VaccinationData, Table::DailyCases];

/// Ranked countries for one metric, from the first table that had data
#[derive(Debug, Clone, PartialEq)]
pub struct TopN {
    pub table: Table,
    pub rows: Vec<(String, Option<i64>)>,
}

/// A `query_data` invocation resolved into one report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportQuery {
    TopN { n: u32, metric: String },
    Trend { country: String, metric: String },
    Max { column: String, country: String },
}

impl ReportQuery {
    /// Interpret `query_data COLUMN COUNTRY [EXTRA]`
    pub fn parse(column: &str, country: &str, extra: Option<&str>) -> Result<Self> {
        match (column, extra) {
            (TOP_N_QUERY, extra) => {
                let metric = extra
                    .filter(|m| !m.trim().is_empty())
                    .ok_or_else(|| EtlError::InvalidQuery("Metric column name required.".to_string()))?;
                let n = country.trim().parse::<u32>().ok().filter(|n| *n > 0).ok_or_else(|| {
                    EtlError::InvalidQuery(format!(
                        "Could not execute top_n query: '{}' is not a positive integer",
                        country
                    ))
                })?;
                Ok(ReportQuery::TopN {
                    n,
                    metric: metric.trim().to_string(),
                })
            }
            (TREND_QUERY, Some(metric)) => Ok(ReportQuery::Trend {
                country: country.to_string(),
                metric: metric.trim().to_string(),
            }),
            _ => Ok(ReportQuery::Max {
                column: column.trim().to_string(),
                country: country.to_string(),
            }),
        }
    }
}

fn table_metric(table: Table, metric: &str) -> Result<&'static str> {
    table
        .metric(metric)
        .ok_or_else(|| EtlError::QueryFailure(format!("table '{}' has no metric column '{}'", table, metric)))
}

/// Resolve a metric name to the table that stores it
pub fn resolve_metric(metric: &str) -> Result<Table> {
    Table::owning(metric).ok_or_else(|| EtlError::QueryFailure(format!("unknown metric column '{}'", metric)))
}

/// Largest value of `column` for one country; `None` when nothing matches
pub async fn max_metric(pool: &SqlitePool, table: Table, column: &str, country: &str) -> Result<Option<i64>> {
    let column = table_metric(table, column)?;
    let sql = format!("SELECT MAX({}) FROM {} WHERE country_name = ?", column, table.name());

    let value: Option<i64> = sqlx::query_scalar(&sql).bind(country).fetch_one(pool).await?;
    Ok(value)
}

/// Top `n` countries by the maximum of `metric`.
///
/// Candidates are tried in order and the first one returning rows wins; the
/// tables are never merged. A candidate that lacks the column or whose query
/// fails is skipped.
pub async fn top_n_by_metric(pool: &SqlitePool, n: u32, metric: &str, candidates: &[Table]) -> Result<TopN> {
    if n == 0 {
        return Err(EtlError::MalformedInput("top-n size must be at least 1".to_string()));
    }

    for &table in candidates {
        let Some(column) = table.metric(metric) else {
            debug!(%table, metric, "metric not present in table, skipping");
            continue;
        };

        let sql = format!(
            "SELECT country_name, MAX({}) AS total FROM {} GROUP BY country_name ORDER BY total DESC LIMIT ?",
            column,
            table.name()
        );

        match sqlx::query_as::<_, (String, Option<i64>)>(&sql)
            .bind(i64::from(n))
            .fetch_all(pool)
            .await
        {
            Ok(rows) if !rows.is_empty() => return Ok(TopN { table, rows }),
            Ok(_) => debug!(%table, metric, "no rows, trying next table"),
            Err(e) => warn!(%table, metric, error = %e, "top-n query failed, trying next table"),
        }
    }

    Err(EtlError::MetricNotFound(metric.to_string()))
}

/// Daily values of `metric` for one country, oldest first
pub async fn trend(
    pool: &SqlitePool,
    table: Table,
    country: &str,
    metric: &str,
) -> Result<Vec<(NaiveDate, Option<i64>)>> {
    let column = table_metric(table, metric)?;
    let sql = format!(
        "SELECT report_date, {} FROM {} WHERE country_name = ? ORDER BY report_date ASC",
        column,
        table.name()
    );

    let rows = sqlx::query_as::<_, (NaiveDate, Option<i64>)>(&sql)
        .bind(country)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_pool;
    use crate::model::{CaseRecord, VaccinationRecord};
    use crate::store::{initialize_schema, write};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn case(country: &str, day: u32, total: i64, new: i64) -> CaseRecord {
        CaseRecord {
            country_name: country.to_string(),
            report_date: date(day),
            total_cases: total,
            new_cases: new,
        }
    }

    async fn seeded_pool() -> SqlitePool {
        let pool = open_pool("sqlite::memory:").await.unwrap();
        initialize_schema(&pool).await.unwrap();
        write(
            &pool,
            &[
                case("India", 1, 10, 2),
                case("India", 2, 15, 5),
                case("India", 3, 16, 1),
                case("Chile", 1, 3, 3),
                case("Peru", 2, 40, 7),
            ],
        )
        .await;
        pool
    }

    // -------------------------------------------------------------------------
    // PARSE TESTS
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_top_n() {
        let query = ReportQuery::parse(TOP_N_QUERY, "5", Some("total_cases")).unwrap();
        assert_eq!(
            query,
            ReportQuery::TopN {
                n: 5,
                metric: "total_cases".to_string()
            }
        );
    }

    #[test]
    fn test_parse_top_n_requires_metric() {
        let err = ReportQuery::parse(TOP_N_QUERY, "5", None).unwrap_err();
        assert_eq!(format!("[ERROR] {}", err), "[ERROR] Metric column name required.");

        let err = ReportQuery::parse(TOP_N_QUERY, "5", Some("  ")).unwrap_err();
        assert_eq!(err.to_string(), "Metric column name required.");
    }

    #[test]
    fn test_parse_top_n_requires_positive_integer() {
        let err = ReportQuery::parse(TOP_N_QUERY, "abc", Some("total_cases")).unwrap_err();
        assert_eq!(
            format!("[ERROR] {}", err),
            "[ERROR] Could not execute top_n query: 'abc' is not a positive integer"
        );

        assert!(matches!(
            ReportQuery::parse(TOP_N_QUERY, "0", Some("total_cases")),
            Err(EtlError::InvalidQuery(m)) if m.starts_with("Could not execute top_n query: ")
        ));
    }

    #[test]
    fn test_parse_trend_and_max() {
        assert_eq!(
            ReportQuery::parse(TREND_QUERY, "India", Some("new_cases")).unwrap(),
            ReportQuery::Trend {
                country: "India".to_string(),
                metric: "new_cases".to_string()
            }
        );
        assert_eq!(
            ReportQuery::parse("total_cases", "India", None).unwrap(),
            ReportQuery::Max {
                column: "total_cases".to_string(),
                country: "India".to_string()
            }
        );
        // Without a metric the trend token is just an unknown column
        assert_eq!(
            ReportQuery::parse(TREND_QUERY, "India", None).unwrap(),
            ReportQuery::Max {
                column: TREND_QUERY.to_string(),
                country: "India".to_string()
            }
        );
    }

    // -------------------------------------------------------------------------
    // MAX METRIC TESTS
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_max_metric() {
        let pool = seeded_pool().await;
        let max = max_metric(&pool, Table::DailyCases, "total_cases", "India").await.unwrap();
        assert_eq!(max, Some(16));
    }

    #[tokio::test]
    async fn test_max_metric_no_rows() {
        let pool = seeded_pool().await;
        let max = max_metric(&pool, Table::DailyCases, "new_cases", "Atlantis").await.unwrap();
        assert_eq!(max, None);
    }

    #[tokio::test]
    async fn test_max_metric_rejects_unknown_column() {
        let pool = seeded_pool().await;
        let result = max_metric(&pool, Table::DailyCases, "total_cases) FROM daily_cases; --", "India").await;
        assert!(matches!(result, Err(EtlError::QueryFailure(_))));

        let result = max_metric(&pool, Table::DailyCases, "people_vaccinated", "India").await;
        assert!(matches!(result, Err(EtlError::QueryFailure(_))));
    }

    // -------------------------------------------------------------------------
    // TOP-N TESTS
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_top_n_falls_through_to_table_with_column() {
        let pool = seeded_pool().await;
        let top = top_n_by_metric(&pool, 1, "total_cases", &TOP_N_CANDIDATES).await.unwrap();

        assert_eq!(top.table, Table::DailyCases);
        assert_eq!(top.rows, vec![("Peru".to_string(), Some(40))]);
    }

    #[tokio::test]
    async fn test_top_n_ranks_by_max_descending() {
        let pool = seeded_pool().await;
        let top = top_n_by_metric(&pool, 10, "total_cases", &TOP_N_CANDIDATES).await.unwrap();

        let countries: Vec<&str> = top.rows.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(countries, vec!["Peru", "India", "Chile"]);
    }

    #[tokio::test]
    async fn test_top_n_skips_empty_candidate() {
        let pool = seeded_pool().await;
        // vaccination_data has the column but no rows yet
        let result = top_n_by_metric(&pool, 3, "total_vaccinations", &TOP_N_CANDIDATES).await;
        assert!(matches!(result, Err(EtlError::MetricNotFound(_))));

        write(
            &pool,
            &[VaccinationRecord {
                country_name: "USA".to_string(),
                report_date: date(1),
                total_vaccinations: Some(100),
                people_vaccinated: None,
                people_fully_vaccinated: None,
            }],
        )
        .await;
        let top = top_n_by_metric(&pool, 3, "total_vaccinations", &TOP_N_CANDIDATES).await.unwrap();
        assert_eq!(top.table, Table::VaccinationData);
        assert_eq!(top.rows, vec![("USA".to_string(), Some(100))]);
    }

    #[tokio::test]
    async fn test_top_n_unknown_metric() {
        let pool = seeded_pool().await;
        let result = top_n_by_metric(&pool, 3, "deaths", &TOP_N_CANDIDATES).await;
        assert!(matches!(result, Err(EtlError::MetricNotFound(m)) if m == "deaths"));
    }

    #[tokio::test]
    async fn test_top_n_missing_tables_is_metric_not_found() {
        let pool = open_pool("sqlite::memory:").await.unwrap();
        let result = top_n_by_metric(&pool, 3, "total_cases", &TOP_N_CANDIDATES).await;
        assert!(matches!(result, Err(EtlError::MetricNotFound(_))));
    }

    // -------------------------------------------------------------------------
    // TREND TESTS
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_trend_ascending_for_one_country() {
        let pool = seeded_pool().await;
        let rows = trend(&pool, Table::DailyCases, "India", "new_cases").await.unwrap();

        assert_eq!(
            rows,
            vec![(date(1), Some(2)), (date(2), Some(5)), (date(3), Some(1))]
        );
    }

    #[tokio::test]
    async fn test_trend_unknown_country_is_empty() {
        let pool = seeded_pool().await;
        let rows = trend(&pool, Table::DailyCases, "Atlantis", "new_cases").await.unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_resolve_metric() {
        assert_eq!(resolve_metric("people_vaccinated").unwrap(), Table::VaccinationData);
        assert!(matches!(resolve_metric("deaths"), Err(EtlError::QueryFailure(_))));
    }
}
