//! Schema management and the dedup writer.
//!
//! The writer is insert-only: a candidate whose (report_date, country_name)
//! key is already stored is skipped, never updated. Survivors go in as one
//! batch inside a single transaction that commits only if every insert
//! succeeds.

use crate::error::Result;
use crate::model::{CaseRecord, KeyedRecord, Table, VaccinationRecord};
use sqlx::query_builder::Separated;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashSet;
use tracing::{error, info};

const SCHEMA_SQL: &str = include_str!("../sql/create_tables.sql");

/// Rows per INSERT statement, well under SQLite's bind-parameter limit
const INSERT_CHUNK_ROWS: usize = 500;

/// A record that knows its destination table and how to bind its columns
pub trait TableRow: KeyedRecord {
    const TABLE: Table;

    /// Push one bind per column, in `Table::columns()` order
    fn push_binds(&self, row: &mut Separated<'_, '_, Sqlite, &'static str>);
}

impl TableRow for CaseRecord {
    const TABLE: Table = Table::DailyCases;

    fn push_binds(&self, row: &mut Separated<'_, '_, Sqlite, &'static str>) {
        row.push_bind(self.report_date)
            .push_bind(self.country_name.clone())
            .push_bind(self.total_cases)
            .push_bind(self.new_cases);
    }
}

impl TableRow for VaccinationRecord {
    const TABLE: Table = Table::VaccinationData;

    fn push_binds(&self, row: &mut Separated<'_, '_, Sqlite, &'static str>) {
        row.push_bind(self.report_date)
            .push_bind(self.country_name.clone())
            .push_bind(self.total_vaccinations)
            .push_bind(self.people_vaccinated)
            .push_bind(self.people_fully_vaccinated);
    }
}

/// Split the schema script into executable statements, dropping comments
fn schema_statements(script: &str) -> Vec<String> {
    script
        .split(';')
        .map(|stmt| {
            stmt.lines()
                .filter(|line| !line.trim_start().starts_with("--"))
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string()
        })
        .filter(|stmt| !stmt.is_empty())
        .collect()
}

/// Create both tables if they do not exist yet; safe to call repeatedly
pub async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
    for stmt in schema_statements(SCHEMA_SQL) {
        sqlx::query(&stmt).execute(pool).await?;
    }
    info!("Schema initialized.");
    Ok(())
}

/// Insert the records whose key is not stored yet, returning how many went in.
///
/// Empty input issues no statement at all. Any failure rolls the whole batch
/// back and is reported as zero rows inserted.
pub async fn write<R: TableRow>(pool: &SqlitePool, records: &[R]) -> u64 {
    if records.is_empty() {
        info!("No data available for insertion.");
        return 0;
    }

    match insert_new_rows(pool, records).await {
        Ok(0) => {
            info!(table = %R::TABLE, "No new unique rows to insert.");
            0
        }
        Ok(inserted) => {
            info!(table = %R::TABLE, inserted, "New rows inserted");
            inserted
        }
        Err(e) => {
            error!(table = %R::TABLE, error = %e, "Insertion failed, batch rolled back");
            0
        }
    }
}

async fn insert_new_rows<R: TableRow>(pool: &SqlitePool, records: &[R]) -> Result<u64> {
    let table = R::TABLE;
    let exists_sql = format!(
        "SELECT 1 FROM {} WHERE report_date = ? AND country_name = ? LIMIT 1",
        table.name()
    );

    // Dropping the transaction without commit rolls it back
    let mut tx = pool.begin().await?;

    let mut seen = HashSet::new();
    let mut fresh: Vec<&R> = Vec::new();
    for record in records {
        if !seen.insert((record.report_date(), record.country_name())) {
            continue;
        }

        let existing = sqlx::query(&exists_sql)
            .bind(record.report_date())
            .bind(record.country_name())
            .fetch_optional(&mut *tx)
            .await?;

        if existing.is_none() {
            fresh.push(record);
        }
    }

    if fresh.is_empty() {
        return Ok(0);
    }

    let insert_prefix = format!("INSERT INTO {} ({}) ", table.name(), table.columns().join(", "));
    let mut inserted = 0;
    for chunk in fresh.chunks(INSERT_CHUNK_ROWS) {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(insert_prefix.as_str());
        builder.push_values(chunk, |mut row, record| record.push_binds(&mut row));
        inserted += builder.build().execute(&mut *tx).await?.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

/// Names of the tables currently in the store
pub async fn list_tables(pool: &SqlitePool) -> Result<Vec<String>> {
    let names = sqlx::query_scalar::<_, String>(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(names)
}

/// Drop both tables, returning the ones dropped. A failure on one table is
/// logged and does not stop the other.
pub async fn drop_schema(pool: &SqlitePool) -> Vec<Table> {
    let mut dropped = Vec::new();
    for table in Table::ALL {
        let sql = format!("DROP TABLE IF EXISTS {}", table.name());
        match sqlx::query(&sql).execute(pool).await {
            Ok(_) => {
                info!(%table, "Dropped table");
                dropped.push(table);
            }
            Err(e) => error!(%table, error = %e, "Error dropping table"),
        }
    }
    dropped
}
