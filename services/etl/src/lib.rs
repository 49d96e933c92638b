//! COVID-19 ETL - loads case and vaccination data into a relational store
//!
//! Responsibilities:
//! - Fetch daily case counts for a country from the COVID-19 API
//! - Load vaccination snapshots from CSV
//! - Normalize both sources into canonical records
//! - Insert only rows whose (report_date, country_name) key is new
//! - Answer reporting queries (max, top-N, trend) over the stored tables

pub mod config;
pub mod csv_source;
pub mod db;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod query;
pub mod report;
pub mod store;

pub use error::{EtlError, Result};
