//! Canonical row shapes and the table/column allow-list.
//!
//! Only identifiers listed here are ever interpolated into SQL text. Caller
//! supplied names are matched against these lists and the `'static` string
//! from the list is what reaches the query.

use chrono::NaiveDate;
use std::fmt;

/// One day of case counts for a country, as stored in `daily_cases`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseRecord {
    pub country_name: String,
    pub report_date: NaiveDate,
    pub total_cases: i64,
    pub new_cases: i64,
}

/// One vaccination snapshot for a country, as stored in `vaccination_data`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaccinationRecord {
    pub country_name: String,
    pub report_date: NaiveDate,
    pub total_vaccinations: Option<i64>,
    pub people_vaccinated: Option<i64>,
    pub people_fully_vaccinated: Option<i64>,
}

/// Records identified by the (country_name, report_date) key
pub trait KeyedRecord {
    fn country_name(&self) -> &str;
    fn report_date(&self) -> NaiveDate;
}

impl KeyedRecord for CaseRecord {
    fn country_name(&self) -> &str {
        &self.country_name
    }

    fn report_date(&self) -> NaiveDate {
        self.report_date
    }
}

impl KeyedRecord for VaccinationRecord {
    fn country_name(&self) -> &str {
        &self.country_name
    }

    fn report_date(&self) -> NaiveDate {
        self.report_date
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    DailyCases,
    VaccinationData,
}

impl Table {
    pub const ALL: [Table; 2] = [Table::DailyCases, Table::VaccinationData];

    pub fn name(self) -> &'static str {
        match self {
            Table::DailyCases => "daily_cases",
            Table::VaccinationData => "vaccination_data",
        }
    }

    /// Insert column order; record binds follow the same order
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Table::DailyCases => &["report_date", "country_name", "total_cases", "new_cases"],
            Table::VaccinationData => &[
                "report_date",
                "country_name",
                "total_vaccinations",
                "people_vaccinated",
                "people_fully_vaccinated",
            ],
        }
    }

    /// Numeric columns that reporting queries may aggregate
    pub fn metrics(self) -> &'static [&'static str] {
        match self {
            Table::DailyCases => &["total_cases", "new_cases"],
            Table::VaccinationData => &[
                "total_vaccinations",
                "people_vaccinated",
                "people_fully_vaccinated",
            ],
        }
    }

    /// Look up a metric column by name, returning the allow-listed identifier
    pub fn metric(self, name: &str) -> Option<&'static str> {
        self.metrics().iter().copied().find(|m| *m == name)
    }

    /// The table that carries a given metric column
    pub fn owning(metric: &str) -> Option<Table> {
        Table::ALL.into_iter().find(|t| t.metric(metric).is_some())
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
