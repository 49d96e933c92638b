use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Database connection failed: {0}")]
    ConnectionFailure(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Failed to fetch data from API: {0}")]
    FetchFailure(#[from] reqwest::Error),

    /// Bad `query_data` arguments; the message is shown as-is
    #[error("{0}")]
    InvalidQuery(String),

    #[error("Query failed: {0}")]
    QueryFailure(String),

    #[error("Query failed: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("Metric '{0}' not found in any table or no data available")]
    MetricNotFound(String),

    #[error("Could not read CSV file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not read CSV file: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, EtlError>;
