use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid weight table: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{field} cannot be empty")]
    MissingField { field: &'static str },

    #[error("'{name}' is reserved for the summary total row")]
    ReservedReviewer { name: String },

    #[error("Weight for '{category}' must be positive, got {value}")]
    InvalidWeight { category: &'static str, value: i64 },

    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

pub type TrackerResult<T> = Result<T, TrackerError>;
