use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("sqlx error: {0}")]
    SqlxError(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("validation error: {0}")]
    ValidationError(String),
    #[error("parsing error: {0}")]
    ParsingError(String),
    #[error("other error: {0}")]
    OtherError(String),
}
