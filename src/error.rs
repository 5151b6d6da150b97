use thiserror::Error;

pub type OrderlensResult<T> = Result<T, OrderlensError>;

#[derive(Debug, Error)]
pub enum OrderlensError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Io(#[from] IoError),
}

/// Errors raised while reading and normalizing the source dataset.
///
/// All of these are fatal to the session: no partial dataset is ever
/// produced.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read source '{path}': {msg}")]
    SourceUnreadable { path: String, msg: String },

    #[error("Required column '{0}' is missing from the source dataset")]
    MissingColumn(String),

    #[error("Schema mismatch for column '{column}': expected {expected}, got {actual}")]
    SchemaMismatch {
        column: String,
        expected: String,
        actual: String,
    },
}

/// Errors related to query evaluation, frame operations and domain parsing.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Data frame error: {0}")]
    DataFrame(String),

    #[error("Failed to parse enum: {0}")]
    ParseEnum(#[from] strum::ParseError),

    #[error("Invalid week layout: {0}")]
    InvalidWeekLayout(String),

    #[error("Invalid week index {index}: bucketed view covers weeks 1-{max}")]
    InvalidWeekIndex { index: u32, max: u32 },
}

/// Errors related to report export and serialization.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("IO operation failed")]
    Io(#[from] std::io::Error),

    #[error("Serialization failed")]
    Json(#[from] serde_json::Error),

    #[error("File system error: {0}")]
    FileSystem(String),
}
