use thiserror::Error;

#[derive(Error, Debug)]
pub enum DealError {
    /// One or more referenced columns do not exist in the table
    #[error("unknown column(s): {}", .columns.join(", "))]
    Schema { columns: Vec<String> },

    /// A cell held a value of the wrong kind, e.g. text in a measure column
    #[error("column '{column}' row {row}: expected {expected}, found {found}")]
    Type {
        column: String,
        row: usize,
        expected: &'static str,
        found: String,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type DealResult<T> = Result<T, DealError>;
