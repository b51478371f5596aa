use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    /// No parser in the ordered set matched, or rows defeated a positive
    /// capability check. Recoverable — routes to manual column mapping.
    #[error("Statement format not recognized")]
    FormatUnrecognized,
    /// Empty header row or wildly inconsistent column counts.
    #[error("Invalid tabular data: {0}")]
    InvalidTabularData(String),
    #[error("Missing required field: {0}")]
    MissingRequiredField(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("{0}")]
    Parse(#[from] ledgerport_core::ParseError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
