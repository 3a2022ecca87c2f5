use thiserror::Error;

#[derive(Error, Debug)]
pub enum T12Error {
    #[error("Input grid is empty: no rows to process")]
    EmptyInput,

    #[error("Grid has {columns} columns, at least {required} are needed to locate the month band")]
    GridTooNarrow { columns: usize, required: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("Workbook contains no worksheets: {0}")]
    NoWorksheet(String),

    #[error("Invalid file pattern: {0}")]
    PatternError(#[from] glob::PatternError),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    SpreadsheetError(#[from] calamine::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, T12Error>;
