pub mod fetcher;
pub mod loader;
pub mod reconcile;
pub mod types;

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Network error occurred: {0}")]
    Http(#[from] reqwest::Error),

    #[error("One or more datasets are empty or unavailable: {0}")]
    EmptyDataset(&'static str),

    #[error("No matching data found for greed index and BTC prices")]
    NoMatchingData,

    #[error("The CSV file does not exist: {0}")]
    FileNotFound(String),

    #[error("Invalid CSV data: {0}")]
    InvalidData(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
