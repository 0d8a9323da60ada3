use thiserror::Error;

#[derive(Error, Debug)]
pub enum TravisDumpError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to build request: {0}")]
    Request(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to decode builds page at offset {offset}: {source}")]
    Decode {
        offset: u64,
        #[source]
        source: serde_json::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TravisDumpError>;
