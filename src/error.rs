use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Tabular read failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing or empty header row in {context}")]
    MissingHeader { context: String },

    #[error("Missing required column: {column}")]
    MissingColumn { column: String },

    #[error("Failed to fetch {location}: {message}")]
    Fetch { location: String, message: String },

    #[error("No normalizer registered for source: {0}")]
    UnknownSource(String),

    #[error("Catalog store unavailable: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
