use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unexpected status: {0}")]
    Status(reqwest::StatusCode),
    #[error("unexpected content type: {0:?}")]
    ContentType(Option<String>),
    #[error("invalid payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("resource not found")]
    NotFound,
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("state persistence error: {0}")]
    Persist(#[from] std::io::Error),
}
