// Errors raised at the edges of the trainer: configuration, persisted strategies and output.
// The learning loop itself never fails.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid card value: {0}")]
    Card(u8),
    #[error("invalid state key: {0:?}")]
    StateKey(String),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("plot error: {0}")]
    Plot(String),
}
