use thiserror::Error;

pub type HexbotResult<T> = std::result::Result<T, HexbotError>;

#[derive(Debug, Error)]
pub enum HexbotError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("hexbot answered with status {0}")]
    Status(reqwest::StatusCode),

    #[error("response body is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("invalid hex color {0:?}")]
    InvalidHex(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl HexbotError {
    /// Transport-level failures, as opposed to a body we could not use.
    pub fn is_transport(&self) -> bool {
        matches!(self, HexbotError::Transport(_) | HexbotError::Status(_))
    }
}
