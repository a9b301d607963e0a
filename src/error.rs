use thiserror::Error;

/// Failures a panel load can end in. All of them are caught by the panel
/// that issued the load and turned into a status/table message.
#[derive(Error, Debug)]
pub enum DashError {
    #[error("HTTP {status}")]
    Fetch { status: u16 },

    #[error("JSON 解析失敗: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{0}")]
    Empty(String),

    #[error("連線失敗: {0}")]
    Request(#[from] reqwest::Error),

    #[error("無效的網址: {0}")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, DashError>;

impl DashError {
    pub fn empty(message: impl Into<String>) -> Self {
        DashError::Empty(message.into())
    }

    /// Short tag used in diagnostics entries.
    pub fn kind(&self) -> &'static str {
        match self {
            DashError::Fetch { .. } => "fetch",
            DashError::Parse(_) => "parse",
            DashError::Empty(_) => "empty",
            DashError::Request(_) => "request",
            DashError::InvalidUrl(_) => "url",
        }
    }
}
