use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Missing field '{field}' on issue {issue_key}")]
    MissingField { issue_key: String, field: String },

    #[error("Pagination stopped after {pages} pages ({retrieved} of {total} issues retrieved)")]
    PaginationLimit { pages: u32, retrieved: usize, total: u32 },

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// 失敗の分類（レポート診断で使用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// 到達不能、非2xx、タイムアウト
    Transport,
    /// 不正なJSON、必須フィールドの欠落
    Parse,
    /// 日付形式の不一致
    DateFormat,
    Other,
}

impl Error {
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::RequestFailed(e) if e.is_decode() => FailureKind::Parse,
            Error::RequestFailed(_) | Error::ApiError { .. } => FailureKind::Transport,
            Error::JsonParsing(_) | Error::MissingField { .. } | Error::PaginationLimit { .. } => {
                FailureKind::Parse
            }
            Error::InvalidDate(_) => FailureKind::DateFormat,
            _ => FailureKind::Other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
