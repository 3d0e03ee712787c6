use thiserror::Error;
use std::num::ParseIntError;

#[derive(Error, Debug)]
pub enum ChartHubError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Date parsing error: {0}")]
    DateError(#[from] chrono::ParseError),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Parse int error: {0}")]
    ParseIntError(#[from] ParseIntError),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

pub type Result<T> = std::result::Result<T, ChartHubError>;

// 用于从字符串创建错误
impl From<String> for ChartHubError {
    fn from(s: String) -> Self {
        ChartHubError::Unknown(s)
    }
}

// 用于从&str创建错误
impl From<&str> for ChartHubError {
    fn from(s: &str) -> Self {
        ChartHubError::Unknown(s.to_string())
    }
}
