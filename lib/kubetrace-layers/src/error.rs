//! Error types for instrumentation layers

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LayerError>;

#[derive(Error, Debug)]
pub enum LayerError {
    #[error("Metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Metrics output is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("Invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("Failed to install global subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}
