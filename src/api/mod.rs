pub mod client;
pub mod protocol;
pub mod service;

use thiserror::Error;

pub use client::PredictionClient;
pub use service::{spawn_classifier, ClassifierHandle};

/// Classification failures. None of these abort a scan pass; the
/// affected element simply keeps its `checked` marker and is never
/// highlighted.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("prediction request failed: {0}")]
    Network(String),
    #[error("prediction service returned HTTP {0}")]
    Http(reqwest::StatusCode),
    #[error("malformed prediction payload: {0}")]
    Malformed(String),
    #[error("prediction request timed out")]
    Timeout,
    #[error("classifier service stopped")]
    Closed,
}

impl ServiceError {
    pub(crate) fn from_send(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ServiceError::Timeout
        } else {
            ServiceError::Network(err.to_string())
        }
    }
}
