//! Wire types for the external prediction service.
//!
//! `POST /predict` takes `{"text": ...}` and answers
//! `{"is_spam": bool, "confidence": float}`; `GET /health` reports
//! whether the model is loaded.

use serde::{Deserialize, Serialize};

use super::ServiceError;
use crate::domain::Verdict;

#[derive(Debug, Serialize)]
pub struct PredictRequest<'a> {
    pub text: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct PredictResponse {
    pub is_spam: bool,
    pub confidence: f64,
}

#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub model_loaded: bool,
}

pub async fn parse_verdict(response: reqwest::Response) -> Result<Verdict, ServiceError> {
    let payload: PredictResponse = response
        .json()
        .await
        .map_err(|err| ServiceError::Malformed(err.to_string()))?;
    if !(0.0..=1.0).contains(&payload.confidence) {
        return Err(ServiceError::Malformed(format!(
            "confidence {} outside [0, 1]",
            payload.confidence
        )));
    }
    Ok(Verdict {
        is_spam: payload.is_spam,
        confidence: payload.confidence,
    })
}
