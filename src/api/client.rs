use std::time::Duration;

use reqwest::Client;

use super::{
    protocol::{self, HealthResponse, PredictRequest},
    ServiceError,
};
use crate::domain::Verdict;

#[derive(Clone)]
pub struct PredictionClient {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl PredictionClient {
    pub fn new(http: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            timeout,
        }
    }

    pub async fn classify(&self, text: &str) -> Result<Verdict, ServiceError> {
        let response = self
            .http
            .post(format!("{}/predict", self.base_url))
            .json(&PredictRequest { text })
            .timeout(self.timeout)
            .send()
            .await
            .map_err(ServiceError::from_send)?;
        if !response.status().is_success() {
            return Err(ServiceError::Http(response.status()));
        }
        protocol::parse_verdict(response).await
    }

    pub async fn health(&self) -> Result<bool, ServiceError> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(ServiceError::from_send)?;
        if !response.status().is_success() {
            return Err(ServiceError::Http(response.status()));
        }
        let payload: HealthResponse = response
            .json()
            .await
            .map_err(|err| ServiceError::Malformed(err.to_string()))?;
        Ok(payload.status == "healthy" && payload.model_loaded)
    }
}
