use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{sync::mpsc, time::sleep};
use url::Url;

use super::{ElementHandle, HostPage, PageError, PageEvent};
use crate::{config::BridgeConfig, infrastructure::shutdown::ShutdownListener};

const EXECUTE_TIMEOUT: Duration = Duration::from_secs(30);
const EVENT_RETRY_DELAY: Duration = Duration::from_secs(1);
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Production [`HostPage`] backed by a Playwright-style automation
/// sidecar. Every operation is a JSON POST to `{base}/execute`; DOM
/// mutations and manual-control clicks arrive by long-polling
/// `{base}/events`.
#[derive(Clone)]
pub struct SidecarPage {
    client: reqwest::Client,
    config: BridgeConfig,
}

#[derive(Debug, Deserialize)]
struct BridgeEnvelope {
    success: bool,
    #[serde(default)]
    result: Value,
    error: Option<String>,
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventBatch {
    #[serde(default)]
    events: Vec<EventRecord>,
}

#[derive(Debug, Deserialize)]
struct EventRecord {
    kind: String,
    element: Option<String>,
}

impl SidecarPage {
    pub fn new(client: reqwest::Client, config: BridgeConfig) -> Self {
        Self { client, config }
    }

    pub async fn health(&self) -> Result<(), PageError> {
        let url = format!("{}/health", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|err| PageError::Unavailable(err.to_string()))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(PageError::Unavailable(format!(
                "bridge health returned HTTP {}",
                response.status()
            )))
        }
    }

    /// Start forwarding bridge events into an mpsc channel. The polling
    /// task stops when the receiver is dropped or shutdown triggers.
    pub fn spawn_event_stream(&self, mut shutdown: ShutdownListener) -> mpsc::Receiver<PageEvent> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let page = self.clone();
        tokio::spawn(async move {
            loop {
                if shutdown.is_triggered() {
                    break;
                }
                let batch = tokio::select! {
                    res = page.poll_events() => res,
                    _ = shutdown.notified() => break,
                };
                let records = match batch {
                    Ok(records) => records,
                    Err(err) => {
                        tracing::debug!(target: "page", error = %err, "event poll failed");
                        sleep(EVENT_RETRY_DELAY).await;
                        continue;
                    }
                };
                for record in records {
                    let event = match (record.kind.as_str(), record.element) {
                        ("mutation", _) => PageEvent::Mutation,
                        ("manual_action", Some(id)) => PageEvent::ManualAction {
                            element: ElementHandle(id),
                        },
                        (kind, _) => {
                            tracing::debug!(target: "page", kind, "ignoring unknown event kind");
                            continue;
                        }
                    };
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
            }
        });
        rx
    }

    async fn poll_events(&self) -> Result<Vec<EventRecord>, PageError> {
        let url = format!("{}/events", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(self.config.event_poll_timeout + Duration::from_secs(5))
            .send()
            .await
            .map_err(|err| PageError::Unavailable(err.to_string()))?;
        if !response.status().is_success() {
            return Err(PageError::Bridge(format!(
                "event poll returned HTTP {}",
                response.status()
            )));
        }
        let batch: EventBatch = response
            .json()
            .await
            .map_err(|err| PageError::Bridge(err.to_string()))?;
        Ok(batch.events)
    }

    async fn execute(&self, action: &str, mut params: Value) -> Result<Value, PageError> {
        params["action"] = json!(action);
        let url = format!("{}/execute", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .json(&params)
            .timeout(EXECUTE_TIMEOUT)
            .send()
            .await
            .map_err(|err| PageError::Unavailable(err.to_string()))?;
        if !response.status().is_success() {
            return Err(PageError::Bridge(format!(
                "bridge returned HTTP {}",
                response.status()
            )));
        }
        let envelope: BridgeEnvelope = response
            .json()
            .await
            .map_err(|err| PageError::Bridge(err.to_string()))?;
        if envelope.success {
            return Ok(envelope.result);
        }
        if envelope.code.as_deref() == Some("stale") {
            return Err(PageError::Stale);
        }
        Err(PageError::Bridge(
            envelope
                .error
                .unwrap_or_else(|| "bridge reported failure with no message".to_string()),
        ))
    }

    fn elements_from(result: Value) -> Result<Vec<ElementHandle>, PageError> {
        let ids = result
            .get("elements")
            .and_then(Value::as_array)
            .ok_or_else(|| PageError::Bridge("missing elements in bridge result".to_string()))?;
        Ok(ids
            .iter()
            .filter_map(Value::as_str)
            .map(ElementHandle::new)
            .collect())
    }
}

#[async_trait]
impl HostPage for SidecarPage {
    async fn url(&self) -> Result<Url, PageError> {
        let result = self.execute("url", json!({})).await?;
        let raw = result
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| PageError::Bridge("missing url in bridge result".to_string()))?;
        Url::parse(raw).map_err(|err| PageError::Bridge(err.to_string()))
    }

    async fn query(&self, selector: &str) -> Result<Vec<ElementHandle>, PageError> {
        let result = self.execute("query", json!({ "selector": selector })).await?;
        Self::elements_from(result)
    }

    async fn query_within(
        &self,
        scope: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, PageError> {
        let result = self
            .execute(
                "query_within",
                json!({ "element": scope.0, "selector": selector }),
            )
            .await?;
        Self::elements_from(result)
    }

    async fn parent(&self, element: &ElementHandle) -> Result<Option<ElementHandle>, PageError> {
        let result = self.execute("parent", json!({ "element": element.0 })).await?;
        Ok(result
            .get("element")
            .and_then(Value::as_str)
            .map(ElementHandle::new))
    }

    async fn inner_text(&self, element: &ElementHandle) -> Result<String, PageError> {
        let result = self.execute("text", json!({ "element": element.0 })).await?;
        Ok(result
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), PageError> {
        self.execute("click", json!({ "element": element.0 })).await?;
        Ok(())
    }

    async fn hover(&self, element: &ElementHandle) -> Result<(), PageError> {
        self.execute("hover", json!({ "element": element.0 })).await?;
        Ok(())
    }

    async fn send_keys(&self, keys: &str) -> Result<(), PageError> {
        self.execute("keys", json!({ "keys": keys })).await?;
        Ok(())
    }

    async fn open_context_menu(&self, element: &ElementHandle) -> Result<(), PageError> {
        self.execute("context_menu", json!({ "element": element.0 }))
            .await?;
        Ok(())
    }

    async fn apply_highlight(
        &self,
        element: &ElementHandle,
        confidence: f64,
    ) -> Result<(), PageError> {
        self.execute(
            "highlight",
            json!({ "element": element.0, "confidence": confidence }),
        )
        .await?;
        Ok(())
    }

    async fn set_control_busy(
        &self,
        element: &ElementHandle,
        busy: bool,
    ) -> Result<(), PageError> {
        self.execute(
            "control_busy",
            json!({ "element": element.0, "busy": busy }),
        )
        .await?;
        Ok(())
    }
}
