//! Async request/response channel between the scan pipeline and the
//! network side. Each command carries a oneshot reply slot, so many
//! classifications can be in flight at once with no ordering guarantee.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use super::{PredictionClient, ServiceError};
use crate::{domain::Verdict, infrastructure::shutdown::ShutdownListener};

const COMMAND_CAPACITY: usize = 128;

#[derive(Debug)]
pub enum Command {
    Predict {
        api_url: String,
        text: String,
        reply: oneshot::Sender<Result<Verdict, ServiceError>>,
    },
    CheckApi {
        api_url: String,
        reply: oneshot::Sender<Result<bool, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct ClassifierHandle {
    tx: mpsc::Sender<Command>,
}

impl ClassifierHandle {
    pub async fn classify(&self, api_url: String, text: String) -> Result<Verdict, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Predict { api_url, text, reply })
            .await
            .map_err(|_| ServiceError::Closed)?;
        rx.await.map_err(|_| ServiceError::Closed)?
    }

    pub async fn check_api(&self, api_url: String) -> Result<bool, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::CheckApi { api_url, reply })
            .await
            .map_err(|_| ServiceError::Closed)?;
        rx.await.map_err(|_| ServiceError::Closed)?
    }
}

pub fn spawn_classifier(
    http: reqwest::Client,
    predict_timeout: Duration,
    mut shutdown: ShutdownListener,
) -> ClassifierHandle {
    let (tx, mut rx) = mpsc::channel(COMMAND_CAPACITY);
    tokio::spawn(async move {
        loop {
            let command = tokio::select! {
                cmd = rx.recv() => match cmd {
                    Some(cmd) => cmd,
                    None => break,
                },
                _ = shutdown.notified() => break,
            };
            let http = http.clone();
            tokio::spawn(async move {
                handle_command(http, predict_timeout, command).await;
            });
        }
        tracing::debug!(target: "classifier", "classifier service stopped");
    });
    ClassifierHandle { tx }
}

async fn handle_command(http: reqwest::Client, timeout: Duration, command: Command) {
    match command {
        Command::Predict {
            api_url,
            text,
            reply,
        } => {
            let client = PredictionClient::new(http, api_url, timeout);
            let _ = reply.send(client.classify(&text).await);
        }
        Command::CheckApi { api_url, reply } => {
            let client = PredictionClient::new(http, api_url, timeout);
            let _ = reply.send(client.health().await);
        }
    }
}
