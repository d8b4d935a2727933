//! Publishers that deliver expanded messages to a room.

use crate::config::PublisherConfig;
use crate::core::{Publisher, Room};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, instrument};

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("messaging provider rejected the message: status {status}, body: {body}")]
    Rejected { status: u16, body: String },

    #[error("HTTP request to messaging provider failed")]
    Transport(#[from] reqwest::Error),

    #[error("publisher panicked: {0}")]
    Panicked(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Posts messages to a REST messaging API using each room's bearer token.
pub struct HttpPublisher {
    client: reqwest::Client,
    messages_url: String,
}

impl HttpPublisher {
    /// Creates a new `HttpPublisher`.
    pub fn new(config: &PublisherConfig) -> Result<Self, PublishError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            messages_url: format!("{}/messages", config.api_base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl Publisher for HttpPublisher {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, room, text), fields(room = %room.name(), len = text.len()))]
    async fn sent(&self, room: &Room, text: &str) -> Result<(), PublishError> {
        let payload = json!({ "roomId": room.room_id(), "text": text });

        let response = self
            .client
            .post(&self.messages_url)
            .bearer_auth(room.token().expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP request to messaging provider failed");
                PublishError::Transport(e)
            })?;

        let status = response.status();
        if status.is_success() {
            info!("Message accepted by messaging provider.");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Messaging provider rejected the message");
            Err(PublishError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// Logs messages instead of sending them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingPublisher;

#[async_trait]
impl Publisher for LoggingPublisher {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn sent(&self, room: &Room, text: &str) -> Result<(), PublishError> {
        info!(room = %room, text, "Dry run: message not sent");
        Ok(())
    }
}
