//! Core domain types and service traits for BuildNotify
//!
//! This module defines the data structures passed between the registry, the
//! template expander and the dispatcher, together with the trait contracts
//! that external collaborators (token providers, publishers, log sinks)
//! implement.

use crate::activity::ActivityEntry;
use crate::publisher::PublishError;
use crate::tokens::TokenError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Provider-side credential for a room.
///
/// `Debug` and `Display` never print the secret.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomToken(String);

impl RoomToken {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Returns the raw credential. Only the publisher should need this.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for RoomToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RoomToken([REDACTED])")
    }
}

impl fmt::Display for RoomToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// A named destination in the messaging space.
///
/// Not serializable; rooms are only ever read from [`crate::config::RoomConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    name: String,
    room_id: String,
    token: RoomToken,
}

impl Room {
    pub fn new(
        name: impl Into<String>,
        room_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            room_id: room_id.into(),
            token: RoomToken::new(token),
        }
    }

    /// The user-facing name, compared case-insensitively by the registry.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The opaque provider-side destination identifier.
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn token(&self) -> &RoomToken {
        &self.token
    }

    /// Returns true if `other` names this room, ignoring case.
    pub fn is_named(&self, other: &str) -> bool {
        self.name.to_lowercase() == other.to_lowercase()
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Room[name={}, room_id={}]", self.name, self.room_id)
    }
}

/// Outcome of the build that triggered the notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildStatus {
    #[default]
    Success,
    Unstable,
    Failure,
    NotBuilt,
    Aborted,
}

impl BuildStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildStatus::Success => "SUCCESS",
            BuildStatus::Unstable => "UNSTABLE",
            BuildStatus::Failure => "FAILURE",
            BuildStatus::NotBuilt => "NOT_BUILT",
            BuildStatus::Aborted => "ABORTED",
        }
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "SUCCESS" => Ok(BuildStatus::Success),
            "UNSTABLE" => Ok(BuildStatus::Unstable),
            "FAILURE" => Ok(BuildStatus::Failure),
            "NOT_BUILT" => Ok(BuildStatus::NotBuilt),
            "ABORTED" => Ok(BuildStatus::Aborted),
            other => Err(anyhow::anyhow!("unknown build status: {}", other)),
        }
    }
}

/// Build metadata available to token providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BuildContext {
    pub status: BuildStatus,
    pub job_name: String,
    pub build_number: u64,
    pub job_url: String,
    pub build_url: Option<String>,
    /// Build parameters and any other values a provider may need.
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

/// One notification attempt, built from stored job configuration when a build completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub disabled: bool,
    pub room_name: String,
    pub raw_template: String,
}

impl NotificationRequest {
    pub fn new(room_name: impl Into<String>, raw_template: impl Into<String>) -> Self {
        Self {
            disabled: false,
            room_name: room_name.into(),
            raw_template: raw_template.into(),
        }
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

/// Terminal state of a dispatch run. Every run starts idle and ends in one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Skipped,
    Failed,
    Sent,
}

impl DispatchState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchState::Skipped => "skipped",
            DispatchState::Failed => "failed",
            DispatchState::Sent => "sent",
        }
    }
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Service Traits
// =============================================================================

/// Resolves named placeholders against a build context.
pub trait TokenProvider: Send + Sync {
    /// A short name for logging.
    fn name(&self) -> &str;

    /// Resolves a placeholder name.
    ///
    /// # Returns
    /// * `Ok(Some(value))` if this provider recognises `token`
    /// * `Ok(None)` if it does not, so the next provider is tried
    /// * `Err` if it recognises `token` but failed to produce a value
    fn resolve(&self, token: &str, context: &BuildContext) -> Result<Option<String>, TokenError>;
}

/// Sends a message to a room on the external messaging provider.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// A short name for logging (e.g. "http", "dry-run").
    fn name(&self) -> &str;

    /// Delivers `text` to `room`.
    ///
    /// # Returns
    /// * `Ok(())` if the provider accepted the message
    /// * `Err` for any transport failure, timeout or rejected request
    async fn sent(&self, room: &Room, text: &str) -> Result<(), PublishError>;
}

/// Append-only destination for dispatch stage markers.
pub trait ActivitySink: Send + Sync {
    fn record(&self, entry: ActivityEntry);
}
