//! Publishers with scripted behaviour for dispatcher tests.

use async_trait::async_trait;
use buildnotify::core::{Publisher, Room};
use buildnotify::publisher::PublishError;
use std::sync::{Arc, Mutex};

/// Records every message it is asked to send.
#[derive(Clone, Debug, Default)]
pub struct RecordingPublisher {
    pub sent: Arc<Mutex<Vec<(Room, String)>>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_messages(&self) -> Vec<(Room, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    fn name(&self) -> &str {
        "recording_mock"
    }

    async fn sent(&self, room: &Room, text: &str) -> Result<(), PublishError> {
        self.sent.lock().unwrap().push((room.clone(), text.to_string()));
        Ok(())
    }
}

/// How a [`FailingPublisher`] fails.
#[derive(Clone, Copy, Debug)]
pub enum Failure {
    Rejected,
    Io,
    Panic,
}

/// Fails every send, counting the attempts.
#[derive(Clone, Debug)]
pub struct FailingPublisher {
    pub failure: Failure,
    pub attempts: Arc<Mutex<usize>>,
}

impl FailingPublisher {
    pub fn new(failure: Failure) -> Self {
        Self {
            failure,
            attempts: Arc::new(Mutex::new(0)),
        }
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl Publisher for FailingPublisher {
    fn name(&self) -> &str {
        "failing_mock"
    }

    async fn sent(&self, _room: &Room, _text: &str) -> Result<(), PublishError> {
        *self.attempts.lock().unwrap() += 1;
        match self.failure {
            Failure::Rejected => Err(PublishError::Rejected {
                status: 503,
                body: "service unavailable".to_string(),
            }),
            Failure::Io => {
                let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset by peer");
                Err(PublishError::Other(anyhow::Error::new(io).context("posting message")))
            }
            Failure::Panic => panic!("publisher exploded"),
        }
    }
}
