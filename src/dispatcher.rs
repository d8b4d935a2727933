//! Orchestrates a single notification: room lookup, expansion, publish.
//!
//! A dispatch never returns an error. Every failure is written to the
//! activity log and reported through the returned [`DispatchState`], so a
//! broken notification cannot fail the build that triggered it.

use crate::activity::ActivityEntry;
use crate::core::{ActivitySink, BuildContext, DispatchState, NotificationRequest, Publisher, TokenProvider};
use crate::publisher::PublishError;
use crate::registry::RoomRegistry;
use crate::template::{panic_message, TemplateExpander};
use futures::FutureExt;
use std::error::Error;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, info, instrument};

pub struct NotificationDispatcher {
    registry: Arc<RoomRegistry>,
    providers: Vec<Arc<dyn TokenProvider>>,
    publisher: Arc<dyn Publisher>,
}

impl NotificationDispatcher {
    pub fn new(
        registry: Arc<RoomRegistry>,
        providers: Vec<Arc<dyn TokenProvider>>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            registry,
            providers,
            publisher,
        }
    }

    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Runs one notification to completion and returns its terminal state.
    #[instrument(skip_all, fields(room = %request.room_name, publisher = self.publisher.name()))]
    pub async fn dispatch(
        &self,
        request: &NotificationRequest,
        context: &BuildContext,
        sink: &dyn ActivitySink,
    ) -> DispatchState {
        let state = self.run(request, context, sink).await;
        metrics::counter!("notifications_dispatched_total", "outcome" => state.as_str()).increment(1);
        info!(%state, "Notification dispatch finished");
        state
    }

    async fn run(&self, request: &NotificationRequest, context: &BuildContext, sink: &dyn ActivitySink) -> DispatchState {
        if request.disabled {
            sink.record(ActivityEntry::Skipped);
            return DispatchState::Skipped;
        }

        sink.record(ActivityEntry::Start);

        let room = match self.registry.find_by_name(&request.room_name) {
            Ok(room) => room,
            Err(e) => {
                error!(error = %e, "Cannot dispatch notification");
                return Self::fail(sink, e.to_string(), String::new());
            }
        };

        sink.record(ActivityEntry::BeforeExpand(request.raw_template.clone()));
        let text = TemplateExpander::expand(&request.raw_template, context, &self.providers);
        sink.record(ActivityEntry::AfterExpand(text.clone()));

        sink.record(ActivityEntry::PublishBegin(room.to_string()));
        let outcome = AssertUnwindSafe(self.publisher.sent(&room, &text))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(PublishError::Panicked(panic_message(panic.as_ref()))));

        match outcome {
            Ok(()) => {
                sink.record(ActivityEntry::PublishEnd);
                sink.record(ActivityEntry::Finished { success: true });
                DispatchState::Sent
            }
            Err(e) => {
                error!(error = %e, "Failed to publish notification");
                Self::fail(sink, e.to_string(), error_trace(&e))
            }
        }
    }

    fn fail(sink: &dyn ActivitySink, message: String, trace: String) -> DispatchState {
        sink.record(ActivityEntry::Error { message, trace });
        sink.record(ActivityEntry::Finished { success: false });
        DispatchState::Failed
    }
}

/// Renders the `source()` chain of an error, outermost cause first.
pub fn error_trace(err: &(dyn Error + 'static)) -> String {
    let mut causes = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        causes.push(format!("caused by: {}", cause));
        source = cause.source();
    }
    causes.join("; ")
}
