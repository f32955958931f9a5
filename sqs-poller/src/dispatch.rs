//! Fan-out of a received batch to the handler.
//!
//! Every message of a batch runs in its own task; [`dispatch_batch`] returns
//! only once all of them have finished. A message is deleted when its
//! handler succeeds or rejects it, and left on the queue otherwise.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::Instrument;

use crate::{
    handler::{Handler, HandlerError},
    message::Message,
    queue::QueueClient,
};

/// What happened to a single message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Handled and deleted.
    Deleted,
    /// Rejected by the handler and deleted.
    Rejected,
    /// The handler failed; the message stays on the queue.
    Retained,
    /// Handled, but the delete call failed. The message will be redelivered.
    DeleteFailed,
}

/// Per-batch tally of message outcomes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub deleted: usize,
    pub rejected: usize,
    pub retained: usize,
    pub delete_failed: usize,
    /// Tasks that panicked before producing an outcome.
    pub panicked: usize,
}

impl BatchReport {
    fn record(&mut self, outcome: MessageOutcome) {
        match outcome {
            MessageOutcome::Deleted => self.deleted += 1,
            MessageOutcome::Rejected => self.rejected += 1,
            MessageOutcome::Retained => self.retained += 1,
            MessageOutcome::DeleteFailed => self.delete_failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.deleted + self.rejected + self.retained + self.delete_failed + self.panicked
    }
}

/// Run the handler on every message concurrently and wait for all of them.
pub async fn dispatch_batch<Q, H>(
    client: &Arc<Q>,
    queue_url: &Arc<str>,
    handler: &Arc<H>,
    messages: Vec<Message>,
) -> BatchReport
where
    Q: QueueClient + Send + Sync + 'static,
    H: Handler + Send + Sync + 'static,
{
    let mut tasks = JoinSet::new();
    for message in messages {
        let client = Arc::clone(client);
        let queue_url = Arc::clone(queue_url);
        let handler = Arc::clone(handler);
        let span = tracing::debug_span!(
            "message",
            message_id = message.message_id.as_deref().unwrap_or_default()
        );

        tasks.spawn(
            async move {
                process_message(client.as_ref(), &queue_url, handler.as_ref(), message).await
            }
            .instrument(span),
        );
    }

    let mut report = BatchReport::default();
    while let Some(res) = tasks.join_next().await {
        match res {
            Ok(outcome) => report.record(outcome),
            Err(e) => {
                tracing::error!(error = %e, "message task did not complete");
                report.panicked += 1;
            }
        }
    }

    report
}

/// Handle a single message and delete it if it was consumed.
pub async fn process_message<Q, H>(
    client: &Q,
    queue_url: &str,
    handler: &H,
    message: Message,
) -> MessageOutcome
where
    Q: QueueClient + Sync,
    H: Handler + Sync,
{
    let rejected = match handler.handle(&message).await {
        Ok(()) => false,
        Err(e @ HandlerError::Rejected { .. }) => {
            tracing::error!(receipt_handle = %message.receipt_handle, error = %e, "message rejected");
            true
        }
        Err(e) => {
            tracing::error!(
                receipt_handle = %message.receipt_handle,
                error = %e,
                "failed to handle message, leaving it on the queue"
            );
            return MessageOutcome::Retained;
        }
    };

    if let Err(e) = client.delete(queue_url, &message.receipt_handle).await {
        tracing::error!(
            receipt_handle = %message.receipt_handle,
            error = %e,
            "failed to delete message from queue"
        );
        return MessageOutcome::DeleteFailed;
    }
    tracing::debug!(receipt_handle = %message.receipt_handle, "deleted message from queue");

    if rejected {
        MessageOutcome::Rejected
    } else {
        MessageOutcome::Deleted
    }
}
