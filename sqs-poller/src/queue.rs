//! Queue transport used by the worker.
//!
//! [`QueueClient`] is the only surface the worker needs from a queue: resolve
//! a queue name, receive a batch and delete a single message. It is
//! implemented for the SQS SDK client, and [`Deadline`] bounds every call of
//! another client with a timeout.

use aws_sdk_sqs::{error::DisplayErrorContext, types::QueueAttributeName, Client};
use std::time::Duration;
use thiserror::Error;

use crate::{error::BoxError, message::Message};

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("failed to get queue url: {0}")]
    GetQueueUrl(#[source] BoxError),

    #[error("no queue url returned for queue {0}")]
    MissingQueueUrl(String),

    #[error("failed to receive messages: {0}")]
    Receive(#[source] BoxError),

    #[error("failed to delete message: {0}")]
    Delete(#[source] BoxError),

    #[error("message {message_id} has no receipt handle")]
    MissingReceiptHandle { message_id: String },

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

/// Minimum interface required from a queue implementation.
///
/// Calls may run concurrently from several tasks; every call carries its own
/// parameters.
#[trait_variant::make(QueueClient: Send)]
pub trait LocalQueueClient {
    /// Resolve a queue name to its URL.
    async fn resolve_queue_url(&self, queue_name: &str) -> Result<String, QueueError>;

    /// Receive up to `max_number_of_messages`, long-polling for at most
    /// `wait_time_seconds`.
    async fn receive(
        &self,
        queue_url: &str,
        max_number_of_messages: i32,
        wait_time_seconds: i32,
    ) -> Result<Vec<Message>, QueueError>;

    /// Delete a single message.
    async fn delete(&self, queue_url: &str, receipt_handle: &str) -> Result<(), QueueError>;
}

fn describe<E: std::error::Error>(err: E) -> BoxError {
    DisplayErrorContext(err).to_string().into()
}

impl QueueClient for Client {
    async fn resolve_queue_url(&self, queue_name: &str) -> Result<String, QueueError> {
        let output = self
            .get_queue_url()
            .queue_name(queue_name)
            .send()
            .await
            .map_err(|e| QueueError::GetQueueUrl(describe(e)))?;

        output
            .queue_url
            .ok_or_else(|| QueueError::MissingQueueUrl(queue_name.to_string()))
    }

    async fn receive(
        &self,
        queue_url: &str,
        max_number_of_messages: i32,
        wait_time_seconds: i32,
    ) -> Result<Vec<Message>, QueueError> {
        let output = self
            .receive_message()
            .queue_url(queue_url)
            .max_number_of_messages(max_number_of_messages)
            .wait_time_seconds(wait_time_seconds)
            .attribute_names(QueueAttributeName::All)
            .message_attribute_names("All")
            .send()
            .await
            .map_err(|e| QueueError::Receive(describe(e)))?;

        let mut messages = Vec::new();
        for message in output.messages.unwrap_or_default() {
            match Message::try_from(message) {
                Ok(message) => messages.push(message),
                // Can't be acknowledged, so it will come back after the visibility timeout.
                Err(e) => tracing::error!(error = %e, "skipping received message"),
            }
        }

        Ok(messages)
    }

    async fn delete(&self, queue_url: &str, receipt_handle: &str) -> Result<(), QueueError> {
        self.delete_message()
            .queue_url(queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| QueueError::Delete(describe(e)))?;

        Ok(())
    }
}

/// Wraps a [`QueueClient`] so that no call waits longer than `limit`.
///
/// The limit applies to receive calls too, so it should exceed the
/// configured long-poll wait.
#[derive(Debug, Clone)]
pub struct Deadline<Q> {
    inner: Q,
    limit: Duration,
}

impl<Q> Deadline<Q> {
    /// Bound every call made through `inner` by `limit`.
    pub fn new(inner: Q, limit: Duration) -> Self {
        Self { inner, limit }
    }

    /// Unwrap the underlying client.
    pub fn into_inner(self) -> Q {
        self.inner
    }

    fn timed_out(&self, operation: &'static str) -> QueueError {
        QueueError::Timeout {
            operation,
            after: self.limit,
        }
    }
}

impl<Q> QueueClient for Deadline<Q>
where
    Q: QueueClient + Sync,
{
    async fn resolve_queue_url(&self, queue_name: &str) -> Result<String, QueueError> {
        tokio::time::timeout(self.limit, self.inner.resolve_queue_url(queue_name))
            .await
            .map_err(|_| self.timed_out("GetQueueUrl"))?
    }

    async fn receive(
        &self,
        queue_url: &str,
        max_number_of_messages: i32,
        wait_time_seconds: i32,
    ) -> Result<Vec<Message>, QueueError> {
        let call = self
            .inner
            .receive(queue_url, max_number_of_messages, wait_time_seconds);
        tokio::time::timeout(self.limit, call)
            .await
            .map_err(|_| self.timed_out("ReceiveMessage"))?
    }

    async fn delete(&self, queue_url: &str, receipt_handle: &str) -> Result<(), QueueError> {
        tokio::time::timeout(self.limit, self.inner.delete(queue_url, receipt_handle))
            .await
            .map_err(|_| self.timed_out("DeleteMessage"))?
    }
}
