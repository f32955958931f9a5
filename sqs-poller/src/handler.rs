use std::future::Future;

use thiserror::Error;

use crate::{error::BoxError, message::Message};

/// Outcome of a failed [`Handler::handle`] call.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The message is invalid and must not be retried. It is logged and then
    /// deleted like a successfully handled message.
    #[error("[Invalid Event: {event}] {reason}")]
    Rejected { event: String, reason: String },

    /// Processing failed. The message is left on the queue and will be
    /// redelivered once its visibility timeout expires.
    #[error("{0}")]
    Failed(#[source] BoxError),
}

impl HandlerError {
    pub fn rejected(event: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            event: event.into(),
            reason: reason.into(),
        }
    }

    pub fn failed(err: impl Into<BoxError>) -> Self {
        Self::Failed(err.into())
    }
}

/// Handles each received message.
///
/// Messages of a batch are handled concurrently, so implementations must be
/// safe to call from several tasks at once. Delivery is at-least-once: a
/// message may be handled again after a failure anywhere between the handler
/// returning and the delete call completing.
#[trait_variant::make(Handler: Send)]
pub trait LocalHandler {
    async fn handle(&self, message: &Message) -> Result<(), HandlerError>;
}

/// A [`Handler`] built from a closure. See [`handler_fn`].
#[derive(Clone)]
pub struct HandlerFn<F> {
    f: F,
}

/// Create a [`Handler`] from an async closure taking an owned [`Message`].
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(Message) -> Fut,
    Fut: Future<Output = Result<(), HandlerError>>,
{
    HandlerFn { f }
}

impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Message) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send,
{
    async fn handle(&self, message: &Message) -> Result<(), HandlerError> {
        (self.f)(message.clone()).await
    }
}
