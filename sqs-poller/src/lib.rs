//! sqs-poller is a library that continuously polls an SQS queue and hands
//! every received message to a handler.
//!
//! * Messages of a batch are handled concurrently; the next batch is only
//!   requested once the whole batch has finished.
//! * When a handler succeeds, or rejects the message as invalid, the message
//!   is deleted from the queue. Any other failure leaves it on the queue for
//!   redelivery.
//! * Polling stops cooperatively on a shutdown signal, after the current
//!   batch.

mod error;

pub mod config;
pub mod dispatch;
pub mod handler;
pub mod message;
pub mod queue;
pub mod shutdown;
pub mod worker;

pub use config::Config;
pub use dispatch::{BatchReport, MessageOutcome};
pub use error::{BoxError, Error, Result};
pub use handler::{handler_fn, Handler, HandlerError, HandlerFn};
pub use message::Message;
pub use queue::{Deadline, QueueClient, QueueError};
pub use shutdown::{ShutdownSignal, ShutdownTrigger};
pub use worker::{WithGracefulShutdown, Worker};
