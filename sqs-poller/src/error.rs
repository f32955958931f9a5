use thiserror::Error;

use crate::queue::QueueError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that stop a worker from being created.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to resolve url of queue {queue_name}")]
    ResolveQueueUrl {
        queue_name: String,
        #[source]
        source: QueueError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
