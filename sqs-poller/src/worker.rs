use std::{
    future::{Future, IntoFuture},
    pin::Pin,
    sync::Arc,
};

use crate::{
    config::Config,
    dispatch::dispatch_batch,
    error::{Error, Result},
    handler::Handler,
    queue::QueueClient,
    shutdown::ShutdownSignal,
};

/// Polls a queue and hands every received batch to a [`Handler`].
pub struct Worker<Q> {
    config: Config,
    client: Arc<Q>,
    queue_url: Arc<str>,
}

impl<Q> Worker<Q>
where
    Q: QueueClient + Send + Sync + 'static,
{
    /// Create a worker, resolving the queue URL once.
    ///
    /// Unset (zero) values of `config` are replaced by their defaults.
    pub async fn new(client: Q, mut config: Config) -> Result<Self> {
        config.populate_default_values();

        let queue_url = client
            .resolve_queue_url(&config.queue_name)
            .await
            .map_err(|source| Error::ResolveQueueUrl {
                queue_name: config.queue_name.clone(),
                source,
            })?;
        tracing::debug!(queue_name = %config.queue_name, %queue_url, "resolved queue url");
        config.set_queue_url(queue_url.clone());

        Ok(Self {
            config,
            client: Arc::new(client),
            queue_url: queue_url.into(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn client(&self) -> &Q {
        &self.client
    }

    /// Poll until `shutdown` is triggered.
    ///
    /// The signal is checked before every receive call. Batches are handled
    /// one at a time: the next receive is only issued once every message of
    /// the current batch has finished. Receive errors are logged and the
    /// loop polls again straight away.
    pub async fn start<H>(&self, handler: H, shutdown: ShutdownSignal)
    where
        H: Handler + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);

        loop {
            if shutdown.is_triggered() {
                tracing::info!(queue_url = %self.queue_url, "stopping polling, shutdown signal received");
                return;
            }
            // Receives that complete without waiting would otherwise starve the
            // shutdown watcher on a current-thread runtime.
            tokio::task::yield_now().await;
            tracing::debug!(queue_url = %self.queue_url, "start polling");

            let messages = match self
                .client
                .receive(
                    &self.queue_url,
                    self.config.max_number_of_messages,
                    self.config.wait_time_seconds,
                )
                .await
            {
                Ok(messages) => messages,
                Err(e) => {
                    tracing::error!(queue_url = %self.queue_url, error = %e, "failed to receive messages");
                    continue;
                }
            };

            if messages.is_empty() {
                continue;
            }

            tracing::info!(message_count = messages.len(), "received messages");
            let report = dispatch_batch(&self.client, &self.queue_url, &handler, messages).await;
            tracing::debug!(?report, "finished batch");
        }
    }

    /// Poll until `signal` completes, e.g. `tokio::signal::ctrl_c()`.
    ///
    /// The returned value runs when awaited.
    pub fn with_graceful_shutdown<H, F>(self, handler: H, signal: F) -> WithGracefulShutdown<Q, H, F>
    where
        H: Handler + Send + Sync + 'static,
        F: Future<Output = ()> + Send + 'static,
    {
        WithGracefulShutdown {
            worker: self,
            handler,
            signal,
        }
    }
}

/// Worker with graceful shutdown.
pub struct WithGracefulShutdown<Q, H, F> {
    worker: Worker<Q>,
    handler: H,
    signal: F,
}

impl<Q, H, F> IntoFuture for WithGracefulShutdown<Q, H, F>
where
    Q: QueueClient + Send + Sync + 'static,
    H: Handler + Send + Sync + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    type Output = ();
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        let Self {
            worker,
            handler,
            signal,
        } = self;

        Box::pin(async move {
            let shutdown = ShutdownSignal::from_future(signal);
            worker.start(handler, shutdown).await;
        })
    }
}
