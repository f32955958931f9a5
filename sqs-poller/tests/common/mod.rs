#![allow(dead_code)]

use std::{
    collections::{HashSet, VecDeque},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use serde::Deserialize;
use sqs_poller::{Handler, HandlerError, Message, QueueClient, QueueError, ShutdownTrigger};
use tokio::sync::Barrier;

pub const REGION: &str = "eu-west-1";
pub const QUEUE_NAME: &str = "my-sqs-queue";
pub const QUEUE_URL: &str = "https://sqs.eu-west-1.amazonaws.com/123456789/my-sqs-queue";

/// In-memory queue that serves pre-loaded batches, then raises the shutdown
/// trigger once it runs dry.
#[derive(Default)]
pub struct FakeQueue {
    fail_resolve: bool,
    fail_delete: HashSet<String>,
    batches: Mutex<VecDeque<Result<Vec<Message>, QueueError>>>,
    receives: Mutex<Vec<(String, i32, i32)>>,
    deleted: Mutex<Vec<(String, String)>>,
    trigger: Mutex<Option<ShutdownTrigger>>,
    in_flight: Arc<AtomicUsize>,
    received_while_busy: AtomicBool,
}

impl FakeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_resolve() -> Self {
        Self {
            fail_resolve: true,
            ..Default::default()
        }
    }

    pub fn with_batch(self, batch: Vec<Message>) -> Self {
        self.batches.lock().unwrap().push_back(Ok(batch));
        self
    }

    pub fn with_receive_error(self) -> Self {
        self.batches
            .lock()
            .unwrap()
            .push_back(Err(QueueError::Receive("connection reset".into())));
        self
    }

    pub fn failing_delete_for(mut self, receipt_handle: &str) -> Self {
        self.fail_delete.insert(receipt_handle.to_string());
        self
    }

    pub fn stop_when_drained(self, trigger: ShutdownTrigger) -> Self {
        *self.trigger.lock().unwrap() = Some(trigger);
        self
    }

    /// Counter the test handler bumps while a message is being handled.
    pub fn in_flight(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.in_flight)
    }

    pub fn receives(&self) -> Vec<(String, i32, i32)> {
        self.receives.lock().unwrap().clone()
    }

    /// `(queue_url, receipt_handle)` of every delete call, in call order.
    pub fn deleted(&self) -> Vec<(String, String)> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn deleted_handles(&self) -> Vec<String> {
        let mut handles: Vec<String> = self.deleted().into_iter().map(|(_, h)| h).collect();
        handles.sort();
        handles
    }

    pub fn received_while_busy(&self) -> bool {
        self.received_while_busy.load(Ordering::SeqCst)
    }
}

impl QueueClient for FakeQueue {
    async fn resolve_queue_url(&self, queue_name: &str) -> Result<String, QueueError> {
        if self.fail_resolve {
            return Err(QueueError::GetQueueUrl("access denied".into()));
        }
        Ok(format!(
            "https://sqs.{}.amazonaws.com/123456789/{}",
            REGION, queue_name
        ))
    }

    async fn receive(
        &self,
        queue_url: &str,
        max_number_of_messages: i32,
        wait_time_seconds: i32,
    ) -> Result<Vec<Message>, QueueError> {
        self.receives.lock().unwrap().push((
            queue_url.to_string(),
            max_number_of_messages,
            wait_time_seconds,
        ));
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            self.received_while_busy.store(true, Ordering::SeqCst);
        }

        let next = self.batches.lock().unwrap().pop_front();
        match next {
            Some(batch) => batch,
            None => {
                if let Some(trigger) = self.trigger.lock().unwrap().as_ref() {
                    trigger.trigger();
                }
                Ok(Vec::new())
            }
        }
    }

    async fn delete(&self, queue_url: &str, receipt_handle: &str) -> Result<(), QueueError> {
        if self.fail_delete.contains(receipt_handle) {
            return Err(QueueError::Delete("throttled".into()));
        }
        self.deleted
            .lock()
            .unwrap()
            .push((queue_url.to_string(), receipt_handle.to_string()));
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct Event {
    pub foo: String,
    pub qux: String,
}

#[derive(Default)]
pub struct HandlerState {
    pub calls: Mutex<Vec<(String, String, String)>>,
    pub max_concurrency: AtomicUsize,
    current: AtomicUsize,
}

/// Handler that parses `{"foo": .., "qux": ..}` bodies and records every
/// call. Bodies `"reject"` and `"fail"` produce the matching errors.
#[derive(Clone)]
pub struct RecordingHandler {
    pub state: Arc<HandlerState>,
    in_flight: Arc<AtomicUsize>,
    barrier: Option<Arc<Barrier>>,
    on_call: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl RecordingHandler {
    pub fn new(in_flight: Arc<AtomicUsize>) -> Self {
        Self {
            state: Arc::default(),
            in_flight,
            barrier: None,
            on_call: None,
        }
    }

    /// Every call waits until `n` calls are running at once.
    pub fn with_barrier(mut self, n: usize) -> Self {
        self.barrier = Some(Arc::new(Barrier::new(n)));
        self
    }

    pub fn on_call(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_call = Some(Arc::new(f));
        self
    }

    pub fn calls(&self) -> Vec<(String, String, String)> {
        let mut calls = self.state.calls.lock().unwrap().clone();
        calls.sort();
        calls
    }

    pub fn max_concurrency(&self) -> usize {
        self.state.max_concurrency.load(Ordering::SeqCst)
    }
}

impl Handler for RecordingHandler {
    async fn handle(&self, message: &Message) -> Result<(), HandlerError> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let current = self.state.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_concurrency.fetch_max(current, Ordering::SeqCst);

        if let Some(on_call) = &self.on_call {
            on_call();
        }
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        tokio::task::yield_now().await;

        let result = match message.body.as_str() {
            "reject" => Err(HandlerError::rejected("test", "bad payload")),
            "fail" => Err(HandlerError::failed("downstream unavailable")),
            body => match serde_json::from_str::<Event>(body) {
                Ok(event) => {
                    self.state.calls.lock().unwrap().push((
                        message.receipt_handle.clone(),
                        event.foo,
                        event.qux,
                    ));
                    Ok(())
                }
                Err(e) => Err(HandlerError::failed(e)),
            },
        };

        self.state.current.fetch_sub(1, Ordering::SeqCst);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

pub fn event_message(receipt_handle: impl ToString) -> Message {
    Message::new(r#"{ "foo": "bar", "qux": "baz" }"#, receipt_handle.to_string())
}
