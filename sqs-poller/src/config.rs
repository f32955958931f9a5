/// Number of messages requested per receive call when left unset.
///
/// This is also the ceiling SQS itself enforces on a single receive.
pub const DEFAULT_MAX_NUMBER_OF_MESSAGES: i32 = 10;

/// Long-poll wait, in seconds, used when left unset.
pub const DEFAULT_WAIT_TIME_SECONDS: i32 = 20;

/// Worker configuration.
///
/// Numeric fields left at zero are replaced with their defaults when the
/// worker is created. Values are passed to the queue as-is; any clamping to
/// the service limits is up to the queue client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Name of the queue to poll.
    pub queue_name: String,
    /// Maximum number of messages per receive call.
    pub max_number_of_messages: i32,
    /// Long-poll wait, in seconds.
    pub wait_time_seconds: i32,

    queue_url: String,
}

impl Config {
    /// Config for `queue_name` with every other field unset.
    pub fn new(queue_name: impl Into<String>) -> Self {
        Self {
            queue_name: queue_name.into(),
            ..Default::default()
        }
    }

    /// Set the batch size; 0 selects the default.
    pub fn with_max_number_of_messages(mut self, max_number_of_messages: i32) -> Self {
        self.max_number_of_messages = max_number_of_messages;
        self
    }

    /// Set the long-poll wait; 0 selects the default.
    pub fn with_wait_time_seconds(mut self, wait_time_seconds: i32) -> Self {
        self.wait_time_seconds = wait_time_seconds;
        self
    }

    /// The queue URL resolved from [`Config::queue_name`].
    ///
    /// Empty until the config has been handed to [`crate::Worker::new`].
    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }

    pub(crate) fn set_queue_url(&mut self, queue_url: String) {
        self.queue_url = queue_url;
    }

    /// Replace unset (zero) values with their defaults.
    pub(crate) fn populate_default_values(&mut self) {
        if self.max_number_of_messages == 0 {
            self.max_number_of_messages = DEFAULT_MAX_NUMBER_OF_MESSAGES;
        }

        if self.wait_time_seconds == 0 {
            self.wait_time_seconds = DEFAULT_WAIT_TIME_SECONDS;
        }
    }
}
