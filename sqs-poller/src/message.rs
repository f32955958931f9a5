use std::collections::HashMap;

use crate::queue::QueueError;

/// A single delivery of a queue message.
///
/// The receipt handle is only valid for this delivery; a redelivered message
/// carries a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub message_id: Option<String>,
    pub body: String,
    pub receipt_handle: String,
    /// System attributes, e.g. `ApproximateReceiveCount`.
    pub attributes: HashMap<String, String>,
    /// String-valued message attributes set by the producer.
    pub message_attributes: HashMap<String, String>,
}

impl Message {
    /// Message with a body and receipt handle and no id or attributes.
    pub fn new(body: impl Into<String>, receipt_handle: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            receipt_handle: receipt_handle.into(),
            ..Default::default()
        }
    }

    /// Set the message id.
    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    /// Add a system attribute, e.g. `ApproximateReceiveCount`.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

impl TryFrom<aws_sdk_sqs::types::Message> for Message {
    type Error = QueueError;

    fn try_from(message: aws_sdk_sqs::types::Message) -> Result<Self, Self::Error> {
        let receipt_handle = message
            .receipt_handle
            .ok_or_else(|| QueueError::MissingReceiptHandle {
                message_id: message.message_id.clone().unwrap_or_default(),
            })?;

        let attributes = message
            .attributes
            .unwrap_or_default()
            .into_iter()
            .map(|(name, value)| (name.as_str().to_string(), value))
            .collect();

        let message_attributes = message
            .message_attributes
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(name, value)| value.string_value.map(|v| (name, v)))
            .collect();

        Ok(Self {
            message_id: message.message_id,
            body: message.body.unwrap_or_default(),
            receipt_handle,
            attributes,
            message_attributes,
        })
    }
}
