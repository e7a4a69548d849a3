use std::collections::VecDeque;

use crate::{ChatMessage, DeliveryStatus, Error};

/// Insertion-ordered message log that evicts its oldest entries past a cap.
#[derive(Debug, Clone)]
pub struct ChatLog {
    messages: VecDeque<ChatMessage>,
    capacity: usize,
}

impl Default for ChatLog {
    fn default() -> Self {
        Self::new(100)
    }
}

impl ChatLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Append a message, evicting from the front while over capacity.
    ///
    /// Message ids must be unique among the messages currently held.
    pub fn append(&mut self, message: ChatMessage) -> Result<(), Error> {
        if self.get(&message.id).is_some() {
            return Err(Error::DuplicateMessageId(message.id));
        }
        self.messages.push_back(message);
        while self.messages.len() > self.capacity {
            self.messages.pop_front();
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Update the delivery status of the message with the given id.
    pub fn set_status(&mut self, id: &str, status: DeliveryStatus) -> Result<(), Error> {
        let message = self
            .messages
            .iter_mut()
            .find(|message| message.id == id)
            .ok_or_else(|| Error::UnknownMessageId(id.to_string()))?;
        message.status = status;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&ChatMessage> {
        self.messages.iter().find(|message| message.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    /// Snapshot of the log, oldest first.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.messages.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
