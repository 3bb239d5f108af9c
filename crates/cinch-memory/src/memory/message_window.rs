//! Message-count-bounded conversation memory.
//!
//! Same admission and eviction rules as [`TokenWindowMemory`](super::TokenWindowMemory),
//! with capacity measured in messages instead of tokens. Useful when no
//! tokenizer is at hand or the provider limits turns rather than tokens.

use tracing::debug;

use super::policy::{self, Admission};
use super::{ChatMemory, DEFAULT_MEMORY_ID};
use crate::Message;
use crate::error::{MemoryError, Result};

/// A chat memory holding at most `max_messages` messages.
#[derive(Debug, Clone)]
pub struct MessageWindowMemory {
    id: String,
    max_messages: usize,
    messages: Vec<Message>,
}

impl MessageWindowMemory {
    /// Start building a memory.
    pub fn builder() -> MessageWindowMemoryBuilder {
        MessageWindowMemoryBuilder::default()
    }

    /// Memory with the default id and the given capacity.
    pub fn with_max_messages(max_messages: usize) -> Result<Self> {
        Self::builder().max_messages(max_messages).build()
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }
}

impl ChatMemory for MessageWindowMemory {
    fn id(&self) -> &str {
        &self.id
    }

    fn add(&mut self, message: Message) -> Result<()> {
        if policy::admit(&mut self.messages, message) == Admission::Duplicate {
            return Ok(());
        }

        let max = self.max_messages;
        let evicted = policy::evict_while(&mut self.messages, |window| {
            Ok::<bool, std::convert::Infallible>(window.len() > max)
        })
        .unwrap_or_else(|never| match never {});

        if !evicted.is_empty() {
            debug!(
                "memory '{}': evicted {} message(s), {} remain",
                self.id,
                evicted.len(),
                self.messages.len()
            );
        }
        Ok(())
    }

    fn messages(&self) -> Vec<Message> {
        self.messages.clone()
    }

    fn clear(&mut self) {
        self.messages.clear();
    }
}

/// Builder for [`MessageWindowMemory`].
#[derive(Debug, Default)]
pub struct MessageWindowMemoryBuilder {
    id: Option<String>,
    max_messages: Option<usize>,
}

impl MessageWindowMemoryBuilder {
    /// Lookup key for the memory. Default: [`DEFAULT_MEMORY_ID`].
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Maximum number of messages held. Required.
    ///
    /// The system message and the message just added are never evicted, so
    /// with a capacity of 1 a window holding a system message keeps two
    /// messages and logs an over-capacity warning on every `add`.
    pub fn max_messages(mut self, max_messages: usize) -> Self {
        self.max_messages = Some(max_messages);
        self
    }

    pub fn build(self) -> Result<MessageWindowMemory> {
        match self.max_messages {
            None => Err(MemoryError::Config("max_messages is required".into())),
            Some(0) => Err(MemoryError::Config(
                "max_messages must be greater than 0".into(),
            )),
            Some(max_messages) => Ok(MessageWindowMemory {
                id: self.id.unwrap_or_else(|| DEFAULT_MEMORY_ID.to_string()),
                max_messages,
                messages: Vec::new(),
            }),
        }
    }
}
