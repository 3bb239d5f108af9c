//! Token-bounded conversation memory.
//!
//! Keeps the estimated cost of the whole window, request overhead included,
//! at or under `max_tokens` by evicting the oldest non-system messages. The
//! window stays over budget only when nothing evictable is left: the system
//! message and the message just added are never evicted, so a message that
//! alone costs more than the budget is kept. That state is logged, not
//! rejected.

use std::sync::Arc;

use tracing::{debug, trace};

use super::policy::{self, Admission};
use super::{ChatMemory, DEFAULT_MEMORY_ID};
use crate::Message;
use crate::error::{EstimateError, MemoryError, Result};
use crate::estimate::TokenEstimator;

/// A chat memory bounded by estimated token cost.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use cinch_memory::estimate::CharRatioEstimator;
/// use cinch_memory::{ChatMemory, Message, TokenWindowMemory};
///
/// let mut memory = TokenWindowMemory::builder()
///     .id("user-42")
///     .max_tokens(1_000, Arc::new(CharRatioEstimator::default()))
///     .build()?;
///
/// memory.add(Message::system("You are a helpful assistant."))?;
/// memory.add(Message::user("Hello!"))?;
/// assert_eq!(memory.messages().len(), 2);
/// # Ok::<(), cinch_memory::MemoryError>(())
/// ```
pub struct TokenWindowMemory {
    id: String,
    max_tokens: usize,
    estimator: Arc<dyn TokenEstimator>,
    messages: Vec<Message>,
}

impl std::fmt::Debug for TokenWindowMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenWindowMemory")
            .field("id", &self.id)
            .field("max_tokens", &self.max_tokens)
            .field("messages", &self.messages)
            .finish_non_exhaustive()
    }
}

impl TokenWindowMemory {
    /// Start building a memory.
    pub fn builder() -> TokenWindowMemoryBuilder {
        TokenWindowMemoryBuilder::default()
    }

    /// Memory with the default id and the given budget.
    pub fn with_max_tokens(max_tokens: usize, estimator: Arc<dyn TokenEstimator>) -> Result<Self> {
        Self::builder().max_tokens(max_tokens, estimator).build()
    }

    /// The token budget.
    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Number of messages currently held.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Estimated cost of the current window, as it would be submitted.
    pub fn estimated_tokens(&self) -> Result<usize> {
        Ok(self.estimator.estimate_messages(&self.messages)?)
    }

    /// Snapshot of current usage against the budget.
    pub fn usage(&self) -> Result<WindowUsage> {
        let estimated_tokens = self.estimated_tokens()?;
        Ok(WindowUsage {
            estimated_tokens,
            max_tokens: self.max_tokens,
            usage_pct: estimated_tokens as f64 / self.max_tokens as f64,
            message_count: self.messages.len(),
        })
    }
}

impl ChatMemory for TokenWindowMemory {
    fn id(&self) -> &str {
        &self.id
    }

    /// Admit `message` and evict until the window fits.
    ///
    /// Work happens on a copy of the window that is committed only once
    /// pricing succeeds, so an estimator error leaves the memory unchanged.
    fn add(&mut self, message: Message) -> Result<()> {
        let mut candidate = self.messages.clone();

        match policy::admit(&mut candidate, message) {
            Admission::Duplicate => return Ok(()),
            Admission::Appended {
                replaced: Some(old),
            } => debug!(
                "memory '{}': system message replaced ({} chars dropped)",
                self.id,
                old.content.as_ref().map_or(0, |c| c.len())
            ),
            Admission::Appended { replaced: None } => {}
        }

        let max_tokens = self.max_tokens;
        let estimator = &self.estimator;
        let evicted = policy::evict_while(&mut candidate, |window| {
            let tokens = estimator.estimate_messages(window)?;
            trace!(
                "window priced at {tokens}/{max_tokens} tokens ({} messages)",
                window.len()
            );
            Ok::<bool, EstimateError>(tokens > max_tokens)
        })?;

        if !evicted.is_empty() {
            debug!(
                "memory '{}': evicted {} message(s), {} remain",
                self.id,
                evicted.len(),
                candidate.len()
            );
        }

        self.messages = candidate;
        Ok(())
    }

    fn messages(&self) -> Vec<Message> {
        self.messages.clone()
    }

    fn clear(&mut self) {
        self.messages.clear();
    }
}

/// Builder for [`TokenWindowMemory`].
#[derive(Default)]
pub struct TokenWindowMemoryBuilder {
    id: Option<String>,
    max_tokens: Option<usize>,
    estimator: Option<Arc<dyn TokenEstimator>>,
}

impl TokenWindowMemoryBuilder {
    /// Lookup key for the memory. Default: [`DEFAULT_MEMORY_ID`].
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Token budget and the estimator that prices against it. Required.
    pub fn max_tokens(mut self, max_tokens: usize, estimator: Arc<dyn TokenEstimator>) -> Self {
        self.max_tokens = Some(max_tokens);
        self.estimator = Some(estimator);
        self
    }

    /// Validate and build. Fails on a missing or zero budget.
    pub fn build(self) -> Result<TokenWindowMemory> {
        let (Some(max_tokens), Some(estimator)) = (self.max_tokens, self.estimator) else {
            return Err(MemoryError::Config(
                "max_tokens and a token estimator are required".into(),
            ));
        };
        if max_tokens == 0 {
            return Err(MemoryError::Config(
                "max_tokens must be greater than 0".into(),
            ));
        }

        Ok(TokenWindowMemory {
            id: self.id.unwrap_or_else(|| DEFAULT_MEMORY_ID.to_string()),
            max_tokens,
            estimator,
            messages: Vec::new(),
        })
    }
}

/// Snapshot of window usage at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowUsage {
    /// Estimated tokens of the window, request overhead included.
    pub estimated_tokens: usize,
    /// Token budget.
    pub max_tokens: usize,
    /// Usage as a fraction (0.0 to 1.0+; above 1.0 only when protected
    /// messages alone exceed the budget).
    pub usage_pct: f64,
    /// Messages held.
    pub message_count: usize,
}

impl WindowUsage {
    /// Whether the window exceeds its budget.
    pub fn is_over_budget(&self) -> bool {
        self.estimated_tokens > self.max_tokens
    }

    /// Format as a short log-friendly string.
    pub fn to_log_string(&self) -> String {
        format!(
            "window: {} messages, ~{} tokens ({:.0}% of {})",
            self.message_count,
            self.estimated_tokens,
            self.usage_pct * 100.0,
            self.max_tokens,
        )
    }
}
