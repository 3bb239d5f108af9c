//! Token estimation: pricing messages the way a provider will bill them.
//!
//! A memory never counts tokens itself. It asks a [`TokenEstimator`] for the
//! price of its whole candidate window and evicts until that price fits.
//!
//! Two estimators ship with the crate:
//!
//! - **[`CharRatioEstimator`]**: character-ratio heuristic, no tokenizer
//!   needed, 3.5 chars/token by default.
//! - **[`OpenAiEstimator`]**: exact BPE counts via `tiktoken-rs`, with the
//!   OpenAI chat framing overheads.

pub mod heuristic;
pub mod openai;

pub use heuristic::{CharRatioEstimator, DEFAULT_CHARS_PER_TOKEN};
pub use openai::OpenAiEstimator;

use crate::Message;
use crate::error::EstimateError;

/// Tokens added once per request for reply priming
/// (`<|start|>assistant<|message|>` in the OpenAI chat format).
pub const DEFAULT_REQUEST_OVERHEAD: usize = 3;

/// Prices messages in tokens.
///
/// Implementors only have to price a single message. The sequence price
/// adds [`request_overhead()`](Self::request_overhead) exactly once, no
/// matter how many messages are priced, so `estimate_messages(&[m])` equals
/// `estimate_message(&m) + request_overhead()`.
///
/// Memories always decide eviction from [`estimate_messages()`](Self::estimate_messages)
/// over the full window, never from a running sum of per-message prices.
pub trait TokenEstimator: Send + Sync {
    /// Price of one message in isolation, including its per-message framing.
    fn estimate_message(&self, message: &Message) -> Result<usize, EstimateError>;

    /// Flat per-request cost, independent of message count.
    fn request_overhead(&self) -> usize {
        DEFAULT_REQUEST_OVERHEAD
    }

    /// Price of an ordered sequence as it would be submitted.
    fn estimate_messages(&self, messages: &[Message]) -> Result<usize, EstimateError> {
        messages
            .iter()
            .try_fold(self.request_overhead(), |total, m| {
                Ok(total + self.estimate_message(m)?)
            })
    }
}
