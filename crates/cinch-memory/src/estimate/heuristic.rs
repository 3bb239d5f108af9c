//! Character-ratio token estimation.
//!
//! Good enough for budgeting when no tokenizer is available for the target
//! model. Errs on the high side: partial tokens round up.

use super::{DEFAULT_REQUEST_OVERHEAD, TokenEstimator};
use crate::Message;
use crate::error::EstimateError;

/// Default characters per token (conservative estimate for English text).
/// Most tokenizers average 3-4 chars per token; we use 3.5 as a middle ground.
pub const DEFAULT_CHARS_PER_TOKEN: f64 = 3.5;

/// Framing tokens per message (`<|start|>{role}<|message|>...<|end|>`).
const DEFAULT_MESSAGE_OVERHEAD: usize = 3;

/// Estimates tokens from character counts.
///
/// # Example
///
/// ```
/// use cinch_memory::estimate::{CharRatioEstimator, TokenEstimator};
/// use cinch_memory::Message;
///
/// let estimator = CharRatioEstimator::default().with_chars_per_token(4.0);
/// // 3 framing tokens + ceil(("user" + "abcdefgh") / 4)
/// assert_eq!(estimator.estimate_message(&Message::user("abcdefgh")).unwrap(), 6);
/// ```
#[derive(Debug, Clone)]
pub struct CharRatioEstimator {
    chars_per_token: f64,
    message_overhead: usize,
    request_overhead: usize,
}

impl Default for CharRatioEstimator {
    fn default() -> Self {
        Self {
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
            message_overhead: DEFAULT_MESSAGE_OVERHEAD,
            request_overhead: DEFAULT_REQUEST_OVERHEAD,
        }
    }
}

impl CharRatioEstimator {
    /// Create an estimator with a calibrated chars-per-token ratio from
    /// historical API usage data. Pass `None` to use the default.
    pub fn with_calibration(calibrated_cpt: Option<f64>) -> Self {
        Self::default().with_chars_per_token(calibrated_cpt.unwrap_or(DEFAULT_CHARS_PER_TOKEN))
    }

    /// Override the chars-per-token ratio. Non-positive or non-finite ratios
    /// fall back to [`DEFAULT_CHARS_PER_TOKEN`].
    pub fn with_chars_per_token(mut self, cpt: f64) -> Self {
        self.chars_per_token = if cpt.is_finite() && cpt > 0.0 {
            cpt
        } else {
            DEFAULT_CHARS_PER_TOKEN
        };
        self
    }

    /// Override the per-message framing cost.
    pub fn with_message_overhead(mut self, tokens: usize) -> Self {
        self.message_overhead = tokens;
        self
    }

    /// Override the per-request cost.
    pub fn with_request_overhead(mut self, tokens: usize) -> Self {
        self.request_overhead = tokens;
        self
    }

    /// The chars-per-token ratio in use.
    pub fn chars_per_token(&self) -> f64 {
        self.chars_per_token
    }

    fn tokens_for_chars(&self, chars: usize) -> usize {
        (chars as f64 / self.chars_per_token).ceil() as usize
    }
}

/// Characters a message contributes on the wire, excluding framing.
fn message_chars(message: &Message) -> usize {
    let content = message.content.as_ref().map_or(0, |c| c.len());
    let call_id = message.tool_call_id.as_ref().map_or(0, |id| id.len());
    let calls: usize = message
        .tool_calls
        .iter()
        .flatten()
        .map(|c| c.id.len() + c.function.name.len() + c.function.arguments.len())
        .sum();
    message.role.as_str().len() + content + call_id + calls
}

impl TokenEstimator for CharRatioEstimator {
    fn estimate_message(&self, message: &Message) -> Result<usize, EstimateError> {
        Ok(self.message_overhead + self.tokens_for_chars(message_chars(message)))
    }

    fn request_overhead(&self) -> usize {
        self.request_overhead
    }
}
