//! Exact token counts for OpenAI-family models via `tiktoken-rs`.
//!
//! Follows the OpenAI cookbook accounting for chat models: every message is
//! framed with 3 tokens plus its role, and every request is primed with 3
//! more for the assistant reply.

use tiktoken_rs::CoreBPE;

use super::{DEFAULT_REQUEST_OVERHEAD, TokenEstimator};
use crate::Message;
use crate::error::EstimateError;

/// Framing tokens per message.
const TOKENS_PER_MESSAGE: usize = 3;

/// Framing tokens per tool call (`{"id":..,"type":"function","function":{..}}`).
const TOKENS_PER_TOOL_CALL: usize = 3;

/// BPE-backed estimator for a specific model.
pub struct OpenAiEstimator {
    model: String,
    bpe: CoreBPE,
}

impl std::fmt::Debug for OpenAiEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEstimator")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OpenAiEstimator {
    /// Load the tokenizer for `model` (e.g. `gpt-4o`, `gpt-3.5-turbo`).
    pub fn for_model(model: impl Into<String>) -> Result<Self, EstimateError> {
        let model = model.into();
        let bpe = tiktoken_rs::get_bpe_from_model(&model)
            .map_err(|_| EstimateError::UnknownModel(model.clone()))?;
        Ok(Self { model, bpe })
    }

    /// Model whose tokenizer is loaded.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Tokens in `text`, encoded as plain text. Special-token markup inside
    /// message content is billed as ordinary characters.
    fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        self.bpe.encode_ordinary(text).len()
    }
}

impl TokenEstimator for OpenAiEstimator {
    fn estimate_message(&self, message: &Message) -> Result<usize, EstimateError> {
        let mut tokens = TOKENS_PER_MESSAGE + self.count(message.role.as_str());

        if let Some(ref content) = message.content {
            tokens += self.count(content);
        }
        if let Some(ref id) = message.tool_call_id {
            tokens += self.count(id);
        }
        for call in message.tool_calls.iter().flatten() {
            tokens += TOKENS_PER_TOOL_CALL
                + self.count(&call.id)
                + self.count(&call.function.name)
                + self.count(&call.function.arguments);
        }

        Ok(tokens)
    }

    fn request_overhead(&self) -> usize {
        DEFAULT_REQUEST_OVERHEAD
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToolCall;

    #[test]
    fn unknown_model_is_rejected() {
        let err = OpenAiEstimator::for_model("definitely-not-a-model").unwrap_err();
        assert_eq!(
            err,
            EstimateError::UnknownModel("definitely-not-a-model".into())
        );
    }

    #[test]
    fn single_word_message_matches_cookbook_accounting() {
        let est = OpenAiEstimator::for_model("gpt-3.5-turbo").unwrap();
        assert_eq!(est.model(), "gpt-3.5-turbo");
        // 3 framing + "user" + "hello"
        assert_eq!(est.estimate_message(&Message::user("hello")).unwrap(), 5);
    }

    #[test]
    fn sequence_adds_reply_priming_once() {
        let est = OpenAiEstimator::for_model("gpt-4o").unwrap();
        let m1 = Message::user("hello");
        let m2 = Message::user("world");
        let sum = est.estimate_message(&m1).unwrap() + est.estimate_message(&m2).unwrap();
        assert_eq!(est.estimate_messages(&[m1, m2]).unwrap(), sum + 3);
    }

    #[test]
    fn special_token_markup_is_counted_as_text() {
        let est = OpenAiEstimator::for_model("gpt-4o").unwrap();
        // As a special token this would be 3 framing + "user" + 1.
        let tokens = est
            .estimate_message(&Message::user("<|endoftext|>"))
            .unwrap();
        assert!(tokens > 5, "got {tokens}");
    }

    #[test]
    fn tool_calls_cost_more_than_empty_assistant() {
        let est = OpenAiEstimator::for_model("gpt-4o").unwrap();
        let bare = Message::assistant_tool_calls(vec![]);
        let call = Message::assistant_tool_calls(vec![ToolCall::function(
            "call_abc",
            "read_file",
            r#"{"path":"README.md"}"#,
        )]);
        assert!(est.estimate_message(&call).unwrap() > est.estimate_message(&bare).unwrap());
    }
}
