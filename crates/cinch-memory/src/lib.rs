//! Token-bounded conversation memory for LLM agents.
//!
//! `cinch-memory` holds the ordered messages that will be submitted to a model
//! and keeps their estimated token cost within a budget. The core abstraction
//! is the [`TokenWindowMemory`]: add messages as the conversation unfolds and
//! it evicts the oldest ones so that the window always fits.
//!
//! # Getting started
//!
//! ```
//! use std::sync::Arc;
//! use cinch_memory::prelude::*;
//!
//! let estimator = Arc::new(CharRatioEstimator::default());
//! let mut memory = TokenWindowMemory::with_max_tokens(2_000, estimator)?;
//!
//! memory.add(Message::system("You are a helpful coding assistant."))?;
//! memory.add(Message::user("Read src/main.rs and summarize it."))?;
//!
//! let usage = memory.usage()?;
//! println!("{}", usage.to_log_string());
//! assert!(!usage.is_over_budget());
//! # Ok::<(), MemoryError>(())
//! ```
//!
//! # Where to find things
//!
//! If you're looking for how to...
//!
//! - **Bound a conversation by tokens:** see [`TokenWindowMemory`] and its
//!   [builder](TokenWindowMemory::builder). [`WindowUsage`] reports how full
//!   the window is.
//!
//! - **Bound a conversation by turns:** see [`MessageWindowMemory`]. Same
//!   rules, message-count capacity.
//!
//! - **Price messages:** implement [`TokenEstimator`](estimate::TokenEstimator),
//!   or use [`CharRatioEstimator`](estimate::CharRatioEstimator) (heuristic) or
//!   [`OpenAiEstimator`](estimate::OpenAiEstimator) (`tiktoken-rs`).
//!
//! - **Share a memory between threads:** wrap it in [`SharedMemory`].
//!
//! - **Configure from a file:** see [`WindowConfig`](config::WindowConfig).
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`memory`] | [`ChatMemory`] trait, token and message windows, shared handle |
//! | [`estimate`] | [`TokenEstimator`](estimate::TokenEstimator) trait and built-in estimators |
//! | [`config`] | [`WindowConfig`](config::WindowConfig), JSON loading |
//! | [`message`] | [`Message`], [`MessageRole`], tool call types |
//! | [`error`] | [`MemoryError`], [`EstimateError`] |
//!
//! # Window rules
//!
//! 1. **One system message.** Adding the system message already held is a
//!    no-op. Adding a different one removes the old one and appends the new
//!    one at the tail.
//!
//! 2. **Oldest first.** Over capacity, the oldest non-system message is
//!    evicted, repeatedly, until the window fits. Survivors keep their order.
//!
//! 3. **Protected messages stay.** The system message and the message just
//!    added are never evicted for space. If they alone exceed the budget the
//!    window is left over budget and a warning is logged.
//!
//! 4. **Tool calls leave with their results.** Evicting an assistant message
//!    that requested tools also evicts the tool results answering it, even
//!    if the window would fit without that. The message just added stays.

pub mod config;
pub mod error;
pub mod estimate;
pub mod memory;
pub mod message;
pub mod prelude;

pub use error::{EstimateError, MemoryError, Result};
pub use memory::{
    ChatMemory, DEFAULT_MEMORY_ID, MessageWindowMemory, SharedMemory, TokenWindowMemory,
    WindowUsage,
};
pub use message::{CallType, FunctionCallData, Message, MessageRole, ToolCall};
