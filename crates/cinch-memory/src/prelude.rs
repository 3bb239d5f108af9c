//! Convenience re-exports for common `cinch-memory` types.
//!
//! ```ignore
//! use cinch_memory::prelude::*;
//! ```
//!
//! Builders and the policy internals are left out; import those from
//! their modules when needed.

pub use crate::config::{EstimatorConfig, WindowConfig};
pub use crate::error::{EstimateError, MemoryError};
pub use crate::estimate::{CharRatioEstimator, OpenAiEstimator, TokenEstimator};
pub use crate::memory::{
    ChatMemory, MessageWindowMemory, SharedMemory, TokenWindowMemory, WindowUsage,
};
pub use crate::message::{Message, MessageRole, ToolCall};
