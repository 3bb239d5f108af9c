//! Conversation memories: the message windows submitted to a model.
//!
//! Every memory follows the same rules (see [`policy`]):
//!
//! - at most one system message, never evicted for space, re-adds ignored,
//!   replacements appended at the tail;
//! - everything else evicted oldest-first once the window exceeds capacity.
//!
//! They differ only in how capacity is measured:
//!
//! - **[`TokenWindowMemory`]**: estimated token cost of the full window.
//! - **[`MessageWindowMemory`]**: number of messages.
//!
//! [`SharedMemory`] wraps either one for use from several threads.

mod message_window;
pub(crate) mod policy;
mod shared;
mod token_window;

pub use message_window::{MessageWindowMemory, MessageWindowMemoryBuilder};
pub use shared::SharedMemory;
pub use token_window::{TokenWindowMemory, TokenWindowMemoryBuilder, WindowUsage};

use crate::Message;
use crate::error::Result;

/// Identifier given to memories built without an explicit id.
pub const DEFAULT_MEMORY_ID: &str = "default";

/// An ordered, bounded window of chat messages.
pub trait ChatMemory: Send {
    /// Lookup key assigned at construction. Carries no meaning inside the memory.
    fn id(&self) -> &str;

    /// Add a message, then evict until the window fits its capacity.
    fn add(&mut self, message: Message) -> Result<()>;

    /// Snapshot of the current window, oldest first.
    fn messages(&self) -> Vec<Message>;

    /// Remove every message, the system message included. Idempotent.
    fn clear(&mut self);
}
