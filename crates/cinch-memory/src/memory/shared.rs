//! Thread-safe handle to a memory.
//!
//! Concurrent turns of the same conversation serialize through one mutex;
//! each `add` or `clear` is applied atomically and readers always see a
//! whole window.

use std::sync::{Arc, Mutex, MutexGuard};

use super::ChatMemory;
use crate::Message;
use crate::error::Result;

/// Cloneable, lock-guarded handle to a [`ChatMemory`].
///
/// ```
/// use cinch_memory::{Message, MessageWindowMemory, SharedMemory};
///
/// let shared = SharedMemory::new(MessageWindowMemory::with_max_messages(10)?);
/// let worker = shared.clone();
/// std::thread::spawn(move || worker.add(Message::user("from a worker")))
///     .join()
///     .unwrap()?;
/// assert_eq!(shared.messages().len(), 1);
/// # Ok::<(), cinch_memory::MemoryError>(())
/// ```
pub struct SharedMemory<M>(Arc<Mutex<M>>);

impl<M> Clone for SharedMemory<M> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<M: ChatMemory> SharedMemory<M> {
    pub fn new(memory: M) -> Self {
        Self(Arc::new(Mutex::new(memory)))
    }

    // A panic inside `add` never commits a half-trimmed window, so the
    // guarded value is consistent even when the lock is poisoned.
    fn lock(&self) -> MutexGuard<'_, M> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Lookup key of the wrapped memory.
    pub fn id(&self) -> String {
        self.lock().id().to_string()
    }

    pub fn add(&self, message: Message) -> Result<()> {
        self.lock().add(message)
    }

    /// Snapshot of the current window.
    pub fn messages(&self) -> Vec<Message> {
        self.lock().messages()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Run `f` against the memory under the lock, for compound reads such
    /// as taking messages and usage from the same window.
    pub fn with<R>(&self, f: impl FnOnce(&M) -> R) -> R {
        f(&*self.lock())
    }
}

impl<M: std::fmt::Debug> std::fmt::Debug for SharedMemory<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.try_lock() {
            Ok(guard) => f.debug_tuple("SharedMemory").field(&*guard).finish(),
            Err(_) => f.write_str("SharedMemory(<locked>)"),
        }
    }
}
