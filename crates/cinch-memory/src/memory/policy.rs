//! Admission and eviction rules shared by every windowed memory.
//!
//! A window is an ordered `Vec<Message>` with two rules layered on top:
//!
//! 1. **One system message.** Re-adding the held system message is a no-op.
//!    A different system message removes the held one from wherever it sits
//!    and is appended at the tail like any other message.
//! 2. **FIFO eviction of everything else.** While the window is over capacity,
//!    the oldest non-system message is removed. System messages are never
//!    evicted for space, and neither is the message just admitted; if nothing
//!    else is left the window stays over capacity.
//! 3. **Tool results follow their call.** Evicting an assistant message that
//!    requested tools also evicts the results answering it that sit directly
//!    behind it, even when the window would already fit without that. The
//!    tail is exempt, so a just-admitted result can outlive its call.
//!
//! Capacity is a predicate over the candidate window, so token budgets and
//! message-count limits share the same rules.

use tracing::{debug, warn};

use crate::Message;

/// Outcome of admitting a message into a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Admission {
    /// The message equals the held system message. Window untouched.
    Duplicate,
    /// The message was appended. Carries the system message it displaced, if any.
    Appended { replaced: Option<Message> },
}

/// Index of the held system message, if any.
pub(crate) fn system_index(messages: &[Message]) -> Option<usize> {
    messages.iter().position(Message::is_system)
}

/// Index of the next message to evict: the oldest non-system message ahead
/// of the tail. The tail is the message just admitted.
pub(crate) fn oldest_evictable(messages: &[Message]) -> Option<usize> {
    let tail = messages.len().saturating_sub(1);
    messages[..tail].iter().position(|m| !m.is_system())
}

/// Append `message`, applying the single-system-message rule.
pub(crate) fn admit(messages: &mut Vec<Message>, message: Message) -> Admission {
    if message.is_system()
        && let Some(idx) = system_index(messages)
    {
        if messages[idx] == message {
            debug!("system message already held at position {idx}, ignoring");
            return Admission::Duplicate;
        }
        let replaced = messages.remove(idx);
        debug!("replacing system message held at position {idx}");
        messages.push(message);
        return Admission::Appended {
            replaced: Some(replaced),
        };
    }

    messages.push(message);
    Admission::Appended { replaced: None }
}

/// Evict oldest non-system messages while `over_capacity` holds.
///
/// When an evicted assistant message carried tool calls, the tool results
/// directly behind it that answer those calls go with it, up to but never
/// including the tail. They go even when the window fits once the call is
/// gone, so a pass can leave it below capacity. Returns the evicted messages, oldest first. Errors
/// from `over_capacity` abort the loop and are returned as-is; callers decide
/// whether to keep the partially trimmed window.
pub(crate) fn evict_while<E>(
    messages: &mut Vec<Message>,
    mut over_capacity: impl FnMut(&[Message]) -> Result<bool, E>,
) -> Result<Vec<Message>, E> {
    let mut evicted = Vec::new();

    while over_capacity(messages.as_slice())? {
        let Some(idx) = oldest_evictable(messages) else {
            warn!(
                "window over capacity with {} protected message(s) left, nothing to evict",
                messages.len()
            );
            break;
        };

        let removed = messages.remove(idx);
        let calls = removed.tool_calls.clone().unwrap_or_default();
        evicted.push(removed);
        while idx + 1 < messages.len() && messages[idx].answers(&calls) {
            evicted.push(messages.remove(idx));
        }
    }

    Ok(evicted)
}
