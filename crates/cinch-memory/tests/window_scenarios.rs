//! End-to-end window behavior with a fixed-price estimator.
//!
//! Every message costs its content length in tokens, plus a flat 3 per
//! request, so budgets below read as plain arithmetic.

use std::sync::Arc;
use std::thread;

use cinch_memory::estimate::{CharRatioEstimator, TokenEstimator};
use cinch_memory::{
    ChatMemory, EstimateError, Message, MessageRole, SharedMemory, TokenWindowMemory,
};

struct LenEstimator;

impl TokenEstimator for LenEstimator {
    fn estimate_message(&self, message: &Message) -> Result<usize, EstimateError> {
        Ok(message.content.as_ref().map_or(0, |c| c.len()))
    }
}

fn memory(max_tokens: usize) -> TokenWindowMemory {
    TokenWindowMemory::with_max_tokens(max_tokens, Arc::new(LenEstimator)).unwrap()
}

/// A message of `role` costing `n` tokens, distinguishable by `tag`.
fn sized(role: MessageRole, tag: char, n: usize) -> Message {
    let content: String = std::iter::repeat_n(tag, n).collect();
    match role {
        MessageRole::System => Message::system(content),
        MessageRole::User => Message::user(content),
        MessageRole::Assistant => Message::assistant_text(content),
        MessageRole::Tool => Message::tool_result(format!("call-{tag}"), content),
    }
}

fn tokens(memory: &TokenWindowMemory) -> usize {
    memory.estimated_tokens().unwrap()
}

// ── Scenarios ────────────────────────────────────────────────────────

#[test]
fn keeps_configured_number_of_tokens() {
    let mut mem = memory(33);
    let user1 = sized(MessageRole::User, 'a', 10);
    let ai1 = sized(MessageRole::Assistant, 'b', 10);
    let user2 = sized(MessageRole::User, 'c', 10);
    let ai2 = sized(MessageRole::Assistant, 'd', 10);

    mem.add(user1.clone()).unwrap();
    assert_eq!(mem.messages(), vec![user1.clone()]);
    assert_eq!(tokens(&mem), 10 + 3);

    mem.add(ai1.clone()).unwrap();
    assert_eq!(mem.messages(), vec![user1.clone(), ai1.clone()]);
    assert_eq!(tokens(&mem), 10 + 10 + 3);

    mem.add(user2.clone()).unwrap();
    assert_eq!(mem.messages(), vec![user1, ai1.clone(), user2.clone()]);
    assert_eq!(tokens(&mem), 10 + 10 + 10 + 3);

    mem.add(ai2.clone()).unwrap();
    // user1 was evicted
    assert_eq!(mem.messages(), vec![ai1, user2, ai2]);
    assert_eq!(tokens(&mem), 33);
}

#[test]
fn system_message_is_never_evicted() {
    let mut mem = memory(33);
    let system = sized(MessageRole::System, 's', 10);
    let user1 = sized(MessageRole::User, 'a', 10);
    let ai1 = sized(MessageRole::Assistant, 'b', 10);
    let user2 = sized(MessageRole::User, 'c', 10);
    let ai2 = sized(MessageRole::Assistant, 'd', 10);

    mem.add(system.clone()).unwrap();
    mem.add(user1.clone()).unwrap();
    mem.add(ai1.clone()).unwrap();
    assert_eq!(mem.messages(), vec![system.clone(), user1, ai1.clone()]);

    mem.add(user2.clone()).unwrap();
    // user1 was evicted
    assert_eq!(mem.messages(), vec![system.clone(), ai1, user2.clone()]);
    assert!(tokens(&mem) <= 33);

    mem.add(ai2.clone()).unwrap();
    // ai1 was evicted
    assert_eq!(mem.messages(), vec![system, user2, ai2]);
}

#[test]
fn keeps_only_the_latest_system_message() {
    let mut mem = memory(40);
    let first_system = Message::system("A");
    let user = sized(MessageRole::User, 'a', 10);
    let ai = sized(MessageRole::Assistant, 'b', 10);

    mem.add(first_system.clone()).unwrap();
    mem.add(user.clone()).unwrap();
    mem.add(ai.clone()).unwrap();
    assert_eq!(mem.messages(), vec![first_system, user.clone(), ai.clone()]);

    let second_system = Message::system("B");
    mem.add(second_system.clone()).unwrap();
    assert_eq!(mem.messages(), vec![user, ai, second_system]);
}

#[test]
fn same_system_message_is_not_added_twice() {
    let mut mem = memory(33);
    let system = sized(MessageRole::System, 's', 10);
    let user = sized(MessageRole::User, 'a', 10);
    let ai = sized(MessageRole::Assistant, 'b', 10);

    mem.add(system.clone()).unwrap();
    mem.add(user.clone()).unwrap();
    mem.add(ai.clone()).unwrap();
    mem.add(system.clone()).unwrap();

    assert_eq!(mem.messages(), vec![system, user, ai]);
}

#[test]
fn clear_is_idempotent() {
    let mut mem = memory(100);
    mem.add(Message::system("rules")).unwrap();
    mem.add(Message::user("hello")).unwrap();

    mem.clear();
    assert!(mem.messages().is_empty());
    mem.clear();
    assert!(mem.messages().is_empty());

    // Still usable after clearing, and the old system message is gone.
    mem.add(Message::system("rules")).unwrap();
    assert_eq!(mem.messages(), vec![Message::system("rules")]);
}

// ── Properties ───────────────────────────────────────────────────────

#[test]
fn survivors_are_a_contiguous_tail_of_insertions() {
    let budget = 50;
    let mut mem = memory(budget);
    let mut inserted = Vec::new();

    for i in 0..40 {
        let role = if i % 2 == 0 {
            MessageRole::User
        } else {
            MessageRole::Assistant
        };
        let tag = char::from(b'a' + (i % 26) as u8);
        let msg = sized(role, tag, 1 + (i * 7) % 15);
        inserted.push(msg.clone());
        mem.add(msg).unwrap();

        let window = mem.messages();
        let tail = &inserted[inserted.len() - window.len()..];
        assert_eq!(window, tail, "after insertion {i}");
        assert!(tokens(&mem) <= budget, "after insertion {i}");
    }
}

#[test]
fn system_survives_any_pressure() {
    let mut mem = memory(30);
    let system = sized(MessageRole::System, 's', 12);
    mem.add(system.clone()).unwrap();

    for i in 0..100 {
        mem.add(sized(MessageRole::User, 'u', 1 + i % 14)).unwrap();
        let window = mem.messages();
        assert_eq!(window.iter().filter(|m| m.is_system()).count(), 1);
        assert_eq!(window[0], system);
        assert!(tokens(&mem) <= 30);
    }
}

#[test]
fn overhead_is_counted_once() {
    let estimator = CharRatioEstimator::default();
    let messages: Vec<Message> = (0..5).map(|i| Message::user(format!("turn {i}"))).collect();
    let overhead = estimator.request_overhead();

    assert_eq!(estimator.estimate_messages(&[]).unwrap(), overhead);
    for k in 1..=messages.len() {
        let marginal: usize = messages[..k]
            .iter()
            .map(|m| estimator.estimate_message(m).unwrap())
            .sum();
        assert_eq!(
            estimator.estimate_messages(&messages[..k]).unwrap(),
            marginal + overhead
        );
    }
}

#[test]
fn single_oversized_message_leaves_window_over_budget() {
    let mut mem = memory(20);
    mem.add(sized(MessageRole::User, 'a', 5)).unwrap();
    let huge = sized(MessageRole::User, 'z', 40);
    mem.add(huge.clone()).unwrap();

    assert_eq!(mem.messages(), vec![huge]);
    assert!(mem.usage().unwrap().is_over_budget());
}

// ── Concurrency ──────────────────────────────────────────────────────

#[test]
fn shared_memory_serializes_concurrent_turns() {
    let shared = SharedMemory::new(memory(60));
    shared.add(Message::system("rules")).unwrap();

    let writers: Vec<_> = (0..8)
        .map(|t| {
            let handle = shared.clone();
            thread::spawn(move || {
                for i in 0..25 {
                    handle
                        .add(Message::user(format!("thread {t} turn {i}")))
                        .unwrap();
                }
            })
        })
        .collect();

    let reader = {
        let handle = shared.clone();
        thread::spawn(move || {
            for _ in 0..200 {
                let (over, systems) = handle.with(|m| {
                    let systems = m.messages().iter().filter(|msg| msg.is_system()).count();
                    (m.usage().unwrap().is_over_budget(), systems)
                });
                assert!(!over);
                assert_eq!(systems, 1);
            }
        })
    };

    for w in writers {
        w.join().unwrap();
    }
    reader.join().unwrap();

    let window = shared.messages();
    assert_eq!(window[0], Message::system("rules"));
    assert!(shared.with(|m| m.estimated_tokens().unwrap()) <= 60);
}
