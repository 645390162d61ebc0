// src/engine/queue.rs

use std::collections::VecDeque;

use tracing::debug;

use super::BindingName;

/// Follow-up passes remembered while their binding is running.
///
/// Semantics:
/// - Each binding appears at most once: any number of triggers during one
///   pass coalesce into exactly one follow-up.
/// - Order is first-trigger order, so follow-ups start in the order their
///   bindings were first re-triggered.
#[derive(Debug, Default)]
pub struct TriggerQueue {
    pending: VecDeque<BindingName>,
}

impl TriggerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are no queued follow-ups.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn contains(&self, binding: &str) -> bool {
        self.pending.iter().any(|b| b == binding)
    }

    /// Remember one follow-up for `binding`. Returns false if one was
    /// already queued.
    pub fn record_trigger(&mut self, binding: &str) -> bool {
        if self.contains(binding) {
            debug!(binding, "follow-up already queued; coalescing trigger");
            return false;
        }
        debug!(binding, "queued follow-up pass");
        self.pending.push_back(binding.to_string());
        true
    }

    /// Remove the follow-up of `binding`, returning whether there was one.
    pub fn take(&mut self, binding: &str) -> bool {
        match self.pending.iter().position(|b| b == binding) {
            Some(idx) => {
                self.pending.remove(idx);
                true
            }
            None => false,
        }
    }
}
