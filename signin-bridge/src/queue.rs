//! FIFO buffer of resolved completions awaiting the host pump.
//!
//! The queue carries no lock of its own; it lives inside the registry state
//! and shares the registry's mutex.

use std::collections::VecDeque;

use crate::continuation::Completion;
use crate::request::RequestId;

#[derive(Debug, Default)]
pub struct CompletionQueue {
    items: VecDeque<Completion>,
}

impl CompletionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the tail.
    pub fn enqueue(&mut self, completion: Completion) {
        self.items.push_back(completion);
    }

    /// Remove and return everything queued so far, oldest first.
    pub fn take_all(&mut self) -> VecDeque<Completion> {
        std::mem::take(&mut self.items)
    }

    /// Put `batch` back ahead of anything queued since it was taken.
    pub fn restore_front(&mut self, mut batch: VecDeque<Completion>) {
        batch.append(&mut self.items);
        self.items = batch;
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Request ids in execution order.
    pub fn request_ids(&self) -> Vec<RequestId> {
        self.items.iter().map(Completion::request_id).collect()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
