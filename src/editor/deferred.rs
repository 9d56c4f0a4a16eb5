//! Next-tick task queue
//!
//! Work that has to wait until every handler for the current input event has
//! run. Tasks sent during a frame run on the following `tick`; tasks sent
//! while a tick is running wait for the one after.

/// A queue for deferred tasks of a single type
#[derive(Debug)]
pub struct DeferredQueue<T> {
    pending: Vec<T>,
}

impl<T> DeferredQueue<T> {
    pub fn new() -> Self {
        Self { pending: Vec::new() }
    }

    /// Schedule a task for the next tick
    pub fn send(&mut self, task: T) {
        self.pending.push(task);
    }

    /// Take everything scheduled so far, leaving the queue empty
    pub fn take(&mut self) -> Vec<T> {
        std::mem::take(&mut self.pending)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop all pending tasks without running them
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

impl<T> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Tasks the editor session defers to the next frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredTask {
    /// End a drag-selection after the pointer was released
    FinishSelecting,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_empties_queue() {
        let mut queue = DeferredQueue::new();
        queue.send(DeferredTask::FinishSelecting);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.take(), vec![DeferredTask::FinishSelecting]);
        assert!(queue.is_empty());
    }
}
