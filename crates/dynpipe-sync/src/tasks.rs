//! Deferred settle tasks.
//!
//! Some hosts reposition slots after a connection handler returns, so call
//! sites schedule the same normalization to re-run once the host settles.
//! Instead of accumulating timers, tasks are keyed by node identity: a later
//! identical task supersedes the earlier one. Drained tasks are pure retries
//! of idempotent operations and no-op when the node has since been removed.

use indexmap::IndexMap;

use dynpipe_core::id::NodeId;

/// What a deferred task should re-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    RefreshPipeIn,
    RefreshPipeOut,
}

/// A scheduled settle task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTask {
    pub node: NodeId,
    pub kind: TaskKind,
}

/// An ordered, node-keyed task set.
#[derive(Debug, Default)]
pub struct PendingQueue {
    tasks: IndexMap<NodeId, TaskKind>,
}

impl PendingQueue {
    pub fn new() -> Self {
        PendingQueue::default()
    }

    /// Schedules a task, superseding any earlier task for the same node and
    /// moving it to the back of the queue.
    pub fn schedule(&mut self, node: NodeId, kind: TaskKind) {
        self.tasks.shift_remove(&node);
        self.tasks.insert(node, kind);
    }

    /// Drops any scheduled task for a node (e.g. on node removal).
    pub fn cancel(&mut self, node: NodeId) {
        self.tasks.shift_remove(&node);
    }

    /// Takes all queued tasks in schedule order, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<PendingTask> {
        std::mem::take(&mut self.tasks)
            .into_iter()
            .map(|(node, kind)| PendingTask { node, kind })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_task_supersedes_and_reorders() {
        let mut queue = PendingQueue::new();
        queue.schedule(NodeId(1), TaskKind::RefreshPipeIn);
        queue.schedule(NodeId(2), TaskKind::RefreshPipeOut);
        queue.schedule(NodeId(1), TaskKind::RefreshPipeIn);

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].node, NodeId(2));
        assert_eq!(drained[1].node, NodeId(1));
        assert!(queue.is_empty());
    }

    #[test]
    fn cancel_removes_task() {
        let mut queue = PendingQueue::new();
        queue.schedule(NodeId(1), TaskKind::RefreshPipeIn);
        queue.cancel(NodeId(1));
        assert!(queue.is_empty());
    }
}
