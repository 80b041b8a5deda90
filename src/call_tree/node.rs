//! A single function invocation and its nested callees

use super::{DepthEvent, DepthFirst, EventKind, WidthFirst};
use crate::error::{MemTraceError, Result};
use crate::measurement::Measurement;
use crate::retention::RetentionFilter;
use std::fmt;

/// Open until the return event arrives, then closed for good
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeState {
    Open,
    Closed { return_data: Measurement },
}

/// What happened to the invocation closed by `add_return`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnOutcome {
    /// The invocation stays in the tree
    Retained,
    /// The retention filter rejected it; whoever holds it must drop it
    Rejected,
}

/// One function activation
pub struct CallNode {
    function_id: usize,
    call_data: Measurement,
    state: NodeState,
    children: Vec<CallNode>,
}

impl CallNode {
    /// Open a node for a call to `function_id`
    pub fn new(function_id: usize, call_data: Measurement) -> Self {
        Self {
            function_id,
            call_data,
            state: NodeState::Open,
            children: Vec::new(),
        }
    }

    pub fn function_id(&self) -> usize {
        self.function_id
    }

    pub fn call_data(&self) -> Measurement {
        self.call_data
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    /// Measurement at return, `None` while open
    pub fn return_data(&self) -> Option<Measurement> {
        match self.state {
            NodeState::Open => None,
            NodeState::Closed { return_data } => Some(return_data),
        }
    }

    /// Callees in call order
    pub fn children(&self) -> &[CallNode] {
        &self.children
    }

    /// True until the return event has been recorded
    pub fn is_open(&self) -> bool {
        matches!(self.state, NodeState::Open)
    }

    /// Record a call made from wherever execution currently is
    ///
    /// Execution is always inside the deepest node reachable by following
    /// open last children, so the new node is appended there.
    pub fn add_call(&mut self, function_id: usize, call_data: Measurement) -> Result<()> {
        if !self.is_open() {
            return Err(MemTraceError::SequenceError(
                "CallNode.add_call() when not open for calls.".to_string(),
            ));
        }
        let mut node = self;
        while node.has_open_child() {
            let last = node.children.len() - 1;
            node = &mut node.children[last];
        }
        node.children.push(CallNode::new(function_id, call_data));
        Ok(())
    }

    /// Record a return, closing the deepest open node
    ///
    /// A child rejected by `filter` is removed from its parent here. If this
    /// node itself is the one closing and it is rejected, the caller must
    /// drop it.
    pub fn add_return(
        &mut self,
        function_id: usize,
        return_data: Measurement,
        filter: Option<&RetentionFilter>,
    ) -> Result<ReturnOutcome> {
        if !self.is_open() {
            return Err(MemTraceError::SequenceError(
                "CallNode.add_return() when not open for returns.".to_string(),
            ));
        }
        if !self.has_open_child() {
            return self.close(function_id, return_data, filter);
        }

        // Find the parent of the deepest open node
        let mut parent = self;
        while parent.children.last().is_some_and(CallNode::has_open_child) {
            let last = parent.children.len() - 1;
            parent = &mut parent.children[last];
        }

        let last = parent.children.len() - 1;
        let outcome = parent.children[last].close(function_id, return_data, filter)?;
        if outcome == ReturnOutcome::Rejected {
            parent.children.pop();
        }
        Ok(outcome)
    }

    fn has_open_child(&self) -> bool {
        self.children.last().is_some_and(CallNode::is_open)
    }

    fn close(
        &mut self,
        function_id: usize,
        return_data: Measurement,
        filter: Option<&RetentionFilter>,
    ) -> Result<ReturnOutcome> {
        if self.function_id != function_id {
            return Err(MemTraceError::IdentityMismatch {
                expected: self.function_id,
                found: function_id,
            });
        }
        self.state = NodeState::Closed { return_data };

        match filter {
            Some(filter) if !filter.retains(&self.call_data, &return_data) => {
                tracing::trace!(
                    function_id,
                    filter = filter.label(),
                    "invocation rejected by retention filter"
                );
                Ok(ReturnOutcome::Rejected)
            }
            _ => Ok(ReturnOutcome::Retained),
        }
    }

    /// Number of nested levels; a lone call is 1
    pub fn max_depth(&self) -> usize {
        self.gen_depth_first()
            .map(|event| event.depth)
            .max()
            .map_or(1, |depth| depth + 1)
    }

    /// Number of leaves in this subtree; a lone call is 1
    pub fn max_width(&self) -> usize {
        self.subtree().filter(|node| node.children.is_empty()).count()
    }

    /// Number of invocations in this subtree including this one
    pub fn node_count(&self) -> usize {
        self.subtree().count()
    }

    /// Structural check: closed nodes have only closed descendants and at
    /// most the last child of any node is open.
    pub fn integrity(&self) -> bool {
        self.subtree().all(|node| {
            let open_children = node.children.iter().filter(|c| c.is_open()).count();
            if node.is_open() {
                open_children == 0 || (open_children == 1 && node.has_open_child())
            } else {
                open_children == 0
            }
        })
    }

    /// Every node of this subtree, in no particular order
    fn subtree(&self) -> impl Iterator<Item = &CallNode> + '_ {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter());
            Some(node)
        })
    }

    /// Depth-first traversal of this subtree, depth 0 being this node
    ///
    /// An open node yields its call tuple but no return tuple.
    pub fn gen_depth_first(&self) -> DepthFirst<'_> {
        DepthFirst::new(self)
    }

    /// Call/return tuples of every node exactly `desired_depth` below this one
    pub fn gen_width_first(&self, desired_depth: usize) -> WidthFirst<'_> {
        WidthFirst::new(self, desired_depth)
    }

    pub(super) fn call_event(&self, depth: usize) -> DepthEvent {
        DepthEvent {
            depth,
            event: EventKind::Call,
            function_id: self.function_id,
            data: self.call_data,
        }
    }

    pub(super) fn return_event(&self, depth: usize) -> Option<DepthEvent> {
        self.return_data().map(|data| DepthEvent {
            depth,
            event: EventKind::Return,
            function_id: self.function_id,
            data,
        })
    }
}

// Deep chains are torn down from a heap stack rather than by nested drops
impl Drop for CallNode {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

impl fmt::Debug for CallNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallNode")
            .field("function_id", &self.function_id)
            .field("call_data", &self.call_data)
            .field("state", &self.state)
            .field("children", &self.children.len())
            .finish()
    }
}
