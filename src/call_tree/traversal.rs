//! Lazy traversal iterators over a single call tree
//!
//! Both iterators keep an explicit stack instead of recursing, so deep call
//! chains cannot overflow the native stack. Each iterator is single pass;
//! ask the node for a fresh one to traverse again.

use super::{CallNode, DepthEvent};

struct Frame<'a> {
    node: &'a CallNode,
    depth: usize,
    next_child: usize,
}

/// Pre-order call tuples interleaved with post-order return tuples
pub struct DepthFirst<'a> {
    start: Option<&'a CallNode>,
    stack: Vec<Frame<'a>>,
}

impl<'a> DepthFirst<'a> {
    pub(super) fn new(root: &'a CallNode) -> Self {
        Self {
            start: Some(root),
            stack: Vec::new(),
        }
    }
}

impl Iterator for DepthFirst<'_> {
    type Item = DepthEvent;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(root) = self.start.take() {
            self.stack.push(Frame {
                node: root,
                depth: 0,
                next_child: 0,
            });
            return Some(root.call_event(0));
        }

        loop {
            let frame = self.stack.last_mut()?;
            let node = frame.node;
            if let Some(child) = node.children().get(frame.next_child) {
                frame.next_child += 1;
                let depth = frame.depth + 1;
                self.stack.push(Frame {
                    node: child,
                    depth,
                    next_child: 0,
                });
                return Some(child.call_event(depth));
            }

            let depth = frame.depth;
            self.stack.pop();
            if let Some(event) = node.return_event(depth) {
                return Some(event);
            }
        }
    }
}

/// Call/return pairs of all nodes at one depth, left to right
pub struct WidthFirst<'a> {
    desired_depth: usize,
    stack: Vec<(&'a CallNode, usize)>,
    pending_return: Option<DepthEvent>,
}

impl<'a> WidthFirst<'a> {
    pub(super) fn new(root: &'a CallNode, desired_depth: usize) -> Self {
        Self {
            desired_depth,
            stack: vec![(root, 0)],
            pending_return: None,
        }
    }
}

impl Iterator for WidthFirst<'_> {
    type Item = DepthEvent;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(event) = self.pending_return.take() {
            return Some(event);
        }

        while let Some((node, depth)) = self.stack.pop() {
            if depth == self.desired_depth {
                self.pending_return = node.return_event(depth);
                return Some(node.call_event(depth));
            }
            self.stack
                .extend(node.children().iter().rev().map(|child| (child, depth + 1)));
        }
        None
    }
}
