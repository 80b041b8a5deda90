//! Ordered top-level invocations and the event routing entry point

use super::{CallNode, EventKind, ReturnOutcome, TraversalOrder, WidthDepthEvent};
use crate::error::{MemTraceError, Result};
use crate::measurement::Measurement;
use crate::retention::RetentionFilter;

/// Sequence of top-level call trees built from one thread's event stream
///
/// At most one root is open at a time. Not shareable between threads of
/// control: each thread needs its own sequence.
#[derive(Debug, Default)]
pub struct CallSequence {
    function_trees: Vec<CallNode>,
    filter: Option<RetentionFilter>,
    filtered_function_count: usize,
}

impl CallSequence {
    /// Sequence that retains every invocation
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence that drops invocations `filter` rejects (`None` keeps all)
    pub fn with_filter(filter: Option<RetentionFilter>) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    /// Number of top-level invocations
    pub fn len(&self) -> usize {
        self.function_trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.function_trees.is_empty()
    }

    pub fn roots(&self) -> &[CallNode] {
        &self.function_trees
    }

    pub fn filter(&self) -> Option<&RetentionFilter> {
        self.filter.as_ref()
    }

    /// True if the last top-level invocation has not returned yet
    pub fn is_open(&self) -> bool {
        self.function_trees.last().is_some_and(CallNode::is_open)
    }

    /// Invocations retained in the tree, at every depth
    pub fn function_count(&self) -> usize {
        self.function_trees.iter().map(CallNode::node_count).sum()
    }

    /// Invocations rejected by the retention filter
    pub fn filtered_function_count(&self) -> usize {
        self.filtered_function_count
    }

    /// Route one call or return event to the currently open invocation
    pub fn add_call_return_event(
        &mut self,
        event: EventKind,
        function_id: usize,
        data: Measurement,
    ) -> Result<()> {
        if !self.is_open() {
            return match event {
                EventKind::Call => {
                    self.function_trees.push(CallNode::new(function_id, data));
                    Ok(())
                }
                EventKind::Return => Err(MemTraceError::SequenceError(format!(
                    "CallSequence received a return for function {} with no open call",
                    function_id
                ))),
            };
        }

        let last = self.function_trees.len() - 1;
        let tree = &mut self.function_trees[last];
        match event {
            EventKind::Call => tree.add_call(function_id, data),
            EventKind::Return => {
                let outcome = tree.add_return(function_id, data, self.filter.as_ref())?;
                if outcome == ReturnOutcome::Rejected {
                    self.filtered_function_count += 1;
                    if !tree.is_open() {
                        self.function_trees.pop();
                    }
                }
                Ok(())
            }
        }
    }

    /// Depth-first tuples of every root, tagged with the root's index
    pub fn gen_depth_first(&self) -> impl Iterator<Item = WidthDepthEvent> + '_ {
        self.function_trees
            .iter()
            .enumerate()
            .flat_map(|(width, tree)| {
                tree.gen_depth_first()
                    .map(move |event| WidthDepthEvent::tagged(width, event))
            })
    }

    /// All nodes at depth 0 across the roots, then depth 1, and so on
    ///
    /// `width` counts nodes within each depth level, so a node's call and
    /// return tuples share the same width.
    pub fn gen_width_first(&self) -> impl Iterator<Item = WidthDepthEvent> + '_ {
        // An empty sequence has no levels to visit
        let max_depth = self.max_depth().unwrap_or(0);
        (0..max_depth).flat_map(move |depth| {
            self.function_trees
                .iter()
                .flat_map(move |tree| tree.gen_width_first(depth))
                .scan(0usize, |nodes_seen, event| {
                    if event.event == EventKind::Call {
                        *nodes_seen += 1;
                    }
                    Some(WidthDepthEvent::tagged(*nodes_seen - 1, event))
                })
        })
    }

    /// Either traversal, chosen at run time
    pub fn events(&self, order: TraversalOrder) -> Box<dyn Iterator<Item = WidthDepthEvent> + '_> {
        match order {
            TraversalOrder::DepthFirst => Box::new(self.gen_depth_first()),
            TraversalOrder::WidthFirst => Box::new(self.gen_width_first()),
        }
    }

    /// Deepest nesting across all roots
    pub fn max_depth(&self) -> Result<usize> {
        self.function_trees
            .iter()
            .map(CallNode::max_depth)
            .max()
            .ok_or(MemTraceError::EmptyTree("CallSequence"))
    }

    /// Sum of the roots' leaf counts, 0 when empty
    pub fn max_width(&self) -> usize {
        self.function_trees.iter().map(CallNode::max_width).sum()
    }

    pub fn integrity(&self) -> bool {
        let open_roots = self.function_trees.iter().filter(|t| t.is_open()).count();
        let roots_ok = open_roots == 0 || (open_roots == 1 && self.is_open());
        roots_ok && self.function_trees.iter().all(CallNode::integrity)
    }
}
