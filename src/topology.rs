//! Dependency analysis over pin bindings.
//!
//! The wiring itself lives in the pins; these helpers rebuild a petgraph view of it when
//! the control thread needs to reason about the graph as a whole.

use hashbrown::HashSet;
use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graphmap::DiGraphMap;

use crate::node::{Node, NodeId, NodeRef};

/// Everything reachable upstream of `roots`, as edges `upstream -> downstream` weighted
/// with the input index on the downstream side.
pub(crate) fn dependencies<'a, I>(roots: I) -> DiGraphMap<NodeId, usize>
where
    I: IntoIterator<Item = &'a NodeRef>,
{
    let mut graph = DiGraphMap::new();
    let mut seen = HashSet::new();
    let mut pending: Vec<NodeRef> = roots.into_iter().cloned().collect();

    while let Some(node) = pending.pop() {
        if !seen.insert(node.id()) {
            continue;
        }
        graph.add_node(node.id());

        for (input, pin) in node.inputs().iter().enumerate() {
            let Some(binding) = pin.upstream() else {
                continue;
            };
            let upstream = binding.node();
            graph.add_edge(upstream.id(), node.id(), input);
            if !seen.contains(&upstream.id()) {
                pending.push(upstream.clone());
            }
        }
    }

    graph
}

/// Whether binding one of `node`'s inputs to `upstream` would close a loop.
pub(crate) fn would_cycle(node: &Node, upstream: &NodeRef) -> bool {
    if node.id() == upstream.id() {
        return true;
    }

    let graph = dependencies(core::iter::once(upstream));
    graph.contains_node(node.id()) && has_path_connecting(&graph, node.id(), upstream.id(), None)
}

/// Upstream-first ordering of everything `roots` depend on.
///
/// On a cycle, returns the id of a node on it.
pub(crate) fn evaluation_order<'a, I>(roots: I) -> Result<Vec<NodeId>, NodeId>
where
    I: IntoIterator<Item = &'a NodeRef>,
{
    let graph = dependencies(roots);
    toposort(&graph, None).map_err(|cycle| cycle.node_id())
}
