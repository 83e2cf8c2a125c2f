//! Graph container.

use tracing::debug;

use crate::error::GraphError;
use crate::node::{AudioNode, Node, NodeId, NodeRef};
use crate::topology;

/// A set of nodes plus the node whose output is sent to the device.
///
/// Membership is bookkeeping for the host: evaluation only follows pin bindings from
/// the output node. A `NodeGraph` handed to the engine is immutable; to edit a live
/// graph, clone it (nodes are shared, not copied), edit the clone and swap it in.
#[derive(Clone, Default, Debug)]
pub struct NodeGraph {
    nodes: Vec<NodeRef>,
    output: Option<NodeRef>,
}

impl NodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `node` to the graph. Adding a member again is a no-op.
    pub fn add_node(&mut self, node: NodeRef) -> NodeId {
        let id = node.id();
        if !self.contains(&node) {
            debug!(%id, name = node.name(), "add node");
            self.nodes.push(node);
        }
        id
    }

    /// Wrap `node` and add it, returning the handle.
    pub fn add<N: AudioNode>(&mut self, node: N) -> NodeRef {
        let node = Node::new(node);
        self.add_node(node.clone());
        node
    }

    /// Remove a member.
    ///
    /// Clears the output if it pointed at the node and unbinds every member pin that
    /// read from it.
    pub fn remove_node(&mut self, id: NodeId) -> Option<NodeRef> {
        let index = self.nodes.iter().position(|node| node.id() == id)?;
        let removed = self.nodes.remove(index);

        if self.output.as_ref().map_or(false, |output| output.id() == id) {
            self.output = None;
        }
        for pin in self.nodes.iter().flat_map(|node| node.inputs()) {
            if pin.upstream().map_or(false, |binding| binding.node().id() == id) {
                pin.disconnect();
            }
        }

        debug!(%id, name = removed.name(), "remove node");
        Some(removed)
    }

    /// Make `node` the graph's output. It must be a member.
    pub fn set_output(&mut self, node: &NodeRef) -> Result<(), GraphError> {
        if !self.contains(node) {
            return Err(GraphError::NotInGraph(node.id()));
        }
        self.output = Some(node.clone());
        Ok(())
    }

    pub fn clear_output(&mut self) {
        self.output = None;
    }

    pub fn output(&self) -> Option<&NodeRef> {
        self.output.as_ref()
    }

    /// Members in insertion order.
    pub fn nodes(&self) -> &[NodeRef] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeRef> {
        self.nodes.iter().find(|node| node.id() == id)
    }

    pub fn contains(&self, node: &Node) -> bool {
        self.nodes.iter().any(|member| member.id() == node.id())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Bind input `input` of `to` to output `output` of `from`. Both must be members.
    pub fn connect(
        &self,
        to: &NodeRef,
        input: usize,
        from: &NodeRef,
        output: usize,
    ) -> Result<(), GraphError> {
        for node in [to, from] {
            if !self.contains(node) {
                return Err(GraphError::NotInGraph(node.id()));
            }
        }
        to.connect(input, from, output)
    }

    /// Members ordered so that every node comes after the nodes it reads from.
    ///
    /// Includes nodes outside the graph that members are bound to. A cycle wired around
    /// [`Node::connect`] fails with [`GraphError::Cyclic`] naming one node on it.
    pub fn evaluation_order(&self) -> Result<Vec<NodeId>, GraphError> {
        topology::evaluation_order(&self.nodes).map_err(GraphError::Cyclic)
    }
}
