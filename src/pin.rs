//! Input pins.
//!
//! A pin is either a literal value or bound to one output of an upstream node. Both
//! halves are lock-free: the literal is an atomic float and the binding sits behind an
//! [`ArcSwapOption`], so the control thread can rewire while the audio thread pulls.

use core::fmt;
use core::sync::atomic::Ordering;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use atomic_float::AtomicF32;

use crate::error::GraphError;
use crate::node::{NodeRef, ProcessContext};

/// An upstream output a pin reads from.
pub struct Binding {
    node: NodeRef,
    output: usize,
}

impl Binding {
    pub fn node(&self) -> &NodeRef {
        &self.node
    }

    pub fn output(&self) -> usize {
        self.output
    }
}

/// A named input of a node.
pub struct Pin {
    name: &'static str,
    literal: AtomicF32,
    upstream: ArcSwapOption<Binding>,
}

impl Pin {
    pub fn new(name: &'static str, value: f32) -> Self {
        Self {
            name,
            literal: AtomicF32::new(value),
            upstream: ArcSwapOption::empty(),
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The upstream output's value if bound, otherwise the literal.
    #[inline]
    pub fn generate(&self, ctx: &ProcessContext) -> f32 {
        match &*self.upstream.load() {
            Some(binding) => binding.node.generate(ctx, binding.output),
            None => self.literal.load(Ordering::Relaxed),
        }
    }

    /// Set the literal. Takes effect once the pin is unbound.
    #[inline]
    pub fn set(&self, value: f32) {
        self.literal.store(value, Ordering::Relaxed);
    }

    /// The literal value, regardless of any binding.
    #[inline]
    pub fn value(&self) -> f32 {
        self.literal.load(Ordering::Relaxed)
    }

    /// Bind to output `output` of `node`, replacing any previous binding.
    ///
    /// This does not check for cycles, see [`Node::connect`](crate::Node::connect).
    pub fn connect(&self, node: NodeRef, output: usize) -> Result<(), GraphError> {
        if output >= node.num_outputs() {
            return Err(GraphError::NoSuchOutput {
                node: node.name(),
                index: output,
            });
        }
        self.upstream.store(Some(Arc::new(Binding { node, output })));
        Ok(())
    }

    /// Drop the binding. The literal is left as it was.
    pub fn disconnect(&self) {
        self.upstream.store(None);
    }

    pub fn upstream(&self) -> Option<Arc<Binding>> {
        self.upstream.load_full()
    }

    pub fn is_bound(&self) -> bool {
        self.upstream.load().is_some()
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Pin");
        s.field("name", &self.name).field("literal", &self.value());
        if let Some(binding) = &*self.upstream.load() {
            s.field("node", &binding.node.id())
                .field("output", &binding.output);
        }
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use crate::nodes::Subtract;

    #[test]
    fn literal_until_bound() {
        let ctx = ProcessContext::new(48_000);
        let pin = Pin::new("in", 0.25);
        assert_eq!(pin.generate(&ctx), 0.25);

        pin.set(-3.0);
        assert_eq!(pin.generate(&ctx), -3.0);
        assert!(!pin.is_bound());
    }

    #[test]
    fn disconnect_restores_literal() {
        let ctx = ProcessContext::new(48_000);
        let source = Node::new(Subtract::new());
        source.set(Subtract::LEFT, 7.0).unwrap();

        let pin = Pin::new("in", 0.0);
        pin.set(5.0);
        pin.connect(source.clone(), 0).unwrap();
        assert_eq!(pin.generate(&ctx), 7.0);
        assert_eq!(pin.upstream().map(|b| b.node().id()), Some(source.id()));

        pin.disconnect();
        assert_eq!(pin.generate(&ctx), 5.0);
        assert!(pin.upstream().is_none());
    }

    #[test]
    fn rejects_missing_output() {
        let source = Node::new(Subtract::new());
        let pin = Pin::new("in", 1.0);
        assert!(pin.connect(source, 1).is_err());
        assert!(!pin.is_bound());
    }
}
