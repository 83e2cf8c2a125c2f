//! Core node trait and context types.

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::GraphError;
use crate::pin::Pin;
use crate::topology;

/// Upper bound on output pins per node. Outputs are cached inline, so this stays small.
pub const MAX_OUTPUTS: usize = 4;

/// Information available while generating a sample.
///
/// Passed down every pull. `frame` identifies the output sample being produced; a node
/// pulled several times for the same frame (fan-out) is only evaluated once.
#[derive(Clone, Copy, Debug)]
pub struct ProcessContext {
    /// Sample rate of the output in Hz (e.g., 44100, 48000)
    pub sample_rate: u32,
    /// Index of the frame currently being generated
    pub frame: u64,
}

impl ProcessContext {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            frame: 0,
        }
    }

    /// Duration of one sample in seconds.
    #[inline]
    pub fn sample_period(&self) -> f32 {
        1.0 / self.sample_rate as f32
    }

    /// Time of the current frame in seconds since the context started.
    #[inline]
    pub fn time(&self) -> f64 {
        self.frame as f64 / self.sample_rate as f64
    }

    /// Move on to the next frame.
    #[inline]
    pub fn advance(&mut self) {
        self.frame = self.frame.wrapping_add(1);
    }
}

/// Unique identifier for a node.
///
/// Ids are process-wide, so a node keeps its id when it is shared between graphs.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(0);
        NodeId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Name and default literal of an input pin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinSpec {
    pub name: &'static str,
    pub default: f32,
}

impl PinSpec {
    pub const fn new(name: &'static str, default: f32) -> Self {
        Self { name, default }
    }
}

/// Read access to a node's input pins during [`AudioNode::process`].
///
/// Reading an input pulls whatever is bound to it, so only read the inputs you need.
pub struct Inputs<'a> {
    pins: &'a [Pin],
    ctx: &'a ProcessContext,
}

impl<'a> Inputs<'a> {
    pub fn new(pins: &'a [Pin], ctx: &'a ProcessContext) -> Self {
        Self { pins, ctx }
    }

    /// Current value of input `index`, or `0.0` if there is no such pin.
    #[inline]
    pub fn get(&self, index: usize) -> f32 {
        self.pins
            .get(index)
            .map_or(0.0, |pin| pin.generate(self.ctx))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pins.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}

/// The core trait for signal nodes.
///
/// Implement this trait to create custom nodes. A node declares a fixed set of input
/// pins (each with a default literal) and output pins, and produces one value per
/// output each time it is processed.
///
/// `process` runs on the audio thread. It must not allocate, block or do I/O; internal
/// state (phase, envelope time, filter memory) lives in `self` and is only touched here.
///
/// ```
/// use klangnetz::{AudioNode, Inputs, Node, PinSpec, ProcessContext};
///
/// const GAIN_INPUTS: &[PinSpec] = &[PinSpec::new("in", 0.0), PinSpec::new("gain", 0.5)];
///
/// struct Gain;
///
/// impl AudioNode for Gain {
///     fn name(&self) -> &'static str {
///         "Gain"
///     }
///
///     fn inputs(&self) -> &'static [PinSpec] {
///         GAIN_INPUTS
///     }
///
///     fn process(&mut self, _ctx: &ProcessContext, inputs: &Inputs<'_>, outputs: &mut [f32]) {
///         outputs[0] = inputs.get(0) * inputs.get(1);
///     }
/// }
///
/// let gain = Node::new(Gain);
/// gain.set(0, 0.8).unwrap();
///
/// let ctx = ProcessContext::new(48_000);
/// assert_eq!(gain.generate(&ctx, 0), 0.4);
/// ```
pub trait AudioNode: Send + 'static {
    /// Display name of the node type.
    fn name(&self) -> &'static str;

    /// Input pins, in index order. Sources have none.
    fn inputs(&self) -> &'static [PinSpec] {
        &[]
    }

    /// Output pin names, in index order.
    fn outputs(&self) -> &'static [&'static str] {
        &["out"]
    }

    /// Produce one value for every output pin.
    ///
    /// `outputs` has exactly one slot per declared output.
    fn process(&mut self, ctx: &ProcessContext, inputs: &Inputs<'_>, outputs: &mut [f32]);
}

struct Slot {
    node: Box<dyn AudioNode>,
    frame: Option<u64>,
    values: [f32; MAX_OUTPUTS],
}

/// A node in the signal graph: an [`AudioNode`] plus its pins.
///
/// Nodes are shared through [`NodeRef`]. A node lives as long as a graph holds it or
/// any pin is bound to one of its outputs.
pub struct Node {
    id: NodeId,
    name: &'static str,
    inputs: Box<[Pin]>,
    outputs: &'static [&'static str],
    slot: Mutex<Slot>,
}

/// Shared handle to a [`Node`].
pub type NodeRef = Arc<Node>;

impl Node {
    /// Wrap `node`, creating its input pins with their default literals.
    ///
    /// # Panics
    ///
    /// If `node` declares more than [`MAX_OUTPUTS`] outputs.
    pub fn new<N: AudioNode>(node: N) -> NodeRef {
        let inputs = node
            .inputs()
            .iter()
            .map(|spec| Pin::new(spec.name, spec.default))
            .collect();
        let outputs = node.outputs();
        assert!(
            outputs.len() <= MAX_OUTPUTS,
            "{} declares {} outputs, at most {} are supported",
            node.name(),
            outputs.len(),
            MAX_OUTPUTS
        );

        Arc::new(Self {
            id: NodeId::next(),
            name: node.name(),
            inputs,
            outputs,
            slot: Mutex::new(Slot {
                node: Box::new(node),
                frame: None,
                values: [0.0; MAX_OUTPUTS],
            }),
        })
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn inputs(&self) -> &[Pin] {
        &self.inputs
    }

    #[inline]
    pub fn input(&self, index: usize) -> Option<&Pin> {
        self.inputs.get(index)
    }

    #[inline]
    pub fn outputs(&self) -> &'static [&'static str] {
        self.outputs
    }

    #[inline]
    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    #[inline]
    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Index of the input pin called `name`.
    pub fn pin_index(&self, name: &str) -> Result<usize, GraphError> {
        self.inputs
            .iter()
            .position(|pin| pin.name() == name)
            .ok_or_else(|| GraphError::UnknownPin {
                node: self.name,
                name: name.to_string(),
            })
    }

    /// Value of output `output` for the frame in `ctx`.
    ///
    /// The node is processed at most once per frame; later pulls in the same frame
    /// (fan-out, other outputs) read the cached values. Never blocks: if the node is
    /// already being processed further up the call stack (a wiring cycle), this
    /// returns `0.0`.
    pub fn generate(&self, ctx: &ProcessContext, output: usize) -> f32 {
        let Some(mut slot) = self.slot.try_lock() else {
            return 0.0;
        };

        if slot.frame != Some(ctx.frame) {
            let count = self.outputs.len();
            let inputs = Inputs::new(&self.inputs, ctx);
            let Slot { node, values, .. } = &mut *slot;
            node.process(ctx, &inputs, &mut values[..count]);
            slot.frame = Some(ctx.frame);
        }

        slot.values.get(output).copied().unwrap_or(0.0)
    }

    /// Set the literal value of input `input`. An existing binding stays in place.
    pub fn set(&self, input: usize, value: f32) -> Result<(), GraphError> {
        self.pin(input)?.set(value);
        Ok(())
    }

    /// Bind input `input` to output `output` of `upstream`.
    ///
    /// Rejects bindings that would make this node depend on itself.
    pub fn connect(&self, input: usize, upstream: &NodeRef, output: usize) -> Result<(), GraphError> {
        let pin = self.pin(input)?;
        if topology::would_cycle(self, upstream) {
            return Err(GraphError::Cycle {
                from: upstream.id(),
                to: self.id,
            });
        }
        pin.connect(upstream.clone(), output)?;

        debug!(
            from = %upstream.id(),
            output,
            to = %self.id,
            pin = pin.name(),
            "connect"
        );
        Ok(())
    }

    /// Clear the binding of input `input`; it falls back to its literal.
    pub fn disconnect(&self, input: usize) -> Result<(), GraphError> {
        let pin = self.pin(input)?;
        pin.disconnect();

        debug!(node = %self.id, pin = pin.name(), "disconnect");
        Ok(())
    }

    fn pin(&self, input: usize) -> Result<&Pin, GraphError> {
        self.inputs.get(input).ok_or(GraphError::NoSuchInput {
            node: self.name,
            index: input,
        })
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish()
    }
}
