//! Klangnetz - pull-based real-time synthesis graph
//!
//! Design principles:
//! - Nodes expose named input pins; a pin holds a literal or reads one output of another node
//! - The device callback pulls the output node once per frame, which pulls everything upstream
//! - Each node is processed at most once per frame, however many pins read it
//! - Pins, graph swaps and metering are lock-free, so the graph can be edited while it plays
//! - Replaced graphs are freed on the host thread, never in the callback
//!
//! ```
//! use std::sync::Arc;
//! use klangnetz::nodes::Sine;
//! use klangnetz::{AudioEngine, EngineConfig, NodeGraph};
//!
//! let mut graph = NodeGraph::new();
//! let sine = graph.add(Sine::new());
//! sine.set(Sine::AMPLITUDE, 0.5)?;
//! graph.set_output(&sine)?;
//!
//! let mut engine = AudioEngine::new(EngineConfig::default())?;
//! engine.set_graph(Arc::new(graph));
//!
//! // render offline instead of calling `engine.init()`
//! let mut renderer = engine.renderer(2)?;
//! let mut buffer = vec![0.0f32; 2 * 4800];
//! renderer.render(&mut buffer);
//! assert!((engine.db() + 9.03).abs() < 0.1);
//! # Ok::<(), klangnetz::Error>(())
//! ```

mod config;
mod control;
#[cfg(feature = "cpal_sink")]
mod device;
mod engine;
mod error;
mod graph;
mod meter;
mod node;
mod pin;
mod renderer;
mod sample;
mod smooth;
mod topology;

pub mod nodes;
pub mod patch;

pub use config::EngineConfig;
pub use control::{note_to_frequency, ControlInput};
pub use engine::AudioEngine;
pub use error::{DeviceError, Error, GraphError, Result};
pub use graph::NodeGraph;
pub use meter::{rms_to_db, Meter};
pub use node::{AudioNode, Inputs, Node, NodeId, NodeRef, PinSpec, ProcessContext, MAX_OUTPUTS};
pub use pin::{Binding, Pin};
pub use renderer::Renderer;
pub use sample::OutputSample;
pub use smooth::Declick;
