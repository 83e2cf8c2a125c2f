//! Built-in audio nodes.
//!
//! Nodes are organized into two categories:
//!
//! ## Sources ([`source`])
//!
//! Generate signals without reading other nodes:
//! - [`Sine`] - Sine wave oscillator with frequency/amplitude inputs
//! - [`ShapeOscillator`] - Band-limited sawtooth, triangle, square and stairs
//! - [`MidiSource`] - Exposes the current note as amplitude and frequency
//! - [`MidiRepeater`] - Records notes and loops them back
//!
//! ## Effects ([`effect`])
//!
//! Process signals (inputs → outputs):
//! - [`Subtract`] - Difference of two inputs
//! - [`Ema`] - One-pole smoother
//! - [`Jitter`] - Random multiplicative wobble
//! - [`Adsr`] - Gate-driven envelope with click suppression
//!
//! Every node exposes its pin indices as associated constants, e.g. [`Sine::FREQUENCY`],
//! for use with [`Node::connect`](crate::Node::connect) and [`Node::set`](crate::Node::set).

pub mod effect;
pub mod source;

// Re-export common types at the top level for convenience
pub use effect::{Adsr, Ema, Jitter, Subtract};
pub use source::{
    BandLimitedWave, MidiRepeater, MidiSource, Shape, ShapeOscillator, Sine, Waveform,
};
