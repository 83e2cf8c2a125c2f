//! Ready-made graphs.

use std::sync::Arc;

use crate::control::ControlInput;
use crate::error::GraphError;
use crate::graph::NodeGraph;
use crate::nodes::{Adsr, Ema, MidiSource, Sine, Subtract};

/// A monophonic sine voice played from `controls`.
///
/// ```text
/// MidiSource.freq -> Ema (alpha 0.005) -> Sine.frequency
/// MidiSource.amp  -> Adsr (A 0.1, D 0.3, S 0.1, R 0.2) -> Sine.amplitude
/// Sine -> Subtract.in1 -> output
/// ```
pub fn midi_voice(controls: &Arc<ControlInput>) -> Result<NodeGraph, GraphError> {
    let mut graph = NodeGraph::new();

    let midi = graph.add(MidiSource::new(controls.clone()));

    let glide = graph.add(Ema::with_initial(controls.frequency()));
    glide.set(Ema::ALPHA, 0.005)?;
    glide.connect(Ema::INPUT, &midi, MidiSource::FREQUENCY)?;

    let envelope = graph.add(Adsr::new());
    envelope.set(Adsr::ATTACK, 0.1)?;
    envelope.set(Adsr::DECAY, 0.3)?;
    envelope.set(Adsr::SUSTAIN, 0.1)?;
    envelope.set(Adsr::RELEASE, 0.2)?;
    envelope.connect(Adsr::GATE, &midi, MidiSource::AMPLITUDE)?;

    let sine = graph.add(Sine::new());
    sine.connect(Sine::FREQUENCY, &glide, 0)?;
    sine.connect(Sine::AMPLITUDE, &envelope, 0)?;

    let output = graph.add(Subtract::new());
    output.connect(Subtract::LEFT, &sine, 0)?;
    graph.set_output(&output)?;

    Ok(graph)
}
