//! Note control as a signal source

use std::sync::Arc;

use crate::control::ControlInput;
use crate::node::{AudioNode, Inputs, ProcessContext};

const OUTPUTS: &[&str] = &["amp", "freq"];

/// Reads a shared [`ControlInput`] every sample (two outputs: `amp`, `freq`)
///
/// `amp` is the note velocity scaled to `[0, 1]` and drops to zero on note-off, so it
/// doubles as a gate for [`Adsr`](crate::nodes::Adsr).
#[derive(Debug)]
pub struct MidiSource {
    controls: Arc<ControlInput>,
}

impl MidiSource {
    pub const AMPLITUDE: usize = 0;
    pub const FREQUENCY: usize = 1;

    pub fn new(controls: Arc<ControlInput>) -> Self {
        Self { controls }
    }

    pub fn controls(&self) -> &Arc<ControlInput> {
        &self.controls
    }
}

impl AudioNode for MidiSource {
    fn name(&self) -> &'static str {
        "MidiSource"
    }

    fn outputs(&self) -> &'static [&'static str] {
        OUTPUTS
    }

    fn process(&mut self, _ctx: &ProcessContext, _inputs: &Inputs<'_>, outputs: &mut [f32]) {
        outputs[Self::AMPLITUDE] = self.controls.amplitude();
        outputs[Self::FREQUENCY] = self.controls.frequency();
    }
}
