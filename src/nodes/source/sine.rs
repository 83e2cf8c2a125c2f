//! Sine wave oscillator

use core::f32::consts::TAU;

use crate::node::{AudioNode, Inputs, PinSpec, ProcessContext};

const INPUTS: &[PinSpec] = &[
    PinSpec::new("frequency", 440.0),
    PinSpec::new("amplitude", 1.0),
];

/// A sine wave oscillator (mono source)
///
/// The phase is kept in radians and wrapped into `[0, 2π)` every sample, so it stays
/// accurate over long runs. Negative frequencies run backwards.
#[derive(Debug, Default)]
pub struct Sine {
    phase: f32,
}

impl Sine {
    pub const FREQUENCY: usize = 0;
    pub const AMPLITUDE: usize = 1;

    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn phase(&self) -> f32 {
        self.phase
    }
}

impl AudioNode for Sine {
    fn name(&self) -> &'static str {
        "Sine"
    }

    fn inputs(&self) -> &'static [PinSpec] {
        INPUTS
    }

    fn process(&mut self, ctx: &ProcessContext, inputs: &Inputs<'_>, outputs: &mut [f32]) {
        let frequency = inputs.get(Self::FREQUENCY);
        self.phase = wrap_phase(self.phase + TAU * frequency / ctx.sample_rate as f32);

        outputs[0] = inputs.get(Self::AMPLITUDE) * self.phase.sin();
    }
}

#[inline]
fn wrap_phase(phase: f32) -> f32 {
    if !phase.is_finite() {
        return 0.0;
    }
    let wrapped = phase.rem_euclid(TAU);
    // rem_euclid rounds tiny negative phases up to exactly TAU
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}
