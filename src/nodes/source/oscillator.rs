//! Multi-shape oscillator

use super::wave::{BandLimitedWave, Shape};
use crate::node::{AudioNode, Inputs, PinSpec, ProcessContext};

const INPUTS: &[PinSpec] = &[
    PinSpec::new("frequency", 440.0),
    PinSpec::new("amplitude", 1.0),
    PinSpec::new("shape", 0.0),
];

/// Waveforms selectable through the `shape` input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sawtooth,
    Triangle,
    Square,
    Stairs,
}

impl Waveform {
    /// Map a control value onto a waveform: rounded, then clamped to `0..=3`.
    pub fn from_value(value: f32) -> Self {
        match value.round() as i32 {
            i32::MIN..=0 => Waveform::Sawtooth,
            1 => Waveform::Triangle,
            2 => Waveform::Square,
            _ => Waveform::Stairs,
        }
    }

    pub fn shape(self) -> Shape {
        match self {
            Waveform::Sawtooth => Shape::new(true, 1.0, 0.5, 0.0),
            Waveform::Triangle => Shape::new(true, 0.5, 0.0, 0.0),
            Waveform::Square => Shape::new(true, 0.0, 1.0, 0.0),
            Waveform::Stairs => Shape::new(false, 0.0, 1.0, 0.5),
        }
    }
}

/// Band-limited oscillator with a selectable waveform (mono source)
///
/// The `shape` input is read every sample; the generator is only rebuilt when the
/// selected [`Waveform`] actually changes, and it keeps its phase across the switch.
#[derive(Clone, Debug)]
pub struct ShapeOscillator {
    waveform: Waveform,
    wave: BandLimitedWave,
}

impl ShapeOscillator {
    pub const FREQUENCY: usize = 0;
    pub const AMPLITUDE: usize = 1;
    pub const SHAPE: usize = 2;

    pub fn new() -> Self {
        let waveform = Waveform::Sawtooth;
        Self {
            waveform,
            wave: BandLimitedWave::new(waveform.shape()),
        }
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }
}

impl Default for ShapeOscillator {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioNode for ShapeOscillator {
    fn name(&self) -> &'static str {
        "ShapeOscillator"
    }

    fn inputs(&self) -> &'static [PinSpec] {
        INPUTS
    }

    fn process(&mut self, ctx: &ProcessContext, inputs: &Inputs<'_>, outputs: &mut [f32]) {
        let waveform = Waveform::from_value(inputs.get(Self::SHAPE));
        if waveform != self.waveform {
            self.waveform = waveform;
            self.wave.configure(waveform.shape());
        }

        let dt = inputs.get(Self::FREQUENCY) / ctx.sample_rate as f32;
        outputs[0] = inputs.get(Self::AMPLITUDE) * self.wave.next_sample(dt);
    }
}
