//! Exponential moving average

use crate::node::{AudioNode, Inputs, PinSpec, ProcessContext};

const INPUTS: &[PinSpec] = &[PinSpec::new("in", 0.0), PinSpec::new("alpha", 0.1)];

/// One-pole low-pass: `y = alpha * x + (1 - alpha) * y_prev`
///
/// `alpha` is clamped to `[0, 1]`; 1 passes the input through, 0 holds the last value.
/// Useful for gliding control signals such as pitch.
#[derive(Debug, Default)]
pub struct Ema {
    previous: f32,
}

impl Ema {
    pub const INPUT: usize = 0;
    pub const ALPHA: usize = 1;

    pub fn new() -> Self {
        Self::default()
    }

    /// Start from `value` instead of zero.
    pub fn with_initial(value: f32) -> Self {
        Self { previous: value }
    }
}

impl AudioNode for Ema {
    fn name(&self) -> &'static str {
        "Ema"
    }

    fn inputs(&self) -> &'static [PinSpec] {
        INPUTS
    }

    fn process(&mut self, _ctx: &ProcessContext, inputs: &Inputs<'_>, outputs: &mut [f32]) {
        let alpha = inputs.get(Self::ALPHA).clamp(0.0, 1.0);
        let input = inputs.get(Self::INPUT);

        let value = alpha * input + (1.0 - alpha) * self.previous;
        // keep one bad sample from poisoning the state forever
        if value.is_finite() {
            self.previous = value;
        }
        outputs[0] = value;
    }
}
