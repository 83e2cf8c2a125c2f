use crate::node::{AudioNode, Inputs, PinSpec, ProcessContext};

const INPUTS: &[PinSpec] = &[PinSpec::new("in", 0.0), PinSpec::new("jitter", 0.1)];

/// Multiplies the input by a random factor in `[1 - jitter/2, 1 + jitter/2)`.
///
/// Fed with a frequency this gives a slightly unstable, analog-ish pitch. Uses a
/// per-node generator, so it is safe to run on the audio thread.
pub struct Jitter {
    rng: fastrand::Rng,
}

impl Jitter {
    pub const INPUT: usize = 0;
    pub const AMOUNT: usize = 1;

    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    /// Deterministic sequence for reproducible renders.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl Default for Jitter {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioNode for Jitter {
    fn name(&self) -> &'static str {
        "Jitter"
    }

    fn inputs(&self) -> &'static [PinSpec] {
        INPUTS
    }

    fn process(&mut self, _ctx: &ProcessContext, inputs: &Inputs<'_>, outputs: &mut [f32]) {
        let input = inputs.get(Self::INPUT);
        let amount = inputs.get(Self::AMOUNT);
        outputs[0] = input + input * amount * (self.rng.f32() - 0.5);
    }
}
