use crate::node::{AudioNode, Inputs, PinSpec, ProcessContext};

const INPUTS: &[PinSpec] = &[PinSpec::new("in1", 0.0), PinSpec::new("in2", 0.0)];

/// Outputs `in1 - in2`.
///
/// With `in2` left at zero this is a pass-through, which makes it a convenient fixed
/// output node for a patch.
#[derive(Debug, Default)]
pub struct Subtract;

impl Subtract {
    pub const LEFT: usize = 0;
    pub const RIGHT: usize = 1;

    pub fn new() -> Self {
        Self
    }
}

impl AudioNode for Subtract {
    fn name(&self) -> &'static str {
        "Subtract"
    }

    fn inputs(&self) -> &'static [PinSpec] {
        INPUTS
    }

    fn process(&mut self, _ctx: &ProcessContext, inputs: &Inputs<'_>, outputs: &mut [f32]) {
        outputs[0] = inputs.get(Self::LEFT) - inputs.get(Self::RIGHT);
    }
}
