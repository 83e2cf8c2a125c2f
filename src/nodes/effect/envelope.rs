//! Attack/decay/sustain/release envelope

use crate::node::{AudioNode, Inputs, PinSpec, ProcessContext};
use crate::smooth::Declick;

const INPUTS: &[PinSpec] = &[
    PinSpec::new("amplitude", 1.0),
    PinSpec::new("A", 0.1),
    PinSpec::new("D", 0.4),
    PinSpec::new("S", 0.6),
    PinSpec::new("R", 0.8),
];

/// Gate-driven ADSR envelope.
///
/// The `amplitude` input is the gate: zero is off, anything else is on and scales the
/// attack/decay/sustain curve (so a velocity-scaled MIDI amplitude can drive it
/// directly). A change of gate value restarts the curve; dropping to zero snapshots the
/// current level and ramps it linearly to zero over `R` seconds.
///
/// Times are in seconds and read every sample. Zero or negative times are instant
/// transitions. The release ramp is tracked in double precision so it lands on zero
/// after `R` seconds. The result goes through a [`Declick`] so gate jumps never click.
#[derive(Debug, Default)]
pub struct Adsr {
    elapsed: f32,
    last_gate: f32,
    release_level: f64,
    release_decrement: f64,
    declick: Declick,
}

impl Adsr {
    pub const GATE: usize = 0;
    pub const ATTACK: usize = 1;
    pub const DECAY: usize = 2;
    pub const SUSTAIN: usize = 3;
    pub const RELEASE: usize = 4;

    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn is_releasing(&self) -> bool {
        self.release_level > 0.0
    }
}

/// Attack/decay/sustain curve at `t` seconds after the gate went up.
#[inline]
fn attack_decay_sustain(t: f32, attack: f32, decay: f32, sustain: f32) -> f32 {
    if t < attack {
        return t / attack;
    }
    let t = t - attack.max(0.0);
    if t < decay {
        return sustain + (1.0 - t / decay) * (1.0 - sustain);
    }
    sustain
}

impl AudioNode for Adsr {
    fn name(&self) -> &'static str {
        "Adsr"
    }

    fn inputs(&self) -> &'static [PinSpec] {
        INPUTS
    }

    fn process(&mut self, ctx: &ProcessContext, inputs: &Inputs<'_>, outputs: &mut [f32]) {
        let gate = inputs.get(Self::GATE);
        let attack = inputs.get(Self::ATTACK);
        let decay = inputs.get(Self::DECAY);
        let sustain = inputs.get(Self::SUSTAIN).clamp(0.0, 1.0);
        let sample_rate = ctx.sample_rate as f32;

        let level = attack_decay_sustain(self.elapsed, attack, decay, sustain);
        self.elapsed += ctx.sample_period();

        if gate != self.last_gate {
            if gate == 0.0 {
                self.release_level = (level * self.last_gate) as f64;
                let release_samples = (inputs.get(Self::RELEASE) * sample_rate) as f64;
                self.release_decrement = if release_samples > 1.0 {
                    self.release_level / release_samples
                } else {
                    self.release_level
                };
            }
            if gate != 0.0 || self.release_level <= 0.0 {
                self.elapsed = 0.0;
                self.release_level = 0.0;
            }
            self.last_gate = gate;
        }

        let raw = if self.release_level > 0.0 {
            self.release_level = (self.release_level - self.release_decrement).max(0.0);
            self.release_level as f32
        } else {
            gate * level
        };

        outputs[0] = self.declick.process(raw, ctx.sample_rate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pin::Pin;
    use approx::assert_abs_diff_eq;

    const RATE: u32 = 48_000;

    struct Rig {
        adsr: Adsr,
        pins: [Pin; 5],
        ctx: ProcessContext,
    }

    impl Rig {
        fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
            Self {
                adsr: Adsr::new(),
                pins: [
                    Pin::new("amplitude", 0.0),
                    Pin::new("A", attack),
                    Pin::new("D", decay),
                    Pin::new("S", sustain),
                    Pin::new("R", release),
                ],
                ctx: ProcessContext::new(RATE),
            }
        }

        fn gate(&self, value: f32) {
            self.pins[Adsr::GATE].set(value);
        }

        fn run(&mut self, frames: usize) -> Vec<f32> {
            let mut out = [0.0];
            (0..frames)
                .map(|_| {
                    let inputs = Inputs::new(&self.pins, &self.ctx);
                    self.adsr.process(&self.ctx, &inputs, &mut out);
                    self.ctx.advance();
                    out[0]
                })
                .collect()
        }
    }

    fn seconds(s: f32) -> usize {
        (s * RATE as f32).round() as usize
    }

    #[test]
    fn curve_segments() {
        assert_eq!(attack_decay_sustain(0.05, 0.1, 0.4, 0.6), 0.5);
        assert_abs_diff_eq!(attack_decay_sustain(0.1, 0.1, 0.4, 0.6), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(attack_decay_sustain(0.3, 0.1, 0.4, 0.6), 0.8, epsilon = 1e-6);
        assert_eq!(attack_decay_sustain(2.0, 0.1, 0.4, 0.6), 0.6);
        assert_eq!(attack_decay_sustain(0.0, 0.0, 0.0, 0.3), 0.3);
        assert_eq!(attack_decay_sustain(0.0, -1.0, -1.0, 0.3), 0.3);
    }

    #[test]
    fn attack_peaks_then_decays_to_sustain() {
        let mut rig = Rig::new(0.1, 0.4, 0.6, 0.8);
        rig.gate(1.0);

        let out = rig.run(seconds(0.6));
        let peak = seconds(0.1);
        assert_abs_diff_eq!(out[peak], 1.0, epsilon = 1e-2);
        assert!(out.iter().all(|&v| v <= 1.0 + 1e-6));
        assert!(out[..peak].windows(2).all(|w| w[1] >= w[0] - 1e-6));

        assert_abs_diff_eq!(out[seconds(0.5) + 1], 0.6, epsilon = 1e-2);
        assert_abs_diff_eq!(*out.last().unwrap(), 0.6, epsilon = 1e-5);
    }

    #[test]
    fn release_falls_to_zero_in_time() {
        for &held in &[0.05, 0.3, 0.7] {
            let mut rig = Rig::new(0.1, 0.4, 0.6, 0.8);
            rig.gate(1.0);
            rig.run(seconds(held));

            rig.gate(0.0);
            let out = rig.run(seconds(0.8) + 2);
            assert!(rig.adsr.release_level == 0.0);
            assert_eq!(*out.last().unwrap(), 0.0, "held {held}s");
            assert!(
                out.windows(2).all(|w| w[1] <= w[0] + 1e-6),
                "release after {held}s is not monotone"
            );
        }
    }

    #[test]
    fn gate_scales_the_curve() {
        let mut rig = Rig::new(0.0, 0.0, 0.5, 0.1);
        rig.gate(0.5);
        let out = rig.run(seconds(0.02));
        assert_abs_diff_eq!(*out.last().unwrap(), 0.25, epsilon = 1e-5);
    }

    #[test]
    fn zero_times_are_instant_and_finite() {
        let mut rig = Rig::new(0.0, 0.0, 0.8, 0.0);
        rig.gate(1.0);
        let on = rig.run(seconds(0.01));
        assert!(on.iter().all(|v| v.is_finite()));
        assert_abs_diff_eq!(*on.last().unwrap(), 0.8, epsilon = 1e-5);

        rig.gate(0.0);
        let off = rig.run(seconds(Declick::RAMP_SECONDS) + 2);
        assert!(off.iter().all(|v| v.is_finite()));
        assert_eq!(*off.last().unwrap(), 0.0);
    }

    #[test]
    fn retrigger_during_release_restarts_attack() {
        let mut rig = Rig::new(0.1, 0.4, 0.6, 0.8);
        rig.gate(1.0);
        rig.run(seconds(0.6));
        rig.gate(0.0);
        rig.run(seconds(0.2));
        assert!(rig.adsr.is_releasing());

        rig.gate(1.0);
        let out = rig.run(seconds(0.1));
        assert!(!rig.adsr.is_releasing());
        assert!(out.iter().all(|v| v.is_finite()));
        assert_abs_diff_eq!(*out.last().unwrap(), 1.0, epsilon = 1e-2);
    }
}
