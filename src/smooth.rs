//! Click suppression for control signals.

/// Rate-limited follower that turns level jumps into short ramps.
///
/// Works on the squared magnitude: each sample the tracked square moves toward the
/// squared target by at most `1 / (RAMP_SECONDS * sample_rate)`, and the output is its
/// square root. A full-scale jump therefore takes [`Declick::RAMP_SECONDS`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Declick {
    squared: f32,
}

impl Declick {
    /// Time for a full 0 -> 1 swing.
    pub const RAMP_SECONDS: f32 = 0.005;

    pub fn new() -> Self {
        Self::default()
    }

    /// Current output without advancing.
    pub fn value(&self) -> f32 {
        self.squared.sqrt()
    }

    /// Step toward `target` and return the smoothed value.
    ///
    /// Negative and NaN targets count as zero.
    #[inline]
    pub fn process(&mut self, target: f32, sample_rate: u32) -> f32 {
        let target = target.max(0.0);
        let goal = target * target;
        let step = 1.0 / (Self::RAMP_SECONDS * sample_rate as f32);

        let delta = goal - self.squared;
        if delta.abs() <= step || !delta.is_finite() {
            self.squared = if goal.is_finite() { goal } else { 0.0 };
        } else {
            self.squared += step.copysign(delta);
        }

        self.squared.sqrt()
    }
}
