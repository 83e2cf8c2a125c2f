//! Band-limited piecewise-linear waveform generator.
//!
//! One period is described by nine vertices on `[0, 1]`. Discontinuities in value and
//! slope at the segment joins are smoothed with polynomial BLEP and BLAMP residuals, so
//! harsh shapes (saw, square) stay mostly alias-free without oversampling.

const MAX_SEGMENTS: usize = 8;
const MIN_SEGMENT: f32 = 1.0e-5;
const MIN_CORNER: f32 = 1.0e-6;

/// Parameters of a piecewise-linear period.
///
/// The first half rises from zero to the peak and settles at `half_height`; the second
/// half is either the negated copy of the first (`reflect == false`) or its mirror image
/// in time (`reflect == true`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shape {
    pub reflect: bool,
    /// Where the peak sits between the end of the zero wait and the half period, `[0, 1]`
    pub peak_time: f32,
    /// Value at the half period, `[-1, 1]`
    pub half_height: f32,
    /// Fraction of the half period spent at zero before rising, `[0, 1]`
    pub zero_wait: f32,
}

impl Shape {
    pub const fn new(reflect: bool, peak_time: f32, half_height: f32, zero_wait: f32) -> Self {
        Self {
            reflect,
            peak_time,
            half_height,
            zero_wait,
        }
    }

    fn vertices(self) -> [(f32, f32); 9] {
        let zero_wait = self.zero_wait.clamp(0.0, 1.0);
        let peak_time = self.peak_time.clamp(0.0, 1.0);
        let half_height = self.half_height.clamp(-1.0, 1.0);

        let mut v = [(0.0, 0.0); 9];
        v[1] = (zero_wait * 0.5, 0.0);
        v[2] = (0.5 * peak_time + v[1].0 * (1.0 - peak_time), 1.0);
        v[3] = (0.5, half_height);
        for j in 4..8 {
            v[j] = if self.reflect {
                (1.0 - v[7 - j].0, -v[7 - j].1)
            } else {
                (0.5 + v[j - 4].0, -v[j - 4].1)
            };
        }
        v[8] = (1.0, 0.0);
        v
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Segment {
    start: f32,
    end: f32,
    value: f32,
    slope: f32,
}

impl Segment {
    #[inline]
    fn at(&self, t: f32) -> f32 {
        self.value + self.slope * (t - self.start)
    }
}

/// A value step and slope change at a segment join.
#[derive(Clone, Copy, Debug, Default)]
struct Corner {
    time: f32,
    step: f32,
    kink: f32,
}

/// Stateful generator for a [`Shape`].
#[derive(Clone, Debug)]
pub struct BandLimitedWave {
    segments: [Segment; MAX_SEGMENTS],
    segment_count: usize,
    corners: [Corner; MAX_SEGMENTS],
    corner_count: usize,
    phase: f32,
}

impl BandLimitedWave {
    pub fn new(shape: Shape) -> Self {
        let mut wave = Self {
            segments: [Segment::default(); MAX_SEGMENTS],
            segment_count: 0,
            corners: [Corner::default(); MAX_SEGMENTS],
            corner_count: 0,
            phase: 0.0,
        };
        wave.configure(shape);
        wave
    }

    /// Switch to another shape, keeping the phase.
    pub fn configure(&mut self, shape: Shape) {
        self.segment_count = 0;
        for pair in shape.vertices().windows(2) {
            let ((t0, v0), (t1, v1)) = (pair[0], pair[1]);
            let length = t1 - t0;
            if length > MIN_SEGMENT {
                self.segments[self.segment_count] = Segment {
                    start: t0,
                    end: t1,
                    value: v0,
                    slope: (v1 - v0) / length,
                };
                self.segment_count += 1;
            }
        }
        if self.segment_count == 0 {
            self.segments[0] = Segment {
                start: 0.0,
                end: 1.0,
                value: 0.0,
                slope: 0.0,
            };
            self.segment_count = 1;
        }

        self.corner_count = 0;
        let count = self.segment_count;
        for i in 0..count {
            let previous = self.segments[(i + count - 1) % count];
            let current = self.segments[i];
            let step = current.value - previous.at(previous.end);
            let kink = current.slope - previous.slope;
            if step.abs() > MIN_CORNER || kink.abs() > MIN_CORNER {
                self.corners[self.corner_count] = Corner {
                    time: current.start,
                    step,
                    kink,
                };
                self.corner_count += 1;
            }
        }
    }

    /// Position within the period, `[0, 1)`.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Value at the current phase, then advance by `dt` periods.
    ///
    /// `dt` is frequency over sample rate. Its magnitude is used and capped at Nyquist.
    pub fn next_sample(&mut self, dt: f32) -> f32 {
        let dt = if dt.is_finite() { dt.abs().min(0.5) } else { 0.0 };
        let phase = self.phase;

        let mut value = self.naive(phase);
        if dt > 0.0 {
            for corner in &self.corners[..self.corner_count] {
                let mut x = phase - corner.time;
                if x < 0.0 {
                    x += 1.0;
                }
                value += corner.step * blep(x, dt) + corner.kink * blamp(x, dt);
            }
        }

        self.phase += dt;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        value
    }

    fn naive(&self, phase: f32) -> f32 {
        let segments = &self.segments[..self.segment_count];
        segments
            .iter()
            .find(|segment| phase < segment.end)
            .or_else(|| segments.last())
            .map_or(0.0, |segment| segment.at(phase))
    }
}

/// Residual of a unit step at `x = 0`, for `x` in `[0, 1)` periods since the step.
#[inline]
fn blep(x: f32, dt: f32) -> f32 {
    if x < dt {
        let u = x / dt;
        -0.5 * (1.0 - u) * (1.0 - u)
    } else if x > 1.0 - dt {
        let u = (x - 1.0) / dt;
        0.5 * (1.0 + u) * (1.0 + u)
    } else {
        0.0
    }
}

/// Residual of a unit slope change at `x = 0`.
#[inline]
fn blamp(x: f32, dt: f32) -> f32 {
    if x < dt {
        let u = 1.0 - x / dt;
        dt * u * u * u / 6.0
    } else if x > 1.0 - dt {
        let u = (x - 1.0) / dt + 1.0;
        dt * u * u * u / 6.0
    } else {
        0.0
    }
}
