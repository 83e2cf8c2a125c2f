//! Signal sources (generators with no wired inputs required)

mod midi;
mod oscillator;
mod repeater;
mod sine;
mod wave;

pub use midi::MidiSource;
pub use oscillator::{ShapeOscillator, Waveform};
pub use repeater::MidiRepeater;
pub use sine::Sine;
pub use wave::{BandLimitedWave, Shape};
