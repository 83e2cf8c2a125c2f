//! Note recorder and looper

use std::sync::Arc;

use crate::control::ControlInput;
use crate::node::{AudioNode, Inputs, PinSpec, ProcessContext};

const INPUTS: &[PinSpec] = &[
    PinSpec::new("repeat", 0.0),
    PinSpec::new("quantum", 0.125),
    PinSpec::new("clear", 0.0),
];
const OUTPUTS: &[&str] = &["amp", "freq"];

/// Number of notes kept; older notes are overwritten.
const MAX_NOTES: usize = 8;

/// A captured note, times in seconds of stream time.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct RecordedNote {
    amplitude: f32,
    frequency: f32,
    start: f64,
    end: f64,
}

#[derive(Clone, Copy, Debug)]
struct Playback {
    started: f64,
    start: f64,
    length: f64,
}

/// Records the notes of a [`ControlInput`] and plays them back in a loop.
///
/// While `repeat` is below 0.5 the live note passes through and every note is recorded,
/// with start and end snapped to multiples of `quantum` seconds (no snapping if
/// `quantum` is 0). When `repeat` goes high, the recorded window is looped from its
/// first note, padded to a whole number of quanta. A rising `clear` forgets every
/// recorded note and stops a running loop. Outputs match [`MidiSource`].
///
/// Time is measured in frames of the stream, so it stays locked to the audio clock.
///
/// [`MidiSource`]: crate::nodes::MidiSource
#[derive(Debug)]
pub struct MidiRepeater {
    controls: Arc<ControlInput>,
    notes: [RecordedNote; MAX_NOTES],
    recorded: usize,
    next: usize,
    open: Option<RecordedNote>,
    last_amplitude: f32,
    last_note: Option<u8>,
    last_frequency: f32,
    repeating: bool,
    clearing: bool,
    playback: Option<Playback>,
}

impl MidiRepeater {
    pub const REPEAT: usize = 0;
    pub const QUANTUM: usize = 1;
    pub const CLEAR: usize = 2;

    pub const AMPLITUDE: usize = 0;
    pub const FREQUENCY: usize = 1;

    pub fn new(controls: Arc<ControlInput>) -> Self {
        Self {
            controls,
            notes: [RecordedNote::default(); MAX_NOTES],
            recorded: 0,
            next: 0,
            open: None,
            last_amplitude: 0.0,
            last_note: None,
            last_frequency: 0.0,
            repeating: false,
            clearing: false,
            playback: None,
        }
    }

    /// Completed recordings, oldest slots first.
    fn notes(&self) -> &[RecordedNote] {
        &self.notes[..self.recorded]
    }

    /// Forget every recorded note. A key still held starts a fresh note.
    fn clear(&mut self) {
        self.recorded = 0;
        self.next = 0;
        self.open = None;
        self.playback = None;
        self.last_amplitude = 0.0;
        self.last_note = None;
    }

    fn record(&mut self, now: f64, quantum: f64) -> (f32, f32) {
        let amplitude = self.controls.amplitude();
        let frequency = self.controls.frequency();
        let note = self.controls.note();

        if amplitude != self.last_amplitude || note != self.last_note {
            self.close(now, quantum);
            if amplitude > 0.0 {
                self.open = Some(RecordedNote {
                    amplitude,
                    frequency,
                    start: now,
                    end: f64::INFINITY,
                });
            }
        }

        self.last_amplitude = amplitude;
        self.last_note = note;
        self.last_frequency = frequency;
        (amplitude, frequency)
    }

    fn close(&mut self, now: f64, quantum: f64) {
        let Some(mut note) = self.open.take() else {
            return;
        };
        note.end = now;
        if quantum > 0.0 {
            note.start = snap(note.start, quantum);
            note.end = snap(note.end, quantum).max(note.start + quantum);
        }

        self.notes[self.next] = note;
        self.next = (self.next + 1) % MAX_NOTES;
        self.recorded = (self.recorded + 1).min(MAX_NOTES);
    }

    fn window(&self, quantum: f64) -> Option<(f64, f64)> {
        let notes = self.notes();
        let first = notes.iter().map(|n| n.start).fold(f64::INFINITY, f64::min);
        let last = notes.iter().map(|n| n.end).fold(f64::NEG_INFINITY, f64::max);
        if !(last > first) {
            return None;
        }

        if quantum > 0.0 {
            let start = (first / quantum).floor() * quantum;
            let length = ((last - start) / quantum).ceil() * quantum;
            Some((start, length.max(quantum)))
        } else {
            Some((first, last - first))
        }
    }

    fn replay(&mut self, now: f64) -> (f32, f32) {
        let Some(playback) = self.playback else {
            return (0.0, self.last_frequency);
        };

        let position = playback.start + (now - playback.started).rem_euclid(playback.length);
        let sounding = self
            .notes()
            .iter()
            .find(|note| note.start <= position && position < note.end)
            .copied();

        match sounding {
            Some(note) => {
                self.last_frequency = note.frequency;
                (note.amplitude, note.frequency)
            }
            None => (0.0, self.last_frequency),
        }
    }
}

#[inline]
fn snap(time: f64, quantum: f64) -> f64 {
    (time / quantum).round() * quantum
}

impl AudioNode for MidiRepeater {
    fn name(&self) -> &'static str {
        "MidiRepeater"
    }

    fn inputs(&self) -> &'static [PinSpec] {
        INPUTS
    }

    fn outputs(&self) -> &'static [&'static str] {
        OUTPUTS
    }

    fn process(&mut self, ctx: &ProcessContext, inputs: &Inputs<'_>, outputs: &mut [f32]) {
        let now = ctx.time();
        let quantum = inputs.get(Self::QUANTUM).max(0.0) as f64;
        let repeating = inputs.get(Self::REPEAT) >= 0.5;

        let clearing = inputs.get(Self::CLEAR) >= 0.5;
        if clearing && !self.clearing {
            self.clear();
        }
        self.clearing = clearing;

        if repeating != self.repeating {
            self.repeating = repeating;
            if repeating {
                self.close(now, quantum);
                self.playback = self.window(quantum).map(|(start, length)| Playback {
                    started: now,
                    start,
                    length,
                });
            } else {
                self.playback = None;
                // a key still held when playback stops starts a fresh note
                self.last_amplitude = 0.0;
                self.last_note = None;
            }
        }

        let (amplitude, frequency) = if repeating {
            self.replay(now)
        } else {
            self.record(now, quantum)
        };
        outputs[Self::AMPLITUDE] = amplitude;
        outputs[Self::FREQUENCY] = frequency;
    }
}
