//! Note state shared between the host and the audio thread.

use core::sync::atomic::{AtomicU8, Ordering};

use atomic_float::AtomicF32;

const NO_NOTE: u8 = u8::MAX;

/// Frequency of MIDI note `note` in twelve-tone equal temperament, A4 (69) = 440 Hz.
#[inline]
pub fn note_to_frequency(note: u8) -> f32 {
    440.0 * 2f32.powf((note as f32 - 69.0) / 12.0)
}

/// Monophonic note state fed by MIDI events.
///
/// Written by the host (MIDI callback, UI) and read by [`MidiSource`](crate::nodes::MidiSource)
/// on the audio thread. All fields are atomics, so share it through an `Arc` without
/// locking.
#[derive(Debug)]
pub struct ControlInput {
    amplitude: AtomicF32,
    base_frequency: AtomicF32,
    bend: AtomicF32,
    note: AtomicU8,
}

impl ControlInput {
    pub fn new() -> Self {
        Self {
            amplitude: AtomicF32::new(0.0),
            base_frequency: AtomicF32::new(440.0),
            bend: AtomicF32::new(0.0),
            note: AtomicU8::new(NO_NOTE),
        }
    }

    /// Start `note`. Velocity 0 is a note-off, as in MIDI.
    pub fn note_on(&self, note: u8, velocity: u8) {
        if velocity == 0 {
            self.note_off(note);
            return;
        }
        let note = note.min(127);
        self.base_frequency
            .store(note_to_frequency(note), Ordering::Relaxed);
        self.amplitude
            .store(velocity.min(127) as f32 / 127.0, Ordering::Relaxed);
        self.note.store(note, Ordering::Relaxed);
    }

    /// Release `note` if it is the one sounding; stale note-offs are ignored.
    pub fn note_off(&self, note: u8) {
        if self
            .note
            .compare_exchange(note, NO_NOTE, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            self.amplitude.store(0.0, Ordering::Relaxed);
        }
    }

    /// Offset the pitch by `semitones` (pitch wheel).
    pub fn pitch_bend(&self, semitones: f32) {
        let semitones = if semitones.is_finite() { semitones } else { 0.0 };
        self.bend.store(semitones, Ordering::Relaxed);
    }

    /// Set amplitude and frequency directly, bypassing note tracking.
    pub fn set(&self, amplitude: f32, frequency: f32) {
        self.note.store(NO_NOTE, Ordering::Relaxed);
        self.base_frequency.store(frequency, Ordering::Relaxed);
        self.amplitude.store(amplitude, Ordering::Relaxed);
    }

    #[inline]
    pub fn amplitude(&self) -> f32 {
        self.amplitude.load(Ordering::Relaxed)
    }

    /// Note frequency with pitch bend applied.
    #[inline]
    pub fn frequency(&self) -> f32 {
        let base = self.base_frequency.load(Ordering::Relaxed);
        let bend = self.bend.load(Ordering::Relaxed);
        if bend == 0.0 {
            base
        } else {
            base * 2f32.powf(bend / 12.0)
        }
    }

    /// The note currently held, if any.
    pub fn note(&self) -> Option<u8> {
        match self.note.load(Ordering::Relaxed) {
            NO_NOTE => None,
            note => Some(note),
        }
    }
}

impl Default for ControlInput {
    fn default() -> Self {
        Self::new()
    }
}
