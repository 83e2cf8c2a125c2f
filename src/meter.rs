//! Sample history and loudness for visualization.

use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use arc_swap::{ArcSwap, Guard};
use atomic_float::AtomicF32;

/// `20·log10(rms)`. Silence gives negative infinity.
#[inline]
pub fn rms_to_db(rms: f32) -> f32 {
    20.0 * rms.log10()
}

struct History {
    samples: Box<[AtomicF32]>,
}

impl History {
    fn new(capacity: usize) -> Self {
        Self {
            samples: (0..capacity.max(1)).map(|_| AtomicF32::new(0.0)).collect(),
        }
    }
}

/// Ring buffer of the most recent output samples plus the loudness of the last batch.
///
/// Written only by the render callback, read without locking from any thread. Readers
/// racing the writer may see a partially updated history, which is fine for display.
///
/// The engine keeps one meter for its whole life and resizes it in place when the device
/// runs at another rate, so a cloned handle stays valid.
pub struct Meter {
    history: ArcSwap<History>,
    position: AtomicUsize,
    db: AtomicF32,
}

impl Meter {
    /// A meter holding `capacity` samples (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            history: ArcSwap::from_pointee(History::new(capacity)),
            position: AtomicUsize::new(0),
            db: AtomicF32::new(f32::NEG_INFINITY),
        }
    }

    pub fn capacity(&self) -> usize {
        self.history.load().samples.len()
    }

    /// Index the next sample will be written to. The newest sample sits just before it.
    pub fn history_pos(&self) -> usize {
        self.position.load(Ordering::Acquire)
    }

    /// Raw history slot `index`, in buffer order.
    pub fn sample(&self, index: usize) -> Option<f32> {
        self.history
            .load()
            .samples
            .get(index)
            .map(|sample| sample.load(Ordering::Relaxed))
    }

    /// The most recently written sample.
    pub fn latest(&self) -> f32 {
        let history = self.history.load();
        let capacity = history.samples.len();
        let newest = (self.history_pos() + capacity - 1) % capacity;
        history.samples[newest].load(Ordering::Relaxed)
    }

    /// Copy the history into `out`, oldest sample first.
    pub fn snapshot(&self, out: &mut Vec<f32>) {
        let history = self.history.load();
        let samples = &history.samples;
        let position = self.history_pos().min(samples.len());
        out.clear();
        out.reserve(samples.len());
        out.extend(
            samples[position..]
                .iter()
                .chain(&samples[..position])
                .map(|sample| sample.load(Ordering::Relaxed)),
        );
    }

    /// RMS level of the last rendered batch in dB.
    pub fn db(&self) -> f32 {
        self.db.load(Ordering::Relaxed)
    }

    /// Reallocate the history for `capacity` samples and clear it. No-op if the size
    /// already matches. Allocates, so never call it from the callback.
    pub(crate) fn resize(&self, capacity: usize) {
        let capacity = capacity.max(1);
        if capacity == self.capacity() {
            return;
        }
        self.history.store(Arc::new(History::new(capacity)));
        self.position.store(0, Ordering::Release);
    }

    /// Writer for one callback batch. The cursor is published when it is dropped.
    pub(crate) fn recorder(&self) -> Recorder<'_> {
        let history = self.history.load();
        let mut position = self.position.load(Ordering::Relaxed);
        if position >= history.samples.len() {
            position = 0;
        }
        Recorder {
            meter: self,
            history,
            position,
        }
    }

    /// Publish the loudness of a batch from its sum of squares.
    #[inline]
    pub(crate) fn record_level(&self, sum_squares: f64, frames: usize) {
        if frames > 0 {
            let rms = (sum_squares / frames as f64).sqrt() as f32;
            self.set_db(rms_to_db(rms));
        }
    }

    #[inline]
    pub(crate) fn set_db(&self, db: f32) {
        self.db.store(db, Ordering::Relaxed);
    }
}

impl core::fmt::Debug for Meter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Meter")
            .field("capacity", &self.capacity())
            .field("position", &self.history_pos())
            .field("db", &self.db())
            .finish()
    }
}

/// Appends samples to a [`Meter`]'s history during one batch.
pub(crate) struct Recorder<'a> {
    meter: &'a Meter,
    history: Guard<Arc<History>>,
    position: usize,
}

impl Recorder<'_> {
    /// Append one sample, wrapping at capacity.
    #[inline]
    pub(crate) fn record(&mut self, sample: f32) {
        let samples = &self.history.samples;
        samples[self.position].store(sample, Ordering::Relaxed);
        self.position += 1;
        if self.position == samples.len() {
            self.position = 0;
        }
    }
}

impl Drop for Recorder<'_> {
    fn drop(&mut self) {
        self.meter.position.store(self.position, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn record_all(meter: &Meter, samples: impl IntoIterator<Item = f32>) {
        let mut recorder = meter.recorder();
        for sample in samples {
            recorder.record(sample);
        }
    }

    #[test]
    fn cursor_wraps_at_capacity() {
        let meter = Meter::new(100);
        let written = 250;
        // two batches, the cursor carries over
        record_all(&meter, (0..120).map(|i| i as f32));
        record_all(&meter, (120..written).map(|i| i as f32));

        assert_eq!(meter.history_pos(), written % meter.capacity());
        let newest = (written - 1) % meter.capacity();
        assert_eq!(meter.sample(newest), Some((written - 1) as f32));
        assert_eq!(meter.latest(), (written - 1) as f32);
        assert_eq!(meter.sample(100), None);
    }

    #[test]
    fn snapshot_is_chronological() {
        let meter = Meter::new(4);
        record_all(&meter, (0..6).map(|i| i as f32));
        let mut out = Vec::new();
        meter.snapshot(&mut out);
        assert_eq!(out, vec![2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn level_in_db() {
        let meter = Meter::new(1);
        assert_eq!(meter.db(), f32::NEG_INFINITY);

        // constant 0.5 over 10 frames
        meter.record_level(10.0 * 0.25, 10);
        assert_abs_diff_eq!(meter.db(), -6.0206, epsilon = 1e-3);

        // empty batches leave the last value alone
        meter.record_level(0.0, 0);
        assert_abs_diff_eq!(meter.db(), -6.0206, epsilon = 1e-3);

        meter.record_level(0.0, 10);
        assert_eq!(meter.db(), f32::NEG_INFINITY);
    }

    #[test]
    fn zero_capacity_is_bumped() {
        let meter = Meter::new(0);
        assert_eq!(meter.capacity(), 1);
        record_all(&meter, [0.5]);
        assert_eq!(meter.history_pos(), 0);
        assert_eq!(meter.latest(), 0.5);
    }

    #[test]
    fn resize_keeps_shared_handles_live() {
        let meter = Arc::new(Meter::new(8));
        let reader = meter.clone();
        record_all(&meter, (0..5).map(|i| i as f32));

        meter.resize(8);
        assert_eq!(reader.history_pos(), 5);

        meter.resize(3);
        assert_eq!(reader.capacity(), 3);
        assert_eq!(reader.history_pos(), 0);
        assert_eq!(reader.sample(0), Some(0.0));

        record_all(&meter, [7.0, 8.0]);
        assert_eq!(reader.latest(), 8.0);
        let mut out = Vec::new();
        reader.snapshot(&mut out);
        assert_eq!(out, vec![0.0, 7.0, 8.0]);
    }
}
