//! The per-callback render loop.

use core::sync::atomic::{AtomicU64, Ordering};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use rtrb::Producer;

use crate::graph::NodeGraph;
use crate::meter::Meter;
use crate::node::ProcessContext;
use crate::sample::OutputSample;

/// Fills interleaved device buffers from the engine's current graph.
///
/// This is the body of the device callback. It can also be driven directly for offline
/// rendering, see [`AudioEngine::renderer`](crate::AudioEngine::renderer).
///
/// Real-time safe: the graph is picked up with a lock-free load once per call, and a
/// replaced graph is handed back to the engine through a ring buffer so it is never
/// freed here.
///
/// Frame numbers continue from the engine's clock, so a renderer created after another
/// one never reuses a frame the nodes have already cached.
pub struct Renderer {
    graph: Arc<ArcSwapOption<NodeGraph>>,
    current: Option<Arc<NodeGraph>>,
    retired: Producer<Arc<NodeGraph>>,
    meter: Arc<Meter>,
    clock: Arc<AtomicU64>,
    ctx: ProcessContext,
    channels: usize,
}

impl Renderer {
    pub(crate) fn new(
        graph: Arc<ArcSwapOption<NodeGraph>>,
        retired: Producer<Arc<NodeGraph>>,
        meter: Arc<Meter>,
        clock: Arc<AtomicU64>,
        sample_rate: u32,
        channels: usize,
    ) -> Self {
        let mut ctx = ProcessContext::new(sample_rate);
        ctx.frame = clock.load(Ordering::Acquire);
        Self {
            graph,
            current: None,
            retired,
            meter,
            clock,
            ctx,
            channels: channels.max(1),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.ctx.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Index of the next frame to render on the engine's clock.
    pub fn frames(&self) -> u64 {
        self.ctx.frame
    }

    /// Fill `data` (interleaved, `channels` samples per frame).
    ///
    /// A panic inside the graph is caught and the whole buffer is silenced. The clock
    /// still moves past every frame of the batch.
    pub fn render<T: OutputSample>(&mut self, data: &mut [T]) {
        let start = self.ctx.frame;
        let rendered = panic::catch_unwind(AssertUnwindSafe(|| self.render_frames(&mut *data)));
        if rendered.is_err() {
            data.fill(T::EQUILIBRIUM);
            let frames = (data.len() / self.channels) as u64;
            self.ctx.frame = start.wrapping_add(frames);
        }
        self.clock.store(self.ctx.frame, Ordering::Release);
    }

    fn render_frames<T: OutputSample>(&mut self, data: &mut [T]) {
        self.refresh_graph();

        let Some(output) = self.current.as_ref().and_then(|graph| graph.output()) else {
            data.fill(T::EQUILIBRIUM);
            self.meter.set_db(f32::NEG_INFINITY);
            return;
        };

        let mut ctx = self.ctx;
        let mut recorder = self.meter.recorder();
        let mut sum_squares = 0.0f64;
        let mut frames = 0;

        let mut chunks = data.chunks_exact_mut(self.channels);
        for frame in &mut chunks {
            let mut sample = output.generate(&ctx, 0);
            if !sample.is_finite() {
                sample = 0.0;
            }
            let sample = sample.clamp(-1.0, 1.0);

            let value = T::from_f32(sample);
            for (channel, slot) in frame.iter_mut().enumerate() {
                *slot = if channel < 2 { value } else { T::EQUILIBRIUM };
            }

            sum_squares += (sample as f64) * (sample as f64);
            recorder.record(sample);
            frames += 1;
            ctx.advance();
        }
        chunks.into_remainder().fill(T::EQUILIBRIUM);

        drop(recorder);

        self.ctx = ctx;
        self.meter.record_level(sum_squares, frames);
    }

    /// Pick up the engine's current graph, retiring the one we were using.
    ///
    /// While the retired queue is full the current graph keeps playing, and the swap is
    /// retried on the next call once the engine has collected.
    fn refresh_graph(&mut self) {
        let latest = self.graph.load();
        let unchanged = match (&*latest, &self.current) {
            (Some(latest), Some(current)) => Arc::ptr_eq(latest, current),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return;
        }
        if self.current.is_some() && self.retired.is_full() && !self.retired.is_abandoned() {
            return;
        }

        let previous = core::mem::replace(&mut self.current, (*latest).clone());
        if let Some(previous) = previous {
            // only fails once the engine has dropped its end, so nothing would collect it
            let _ = self.retired.push(previous);
        }
    }
}
