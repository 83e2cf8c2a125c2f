//! The audio engine: device stream, active graph and metering.

use core::sync::atomic::AtomicU64;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use rtrb::{Consumer, RingBuffer};
use tracing::debug;
#[cfg(feature = "cpal_sink")]
use tracing::info;

#[cfg(feature = "cpal_sink")]
use cpal::traits::StreamTrait;

use crate::config::EngineConfig;
#[cfg(feature = "cpal_sink")]
use crate::device::CpalDevice;
use crate::error::{DeviceError, Error, Result};
use crate::graph::NodeGraph;
use crate::meter::Meter;
use crate::renderer::Renderer;

/// Replaced graphs waiting to be freed off the audio thread.
const RETIRED_CAPACITY: usize = 32;

#[cfg(feature = "cpal_sink")]
type Stream = cpal::Stream;
#[cfg(not(feature = "cpal_sink"))]
type Stream = core::convert::Infallible;

/// Owns the output stream and the handle to the graph it plays.
///
/// ```no_run
/// use std::sync::Arc;
/// use klangnetz::nodes::Sine;
/// use klangnetz::{AudioEngine, EngineConfig, NodeGraph};
///
/// let mut graph = NodeGraph::new();
/// let sine = graph.add(Sine::new());
/// sine.set(Sine::AMPLITUDE, 0.25)?;
/// graph.set_output(&sine)?;
///
/// let mut engine = AudioEngine::new(EngineConfig::default())?;
/// engine.set_graph(Arc::new(graph));
/// engine.init()?;
/// # Ok::<(), klangnetz::Error>(())
/// ```
///
/// The graph can be swapped at any time. The callback picks up the new graph at its
/// next invocation and hands the old one back; call [`collect_garbage`](Self::collect_garbage)
/// now and then (every `set_graph` does it too) to free those on the calling thread.
pub struct AudioEngine {
    // dropped first, so the callback is gone before anything it references
    stream: Option<Stream>,
    config: EngineConfig,
    graph: Arc<ArcSwapOption<NodeGraph>>,
    meter: Arc<Meter>,
    clock: Arc<AtomicU64>,
    retired: Option<Consumer<Arc<NodeGraph>>>,
    sample_rate: u32,
    channels: usize,
}

impl AudioEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let meter = Arc::new(Meter::new(config.history_len(config.sample_rate)));

        Ok(Self {
            stream: None,
            sample_rate: config.sample_rate,
            channels: config.channels as usize,
            config,
            graph: Arc::new(ArcSwapOption::empty()),
            meter,
            clock: Arc::new(AtomicU64::new(0)),
            retired: None,
        })
    }

    /// Open the default output device and start playing.
    ///
    /// The sample rate may differ from the configured one if the device insists; check
    /// [`sample_rate`](Self::sample_rate) afterwards. Calling this while running is a no-op.
    #[cfg(feature = "cpal_sink")]
    pub fn init(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let device = CpalDevice::open(&self.config)?;
        let renderer = self.make_renderer(device.sample_rate(), device.channels() as usize);
        let stream = device.build_stream(renderer)?;
        stream.play().map_err(DeviceError::from)?;

        info!(
            device = device.name(),
            rate = self.sample_rate,
            channels = self.channels,
            history = self.meter.capacity(),
            "Audio stream started"
        );
        self.stream = Some(stream);
        Ok(())
    }

    #[cfg(not(feature = "cpal_sink"))]
    pub fn init(&mut self) -> Result<()> {
        Err(DeviceError::Disabled.into())
    }

    /// Stop and drop the output stream.
    pub fn stop(&mut self) {
        if self.stream.take().is_some() {
            debug!("Audio stream stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.stream.is_some()
    }

    /// A renderer at the configured rate, for driving the graph without a device.
    ///
    /// Fails while the device stream is running, since history and metering have a
    /// single writer. The renderer picks up the engine's frame clock where the last one
    /// left it, so drive one renderer at a time.
    pub fn renderer(&mut self, channels: usize) -> Result<Renderer> {
        if self.is_running() {
            return Err(Error::StreamActive);
        }
        Ok(self.make_renderer(self.config.sample_rate, channels))
    }

    fn make_renderer(&mut self, sample_rate: u32, channels: usize) -> Renderer {
        self.meter.resize(self.config.history_len(sample_rate));
        self.sample_rate = sample_rate;
        self.channels = channels;

        let (producer, consumer) = RingBuffer::new(RETIRED_CAPACITY);
        self.collect_garbage();
        self.retired = Some(consumer);

        Renderer::new(
            self.graph.clone(),
            producer,
            self.meter.clone(),
            self.clock.clone(),
            sample_rate,
            channels,
        )
    }

    /// Make `graph` the active graph.
    pub fn set_graph(&mut self, graph: Arc<NodeGraph>) {
        debug!(
            nodes = graph.len(),
            output = ?graph.output().map(|node| node.id()),
            "set graph"
        );
        self.graph.store(Some(graph));
        self.collect_garbage();
    }

    /// Remove the active graph; the output goes silent.
    pub fn clear_graph(&mut self) {
        debug!("clear graph");
        self.graph.store(None);
        self.collect_garbage();
    }

    pub fn graph(&self) -> Option<Arc<NodeGraph>> {
        self.graph.load_full()
    }

    /// Edit a copy of the active graph (or an empty one) and swap it in.
    ///
    /// Nodes are shared between the copies, so this is cheap and the callback never sees
    /// a half-edited node list.
    pub fn update_graph<F, R>(&mut self, edit: F) -> R
    where
        F: FnOnce(&mut NodeGraph) -> R,
    {
        let mut next = self
            .graph
            .load_full()
            .map(|graph| NodeGraph::clone(&graph))
            .unwrap_or_default();
        let result = edit(&mut next);
        self.set_graph(Arc::new(next));
        result
    }

    /// Free graphs the callback has let go of. Returns how many were collected.
    pub fn collect_garbage(&mut self) -> usize {
        let Some(retired) = self.retired.as_mut() else {
            return 0;
        };
        let mut collected = 0;
        while let Ok(graph) = retired.pop() {
            drop(graph);
            collected += 1;
        }
        collected
    }

    /// RMS level of the last callback batch in dB.
    pub fn db(&self) -> f32 {
        self.meter.db()
    }

    /// Write cursor of the sample history.
    pub fn history_pos(&self) -> usize {
        self.meter.history_pos()
    }

    /// Sample history and loudness. The handle stays valid for the engine's lifetime; the
    /// history is resized in place when `init` negotiates a different rate.
    pub fn meter(&self) -> &Arc<Meter> {
        &self.meter
    }

    /// Sample rate of the stream, or the configured one before `init`.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
