//! Error types.
//!
//! Two families: [`DeviceError`] is fatal to [`AudioEngine::init`](crate::AudioEngine::init)
//! and surfaces straight to the host, [`GraphError`] reports a caller breaking the graph
//! editing contract. Neither is ever produced on the audio thread.

use thiserror::Error;

use crate::node::NodeId;

/// Crate-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("The output stream is already running")]
    StreamActive,
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;

/// Failure to open or configure the output device.
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("No output device available")]
    NoDevice,

    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[cfg(feature = "cpal_sink")]
    #[error("Failed to query default output config")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[cfg(feature = "cpal_sink")]
    #[error("Failed to query supported output configs")]
    SupportedConfigs(#[from] cpal::SupportedStreamConfigsError),

    #[cfg(feature = "cpal_sink")]
    #[error("Failed to build output stream")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[cfg(feature = "cpal_sink")]
    #[error("Failed to start output stream")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("Built without the `cpal_sink` feature")]
    Disabled,
}

/// Graph editing contract violations.
///
/// These are expected to be prevented by construction in the host layer; the graph
/// reports them instead of leaving a half-applied edit behind.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("node {0} is not a member of this graph")]
    NotInGraph(NodeId),

    #[error("connecting {from} -> {to} would create a cycle")]
    Cycle { from: NodeId, to: NodeId },

    #[error("node {0} is part of a wiring cycle")]
    Cyclic(NodeId),

    #[error("node '{node}' has no input pin {index}")]
    NoSuchInput { node: &'static str, index: usize },

    #[error("node '{node}' has no output pin {index}")]
    NoSuchOutput { node: &'static str, index: usize },

    #[error("node '{node}' has no input pin named '{name}'")]
    UnknownPin { node: &'static str, name: String },
}
