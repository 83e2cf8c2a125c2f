//! Play a short melody through the MIDI voice patch on the default output device.
//!
//! Run with: cargo run --example voice

use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

use klangnetz::{patch, AudioEngine, ControlInput, EngineConfig};
use tracing::info;

const MELODY: &[(u8, u64)] = &[(60, 400), (64, 400), (67, 400), (72, 800), (67, 400), (60, 1200)];

fn main() -> klangnetz::Result<()> {
    tracing_subscriber::fmt::init();

    let controls = Arc::new(ControlInput::new());
    let mut engine = AudioEngine::new(EngineConfig::default())?;
    engine.set_graph(Arc::new(patch::midi_voice(&controls)?));
    engine.init()?;

    for &(note, millis) in MELODY {
        controls.note_on(note, 100);
        sleep(Duration::from_millis(millis * 3 / 4));
        info!(note, db = engine.db(), "Playing");
        controls.note_off(note);
        sleep(Duration::from_millis(millis / 4));
    }

    // let the last release ring out
    sleep(Duration::from_millis(500));
    info!(db = engine.db(), history_pos = engine.history_pos(), "Done");

    engine.clear_graph();
    sleep(Duration::from_millis(50));
    engine.collect_garbage();
    engine.stop();
    Ok(())
}
