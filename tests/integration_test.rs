use std::sync::Arc;

use approx::assert_abs_diff_eq;
use klangnetz::nodes::{Jitter, ShapeOscillator, Sine, Subtract, Waveform};
use klangnetz::{
    patch, AudioEngine, ControlInput, EngineConfig, GraphError, Node, NodeGraph, Renderer,
};

const RATE: usize = 48_000;

fn engine() -> AudioEngine {
    AudioEngine::new(EngineConfig::default()).unwrap()
}

fn sine_graph(frequency: f32, amplitude: f32) -> NodeGraph {
    let mut graph = NodeGraph::new();
    let sine = graph.add(Sine::new());
    sine.set(Sine::FREQUENCY, frequency).unwrap();
    sine.set(Sine::AMPLITUDE, amplitude).unwrap();
    graph.set_output(&sine).unwrap();
    graph
}

/// Render `frames` stereo frames and return the left channel.
fn render_left(renderer: &mut Renderer, frames: usize) -> Vec<f32> {
    let mut data = vec![0.0f32; frames * 2];
    renderer.render(&mut data);
    data.chunks_exact(2).map(|frame| frame[0]).collect()
}

fn rms(samples: &[f32]) -> f32 {
    let sum: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum / samples.len() as f64).sqrt() as f32
}

#[test]
fn sine_end_to_end() {
    let mut engine = engine();
    engine.set_graph(Arc::new(sine_graph(440.0, 0.5)));
    let mut renderer = engine.renderer(2).unwrap();

    let mut data = vec![0.0f32; RATE * 2];
    renderer.render(&mut data);

    let left: Vec<f32> = data.iter().step_by(2).copied().collect();
    let right: Vec<f32> = data.iter().skip(1).step_by(2).copied().collect();
    assert_eq!(left, right);

    assert_abs_diff_eq!(rms(&left), 0.5 / 2f32.sqrt(), epsilon = 1e-3);
    assert_abs_diff_eq!(engine.db(), -9.03, epsilon = 0.05);

    let peak = left.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    assert_abs_diff_eq!(peak, 0.5, epsilon = 1e-3);
}

#[test]
fn renders_at_44_1_khz() {
    let config = EngineConfig::default().with_sample_rate(44_100);
    let mut engine = AudioEngine::new(config).unwrap();
    assert_eq!(engine.sample_rate(), 44_100);
    // ten seconds of history at this rate
    assert_eq!(engine.meter().capacity(), 441_000);

    engine.set_graph(Arc::new(sine_graph(440.0, 0.5)));
    let mut renderer = engine.renderer(2).unwrap();
    assert_eq!(renderer.sample_rate(), 44_100);

    let left = render_left(&mut renderer, 44_100);
    let rising = left
        .windows(2)
        .filter(|pair| pair[0] < 0.0 && pair[1] >= 0.0)
        .count();
    assert!((439..=441).contains(&rising), "{rising} cycles");
    assert_abs_diff_eq!(rms(&left), 0.5 / 2f32.sqrt(), epsilon = 1e-3);
    assert_abs_diff_eq!(engine.db(), -9.03, epsilon = 0.05);
    assert_eq!(engine.history_pos(), 44_100);
}

#[test]
fn no_graph_is_exact_silence() {
    let mut engine = engine();
    let mut renderer = engine.renderer(2).unwrap();

    for &frames in &[0, 1, 17, 256, 4096] {
        let mut float = vec![0.3f32; frames * 2];
        renderer.render(&mut float);
        assert!(float.iter().all(|&s| s == 0.0));

        let mut int = vec![123i16; frames * 2];
        renderer.render(&mut int);
        assert!(int.iter().all(|&s| s == 0));

        let mut unsigned = vec![0u16; frames * 2];
        renderer.render(&mut unsigned);
        assert!(unsigned.iter().all(|&s| s == 32_768));
    }
    assert_eq!(engine.db(), f32::NEG_INFINITY);
}

#[test]
fn history_wraps_at_capacity() {
    let config = EngineConfig::default().with_history_seconds(0.01);
    let mut engine = AudioEngine::new(config).unwrap();
    let capacity = engine.meter().capacity();
    assert_eq!(capacity, 480);

    engine.set_graph(Arc::new(sine_graph(1000.0, 0.8)));
    let mut renderer = engine.renderer(2).unwrap();

    let written = 3 * capacity + 123;
    let mut left = Vec::new();
    // uneven batches, like a real device
    for batch in [100, 1, 777, written - 878] {
        left.extend(render_left(&mut renderer, batch));
    }
    assert_eq!(left.len(), written);

    assert_eq!(engine.history_pos(), written % capacity);
    let newest = (written - 1) % capacity;
    assert_eq!(engine.meter().sample(newest), left.last().copied());

    let mut history = Vec::new();
    engine.meter().snapshot(&mut history);
    assert_eq!(history, left[written - capacity..]);
}

#[test]
fn i16_output_is_scaled() {
    let mut engine = engine();
    engine.set_graph(Arc::new(sine_graph(440.0, 0.5)));
    let mut float_renderer = engine.renderer(2).unwrap();
    let mut expected = vec![0.0f32; 512];
    float_renderer.render(&mut expected);

    engine.set_graph(Arc::new(sine_graph(440.0, 0.5)));
    let mut int_renderer = engine.renderer(2).unwrap();
    let mut data = vec![0i16; 512];
    int_renderer.render(&mut data);

    for (&s, &f) in data.iter().zip(&expected) {
        assert_eq!(s, (f * 32_767.0) as i16);
    }
    assert!(data.iter().any(|&s| s > 16_000));
}

#[test]
fn live_edits_take_effect() {
    let mut engine = engine();
    let mut graph = NodeGraph::new();
    let out = graph.add(Subtract::new());
    out.set(Subtract::LEFT, 0.25).unwrap();
    graph.set_output(&out).unwrap();
    engine.set_graph(Arc::new(graph));
    let mut renderer = engine.renderer(2).unwrap();

    assert!(render_left(&mut renderer, 64).iter().all(|&s| s == 0.25));

    // rewire the playing graph through its pins
    let sine = Node::new(Sine::new());
    sine.set(Sine::AMPLITUDE, 0.1).unwrap();
    out.connect(Subtract::LEFT, &sine, 0).unwrap();
    let wired = render_left(&mut renderer, 64);
    assert!(wired.iter().all(|s| s.abs() <= 0.1 + 1e-6));
    assert!(wired.iter().any(|&s| s != 0.25));

    // and back to the literal
    out.disconnect(Subtract::LEFT).unwrap();
    assert!(render_left(&mut renderer, 64).iter().all(|&s| s == 0.25));
}

#[test]
fn graph_swap_switches_output() {
    let mut engine = engine();
    let mut renderer = engine.renderer(2).unwrap();

    engine.set_graph(Arc::new(sine_graph(440.0, 0.5)));
    assert!(rms(&render_left(&mut renderer, 4800)) > 0.3);

    engine.update_graph(|graph| graph.clear_output());
    assert!(render_left(&mut renderer, 4800).iter().all(|&s| s == 0.0));

    engine.set_graph(Arc::new(sine_graph(440.0, 0.25)));
    assert_abs_diff_eq!(rms(&render_left(&mut renderer, 4800)), 0.1768, epsilon = 1e-3);

    engine.clear_graph();
    assert!(render_left(&mut renderer, 64).iter().all(|&s| s == 0.0));
    assert!(engine.graph().is_none());
}

#[test]
fn cycles_are_rejected() {
    let mut graph = NodeGraph::new();
    let a = graph.add(Subtract::new());
    let b = graph.add(Subtract::new());
    graph.connect(&b, Subtract::LEFT, &a, 0).unwrap();

    assert_eq!(
        graph.connect(&a, Subtract::RIGHT, &b, 0),
        Err(GraphError::Cycle {
            from: b.id(),
            to: a.id()
        })
    );
    assert!(!a.inputs()[Subtract::RIGHT].is_bound());
    assert_eq!(graph.evaluation_order().unwrap(), vec![a.id(), b.id()]);
}

#[test]
fn oscillator_shapes_through_the_engine() {
    let mut engine = engine();
    let mut graph = NodeGraph::new();
    let osc = graph.add(ShapeOscillator::new());
    osc.set(ShapeOscillator::FREQUENCY, 100.0).unwrap();
    osc.set(ShapeOscillator::AMPLITUDE, 0.5).unwrap();
    graph.set_output(&osc).unwrap();
    engine.set_graph(Arc::new(graph));
    let mut renderer = engine.renderer(2).unwrap();

    // whole periods at 100 Hz
    let expected = [
        (Waveform::Sawtooth, 0.5 / 3f32.sqrt()),
        (Waveform::Triangle, 0.5 / 3f32.sqrt()),
        (Waveform::Square, 0.5),
        (Waveform::Stairs, 0.5 / 2f32.sqrt()),
    ];
    for (index, &(waveform, level)) in expected.iter().enumerate() {
        osc.set(ShapeOscillator::SHAPE, index as f32).unwrap();
        let samples = render_left(&mut renderer, 4800);
        assert_abs_diff_eq!(rms(&samples), level, epsilon = 0.01);
        assert!(samples.iter().all(|s| s.abs() <= 0.55), "{waveform:?}");
    }
}

#[test]
fn midi_voice_plays_and_releases() {
    let controls = Arc::new(ControlInput::new());
    let mut engine = engine();
    engine.set_graph(Arc::new(patch::midi_voice(&controls).unwrap()));
    let mut renderer = engine.renderer(2).unwrap();

    assert!(render_left(&mut renderer, 4800).iter().all(|&s| s == 0.0));

    controls.note_on(69, 127);
    let attack = render_left(&mut renderer, 4800);
    assert!(engine.db() > -20.0);
    assert!(attack.iter().all(|s| s.abs() <= 1.0));

    // sustain 0.1
    let sustained = render_left(&mut renderer, 24_000);
    assert_abs_diff_eq!(rms(&sustained[14_400..]), 0.1 / 2f32.sqrt(), epsilon = 5e-3);

    controls.note_off(69);
    render_left(&mut renderer, 9_600 + 16);
    let tail = render_left(&mut renderer, 480);
    assert!(tail.iter().all(|&s| s == 0.0));
    assert_eq!(engine.db(), f32::NEG_INFINITY);
}

#[test]
fn jitter_wobbles_pitch() {
    let mut engine = engine();
    let mut graph = NodeGraph::new();
    let jitter = graph.add(Jitter::with_seed(42));
    jitter.set(Jitter::INPUT, 440.0).unwrap();
    jitter.set(Jitter::AMOUNT, 0.02).unwrap();
    let sine = graph.add(Sine::new());
    sine.set(Sine::AMPLITUDE, 0.5).unwrap();
    graph.connect(&sine, Sine::FREQUENCY, &jitter, 0).unwrap();
    graph.set_output(&sine).unwrap();
    engine.set_graph(Arc::new(graph));

    let mut renderer = engine.renderer(2).unwrap();
    let samples = render_left(&mut renderer, RATE);
    let rising = samples
        .windows(2)
        .filter(|pair| pair[0] < 0.0 && pair[1] >= 0.0)
        .count();
    assert!((430..=450).contains(&rising), "{rising} cycles");
}
