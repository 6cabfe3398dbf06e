use approx::assert_relative_eq;
use std::time::{Duration, Instant};

use specviz::audio::decode::AudioData;
use specviz::audio::playback::Playback;
use specviz::dsp::analyser::AnalyserSettings;
use specviz::dsp::peak::{find_peak, index_to_hertz, PHASE_LOCK_FLOOR};
use specviz::dsp::window::WindowType;
use specviz::engine::EngineContext;
use specviz::render::colormap::ColormapSource;
use specviz::render::raster::RasterSurface;
use specviz::render::surface::{Image, Surface};
use specviz::viz::bar_graph::build_plan;
use specviz::viz::{Palette, VisualizerKind, VisualizerOptions};

const SAMPLE_RATE: u32 = 44100;

fn tone(hz: f32, seconds: f32) -> AudioData {
    let n = (seconds * SAMPLE_RATE as f32) as usize;
    let samples = (0..n)
        .map(|i| 0.6 * (2.0 * std::f32::consts::PI * hz * i as f32 / SAMPLE_RATE as f32).sin())
        .collect();
    AudioData { samples, sample_rate: SAMPLE_RATE }
}

fn context(fft_size: usize) -> EngineContext {
    let settings = AnalyserSettings { fft_size, ..Default::default() };
    EngineContext::new(SAMPLE_RATE as f64, settings, Palette::default(), VisualizerOptions::default()).unwrap()
}

fn wait_for_colormap(ctx: &EngineContext) {
    let start = Instant::now();
    while !ctx.resources().colormap.is_loaded() && start.elapsed() < Duration::from_secs(10) {
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(ctx.resources().colormap.is_loaded());
}

#[test]
fn five_point_hanning() {
    let w = WindowType::Hanning.generate(5).unwrap();
    let expected = [0.0, 0.5, 1.0, 0.5, 0.0];
    for (got, want) in w.iter().zip(expected) {
        assert_relative_eq!(*got, want, epsilon = 1e-12);
    }
}

#[test]
fn dominant_bin_at_2153_hz() {
    let mut freq = vec![0u8; 1024];
    freq[100] = 200;
    let peak = find_peak(&freq, PHASE_LOCK_FLOOR).unwrap();
    assert_eq!(peak.index, 100);
    assert_relative_eq!(index_to_hertz(100.0, 1024, 44100.0), 2153.3203125, epsilon = 1e-9);
}

#[test]
fn bar_plan_for_default_bars() {
    let plan = build_plan(16, 2800.0, 1024, 44100.0);
    assert_eq!(plan[15], 130);
    let expected = (2800.0 * 2048.0 / 44100.0 * 0.82f64.powi(15)).floor() as usize;
    assert_eq!(plan[0], expected);
}

#[test]
fn detected_tone_matches_the_signal() {
    let ctx = context(2048);
    let mut playback = Playback::new(tone(2153.3203125, 0.5), 30, ctx.tap().clone(), ctx.shared_analyser().unwrap());
    let mut last = None;
    while let Some(frame) = playback.next_frame() {
        last = find_peak(frame.frequency, PHASE_LOCK_FLOOR).map(|p| p.index);
    }
    let index = last.unwrap();
    assert!((index as i64 - 100).abs() <= 1, "peak at bin {}", index);
}

#[test]
fn every_visualizer_draws_a_tone() {
    for kind in VisualizerKind::ALL {
        let ctx = context(1024);
        ctx.load_colormap(ColormapSource::Magma);
        wait_for_colormap(&ctx);

        let mut v = ctx.create(kind, kind.display_name()).unwrap();
        let mut canvas = RasterSurface::new(320, 180).unwrap();
        v.init(&mut canvas);

        let mut playback =
            Playback::new(tone(440.0, 0.5), 30, ctx.tap().clone(), ctx.shared_analyser().unwrap());
        while let Some(frame) = playback.next_frame() {
            v.render(&mut canvas, &frame);
        }

        let painted = canvas.image().pixels.iter().filter(|p| p[3] > 0).count();
        assert!(painted > 0, "{} drew nothing", kind);

        let mut out = Image::new(320, 180, v.palette().background);
        canvas.composite_onto(&mut out);
        assert_eq!(out.as_bytes().len(), 320 * 180 * 4);
        assert!(out.pixels.iter().all(|p| p[3] == 255));
    }
}

#[test]
fn spectrogram_shows_history_right_to_left() {
    let ctx = context(1024);
    ctx.load_colormap(ColormapSource::Magma);
    wait_for_colormap(&ctx);

    let mut v = ctx.create(VisualizerKind::Spectrogram, "s").unwrap();
    let mut canvas = RasterSurface::new(64, 64).unwrap();
    v.init(&mut canvas);

    // 15 ticks of tone, so the rightmost 15 columns are painted
    let mut playback =
        Playback::new(tone(1000.0, 0.5), 30, ctx.tap().clone(), ctx.shared_analyser().unwrap());
    while let Some(frame) = playback.next_frame() {
        v.render(&mut canvas, &frame);
    }
    for x in 0..64 {
        let opaque = canvas.pixel(x, 32).unwrap()[3] == 255;
        assert_eq!(opaque, x >= 64 - 15, "column {}", x);
    }

    canvas.clear();
    assert!(canvas.image().pixels.iter().all(|p| p[3] == 0));
}
