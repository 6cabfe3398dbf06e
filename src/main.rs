mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use cli::Cli;
use specviz::audio::playback::Playback;
use specviz::config::{self, Config};
use specviz::encode::ffmpeg::{EncoderSettings, FfmpegEncoder};
use specviz::engine::EngineContext;
use specviz::render::colormap::ColormapSource;
use specviz::render::raster::RasterSurface;
use specviz::render::surface::{Image, Surface};
use specviz::render::text::{load_font_from_url, TextOverlay};
use specviz::viz::{canvas_size, VisualizerKind, VisualizerOptions};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    let mut cfg = Config::default();
    if let Some(path) = config::discover(cli.config.clone()) {
        if let Some(loaded) = config::load_config(&path) {
            log::info!("Loaded config from {}", path.display());
            cfg = loaded;
            merge_config(&mut cli, &mut cfg);
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }

    if cli.list_visualizers {
        println!("Available visualizers:");
        for kind in VisualizerKind::ALL {
            println!("  {:<20} {}", kind.id(), kind.display_name());
        }
        return Ok(());
    }

    let input = cli.input.as_ref().context("Input audio file is required")?;
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    let kind: VisualizerKind = cli.visualizer.parse()?;
    let window = config::parse_window(&cli.window)?;
    let (width, height) = canvas_size(Some(cli.width), cli.height);

    log::info!("specviz - audio visualizer");
    log::info!("Input: {}", input.display());
    log::info!("Output: {}", cli.output.display());
    log::info!("Resolution: {}x{} @ {}fps", width, height, cli.fps);

    // 1. Decode audio
    log::info!("Decoding audio...");
    let audio_data = specviz::audio::decode::decode_audio(input)?;

    // 2. Engine context and shared resources
    let mut settings = cfg.analysis.settings();
    settings.fft_size = cli.fft_size;
    settings.smoothing = cli.smoothing;
    let options = VisualizerOptions {
        bars: cfg.bars,
        mark_peak: cli.mark_peak,
        ..Default::default()
    };
    let ctx = EngineContext::new(audio_data.sample_rate as f64, settings, cfg.theme, options)
        .context("Invalid analysis settings")?;
    ctx.select_window(window);
    ctx.load_colormap(match cli.colormap.clone() {
        Some(path) => ColormapSource::File(path),
        None => ColormapSource::Magma,
    });

    let title = cli.title.clone().unwrap_or_else(|| kind.display_name().to_string());
    let mut visualizer = ctx.create(kind, title)?;

    // 3. Surfaces
    let mut canvas = RasterSurface::new(width, height).context("Failed to create canvas")?;
    visualizer.init(&mut canvas);

    let labels = !cli.no_labels;
    let mut overlay = RasterSurface::new(width, height).context("Failed to create label overlay")?;
    if labels {
        overlay.set_text(load_text(&cli, width, height));
        visualizer.draw_labels(&mut overlay);
    }
    let background = Image::new(width, height, visualizer.palette().background);

    // 4. Start FFmpeg encoder
    log::info!("Starting FFmpeg encoder...");
    let encoder_settings = EncoderSettings {
        width,
        height,
        fps: cli.fps,
        codec: cli.codec.clone(),
        pix_fmt: cli.pix_fmt.clone(),
        crf: cli.crf,
        bitrate: cli.bitrate.clone(),
    };
    let mut encoder = FfmpegEncoder::new(&encoder_settings, input, &cli.output)?;

    // 5. Render loop
    let mut playback = Playback::new(audio_data, cli.fps, ctx.tap().clone(), ctx.shared_analyser()?);
    let total_frames = playback.total_ticks();
    log::info!("Total frames: {}, Duration: {:.1}s", total_frames, playback.duration());

    let pb = ProgressBar::new(total_frames as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames ({eta} remaining)")?
            .progress_chars("=>-"),
    );

    let redraw_labels = labels && visualizer.labels_are_dynamic();
    let mut pixels = background.clone();
    while let Some(frame) = playback.next_frame() {
        visualizer.render(&mut canvas, &frame);
        if redraw_labels {
            overlay.clear();
            visualizer.draw_labels(&mut overlay);
        }

        pixels.pixels.copy_from_slice(&background.pixels);
        canvas.composite_onto(&mut pixels);
        if labels {
            overlay.composite_onto(&mut pixels);
        }

        encoder.write_frame(pixels.as_bytes())?;
        pb.inc(1);
    }

    pb.finish_with_message("Rendering complete");

    // 6. Finish encoding
    log::info!("Finishing encoding...");
    encoder.finish()?;

    log::info!("Done! Output: {}", cli.output.display());
    Ok(())
}

/// Config values apply only where the CLI is still at its default.
fn merge_config(cli: &mut Cli, cfg: &mut Config) {
    if cli.width == config::default_width() { cli.width = cfg.output.width; }
    if cli.height.is_none() { cli.height = cfg.output.height; }
    if cli.fps == config::default_fps() { cli.fps = cfg.output.fps; }
    if cli.crf == config::default_crf() { cli.crf = cfg.output.crf; }
    if cli.codec == config::default_codec() { cli.codec = std::mem::take(&mut cfg.output.codec); }
    if cli.fft_size == config::default_fft_size() { cli.fft_size = cfg.analysis.fft_size; }
    if cli.smoothing == config::default_smoothing() { cli.smoothing = cfg.analysis.smoothing; }
    if cli.window == config::default_window() { cli.window = cfg.analysis.window.clone(); }
    if cli.colormap.is_none() { cli.colormap = cfg.spectrogram.colormap.take(); }
    if cli.font.is_none() { cli.font = cfg.labels.font.take(); }
    if cli.font_url.is_none() { cli.font_url = cfg.labels.font_url.take(); }
    if !cli.no_labels { cli.no_labels = !cfg.labels.enabled; }
    if !cli.mark_peak { cli.mark_peak = cfg.labels.mark_peak; }
}

/// Caption font from `--font-url` or `--font`. Labels still get their
/// gridlines without one.
fn load_text(cli: &Cli, width: u32, height: u32) -> Option<TextOverlay> {
    let size = (width.min(height) as f32 * 0.035).max(12.0);
    let loaded = if let Some(ref url) = cli.font_url {
        load_font_from_url(url).and_then(|bytes| TextOverlay::from_bytes(&bytes, size))
    } else if let Some(ref path) = cli.font {
        TextOverlay::from_file(path, size)
    } else {
        return None;
    };
    match loaded {
        Ok(text) => Some(text),
        Err(err) => {
            log::warn!("Failed to load caption font: {}", err);
            None
        }
    }
}
