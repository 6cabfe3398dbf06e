use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "specviz", about = "Render audio as a spectrum, waveform, bar graph or spectrogram video")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG)
    pub input: Option<PathBuf>,

    /// Output video file
    #[arg(short, long, default_value = "output.mp4")]
    pub output: PathBuf,

    /// Visualizer: frequency-graph, audio-graph, bar-graph or spectrogram
    #[arg(short, long, default_value = "bar-graph")]
    pub visualizer: String,

    /// Caption used in log output; defaults to the visualizer name
    #[arg(long)]
    pub title: Option<String>,

    /// Canvas width in pixels
    #[arg(long, default_value_t = 720)]
    pub width: u32,

    /// Canvas height in pixels (default: 16:9 of the width)
    #[arg(long)]
    pub height: Option<u32>,

    /// Frames per second
    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    /// H.264 CRF quality (0-51, lower = better). Ignored when --bitrate is set.
    #[arg(long, default_value_t = 18)]
    pub crf: u32,

    /// Video bitrate (e.g. 2400k, 5M). When set, uses -b:v instead of -crf.
    #[arg(short, long)]
    pub bitrate: Option<String>,

    /// FFmpeg video codec
    #[arg(long, default_value = "libx264")]
    pub codec: String,

    /// FFmpeg pixel format
    #[arg(long, default_value = "yuv420p")]
    pub pix_fmt: String,

    /// Analysis window (hanning, hamming, blackman, blackman-harris, parzen, welch, none)
    #[arg(short, long, default_value = "blackman-harris")]
    pub window: String,

    /// FFT size of the shared analyser (power of two, 32-32768)
    #[arg(long, default_value_t = 2048)]
    pub fft_size: usize,

    /// Temporal smoothing of the spectrum (0.0-1.0)
    #[arg(long, default_value_t = 0.8)]
    pub smoothing: f32,

    /// Skip gridlines and captions
    #[arg(long)]
    pub no_labels: bool,

    /// Mark the dominant bin on the frequency graph
    #[arg(long)]
    pub mark_peak: bool,

    /// TTF/OTF font for captions
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Download the caption font from a URL
    #[arg(long)]
    pub font_url: Option<String>,

    /// JSON colormap for the spectrogram (default: built-in magma)
    #[arg(long)]
    pub colormap: Option<PathBuf>,

    /// Config file (default: ./specviz.toml or ~/.config/specviz/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// List available visualizers and exit
    #[arg(long)]
    pub list_visualizers: bool,
}
