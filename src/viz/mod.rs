//! The four visualizers and the pieces they share.
//!
//! Every visualizer owns a [`Transform`] from its data space (bin index,
//! magnitude, sample index) to pixels and draws through a [`PathProxy`], so
//! the surface itself never sees data coordinates.

pub mod audio_graph;
pub mod bar_graph;
pub mod frequency_graph;
pub mod spectrogram;

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::audio::frame::SpectralFrame;
use crate::audio::tap::SignalTap;
use crate::dsp::analyser::AnalyserSettings;
use crate::engine::SharedResources;
use crate::error::{Result, VizError};
use crate::render::surface::{Color, StrokeStyle, Surface, TextAlign, TextBaseline, TextStyle};
use crate::render::transform::Transform;

pub use audio_graph::AudioGraph;
pub use bar_graph::{BarGraph, BarOptions};
pub use frequency_graph::FrequencyGraph;
pub use spectrogram::Spectrogram;

/// Spacing of the frequency gridlines, in Hz.
pub const LABEL_HZ_STEP: f64 = 2000.0;
pub const DEFAULT_CANVAS_WIDTH: u32 = 720;

/// Canvas size for a requested width and optional height; the height
/// defaults to 16:9.
pub fn canvas_size(width: Option<u32>, height: Option<u32>) -> (u32, u32) {
    let width = width.unwrap_or(DEFAULT_CANVAS_WIDTH);
    let height = height.unwrap_or_else(|| (width as f64 * 9.0 / 16.0).round() as u32);
    (width, height)
}

/// `2000 -> "2k"`, `500 -> "500"`.
pub fn format_hertz(hz: f64) -> String {
    if hz >= 1000.0 {
        let k = hz / 1000.0;
        if k.fract() == 0.0 {
            format!("{}k", k as u64)
        } else {
            format!("{:.1}k", k)
        }
    } else {
        format!("{}", hz.round() as u64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Palette {
    #[serde(default = "default_background")]
    pub background: Color,
    #[serde(default = "default_foreground")]
    pub foreground: Color,
    #[serde(default = "default_middleground")]
    pub middleground: Color,
    #[serde(default = "default_color")]
    pub color: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: default_background(),
            foreground: default_foreground(),
            middleground: default_middleground(),
            color: default_color(),
        }
    }
}

fn default_background() -> Color { Color::WHITE }
fn default_foreground() -> Color { Color::BLACK }
fn default_middleground() -> Color { Color::rgb(211, 211, 211) }
fn default_color() -> Color { Color::rgb(0, 100, 0) }

/// State common to every visualizer.
#[derive(Debug, Clone)]
pub struct VisualizerBase {
    pub title: String,
    pub palette: Palette,
    pub matrix: Transform,
    pub width: u32,
    pub height: u32,
}

impl VisualizerBase {
    pub fn new(title: impl Into<String>, palette: Palette) -> Self {
        Self {
            title: title.into(),
            palette,
            matrix: Transform::identity(),
            width: 0,
            height: 0,
        }
    }

    /// Pick up the surface geometry.
    pub fn init(&mut self, surface: &dyn Surface) {
        self.width = surface.width();
        self.height = surface.height();
    }

    pub fn label_text(&self, align: TextAlign, baseline: TextBaseline) -> TextStyle {
        TextStyle {
            color: self.palette.foreground,
            align,
            baseline,
        }
    }

    pub fn grid_stroke(&self) -> StrokeStyle {
        StrokeStyle {
            color: self.palette.middleground,
            width: 1.0,
        }
    }
}

/// Routes path and text calls through a data-to-pixel transform.
pub struct PathProxy<'a> {
    surface: &'a mut dyn Surface,
    matrix: Transform,
}

impl<'a> PathProxy<'a> {
    pub fn new(surface: &'a mut dyn Surface, matrix: Transform) -> Self {
        Self { surface, matrix }
    }

    pub fn begin_path(&mut self) {
        self.surface.begin_path();
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        let (px, py) = self.matrix.apply(x, y);
        self.surface.move_to(px, py);
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        let (px, py) = self.matrix.apply(x, y);
        self.surface.line_to(px, py);
    }

    pub fn stroke(&mut self, style: &StrokeStyle) {
        self.surface.stroke(style);
    }

    pub fn fill_text(&mut self, text: &str, x: f64, y: f64, style: &TextStyle) {
        let (px, py) = self.matrix.apply(x, y);
        self.surface.fill_text(text, px, py, style);
    }
}

/// Capabilities shared by all visualizers.
pub trait Visualize {
    fn base(&self) -> &VisualizerBase;

    /// Build geometry for `surface`. Called once before the first render and
    /// again whenever the surface is replaced.
    fn init(&mut self, surface: &mut dyn Surface);

    fn render(&mut self, surface: &mut dyn Surface, frame: &SpectralFrame<'_>);

    /// Draw gridlines and captions onto an overlay surface.
    fn draw_labels(&self, _overlay: &mut dyn Surface) {}

    /// Whether labels change between frames and need redrawing every tick.
    fn labels_are_dynamic(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualizerKind {
    FrequencyGraph,
    AudioGraph,
    BarGraph,
    Spectrogram,
}

impl VisualizerKind {
    pub const ALL: [VisualizerKind; 4] = [
        VisualizerKind::FrequencyGraph,
        VisualizerKind::AudioGraph,
        VisualizerKind::BarGraph,
        VisualizerKind::Spectrogram,
    ];

    pub const fn id(self) -> &'static str {
        match self {
            Self::FrequencyGraph => "frequency-graph",
            Self::AudioGraph => "audio-graph",
            Self::BarGraph => "bar-graph",
            Self::Spectrogram => "spectrogram",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::FrequencyGraph => "Frequency Graph",
            Self::AudioGraph => "Audio Graph",
            Self::BarGraph => "80s Bar Graph",
            Self::Spectrogram => "Spectrogram",
        }
    }
}

impl fmt::Display for VisualizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for VisualizerKind {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace([' ', '_'], "-");
        Self::ALL
            .iter()
            .copied()
            .find(|k| {
                k.id() == wanted || k.display_name().to_ascii_lowercase().replace(' ', "-") == wanted
            })
            .ok_or_else(|| VizError::UnknownVisualizer(s.to_string()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct VisualizerOptions {
    pub bars: BarOptions,
    /// Mark the dominant bin on the frequency graph.
    pub mark_peak: bool,
    /// dB range for analysers a visualizer owns itself.
    pub analysis: AnalyserSettings,
}

/// Everything a visualizer needs at construction.
#[derive(Clone)]
pub struct VisualizerParams {
    pub title: String,
    /// Number of bins in the shared frequency buffer.
    pub bins: usize,
    pub sample_rate: f64,
    pub tap: SignalTap,
    pub resources: Arc<SharedResources>,
    pub palette: Palette,
    pub options: VisualizerOptions,
}

pub enum Visualizer {
    FrequencyGraph(FrequencyGraph),
    AudioGraph(AudioGraph),
    BarGraph(BarGraph),
    Spectrogram(Spectrogram),
}

impl Visualizer {
    pub fn new(kind: VisualizerKind, params: VisualizerParams) -> Result<Self> {
        Ok(match kind {
            VisualizerKind::FrequencyGraph => Self::FrequencyGraph(FrequencyGraph::new(&params)),
            VisualizerKind::AudioGraph => Self::AudioGraph(AudioGraph::new(&params)),
            VisualizerKind::BarGraph => Self::BarGraph(BarGraph::new(&params)),
            VisualizerKind::Spectrogram => Self::Spectrogram(Spectrogram::new(&params)?),
        })
    }

    pub fn kind(&self) -> VisualizerKind {
        match self {
            Self::FrequencyGraph(_) => VisualizerKind::FrequencyGraph,
            Self::AudioGraph(_) => VisualizerKind::AudioGraph,
            Self::BarGraph(_) => VisualizerKind::BarGraph,
            Self::Spectrogram(_) => VisualizerKind::Spectrogram,
        }
    }

    fn inner(&self) -> &dyn Visualize {
        match self {
            Self::FrequencyGraph(v) => v,
            Self::AudioGraph(v) => v,
            Self::BarGraph(v) => v,
            Self::Spectrogram(v) => v,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Visualize {
        match self {
            Self::FrequencyGraph(v) => v,
            Self::AudioGraph(v) => v,
            Self::BarGraph(v) => v,
            Self::Spectrogram(v) => v,
        }
    }

    pub fn title(&self) -> &str {
        &self.inner().base().title
    }

    pub fn palette(&self) -> &Palette {
        &self.inner().base().palette
    }

    pub fn init(&mut self, surface: &mut dyn Surface) {
        self.inner_mut().init(surface);
    }

    pub fn render(&mut self, surface: &mut dyn Surface, frame: &SpectralFrame<'_>) {
        self.inner_mut().render(surface, frame);
    }

    pub fn draw_labels(&self, overlay: &mut dyn Surface) {
        self.inner().draw_labels(overlay);
    }

    pub fn labels_are_dynamic(&self) -> bool {
        self.inner().labels_are_dynamic()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    pub fn params(bins: usize, sample_rate: f64) -> VisualizerParams {
        VisualizerParams {
            title: "test".into(),
            bins,
            sample_rate,
            tap: SignalTap::new(sample_rate, bins * 4),
            resources: Arc::new(SharedResources::new()),
            palette: Palette::default(),
            options: VisualizerOptions::default(),
        }
    }

    pub fn frame<'a>(frequency: &'a [u8], time_domain: &'a [u8], clock: f64) -> SpectralFrame<'a> {
        SpectralFrame {
            frequency,
            time_domain,
            sample_rate: 44100.0,
            clock_seconds: clock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_canvas_is_16_by_9() {
        assert_eq!(canvas_size(None, None), (720, 405));
        assert_eq!(canvas_size(Some(1280), None), (1280, 720));
        assert_eq!(canvas_size(Some(300), Some(300)), (300, 300));
    }

    #[test]
    fn hertz_captions() {
        assert_eq!(format_hertz(2000.0), "2k");
        assert_eq!(format_hertz(10000.0), "10k");
        assert_eq!(format_hertz(2500.0), "2.5k");
        assert_eq!(format_hertz(440.0), "440");
    }

    #[test]
    fn kinds_parse_from_ids_and_names() {
        for kind in VisualizerKind::ALL {
            assert_eq!(kind.id().parse::<VisualizerKind>().unwrap(), kind);
            assert_eq!(kind.display_name().parse::<VisualizerKind>().unwrap(), kind);
        }
        assert_eq!(
            "bar_graph".parse::<VisualizerKind>().unwrap(),
            VisualizerKind::BarGraph
        );
        assert!(matches!(
            "oscilloscope".parse::<VisualizerKind>(),
            Err(VizError::UnknownVisualizer(_))
        ));
    }

    #[test]
    fn factory_builds_each_variant() {
        for kind in VisualizerKind::ALL {
            let v = Visualizer::new(kind, testing::params(1024, 44100.0)).unwrap();
            assert_eq!(v.kind(), kind);
            assert_eq!(v.title(), "test");
        }
    }

    #[test]
    fn proxy_maps_points() {
        use crate::render::raster::RasterSurface;
        let mut surface = RasterSurface::new(10, 10).unwrap();
        let mut p = PathProxy::new(&mut surface, Transform::new(0.0, -1.0, 1.0, 0.0, 0.0, 8.5));
        p.begin_path();
        // Magnitude 0 runs along the bottom row, index along x
        p.move_to(0.0, 2.0);
        p.line_to(0.0, 8.0);
        p.stroke(&StrokeStyle { color: Color::BLACK, width: 1.0 });
        assert_eq!(surface.pixel(5, 8).map(|p| p[3]), Some(255));
    }
}
