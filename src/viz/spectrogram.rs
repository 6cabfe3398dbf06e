use std::sync::Arc;

use super::{format_hertz, PathProxy, Visualize, VisualizerBase, VisualizerParams, LABEL_HZ_STEP};
use crate::audio::frame::SpectralFrame;
use crate::audio::tap::{SignalTap, TapConnection};
use crate::dsp::analyser::{Analyser, AnalyserSettings};
use crate::dsp::peak::hertz_to_index;
use crate::error::Result;
use crate::render::colormap::ColormapSlot;
use crate::render::surface::{Color, Image, Rect, Surface, TextAlign, TextBaseline};
use crate::render::transform::Transform;

/// Seconds between time gridlines.
pub const TIME_LABEL_STEP: f64 = 2.0;

/// Fixed capacity ring of frame deltas, one per painted column.
#[derive(Debug, Clone)]
pub struct DeltaTimeRing {
    buf: Vec<f32>,
    head: usize,
    len: usize,
}

impl DeltaTimeRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0.0; capacity.max(1)],
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Overwrites the oldest entry once full.
    pub fn push(&mut self, dt: f32) {
        self.buf[self.head] = dt;
        self.head = (self.head + 1) % self.buf.len();
        self.len = (self.len + 1).min(self.buf.len());
    }

    pub fn iter_newest(&self) -> impl Iterator<Item = f32> + '_ {
        let cap = self.buf.len();
        (1..=self.len).map(move |k| self.buf[(self.head + cap - k) % cap])
    }
}

/// Scrolling time/frequency image. Each render paints one column on the
/// right edge from a dedicated analyser and shifts the history left.
pub struct Spectrogram {
    base: VisualizerBase,
    vis_len: usize,
    sample_rate: f64,
    y_scale: f64,
    tap: SignalTap,
    connection: Option<TapConnection>,
    analyser: Analyser,
    colormap: Arc<ColormapSlot>,
    frequency: Vec<u8>,
    slice: Image,
    deltas: DeltaTimeRing,
    last_time: Option<f64>,
}

impl Spectrogram {
    pub fn new(params: &VisualizerParams) -> Result<Self> {
        // Half the shared FFT, so one bin per visible row of the shared spectrum
        let settings = AnalyserSettings {
            fft_size: params.bins,
            smoothing: 0.0,
            ..params.options.analysis
        };
        let analyser = Analyser::new(
            settings,
            Arc::clone(&params.resources.window_selector),
            Arc::clone(&params.resources.windows),
        )?;
        let vis_len = analyser.frequency_bin_count();

        Ok(Self {
            base: VisualizerBase::new(params.title.clone(), params.palette),
            vis_len,
            sample_rate: params.sample_rate,
            y_scale: 1.0,
            tap: params.tap.clone(),
            connection: None,
            analyser,
            colormap: Arc::clone(&params.resources.colormap),
            frequency: vec![0; vis_len],
            slice: Image::new(1, vis_len as u32, Color::BLACK),
            deltas: DeltaTimeRing::new(1),
            last_time: None,
        })
    }

    pub fn matrix(&self) -> Transform {
        self.base.matrix
    }

    pub fn deltas(&self) -> &DeltaTimeRing {
        &self.deltas
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Columns back from the right edge where the accumulated history
    /// exceeds each multiple of [`TIME_LABEL_STEP`], with the seconds to print.
    pub fn time_marks(&self) -> Vec<(usize, f64)> {
        let mut marks = Vec::new();
        let mut elapsed = 0.0f64;
        let mut next = TIME_LABEL_STEP;
        for (k, dt) in self.deltas.iter_newest().enumerate() {
            elapsed += dt as f64;
            if elapsed > next {
                marks.push((k, next));
                while next < elapsed {
                    next += TIME_LABEL_STEP;
                }
            }
        }
        marks
    }

    /// Data rows of the frequency gridlines, with their Hz, strictly inside
    /// the visible bins.
    pub fn frequency_marks(&self) -> Vec<(f64, f64)> {
        let mut marks = Vec::new();
        let mut hz = LABEL_HZ_STEP;
        loop {
            let row = hertz_to_index(hz, self.vis_len, self.sample_rate);
            if !(row > 0.0 && row < self.vis_len as f64) {
                break;
            }
            marks.push((row, hz));
            hz += LABEL_HZ_STEP;
        }
        marks
    }
}

impl Visualize for Spectrogram {
    fn base(&self) -> &VisualizerBase {
        &self.base
    }

    fn init(&mut self, surface: &mut dyn Surface) {
        self.base.init(surface);
        if self.connection.is_none() {
            self.connection = Some(self.tap.connect());
        }

        let width = self.base.width as f64;
        let height = self.base.height as f64;
        self.y_scale = height / self.vis_len.max(1) as f64;
        // Bin 0 at the bottom of the rightmost column
        self.base.matrix = Transform::new(1.0, 0.0, 0.0, -self.y_scale, width - 1.0, height);

        self.slice = Image::new(1, self.vis_len as u32, Color::BLACK);
        self.deltas = DeltaTimeRing::new(self.base.width as usize);
        self.last_time = None;
    }

    fn render(&mut self, surface: &mut dyn Surface, frame: &SpectralFrame<'_>) {
        let Some(colormap) = self.colormap.get() else {
            return;
        };

        self.analyser.pull(&self.tap);
        self.analyser.byte_frequency_data(&mut self.frequency);
        for (row, &byte) in self.frequency.iter().enumerate() {
            let [r, g, b] = colormap.lookup(byte);
            self.slice.set(0, row as u32, [r, g, b, 255]);
        }

        let (width, height) = (surface.width(), surface.height());
        if width > 1 {
            surface.copy_within(Rect { x: 1, y: 0, width: width - 1, height }, 0, 0);
        }
        surface.draw_image(&self.slice, &self.base.matrix);

        let now = frame.clock_seconds;
        let dt = self.last_time.map_or(0.0, |last| (now - last).max(0.0));
        self.last_time = Some(now);
        self.deltas.push(dt as f32);
    }

    fn draw_labels(&self, overlay: &mut dyn Surface) {
        let grid = self.base.grid_stroke();
        let left = -(self.base.width as f64 - 1.0);
        let mut p = PathProxy::new(overlay, self.base.matrix);

        let time_text = self.base.label_text(TextAlign::Center, TextBaseline::Top);
        for (k, seconds) in self.time_marks() {
            // Centre of the column
            let x = 0.5 - k as f64;
            p.begin_path();
            p.move_to(x, 0.0);
            p.line_to(x, self.vis_len as f64);
            p.stroke(&grid);
            p.fill_text(&format!("{}s", seconds), x, self.vis_len as f64, &time_text);
        }

        let freq_text = self.base.label_text(TextAlign::Left, TextBaseline::Bottom);
        for (row, hz) in self.frequency_marks() {
            p.begin_path();
            p.move_to(left, row);
            p.line_to(1.0, row);
            p.stroke(&grid);
            p.fill_text(&format_hertz(hz), left, row, &freq_text);
        }
    }

    fn labels_are_dynamic(&self) -> bool {
        true
    }
}
