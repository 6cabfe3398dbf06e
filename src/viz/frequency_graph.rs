use super::{format_hertz, PathProxy, Visualize, VisualizerBase, VisualizerParams, LABEL_HZ_STEP};
use crate::audio::frame::SpectralFrame;
use crate::dsp::peak::{find_peak, hertz_to_index, PEAK_MARK_FLOOR};
use crate::render::surface::{StrokeStyle, Surface, TextAlign, TextBaseline};
use crate::render::transform::Transform;

/// Lower half of the spectrum as a connected line.
pub struct FrequencyGraph {
    base: VisualizerBase,
    bins: usize,
    vis_len: usize,
    sample_rate: f64,
    mark_peak: bool,
}

impl FrequencyGraph {
    pub fn new(params: &VisualizerParams) -> Self {
        Self {
            base: VisualizerBase::new(params.title.clone(), params.palette),
            bins: params.bins,
            vis_len: params.bins / 2,
            sample_rate: params.sample_rate,
            mark_peak: params.options.mark_peak,
        }
    }

    pub fn matrix(&self) -> Transform {
        self.base.matrix
    }

    pub fn visible_bins(&self) -> usize {
        self.vis_len
    }
}

impl Visualize for FrequencyGraph {
    fn base(&self) -> &VisualizerBase {
        &self.base
    }

    fn init(&mut self, surface: &mut dyn Surface) {
        self.base.init(surface);
        let width = self.base.width as f64;
        let height = self.base.height as f64;
        let width_mod = width / self.vis_len.max(1) as f64;
        let height_mod = height / 256.0;
        // (magnitude, index) -> (index * width_mod, height - magnitude * height_mod)
        self.base.matrix = Transform::new(0.0, -height_mod, width_mod, 0.0, 0.0, height);
    }

    fn render(&mut self, surface: &mut dyn Surface, frame: &SpectralFrame<'_>) {
        surface.clear();

        let freq = frame.frequency;
        let vis_len = self.vis_len.min(freq.len());
        if vis_len == 0 {
            return;
        }
        let palette = self.base.palette;
        let mut p = PathProxy::new(surface, self.base.matrix);

        p.begin_path();
        p.move_to(freq[0] as f64, 0.0);
        for idx in (2..vis_len).step_by(2) {
            p.line_to(freq[idx] as f64, idx as f64);
        }
        p.stroke(&StrokeStyle {
            color: palette.color,
            width: 2.0,
        });

        if self.mark_peak {
            if let Some(peak) = find_peak(&freq[..vis_len], PEAK_MARK_FLOOR) {
                let idx = peak.index as f64;
                p.begin_path();
                p.move_to(0.0, idx);
                p.line_to(255.0, idx);
                p.stroke(&StrokeStyle {
                    color: palette.foreground,
                    width: 1.0,
                });
            }
        }
    }

    fn draw_labels(&self, overlay: &mut dyn Surface) {
        let grid = self.base.grid_stroke();
        let text = self.base.label_text(TextAlign::Center, TextBaseline::Bottom);
        let mut p = PathProxy::new(overlay, self.base.matrix);

        let mut hz = LABEL_HZ_STEP;
        loop {
            let idx = hertz_to_index(hz, self.bins, self.sample_rate);
            if !(idx > 0.0 && idx < self.vis_len as f64) {
                break;
            }
            p.begin_path();
            p.move_to(0.0, idx);
            p.line_to(256.0, idx);
            p.stroke(&grid);
            p.fill_text(&format_hertz(hz), 0.0, idx, &text);
            hz += LABEL_HZ_STEP;
        }
    }
}
