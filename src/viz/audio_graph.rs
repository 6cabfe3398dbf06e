use super::{PathProxy, Visualize, VisualizerBase, VisualizerParams};
use crate::audio::frame::SpectralFrame;
use crate::dsp::peak::{find_peak, index_to_hertz, PHASE_LOCK_FLOOR};
use crate::render::surface::{StrokeStyle, Surface};
use crate::render::transform::Transform;

/// Share of the time-domain buffer that is plotted.
const WINDOW_SHARE: f64 = 0.25;

/// Waveform view, phase locked to the dominant tone so periodic signals
/// stand still between frames.
pub struct AudioGraph {
    base: VisualizerBase,
}

impl AudioGraph {
    pub fn new(params: &VisualizerParams) -> Self {
        Self {
            base: VisualizerBase::new(params.title.clone(), params.palette),
        }
    }

    pub fn matrix(&self) -> Transform {
        self.base.matrix
    }

    /// Stretch the horizontal axis so `[start_x, width_p * len)` fills the
    /// canvas.
    pub fn update_matrix(&mut self, start_x: usize, width_p: f64, len: usize) {
        let span = (width_p * len as f64 - start_x as f64).max(1.0);
        let width_mod = self.base.width as f64 / span;
        self.base.matrix.c = width_mod;
        self.base.matrix.e = -(start_x as f64) * width_mod;
    }
}

/// First sample to plot so the waveform lines up with the period of the
/// strongest bin at the frame's clock. Zero when no bin clears the floor or
/// the start would fall outside the plotted window.
pub fn phase_start(frame: &SpectralFrame<'_>) -> usize {
    let len = frame.time_domain.len();
    if len == 0 || frame.sample_rate <= 0.0 {
        return 0;
    }
    let Some(peak) = find_peak(frame.frequency, PHASE_LOCK_FLOOR) else {
        return 0;
    };
    let hz = index_to_hertz(peak.index as f64, frame.frequency.len(), frame.sample_rate);
    if hz <= 0.0 {
        return 0;
    }

    let period = 1.0 / hz;
    let start_index = (period * frame.sample_rate).round() as i64;
    let offset = ((frame.clock_seconds.rem_euclid(period) * frame.sample_rate).round() as i64)
        % len as i64;
    let start = (start_index - offset).rem_euclid(len as i64) as usize;

    if start as f64 >= WINDOW_SHARE * len as f64 {
        0
    } else {
        start
    }
}

impl Visualize for AudioGraph {
    fn base(&self) -> &VisualizerBase {
        &self.base
    }

    fn init(&mut self, surface: &mut dyn Surface) {
        self.base.init(surface);
        let height = self.base.height as f64;
        // (sample byte, sample index); the x scale is set per frame
        self.base.matrix = Transform::new(0.0, -height / 256.0, 0.0, 0.0, 0.0, height);
    }

    fn render(&mut self, surface: &mut dyn Surface, frame: &SpectralFrame<'_>) {
        surface.clear();

        let td = frame.time_domain;
        let len = td.len();
        if len == 0 {
            return;
        }
        let start = phase_start(frame);
        self.update_matrix(start, WINDOW_SHARE, len);

        let end = (WINDOW_SHARE * len as f64) as usize;
        let color = self.base.palette.color;
        let mut p = PathProxy::new(surface, self.base.matrix);
        p.begin_path();
        p.move_to(td[start] as f64, start as f64);
        for x in (start..end).step_by(2) {
            p.line_to(td[x] as f64, x as f64);
        }
        p.stroke(&StrokeStyle { color, width: 2.0 });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::raster::RasterSurface;
    use crate::viz::testing;
    use approx::assert_relative_eq;

    fn tone_spectrum() -> Vec<u8> {
        let mut freq = vec![0u8; 1024];
        // 2153.3 Hz at 44.1 kHz
        freq[100] = 200;
        freq
    }

    #[test]
    fn locks_to_the_dominant_period() {
        let freq = tone_spectrum();
        let td = vec![128u8; 2048];
        assert_eq!(phase_start(&testing::frame(&freq, &td, 0.0)), 20);

        let period = 1.0 / index_to_hertz(100.0, 1024, 44100.0);
        assert_eq!(phase_start(&testing::frame(&freq, &td, period * 0.5)), 10);
        assert_eq!(phase_start(&testing::frame(&freq, &td, period * 0.25)), 15);
    }

    #[test]
    fn quiet_or_empty_frames_start_at_zero() {
        let td = vec![128u8; 2048];
        let mut freq = vec![0u8; 1024];
        freq[100] = PHASE_LOCK_FLOOR;
        assert_eq!(phase_start(&testing::frame(&freq, &td, 0.3)), 0);
        assert_eq!(phase_start(&testing::frame(&freq, &[], 0.3)), 0);

        // Bin 0 has no period
        let mut dc = vec![0u8; 1024];
        dc[0] = 255;
        assert_eq!(phase_start(&testing::frame(&dc, &td, 0.3)), 0);
    }

    #[test]
    fn low_tones_fall_back_to_zero() {
        // Bin 3 is 64.6 Hz, a period of 683 samples, beyond the quarter window
        let mut freq = vec![0u8; 1024];
        freq[3] = 200;
        let td = vec![128u8; 2048];
        assert_eq!(phase_start(&testing::frame(&freq, &td, 0.0)), 0);
    }

    #[test]
    fn matrix_spans_the_quarter_window() {
        let mut g = AudioGraph::new(&testing::params(1024, 44100.0));
        let mut surface = RasterSurface::new(720, 405).unwrap();
        g.init(&mut surface);

        let freq = tone_spectrum();
        let td = vec![128u8; 2048];
        g.render(&mut surface, &testing::frame(&freq, &td, 0.0));

        let m = g.matrix();
        assert_relative_eq!(m.c, 720.0 / (512.0 - 20.0), epsilon = 1e-9);
        assert_relative_eq!(m.e, -20.0 * 720.0 / 492.0, epsilon = 1e-9);
        assert_relative_eq!(m.apply(0.0, 512.0).0, 720.0, epsilon = 1e-9);
        assert_relative_eq!(m.apply(0.0, 20.0).0, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn flat_signal_draws_the_midline() {
        let mut g = AudioGraph::new(&testing::params(1024, 44100.0));
        let mut surface = RasterSurface::new(200, 100).unwrap();
        g.init(&mut surface);

        let freq = vec![0u8; 1024];
        let td = vec![128u8; 2048];
        g.render(&mut surface, &testing::frame(&freq, &td, 0.0));
        assert_eq!(surface.pixel(100, 50).map(|p| p[3]), Some(255));
        assert_eq!(surface.pixel(100, 10).map(|p| p[3]), Some(0));
    }
}
