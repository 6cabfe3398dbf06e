use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use super::window::{WindowCache, WindowSelector, WindowType};
use crate::audio::tap::SignalTap;
use crate::error::{Result, VizError};

#[derive(Debug, Clone, Copy)]
pub struct AnalyserSettings {
    pub fft_size: usize,
    /// Weight of the previous spectrum, 0.0 disables smoothing.
    pub smoothing: f32,
    pub min_db: f32,
    pub max_db: f32,
}

impl Default for AnalyserSettings {
    fn default() -> Self {
        Self {
            fft_size: default_fft_size(),
            smoothing: default_smoothing(),
            min_db: default_min_db(),
            max_db: default_max_db(),
        }
    }
}

fn default_fft_size() -> usize { 2048 }
fn default_smoothing() -> f32 { 0.8 }
fn default_min_db() -> f32 { -100.0 }
fn default_max_db() -> f32 { -10.0 }

/// Accepted range for a session's shared FFT, matching `AnalyserNode`.
pub const MIN_FFT_SIZE: usize = 32;
pub const MAX_FFT_SIZE: usize = 32768;

pub fn validate_fft_size(fft_size: usize) -> Result<()> {
    if fft_size.is_power_of_two() && (MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&fft_size) {
        Ok(())
    } else {
        Err(VizError::InvalidFftSize(fft_size))
    }
}

/// Windowed FFT over the most recent samples of a [`SignalTap`], quantized
/// to bytes the way a browser `AnalyserNode` reports them.
pub struct Analyser {
    settings: AnalyserSettings,
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    samples: Vec<f32>,
    smoothed: Vec<f32>,
    selector: Arc<WindowSelector>,
    cache: Arc<WindowCache>,
    active_window: Option<(WindowType, Arc<[f32]>)>,
}

impl Analyser {
    pub fn new(
        settings: AnalyserSettings,
        selector: Arc<WindowSelector>,
        cache: Arc<WindowCache>,
    ) -> Result<Self> {
        let fft_size = settings.fft_size;
        if fft_size < 2 {
            return Err(VizError::DegenerateWindow { len: fft_size });
        }

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(fft_size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        Ok(Self {
            settings,
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            scratch,
            samples: vec![0.0; fft_size],
            smoothed: vec![0.0; fft_size / 2],
            fft,
            selector,
            cache,
            active_window: None,
        })
    }

    pub fn fft_size(&self) -> usize {
        self.settings.fft_size
    }

    pub fn frequency_bin_count(&self) -> usize {
        self.settings.fft_size / 2
    }

    /// Read the latest block from `tap` and update the spectrum.
    pub fn pull(&mut self, tap: &SignalTap) {
        tap.latest_into(&mut self.samples);
        self.transform();
    }

    /// Analyse the tail of `block`, zero-padded at the front when shorter
    /// than the FFT size.
    pub fn process(&mut self, block: &[f32]) {
        let n = self.samples.len();
        let take = block.len().min(n);
        let pad = n - take;
        self.samples[..pad].fill(0.0);
        self.samples[pad..].copy_from_slice(&block[block.len() - take..]);
        self.transform();
    }

    fn transform(&mut self) {
        let window = self.current_window();
        match window {
            Some(coefficients) => {
                for ((slot, &sample), &w) in self
                    .buffer
                    .iter_mut()
                    .zip(self.samples.iter())
                    .zip(coefficients.iter())
                {
                    *slot = Complex::new(sample * w, 0.0);
                }
            }
            None => {
                for (slot, &sample) in self.buffer.iter_mut().zip(self.samples.iter()) {
                    *slot = Complex::new(sample, 0.0);
                }
            }
        }

        self.fft
            .process_with_scratch(&mut self.buffer, &mut self.scratch);

        let norm = 1.0 / self.settings.fft_size as f32;
        let tau = self.settings.smoothing.clamp(0.0, 1.0);
        for (prev, c) in self.smoothed.iter_mut().zip(self.buffer.iter()) {
            let magnitude = c.norm() * norm;
            *prev = tau * *prev + (1.0 - tau) * magnitude;
        }
    }

    fn current_window(&mut self) -> Option<Arc<[f32]>> {
        let wanted = self.selector.current()?;
        if let Some((window, table)) = &self.active_window {
            if *window == wanted {
                return Some(Arc::clone(table));
            }
        }
        let table = self.cache.coefficients(wanted, self.settings.fft_size).ok()?;
        self.active_window = Some((wanted, Arc::clone(&table)));
        Some(table)
    }

    /// Smoothed magnitudes mapped from `[min_db, max_db]` onto 0..=255.
    pub fn byte_frequency_data(&self, out: &mut [u8]) {
        let range = (self.settings.max_db - self.settings.min_db).max(f32::EPSILON);
        for (byte, &magnitude) in out.iter_mut().zip(self.smoothed.iter()) {
            let db = 20.0 * magnitude.log10();
            let scaled = 255.0 * (db - self.settings.min_db) / range;
            // log10(0) is -inf, which clamps to 0
            *byte = if scaled.is_nan() { 0 } else { scaled.clamp(0.0, 255.0) as u8 };
        }
    }

    /// The analysed block with samples mapped from [-1, 1] onto 0..=255.
    pub fn byte_time_domain_data(&self, out: &mut [u8]) {
        for (byte, &sample) in out.iter_mut().zip(self.samples.iter()) {
            *byte = (128.0 * (1.0 + sample)).clamp(0.0, 255.0) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyser(fft_size: usize, smoothing: f32) -> Analyser {
        let settings = AnalyserSettings {
            fft_size,
            smoothing,
            ..Default::default()
        };
        Analyser::new(
            settings,
            Arc::new(WindowSelector::default()),
            Arc::new(WindowCache::new()),
        )
        .unwrap()
    }

    fn sine(freq: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn silence_is_all_zero() {
        let mut a = analyser(256, 0.0);
        a.process(&vec![0.0; 256]);
        let mut freq = vec![7u8; 128];
        let mut time = vec![7u8; 256];
        a.byte_frequency_data(&mut freq);
        a.byte_time_domain_data(&mut time);
        assert!(freq.iter().all(|&b| b == 0));
        assert!(time.iter().all(|&b| b == 128));
    }

    #[test]
    fn tone_lands_in_expected_bin() {
        let sr = 44100.0;
        let fft_size = 2048;
        let mut a = analyser(fft_size, 0.0);
        // Bin 93 is ~2002.6 Hz
        let hz = 93.0 * sr / fft_size as f32;
        a.process(&sine(hz, sr, fft_size));

        let mut freq = vec![0u8; fft_size / 2];
        a.byte_frequency_data(&mut freq);
        let peak = crate::dsp::peak::find_peak(&freq, 50).unwrap();
        assert!((peak.index as i64 - 93).abs() <= 1, "peak at {}", peak.index);
    }

    #[test]
    fn short_blocks_are_front_padded() {
        let mut a = analyser(8, 0.0);
        a.process(&[0.5, -0.5]);
        let mut time = vec![0u8; 8];
        a.byte_time_domain_data(&mut time);
        assert_eq!(&time[..6], &[128; 6]);
        assert_eq!(time[6], 192);
        assert_eq!(time[7], 64);
    }

    #[test]
    fn smoothing_carries_energy_forward() {
        let sr = 44100.0;
        let mut a = analyser(512, 0.8);
        a.process(&sine(2000.0, sr, 512));
        a.process(&vec![0.0; 512]);
        let mut freq = vec![0u8; 256];
        a.byte_frequency_data(&mut freq);
        assert!(freq.iter().any(|&b| b > 0));

        let mut b = analyser(512, 0.0);
        b.process(&sine(2000.0, sr, 512));
        b.process(&vec![0.0; 512]);
        b.byte_frequency_data(&mut freq);
        assert!(freq.iter().all(|&b| b == 0));
    }

    #[test]
    fn fft_size_bounds() {
        assert!(validate_fft_size(MIN_FFT_SIZE).is_ok());
        assert!(validate_fft_size(MAX_FFT_SIZE).is_ok());
        assert!(validate_fft_size(MIN_FFT_SIZE / 2).is_err());
        assert!(validate_fft_size(MAX_FFT_SIZE * 2).is_err());
        assert!(validate_fft_size(1536).is_err());
    }

    #[test]
    fn rejects_tiny_fft() {
        let settings = AnalyserSettings {
            fft_size: 1,
            ..Default::default()
        };
        assert!(Analyser::new(
            settings,
            Arc::new(WindowSelector::default()),
            Arc::new(WindowCache::new())
        )
        .is_err());
    }
}
