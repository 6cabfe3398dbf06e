/// One tick of analysed audio as seen by a visualizer. Borrowed for the
/// duration of a single `render` call.
#[derive(Debug, Clone, Copy)]
pub struct SpectralFrame<'a> {
    /// Byte-quantized magnitudes, one per bin.
    pub frequency: &'a [u8],
    /// Byte-quantized waveform, twice as long as `frequency`.
    pub time_domain: &'a [u8],
    pub sample_rate: f64,
    /// Audio clock at the time of analysis, in seconds.
    pub clock_seconds: f64,
}

impl SpectralFrame<'_> {
    pub fn bin_count(&self) -> usize {
        self.frequency.len()
    }
}

/// Backing storage for [`SpectralFrame`], reused across ticks by the host.
#[derive(Debug, Clone)]
pub struct FrameBuffers {
    pub frequency: Vec<u8>,
    pub time_domain: Vec<u8>,
    pub sample_rate: f64,
    pub clock_seconds: f64,
}

impl FrameBuffers {
    pub fn new(bins: usize, sample_rate: f64) -> Self {
        Self {
            frequency: vec![0; bins],
            time_domain: vec![128; bins * 2],
            sample_rate,
            clock_seconds: 0.0,
        }
    }

    pub fn as_frame(&self) -> SpectralFrame<'_> {
        SpectralFrame {
            frequency: &self.frequency,
            time_domain: &self.time_domain,
            sample_rate: self.sample_rate,
            clock_seconds: self.clock_seconds,
        }
    }
}
