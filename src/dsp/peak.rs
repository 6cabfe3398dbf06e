//! Dominant frequency detection over a byte-quantized spectrum.

/// Floor used when locking the waveform display to the dominant tone.
pub const PHASE_LOCK_FLOOR: u8 = 50;
/// Floor used when marking the dominant bin on a spectrum plot.
pub const PEAK_MARK_FLOOR: u8 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Peak {
    pub index: usize,
    pub amplitude: u8,
}

/// Index and amplitude of the loudest bin, or `None` when nothing rises above
/// `floor`. Equal maxima resolve to the highest index.
pub fn find_peak(frequency: &[u8], floor: u8) -> Option<Peak> {
    let (index, amplitude) = frequency
        .iter()
        .copied()
        .enumerate()
        .fold((0usize, 0u8), |best, (i, amp)| if best.1 > amp { best } else { (i, amp) });

    if frequency.is_empty() || amplitude <= floor {
        return None;
    }
    Some(Peak { index, amplitude })
}

/// Frequency in Hz at the centre of bin `index` for a buffer of `len` bins.
pub fn index_to_hertz(index: f64, len: usize, sample_rate: f64) -> f64 {
    if len == 0 {
        return 0.0;
    }
    index * sample_rate / (2.0 * len as f64)
}

/// Fractional bin index of `hz`, the inverse of [`index_to_hertz`].
pub fn hertz_to_index(hz: f64, len: usize, sample_rate: f64) -> f64 {
    if sample_rate <= 0.0 {
        return 0.0;
    }
    hz * 2.0 * len as f64 / sample_rate
}
