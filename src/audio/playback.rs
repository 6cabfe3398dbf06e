use super::decode::AudioData;
use super::frame::{FrameBuffers, SpectralFrame};
use super::tap::SignalTap;
use crate::dsp::analyser::Analyser;

/// Plays decoded audio into a [`SignalTap`] one display tick at a time and
/// analyses it with the shared analyser.
pub struct Playback {
    audio: AudioData,
    fps: u32,
    tick: usize,
    total_ticks: usize,
    position: usize,
    tap: SignalTap,
    analyser: Analyser,
    buffers: FrameBuffers,
}

impl Playback {
    pub fn new(audio: AudioData, fps: u32, tap: SignalTap, analyser: Analyser) -> Self {
        let fps = fps.max(1);
        let duration = audio.samples.len() as f64 / audio.sample_rate.max(1) as f64;
        let total_ticks = (duration * fps as f64).ceil() as usize;
        let buffers = FrameBuffers::new(analyser.frequency_bin_count(), audio.sample_rate as f64);

        Self {
            audio,
            fps,
            tick: 0,
            total_ticks,
            position: 0,
            tap,
            analyser,
            buffers,
        }
    }

    pub fn total_ticks(&self) -> usize {
        self.total_ticks
    }

    pub fn duration(&self) -> f64 {
        self.audio.samples.len() as f64 / self.audio.sample_rate.max(1) as f64
    }

    /// Advance the clock by one tick and analyse everything played so far.
    pub fn next_frame(&mut self) -> Option<SpectralFrame<'_>> {
        if self.tick >= self.total_ticks {
            return None;
        }
        self.tick += 1;

        let clock = self.tick as f64 / self.fps as f64;
        let end = ((clock * self.audio.sample_rate as f64).round() as usize)
            .min(self.audio.samples.len());
        if end > self.position {
            self.tap.push(&self.audio.samples[self.position..end]);
            self.position = end;
        }

        self.analyser.pull(&self.tap);
        self.analyser.byte_frequency_data(&mut self.buffers.frequency);
        self.analyser.byte_time_domain_data(&mut self.buffers.time_domain);
        self.buffers.clock_seconds = clock;

        Some(self.buffers.as_frame())
    }
}
