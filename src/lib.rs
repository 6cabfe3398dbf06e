//! Real-time audio visualizers: a frequency line, a phase-locked waveform,
//! a logarithmic bar graph and a scrolling spectrogram, drawn onto a
//! software RGBA surface from byte-quantized analyser output.

pub mod audio;
pub mod config;
pub mod dsp;
pub mod encode;
pub mod engine;
pub mod error;
pub mod render;
pub mod viz;

pub use error::{Result, VizError};
