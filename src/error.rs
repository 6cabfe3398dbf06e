use thiserror::Error;

#[derive(Debug, Error)]
pub enum VizError {
    /// The drawing surface cannot be created. Nothing can be rendered.
    #[error("unsupported environment: {0}")]
    UnsupportedEnvironment(String),

    #[error("window length {len} is too short, at least 2 samples are required")]
    DegenerateWindow { len: usize },

    #[error("FFT size {0} must be a power of two between {min} and {max}", min = crate::dsp::analyser::MIN_FFT_SIZE, max = crate::dsp::analyser::MAX_FFT_SIZE)]
    InvalidFftSize(usize),

    #[error("unknown window function '{0}'")]
    UnknownWindow(String),

    #[error("unknown visualizer '{0}'")]
    UnknownVisualizer(String),

    #[error("invalid color '{0}'")]
    InvalidColor(String),

    #[error("invalid colormap: {0}")]
    Colormap(String),

    #[error("font error: {0}")]
    Font(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VizError>;
