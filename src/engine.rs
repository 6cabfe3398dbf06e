//! Shared state behind every visualizer of one session.

use std::sync::Arc;

use crate::audio::tap::SignalTap;
use crate::dsp::analyser::{validate_fft_size, Analyser, AnalyserSettings};
use crate::dsp::window::{WindowCache, WindowSelector, WindowType};
use crate::error::Result;
use crate::render::colormap::{load_in_background, ColormapSlot, ColormapSource};
use crate::viz::{Palette, Visualizer, VisualizerKind, VisualizerOptions, VisualizerParams};

/// Lazily populated resources that outlive individual visualizers.
#[derive(Default)]
pub struct SharedResources {
    pub colormap: Arc<ColormapSlot>,
    pub windows: Arc<WindowCache>,
    pub window_selector: Arc<WindowSelector>,
}

impl SharedResources {
    pub fn new() -> Self {
        Self::default()
    }
}

pub struct EngineContext {
    tap: SignalTap,
    resources: Arc<SharedResources>,
    settings: AnalyserSettings,
    palette: Palette,
    options: VisualizerOptions,
}

impl EngineContext {
    pub fn new(
        sample_rate: f64,
        settings: AnalyserSettings,
        palette: Palette,
        mut options: VisualizerOptions,
    ) -> Result<Self> {
        validate_fft_size(settings.fft_size)?;
        options.analysis = settings;
        Ok(Self {
            tap: SignalTap::new(sample_rate, settings.fft_size * 2),
            resources: Arc::new(SharedResources::new()),
            settings,
            palette,
            options,
        })
    }

    pub fn tap(&self) -> &SignalTap {
        &self.tap
    }

    pub fn resources(&self) -> &Arc<SharedResources> {
        &self.resources
    }

    pub fn sample_rate(&self) -> f64 {
        self.tap.sample_rate()
    }

    /// Bins in the shared frequency buffer.
    pub fn bins(&self) -> usize {
        self.settings.fft_size / 2
    }

    /// The analyser that feeds every [`SpectralFrame`](crate::audio::frame::SpectralFrame).
    pub fn shared_analyser(&self) -> Result<Analyser> {
        Analyser::new(
            self.settings,
            Arc::clone(&self.resources.window_selector),
            Arc::clone(&self.resources.windows),
        )
    }

    pub fn select_window(&self, window: Option<WindowType>) {
        self.resources.window_selector.set(window);
        match window {
            Some(w) => log::info!("Analysis window: {}", w),
            None => log::info!("Analysis window: none"),
        }
    }

    pub fn load_colormap(&self, source: ColormapSource) {
        load_in_background(Arc::clone(&self.resources.colormap), source);
    }

    pub fn create(&self, kind: VisualizerKind, title: impl Into<String>) -> Result<Visualizer> {
        let params = VisualizerParams {
            title: title.into(),
            bins: self.bins(),
            sample_rate: self.sample_rate(),
            tap: self.tap.clone(),
            resources: Arc::clone(&self.resources),
            palette: self.palette,
            options: self.options.clone(),
        };
        let visualizer = Visualizer::new(kind, params)?;
        log::info!("Visualizer: {} ({} bins)", kind, self.bins());
        Ok(visualizer)
    }
}
