//! Window functions applied to a sample block before the FFT.
//!
//! Coefficients are cheap to describe but involve a cosine per sample, so the
//! analysis stage never evaluates them per block. [`WindowCache`] memoizes one
//! table per `(type, length)` and [`WindowSelector`] hands the current choice
//! to the analysis stage without locking.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::error::{Result, VizError};

const PI2: f64 = 2.0 * PI;
const BLACKMAN_ALPHA: f64 = 0.16;

/// The shape of an FFT window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowType {
    /// A basic half cosine curve with its maximum in the middle.
    Hanning,
    /// Like `Hanning`, but with some scaling applied.
    Hamming,
    /// Similar to `Hamming`, with a main lobe 50% wider.
    Blackman,
    /// Similar to `Blackman`.
    BlackmanHarris,
    /// A linear abs-function. The ends are non-zero.
    Parzen,
    /// Like `Parzen`, but squared.
    Welch,
}

impl WindowType {
    pub const ALL: [WindowType; 6] = [
        WindowType::Hanning,
        WindowType::Hamming,
        WindowType::Blackman,
        WindowType::BlackmanHarris,
        WindowType::Parzen,
        WindowType::Welch,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Hanning => "Hanning",
            Self::Hamming => "Hamming",
            Self::Blackman => "Blackman",
            Self::BlackmanHarris => "Blackman Harris",
            Self::Parzen => "Parzen",
            Self::Welch => "Welch",
        }
    }

    /// Generate `n` coefficients. Lengths below 2 are rejected: the cosine
    /// windows divide by `n - 1`.
    pub fn generate(self, n: usize) -> Result<Vec<f64>> {
        if n < 2 {
            return Err(VizError::DegenerateWindow { len: n });
        }
        let nf = n as f64;
        let nn = PI2 / (nf - 1.0);

        let coefficients = match self {
            Self::Hanning => (0..n)
                .map(|i| 0.5 * (1.0 - (i as f64 * nn).cos()))
                .collect(),
            Self::Hamming => (0..n)
                .map(|i| 0.54 - 0.46 * (i as f64 * nn).cos())
                .collect(),
            Self::Blackman => {
                let ha = 0.5 * BLACKMAN_ALPHA;
                let af = 0.5 - ha;
                (0..n)
                    .map(|i| {
                        let z = i as f64 * nn;
                        af - 0.5 * z.cos() + ha * (2.0 * z).cos()
                    })
                    .collect()
            }
            Self::BlackmanHarris => (0..n)
                .map(|i| {
                    let z = i as f64 * nn;
                    0.35875 - 0.48829 * z.cos() + 0.14128 * (2.0 * z).cos()
                        - 0.01168 * (3.0 * z).cos()
                })
                .collect(),
            Self::Parzen => {
                // (n - 1) / 2 and 1 / ((n + 1) / 2)
                let hm = 0.5 * (nf - 1.0);
                let s = 1.0 / (0.5 * (nf + 1.0));
                (0..n).map(|i| 1.0 - ((i as f64 - hm) * s).abs()).collect()
            }
            Self::Welch => {
                let hm = 0.5 * (nf - 1.0);
                let hp = 0.5 * (nf + 1.0);
                let sq = 1.0 / (hp * hp);
                (0..n)
                    .map(|i| {
                        let a = i as f64 - hm;
                        1.0 - a * a * sq
                    })
                    .collect()
            }
        };

        Ok(coefficients)
    }

    fn code(self) -> u8 {
        match self {
            Self::Hanning => 1,
            Self::Hamming => 2,
            Self::Blackman => 3,
            Self::BlackmanHarris => 4,
            Self::Parzen => 5,
            Self::Welch => 6,
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|w| w.code() == code)
    }
}

impl fmt::Display for WindowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WindowType {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self> {
        let compact: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect();
        Self::ALL
            .iter()
            .copied()
            .find(|w| {
                let name: String = w.name().chars().filter(|c| !c.is_whitespace()).collect();
                name.eq_ignore_ascii_case(&compact)
            })
            .ok_or_else(|| VizError::UnknownWindow(s.to_string()))
    }
}

/// Memoized coefficient tables keyed by `"{type}#{n}"`.
#[derive(Default)]
pub struct WindowCache {
    tables: RwLock<HashMap<String, Arc<[f32]>>>,
}

impl WindowCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(window: WindowType, n: usize) -> String {
        format!("{}#{}", window, n)
    }

    pub fn coefficients(&self, window: WindowType, n: usize) -> Result<Arc<[f32]>> {
        let key = Self::key(window, n);
        if let Some(table) = self.tables.read().get(&key) {
            return Ok(Arc::clone(table));
        }

        let table: Arc<[f32]> = window
            .generate(n)?
            .into_iter()
            .map(|c| c as f32)
            .collect();
        log::debug!("Computed window table {}", key);

        // Another caller may have filled the slot meanwhile; keep the first.
        let mut tables = self.tables.write();
        let entry = tables.entry(key).or_insert(table);
        Ok(Arc::clone(entry))
    }

    pub fn len(&self) -> usize {
        self.tables.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Current window choice, written by the host and read by the analysis
/// stage at the start of every block. `0` encodes "no window".
pub struct WindowSelector {
    current: AtomicU8,
}

impl WindowSelector {
    pub fn new(window: Option<WindowType>) -> Self {
        Self {
            current: AtomicU8::new(window.map_or(0, WindowType::code)),
        }
    }

    pub fn set(&self, window: Option<WindowType>) {
        self.current
            .store(window.map_or(0, WindowType::code), Ordering::Release);
    }

    pub fn current(&self) -> Option<WindowType> {
        WindowType::from_code(self.current.load(Ordering::Acquire))
    }
}

impl Default for WindowSelector {
    fn default() -> Self {
        Self::new(Some(WindowType::BlackmanHarris))
    }
}
