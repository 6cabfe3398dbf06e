//! 256-entry intensity to RGB lookup tables.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use crate::error::{Result, VizError};

pub const COLORMAP_LEN: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Colormap {
    table: Box<[[u8; 3]; COLORMAP_LEN]>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColormapJson {
    Flat(Vec<f64>),
    Triples(Vec<[f64; 3]>),
}

impl Colormap {
    /// Magma, from the 6th order polynomial fit of the matplotlib table.
    pub fn magma() -> Self {
        const C: [[f64; 3]; 7] = [
            [-0.002136485053939582, -0.000749655052795221, -0.005386127855323933],
            [0.2516605407371642, 0.6775232436837668, 2.494026599312351],
            [8.353717279216625, -3.577719514958484, 0.3144679030132573],
            [-27.66873308576866, 14.26473078096533, -13.64921318813922],
            [52.17613981234068, -27.94360607168351, 12.94416944238394],
            [-50.76852536473588, 29.04658282127291, 4.23415299384598],
            [18.65570506591883, -11.48977351997711, -5.601961508734096],
        ];

        let mut table = Box::new([[0u8; 3]; COLORMAP_LEN]);
        for (i, rgb) in table.iter_mut().enumerate() {
            let t = i as f64 / (COLORMAP_LEN - 1) as f64;
            for ch in 0..3 {
                // Horner
                let v = C.iter().rev().fold(0.0, |acc, c| acc * t + c[ch]);
                rgb[ch] = to_channel(v * 255.0);
            }
        }
        Self { table }
    }

    /// Parse a JSON table: 768 numbers or 256 `[r, g, b]` triples, channel
    /// values in 0..=255.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let parsed: ColormapJson =
            serde_json::from_str(json).map_err(|e| VizError::Colormap(e.to_string()))?;

        let triples: Vec<[f64; 3]> = match parsed {
            ColormapJson::Flat(values) => {
                if values.len() != COLORMAP_LEN * 3 {
                    return Err(VizError::Colormap(format!(
                        "expected {} values, found {}",
                        COLORMAP_LEN * 3,
                        values.len()
                    )));
                }
                values.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect()
            }
            ColormapJson::Triples(triples) => triples,
        };
        if triples.len() != COLORMAP_LEN {
            return Err(VizError::Colormap(format!(
                "expected {} colors, found {}",
                COLORMAP_LEN,
                triples.len()
            )));
        }

        let mut table = Box::new([[0u8; 3]; COLORMAP_LEN]);
        for (dst, src) in table.iter_mut().zip(triples.iter()) {
            *dst = [to_channel(src[0]), to_channel(src[1]), to_channel(src[2])];
        }
        Ok(Self { table })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    #[inline]
    pub fn lookup(&self, value: u8) -> [u8; 3] {
        self.table[value as usize]
    }
}

fn to_channel(v: f64) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.round().clamp(0.0, 255.0) as u8
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColormapSource {
    Magma,
    File(PathBuf),
}

/// Write-once holder. Readers see `None` until a load completes.
#[derive(Default)]
pub struct ColormapSlot {
    cell: OnceLock<Arc<Colormap>>,
}

impl ColormapSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&Colormap> {
        self.cell.get().map(|c| c.as_ref())
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Returns `false` when a colormap was already installed.
    pub fn set(&self, colormap: Colormap) -> bool {
        self.cell.set(Arc::new(colormap)).is_ok()
    }
}

/// Load `source` on a rayon worker and install it into `slot` when done. A
/// file that fails to load falls back to the built-in table.
pub fn load_in_background(slot: Arc<ColormapSlot>, source: ColormapSource) {
    rayon::spawn(move || {
        let colormap = match &source {
            ColormapSource::Magma => Colormap::magma(),
            ColormapSource::File(path) => match Colormap::from_file(path) {
                Ok(c) => c,
                Err(err) => {
                    log::warn!("Failed to load colormap {}: {}", path.display(), err);
                    Colormap::magma()
                }
            },
        };
        if slot.set(colormap) {
            log::debug!("Colormap available ({:?})", source);
        }
    });
}
