use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct History {
    ring: Vec<f32>,
    write: usize,
    filled: usize,
}

struct TapInner {
    sample_rate: f64,
    history: Mutex<History>,
    connections: AtomicUsize,
}

/// Handle to the most recent mono samples of the input signal. Analysers
/// read from it, the host writes to it. Clones share the same history.
#[derive(Clone)]
pub struct SignalTap {
    inner: Arc<TapInner>,
}

impl SignalTap {
    pub fn new(sample_rate: f64, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(TapInner {
                sample_rate,
                history: Mutex::new(History {
                    ring: vec![0.0; capacity],
                    write: 0,
                    filled: 0,
                }),
                connections: AtomicUsize::new(0),
            }),
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.inner.sample_rate
    }

    pub fn capacity(&self) -> usize {
        self.inner.history.lock().ring.len()
    }

    pub fn push(&self, samples: &[f32]) {
        let mut h = self.inner.history.lock();
        let cap = h.ring.len();
        // Only the tail can survive
        let tail = &samples[samples.len().saturating_sub(cap)..];
        for &s in tail {
            let w = h.write;
            h.ring[w] = s;
            h.write = (w + 1) % cap;
        }
        h.filled = (h.filled + tail.len()).min(cap);
    }

    /// Copy the newest `out.len()` samples, oldest first. Missing history is
    /// reported as silence at the front.
    pub fn latest_into(&self, out: &mut [f32]) {
        let h = self.inner.history.lock();
        let cap = h.ring.len();
        let available = h.filled.min(out.len());
        let pad = out.len() - available;
        out[..pad].fill(0.0);

        let start = (h.write + cap - available) % cap;
        for (i, slot) in out[pad..].iter_mut().enumerate() {
            *slot = h.ring[(start + i) % cap];
        }
    }

    /// Register an analysis node reading from this tap. The registration
    /// ends when the returned guard is dropped.
    pub fn connect(&self) -> TapConnection {
        self.inner.connections.fetch_add(1, Ordering::AcqRel);
        TapConnection { tap: self.clone() }
    }

    pub fn connections(&self) -> usize {
        self.inner.connections.load(Ordering::Acquire)
    }
}

pub struct TapConnection {
    tap: SignalTap,
}

impl Drop for TapConnection {
    fn drop(&mut self) {
        self.tap.inner.connections.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_pads_missing_history() {
        let tap = SignalTap::new(48000.0, 8);
        tap.push(&[1.0, 2.0, 3.0]);
        let mut out = [9.0f32; 5];
        tap.latest_into(&mut out);
        assert_eq!(out, [0.0, 0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn history_wraps() {
        let tap = SignalTap::new(48000.0, 4);
        tap.push(&[1.0, 2.0, 3.0]);
        tap.push(&[4.0, 5.0, 6.0]);
        let mut out = [0.0f32; 4];
        tap.latest_into(&mut out);
        assert_eq!(out, [3.0, 4.0, 5.0, 6.0]);

        tap.push(&[7.0, 8.0, 9.0, 10.0, 11.0]);
        let mut out = [0.0f32; 2];
        tap.latest_into(&mut out);
        assert_eq!(out, [10.0, 11.0]);
    }

    #[test]
    fn connections_are_released_on_drop() {
        let tap = SignalTap::new(44100.0, 16);
        let a = tap.connect();
        let b = tap.clone().connect();
        assert_eq!(tap.connections(), 2);
        drop(a);
        assert_eq!(tap.connections(), 1);
        drop(b);
        assert_eq!(tap.connections(), 0);
    }
}
