use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use voxchat_core::AMPLITUDE_IDLE;

/// FFT window length for amplitude analysis.
pub const FFT_SIZE: usize = 256;

/// Scale span above the idle baseline at full amplitude.
pub const AMPLITUDE_SPAN: f32 = 0.25;

// ── Amplitude ─────────────────────────────────────────────────

/// Shared playback amplitude scale, readable from the UI thread while the
/// audio thread updates it. Stored as f32 bits in an atomic.
#[derive(Clone)]
pub struct Amplitude {
    bits: Arc<AtomicU32>,
}

impl Amplitude {
    pub fn new() -> Self {
        Self {
            bits: Arc::new(AtomicU32::new(AMPLITUDE_IDLE.to_bits())),
        }
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    pub fn set(&self, v: f32) {
        self.bits.store(v.to_bits(), Ordering::Relaxed);
    }

    /// Snap back to the idle baseline when playback ends or fails.
    pub fn reset(&self) {
        self.set(AMPLITUDE_IDLE);
    }
}

impl Default for Amplitude {
    fn default() -> Self {
        Self::new()
    }
}

// ── Analysis ──────────────────────────────────────────────────

/// Map byte-scaled frequency bins to a display scale in
/// `[AMPLITUDE_IDLE, AMPLITUDE_IDLE + AMPLITUDE_SPAN]`.
pub fn scale_from_bins(bins: &[u8]) -> f32 {
    if bins.is_empty() {
        return AMPLITUDE_IDLE;
    }
    let sum: u32 = bins.iter().map(|&b| b as u32).sum();
    let mean = sum as f32 / bins.len() as f32;
    let normalized = (mean / 255.0).clamp(0.0, 1.0);
    AMPLITUDE_IDLE + normalized * AMPLITUDE_SPAN
}

/// Streaming FFT analyzer. Feed playback samples as they are rendered;
/// every full window updates the shared [`Amplitude`] handle.
pub struct AmplitudeAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    handle: Amplitude,
}

impl AmplitudeAnalyzer {
    pub fn new(handle: Amplitude) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            fft: planner.plan_fft_forward(FFT_SIZE),
            window: Vec::with_capacity(FFT_SIZE),
            handle,
        }
    }

    pub fn feed(&mut self, samples: &[f32]) {
        for &s in samples {
            self.window.push(s);
            if self.window.len() == FFT_SIZE {
                let bins = self.analyze_window();
                self.handle.set(scale_from_bins(&bins));
                self.window.clear();
            }
        }
    }

    fn analyze_window(&self) -> Vec<u8> {
        let mut buffer: Vec<Complex<f32>> = self
            .window
            .iter()
            .map(|&s| Complex::new(s, 0.0))
            .collect();
        self.fft.process(&mut buffer);

        // Magnitudes of the positive-frequency half, byte-scaled.
        let half = FFT_SIZE / 2;
        buffer[..half]
            .iter()
            .map(|c| {
                let mag = c.norm() / half as f32;
                (mag.clamp(0.0, 1.0) * 255.0) as u8
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amplitude_default_is_idle() {
        let amp = Amplitude::new();
        assert_eq!(amp.get(), AMPLITUDE_IDLE);
    }

    #[test]
    fn test_amplitude_clone_shares_state() {
        let a1 = Amplitude::new();
        let a2 = a1.clone();
        a1.set(1.1);
        assert_eq!(a2.get(), 1.1);
    }

    #[test]
    fn test_amplitude_reset_restores_exact_baseline() {
        let amp = Amplitude::new();
        amp.set(1.15);
        amp.reset();
        assert_eq!(amp.get(), 0.9);
    }

    #[test]
    fn test_scale_silence_is_baseline() {
        let bins = vec![0u8; 128];
        assert_eq!(scale_from_bins(&bins), AMPLITUDE_IDLE);
    }

    #[test]
    fn test_scale_full_amplitude_is_max() {
        let bins = vec![255u8; 128];
        let scale = scale_from_bins(&bins);
        assert!((scale - 1.15).abs() < 1e-6);
    }

    #[test]
    fn test_scale_is_monotonic_in_mean() {
        let quiet = vec![32u8; 128];
        let loud = vec![200u8; 128];
        assert!(scale_from_bins(&quiet) < scale_from_bins(&loud));
    }

    #[test]
    fn test_scale_stays_in_range() {
        for fill in [0u8, 1, 64, 128, 254, 255] {
            let bins = vec![fill; 128];
            let scale = scale_from_bins(&bins);
            assert!((0.9..=1.15).contains(&scale), "scale {} out of range", scale);
        }
    }

    #[test]
    fn test_scale_empty_bins_is_baseline() {
        assert_eq!(scale_from_bins(&[]), AMPLITUDE_IDLE);
    }

    #[test]
    fn test_analyzer_silence_leaves_baseline() {
        let amp = Amplitude::new();
        let mut analyzer = AmplitudeAnalyzer::new(amp.clone());
        analyzer.feed(&vec![0.0f32; FFT_SIZE * 2]);
        assert_eq!(amp.get(), AMPLITUDE_IDLE);
    }

    #[test]
    fn test_analyzer_tone_raises_scale() {
        let amp = Amplitude::new();
        let mut analyzer = AmplitudeAnalyzer::new(amp.clone());
        let tone: Vec<f32> = (0..FFT_SIZE)
            .map(|i| (i as f32 * std::f32::consts::TAU * 8.0 / FFT_SIZE as f32).sin())
            .collect();
        analyzer.feed(&tone);
        assert!(amp.get() > AMPLITUDE_IDLE);
        assert!(amp.get() <= AMPLITUDE_IDLE + AMPLITUDE_SPAN);
    }

    #[test]
    fn test_analyzer_partial_window_no_update() {
        let amp = Amplitude::new();
        let mut analyzer = AmplitudeAnalyzer::new(amp.clone());
        analyzer.feed(&vec![1.0f32; FFT_SIZE - 1]);
        assert_eq!(amp.get(), AMPLITUDE_IDLE);
    }
}
