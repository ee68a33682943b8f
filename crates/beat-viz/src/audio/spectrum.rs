//! FFT conversion from time-domain samples to the byte spectrum the engine reads.
//!
//! Hann window, 2048-point FFT, linear magnitudes smoothed over time, then
//! decibels mapped from `[MIN_DECIBELS, MAX_DECIBELS]` onto 0-255.

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

pub const FFT_SIZE: usize = 2048;
/// Bins in the output buffer (DC up to just below Nyquist)
pub const BIN_COUNT: usize = FFT_SIZE / 2;

const MIN_DECIBELS: f32 = -100.0;
const MAX_DECIBELS: f32 = -30.0;
const SMOOTHING: f32 = 0.8;

pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    fft_buffer: Vec<Complex<f32>>,
    fft_window: Vec<f32>,
    smoothed: Vec<f32>,
    bytes: Vec<u8>,
}

impl SpectrumAnalyzer {
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);

        // Pre-compute Hann window
        let fft_window: Vec<f32> = (0..FFT_SIZE)
            .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / FFT_SIZE as f32).cos()))
            .collect();

        Self {
            fft,
            fft_buffer: vec![Complex::new(0.0, 0.0); FFT_SIZE],
            fft_window,
            smoothed: vec![0.0; BIN_COUNT],
            bytes: vec![0; BIN_COUNT],
        }
    }

    /// Converts the most recent `FFT_SIZE` samples; shorter input is zero-padded.
    pub fn process(&mut self, samples: &[f32]) -> &[u8] {
        let tail = &samples[samples.len().saturating_sub(FFT_SIZE)..];
        for (i, slot) in self.fft_buffer.iter_mut().enumerate() {
            let sample = tail.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(sample * self.fft_window[i], 0.0);
        }

        self.fft.process(&mut self.fft_buffer);

        let scale = 1.0 / FFT_SIZE as f32;
        for i in 0..BIN_COUNT {
            let magnitude = self.fft_buffer[i].norm() * scale;
            self.smoothed[i] = SMOOTHING * self.smoothed[i] + (1.0 - SMOOTHING) * magnitude;
            self.bytes[i] = to_byte(self.smoothed[i]);
        }
        &self.bytes
    }
}

/// Maps a linear magnitude onto 0-255 through the decibel window.
fn to_byte(magnitude: f32) -> u8 {
    let db = 20.0 * (magnitude + 1e-12).log10();
    let t = (db - MIN_DECIBELS) / (MAX_DECIBELS - MIN_DECIBELS);
    (t.clamp(0.0, 1.0) * 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(bin: usize) -> Vec<f32> {
        (0..FFT_SIZE)
            .map(|i| (std::f32::consts::TAU * bin as f32 * i as f32 / FFT_SIZE as f32).sin())
            .collect()
    }

    #[test]
    fn test_silence_is_all_zero() {
        let mut analyzer = SpectrumAnalyzer::new();
        let bytes = analyzer.process(&[0.0; FFT_SIZE]);
        assert_eq!(bytes.len(), BIN_COUNT);
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_sine_peaks_at_its_bin() {
        let mut analyzer = SpectrumAnalyzer::new();
        let bytes = analyzer.process(&sine(64)).to_vec();
        let peak = bytes
            .iter()
            .enumerate()
            .max_by_key(|&(_, &b)| b)
            .map(|(i, _)| i)
            .unwrap();
        assert!((63..=65).contains(&peak));
        assert_eq!(bytes[64], 255);
        assert!(bytes[600] < 32);
    }

    #[test]
    fn test_smoothing_decays_gradually() {
        let mut analyzer = SpectrumAnalyzer::new();
        for _ in 0..20 {
            analyzer.process(&sine(100));
        }
        let loud = analyzer.process(&sine(100))[100];
        let after = analyzer.process(&[0.0; FFT_SIZE])[100];
        assert!(after > 0);
        assert!(after <= loud);
    }

    #[test]
    fn test_decibel_window() {
        assert_eq!(to_byte(0.0), 0);
        assert_eq!(to_byte(1.0), 255);
        // -65 dB sits in the middle of the window
        let mid = to_byte(10f32.powf(-65.0 / 20.0));
        assert!((126..=128).contains(&mid));
    }
}
