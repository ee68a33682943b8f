//! Frequency band reduction.
//!
//! Turns an unsigned-byte frequency-magnitude buffer (low frequencies first)
//! into the scalar intensities every pattern consumes. Stateless: the same
//! buffer always yields the same metrics.

/// Sub-band ratios of the logical buffer length, `[start, end)`.
pub const BASS_BAND: (f32, f32) = (0.0, 0.15);
pub const MID_BAND: (f32, f32) = (0.15, 0.5);
pub const TREBLE_BAND: (f32, f32) = (0.5, 1.0);

/// Per-frame intensity summary, every field in 0.0-1.0.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrequencyMetrics {
    pub overall: f32,
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
}

impl FrequencyMetrics {
    pub const SILENT: FrequencyMetrics = FrequencyMetrics {
        overall: 0.0,
        bass: 0.0,
        mid: 0.0,
        treble: 0.0,
    };

    /// Reduces `buffer` (logical length `len`) to the four intensities.
    ///
    /// A zero `len` or empty buffer is treated as silence.
    pub fn from_spectrum(buffer: &[u8], len: usize) -> Self {
        if len == 0 || buffer.is_empty() {
            return Self::SILENT;
        }
        Self {
            overall: overall_intensity(buffer, len),
            bass: band_intensity(buffer, len, BASS_BAND.0, BASS_BAND.1),
            mid: band_intensity(buffer, len, MID_BAND.0, MID_BAND.1),
            treble: band_intensity(buffer, len, TREBLE_BAND.0, TREBLE_BAND.1),
        }
    }
}

/// Mean magnitude of bins `[len*start_ratio, len*end_ratio)` normalized to 0-1.
///
/// Bins past the end of `buffer` (but inside the logical `len`) read as 0.
/// Degenerate ratio pairs yield 0 rather than dividing by zero.
pub fn band_intensity(buffer: &[u8], len: usize, start_ratio: f32, end_ratio: f32) -> f32 {
    if len == 0 || !start_ratio.is_finite() || !end_ratio.is_finite() {
        return 0.0;
    }
    let start_ratio = start_ratio.clamp(0.0, 1.0);
    let end_ratio = end_ratio.clamp(0.0, 1.0);
    if end_ratio <= start_ratio {
        return 0.0;
    }

    let start = ((len as f32 * start_ratio).floor() as usize).min(len - 1);
    let end = ((len as f32 * end_ratio).floor() as usize)
        .clamp(start + 1, len);

    let sum: u64 = (start..end)
        .map(|i| buffer.get(i).copied().unwrap_or(0) as u64)
        .sum();
    let mean = sum as f32 / (end - start) as f32;
    (mean / 255.0).clamp(0.0, 1.0)
}

/// Mean magnitude of the whole logical buffer, normalized to 0-1.
pub fn overall_intensity(buffer: &[u8], len: usize) -> f32 {
    band_intensity(buffer, len, 0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 255 / len.max(1)) as u8).collect()
    }

    #[test]
    fn test_silence_is_zero() {
        let metrics = FrequencyMetrics::from_spectrum(&[0; 32], 32);
        assert_eq!(metrics, FrequencyMetrics::SILENT);
    }

    #[test]
    fn test_zero_length_degrades_to_silence() {
        assert_eq!(FrequencyMetrics::from_spectrum(&[255; 8], 0), FrequencyMetrics::SILENT);
        assert_eq!(FrequencyMetrics::from_spectrum(&[], 64), FrequencyMetrics::SILENT);
    }

    #[test]
    fn test_full_scale_is_one() {
        let metrics = FrequencyMetrics::from_spectrum(&[255; 64], 64);
        assert_eq!(metrics.overall, 1.0);
        assert_eq!(metrics.bass, 1.0);
        assert_eq!(metrics.mid, 1.0);
        assert_eq!(metrics.treble, 1.0);
    }

    #[test]
    fn test_output_in_range_for_valid_ratios() {
        let buffers = [ramp(7), ramp(64), vec![255; 1024], vec![17; 3]];
        let ratios = [
            (0.0, 0.15),
            (0.15, 0.5),
            (0.5, 1.0),
            (0.01, 0.02),
            (0.99, 1.0),
            (0.3, 0.31),
        ];
        for buffer in &buffers {
            for &(lo, hi) in &ratios {
                let a = band_intensity(buffer, buffer.len(), lo, hi);
                let b = band_intensity(buffer, buffer.len(), lo, hi);
                assert!((0.0..=1.0).contains(&a), "{lo}..{hi} gave {a}");
                assert_eq!(a, b, "band reduction must be pure");
            }
        }
    }

    #[test]
    fn test_logical_length_past_buffer_reads_zero() {
        // Logical length 8 but only 4 samples present: the missing half is silent
        let value = band_intensity(&[255; 4], 8, 0.0, 1.0);
        assert!((value - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_ratios_do_not_divide_by_zero() {
        assert_eq!(band_intensity(&[255; 16], 16, 0.5, 0.5), 0.0);
        assert_eq!(band_intensity(&[255; 16], 16, 0.8, 0.2), 0.0);
        assert_eq!(band_intensity(&[255; 16], 16, f32::NAN, 1.0), 0.0);
        // Tiny band on a short buffer still covers one bin
        assert_eq!(band_intensity(&[255; 4], 4, 0.0, 0.01), 1.0);
    }

    #[test]
    fn test_bass_spike_only_raises_bass() {
        let mut buffer = vec![0u8; 32];
        buffer[..3].fill(255);
        let metrics = FrequencyMetrics::from_spectrum(&buffer, 32);
        assert!(metrics.bass > 0.5);
        assert_eq!(metrics.mid, 0.0);
        assert_eq!(metrics.treble, 0.0);
    }
}
