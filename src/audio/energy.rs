//! Energy-based cry classification of a filtered window.
//!
//! After bandpass filtering, everything left in the window is (mostly)
//! in-band signal. The window reduces to one scalar, its mean-square
//! energy, which is compared against the configured threshold. A single
//! cycle's verdict is memoryless: no hysteresis, no history.
//!
//! Energy is the sum of squared samples normalized by window length, so
//! the verdict does not depend on the configured window size.

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Result of classifying one window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    /// Mean-square energy of the filtered window.
    pub energy: f32,
    /// `true` when `energy` exceeds the configured threshold.
    pub is_cry: bool,
}

// ---------------------------------------------------------------------------
// EnergyClassifier
// ---------------------------------------------------------------------------

/// Threshold comparator over mean-square window energy.
///
/// # Example
///
/// ```
/// use acalanto::audio::EnergyClassifier;
///
/// let classifier = EnergyClassifier::new(1e-3);
///
/// // A silent window never trips the detector.
/// let silence = vec![0.0_f32; 1024];
/// let detection = classifier.classify(&silence);
/// assert_eq!(detection.energy, 0.0);
/// assert!(!detection.is_cry);
/// ```
pub struct EnergyClassifier {
    threshold: f32,
}

impl EnergyClassifier {
    /// Create a classifier with the given energy threshold.
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    /// The configured threshold.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Reduce a filtered window to its mean-square energy and compare it
    /// against the threshold.
    ///
    /// Runs in O(window length) with a single accumulator; no second buffer
    /// is materialized. An empty window yields energy `0.0` and a negative
    /// verdict.
    pub fn classify(&self, filtered: &[f32]) -> Detection {
        let energy = if filtered.is_empty() {
            0.0
        } else {
            let sum_sq: f32 = filtered.iter().map(|s| s * s).sum();
            sum_sq / filtered.len() as f32
        };

        Detection {
            energy,
            is_cry: energy > self.threshold,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{BiquadBandpass, FilterCoefficients};

    const SAMPLE_RATE: f32 = 16_000.0;

    /// One second of a pure sinusoid at `freq_hz`.
    fn sinusoid(freq_hz: f32, amplitude: f32) -> Vec<f32> {
        (0..SAMPLE_RATE as usize)
            .map(|i| {
                amplitude * (std::f32::consts::TAU * freq_hz * i as f32 / SAMPLE_RATE).sin()
            })
            .collect()
    }

    fn filtered_energy(window: &[f32]) -> f32 {
        let mut filter = BiquadBandpass::new(FilterCoefficients::default());
        let mut samples = window.to_vec();
        filter.filter_window(&mut samples);
        EnergyClassifier::new(1e-3).classify(&samples).energy
    }

    // ---- Boundary cases -----------------------------------------------------

    #[test]
    fn zero_window_has_zero_energy_and_no_cry() {
        let classifier = EnergyClassifier::new(100.0);
        let detection = classifier.classify(&vec![0.0_f32; 2048]);
        assert_eq!(detection.energy, 0.0);
        assert!(!detection.is_cry);
    }

    #[test]
    fn empty_window_has_zero_energy() {
        let classifier = EnergyClassifier::new(0.5);
        let detection = classifier.classify(&[]);
        assert_eq!(detection.energy, 0.0);
        assert!(!detection.is_cry);
    }

    #[test]
    fn energy_at_threshold_is_not_a_cry() {
        // Constant 0.5 has mean square exactly 0.25; verdict is strict `>`.
        let classifier = EnergyClassifier::new(0.25);
        let detection = classifier.classify(&vec![0.5_f32; 64]);
        assert!((detection.energy - 0.25).abs() < 1e-6);
        assert!(!detection.is_cry);
    }

    // ---- Normalization ------------------------------------------------------

    #[test]
    fn energy_is_independent_of_window_length() {
        let classifier = EnergyClassifier::new(1.0);
        let short = classifier.classify(&vec![0.5_f32; 100]).energy;
        let long = classifier.classify(&vec![0.5_f32; 10_000]).energy;
        assert!((short - long).abs() < 1e-6);
    }

    // ---- Monotonicity in amplitude ------------------------------------------

    #[test]
    fn scaling_amplitude_strictly_increases_energy() {
        let classifier = EnergyClassifier::new(1e-3);
        let base = sinusoid(5_000.0, 0.3);
        let louder: Vec<f32> = base.iter().map(|s| s * 1.5).collect();

        let e_base = classifier.classify(&base).energy;
        let e_louder = classifier.classify(&louder).energy;
        assert!(e_louder > e_base);
        // Energy scales with the square of the amplitude factor.
        assert!((e_louder / e_base - 2.25).abs() < 0.01);
    }

    // ---- Filter selectivity -------------------------------------------------

    #[test]
    fn in_band_sinusoid_has_more_energy_than_out_of_band() {
        // 5.25 kHz sits at the center of the default 4.5-6 kHz passband;
        // 500 Hz is far below it.
        let in_band = filtered_energy(&sinusoid(5_250.0, 0.5));
        let out_of_band = filtered_energy(&sinusoid(500.0, 0.5));

        assert!(
            in_band > 10.0 * out_of_band,
            "in-band {in_band} vs out-of-band {out_of_band}"
        );
    }

    #[test]
    fn default_threshold_separates_band_edges() {
        let classifier = EnergyClassifier::new(1e-3);

        let mut filter = BiquadBandpass::new(FilterCoefficients::default());
        let mut loud_in_band = sinusoid(5_250.0, 0.5);
        filter.filter_window(&mut loud_in_band);
        assert!(classifier.classify(&loud_in_band).is_cry);

        filter.reset();
        let mut hum = sinusoid(500.0, 0.5);
        filter.filter_window(&mut hum);
        assert!(!classifier.classify(&hum).is_cry);
    }

    // ---- Accessors ----------------------------------------------------------

    #[test]
    fn threshold_getter() {
        let classifier = EnergyClassifier::new(0.042);
        assert!((classifier.threshold() - 0.042).abs() < 1e-7);
    }
}
