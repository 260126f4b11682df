//! Fixed-coefficient bandpass filtering of a sample window.
//!
//! A single 2nd-order IIR bandpass in Direct Form II isolates the cry band
//! before energy classification. Direct Form II needs only two delay values
//! per stage, which is why the original hardware ran it comfortably at
//! 16 kHz. The five coefficients are designed offline and loaded once from
//! configuration; nothing is recomputed at runtime.
//!
//! ## Delay-state lifecycle
//!
//! The delay state (`w1`, `w2`) lives inside the [`BiquadBandpass`] value
//! and nowhere else. The detection loop calls [`BiquadBandpass::reset`]
//! before each window, so every window is filtered from a zeroed state and
//! the output is a pure function of that window alone. The settling
//! transient over the first few samples of a multi-second window is
//! negligible.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// FilterCoefficients
// ---------------------------------------------------------------------------

/// The five scalars of a normalized (a0 = 1) second-order transfer function.
///
/// Designed offline for the target passband; immutable once loaded. The
/// default set is the deployed 4.5–6 kHz band at a 16 kHz sampling rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterCoefficients {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    /// First feedback coefficient (sign convention: `w0 = x - a1*w1 - a2*w2`).
    pub a1: f32,
    /// Second feedback coefficient.
    pub a2: f32,
}

impl Default for FilterCoefficients {
    fn default() -> Self {
        // Precomputed bandpass, 4500-6000 Hz at 16 kHz.
        Self {
            b0: 0.217_395_8,
            b1: 0.0,
            b2: -0.217_395_8,
            a1: 0.869_583_2,
            a2: 0.565_208_4,
        }
    }
}

impl FilterCoefficients {
    /// Returns `true` when the feedback pair lies inside the second-order
    /// stability triangle (|a2| < 1 and |a1| < 1 + a2) and every
    /// coefficient is finite.
    ///
    /// ```
    /// use acalanto::audio::FilterCoefficients;
    ///
    /// assert!(FilterCoefficients::default().is_stable());
    ///
    /// let bad = FilterCoefficients { a2: 1.5, ..Default::default() };
    /// assert!(!bad.is_stable());
    /// ```
    pub fn is_stable(&self) -> bool {
        let finite = [self.b0, self.b1, self.b2, self.a1, self.a2]
            .iter()
            .all(|c| c.is_finite());
        finite && self.a2.abs() < 1.0 && self.a1.abs() < 1.0 + self.a2
    }
}

// ---------------------------------------------------------------------------
// BiquadBandpass
// ---------------------------------------------------------------------------

/// Direct Form II biquad with a two-value delay state.
///
/// Per sample:
///
/// ```text
/// w0 = x - a1*w1 - a2*w2
/// y  = b0*w0 + b1*w1 + b2*w2
/// w2 = w1; w1 = w0
/// ```
///
/// # Example
///
/// ```
/// use acalanto::audio::{BiquadBandpass, FilterCoefficients};
///
/// let mut filter = BiquadBandpass::new(FilterCoefficients::default());
/// let mut window = vec![0.0_f32; 64];
/// filter.filter_window(&mut window);
/// assert!(window.iter().all(|&y| y == 0.0)); // zero in, zero out
/// ```
pub struct BiquadBandpass {
    coeffs: FilterCoefficients,
    w1: f32,
    w2: f32,
}

impl BiquadBandpass {
    /// Create a filter with zeroed delay state.
    pub fn new(coeffs: FilterCoefficients) -> Self {
        Self {
            coeffs,
            w1: 0.0,
            w2: 0.0,
        }
    }

    /// The coefficient set this filter was built with.
    pub fn coefficients(&self) -> FilterCoefficients {
        self.coeffs
    }

    /// Zero the delay state. Called by the detection loop at the start of
    /// every window so windows never couple to each other.
    pub fn reset(&mut self) {
        self.w1 = 0.0;
        self.w2 = 0.0;
    }

    /// Filter one sample, advancing the delay state.
    pub fn process(&mut self, x: f32) -> f32 {
        let c = &self.coeffs;
        let w0 = x - c.a1 * self.w1 - c.a2 * self.w2;
        let y = c.b0 * w0 + c.b1 * self.w1 + c.b2 * self.w2;
        self.w2 = self.w1;
        self.w1 = w0;
        y
    }

    /// Filter a whole window in place, in order.
    ///
    /// O(n) time, no allocation. The delay state is whatever it was when
    /// the call started; callers that want a window-pure output must
    /// [`reset`](Self::reset) first.
    pub fn filter_window(&mut self, samples: &mut [f32]) {
        for sample in samples.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> (f32, f32) {
        (self.w1, self.w2)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    // ---- Stability check ----------------------------------------------------

    #[test]
    fn default_coefficients_are_stable() {
        assert!(FilterCoefficients::default().is_stable());
    }

    #[test]
    fn a2_outside_unit_interval_is_unstable() {
        let c = FilterCoefficients {
            a2: 1.01,
            ..Default::default()
        };
        assert!(!c.is_stable());
    }

    #[test]
    fn a1_outside_triangle_is_unstable() {
        // a2 = 0.5 allows |a1| < 1.5
        let c = FilterCoefficients {
            a1: 1.6,
            a2: 0.5,
            ..Default::default()
        };
        assert!(!c.is_stable());
    }

    #[test]
    fn nan_coefficient_is_unstable() {
        let c = FilterCoefficients {
            b1: f32::NAN,
            ..Default::default()
        };
        assert!(!c.is_stable());
    }

    // ---- Difference equation ------------------------------------------------

    #[test]
    fn zero_input_produces_zero_output_and_zero_state() {
        let mut filter = BiquadBandpass::new(FilterCoefficients::default());
        let mut window = vec![0.0_f32; 256];
        filter.filter_window(&mut window);

        assert!(window.iter().all(|&y| y == 0.0));
        assert_eq!(filter.state(), (0.0, 0.0));
    }

    #[test]
    fn impulse_response_matches_difference_equation() {
        let c = FilterCoefficients::default();
        let mut filter = BiquadBandpass::new(c);
        let mut window = vec![0.0_f32; 3];
        window[0] = 1.0;
        filter.filter_window(&mut window);

        // y0 = b0; y1 = b1 - a1*b0; y2 = b0*(a1^2 - a2) + b1*(-a1) + b2
        assert!(approx(window[0], c.b0));
        assert!(approx(window[1], c.b1 - c.a1 * c.b0));
        let w0_2 = c.a1 * c.a1 - c.a2;
        assert!(approx(window[2], c.b0 * w0_2 - c.b1 * c.a1 + c.b2));
    }

    // ---- Repeatability (determinism) ----------------------------------------

    #[test]
    fn identical_input_from_reset_state_is_reproducible() {
        let input: Vec<f32> = (0..512)
            .map(|i| ((i * 37 % 101) as f32 / 50.0) - 1.0)
            .collect();

        let mut filter = BiquadBandpass::new(FilterCoefficients::default());
        let mut first = input.clone();
        filter.filter_window(&mut first);
        let state_first = filter.state();

        filter.reset();
        let mut second = input.clone();
        filter.filter_window(&mut second);

        assert_eq!(first, second);
        assert_eq!(filter.state(), state_first);
    }

    #[test]
    fn final_state_is_a_function_of_input_and_prior_state() {
        let a: Vec<f32> = (0..128).map(|i| (i as f32 * 0.01).sin()).collect();
        let b: Vec<f32> = (0..128).map(|i| (i as f32 * 0.02).cos()).collect();

        // Continuation: filter a then b without reset.
        let mut continued = BiquadBandpass::new(FilterCoefficients::default());
        let mut a1 = a.clone();
        continued.filter_window(&mut a1);
        let mid_state = continued.state();
        let mut b1 = b.clone();
        continued.filter_window(&mut b1);

        // A second filter seeded by replaying `a` must agree on `b`.
        let mut replayed = BiquadBandpass::new(FilterCoefficients::default());
        let mut a2 = a.clone();
        replayed.filter_window(&mut a2);
        assert_eq!(replayed.state(), mid_state);
        let mut b2 = b.clone();
        replayed.filter_window(&mut b2);

        assert_eq!(b1, b2);
        assert_eq!(continued.state(), replayed.state());
    }

    #[test]
    fn reset_clears_delay_state() {
        let mut filter = BiquadBandpass::new(FilterCoefficients::default());
        filter.process(1.0);
        filter.process(-0.5);
        assert_ne!(filter.state(), (0.0, 0.0));

        filter.reset();
        assert_eq!(filter.state(), (0.0, 0.0));
    }

    #[test]
    fn process_and_filter_window_agree() {
        let input: Vec<f32> = (0..64).map(|i| (i as f32 * 0.1).sin()).collect();

        let mut sample_wise = BiquadBandpass::new(FilterCoefficients::default());
        let expected: Vec<f32> = input.iter().map(|&x| sample_wise.process(x)).collect();

        let mut window_wise = BiquadBandpass::new(FilterCoefficients::default());
        let mut actual = input.clone();
        window_wise.filter_window(&mut actual);

        assert_eq!(expected, actual);
    }
}
