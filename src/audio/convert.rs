//! Capture-chunk conversion for the detection chain.
//!
//! The classifier wants mono samples at the analysis rate (16 kHz by
//! default); capture devices deliver interleaved multi-channel frames at
//! whatever rate the hardware prefers. [`convert_chunk`] does both
//! conversions in one pass over a cpal callback chunk: each output sample
//! interpolates between two neighboring input frames, and each frame is
//! averaged across its channels on the fly, so no intermediate mono
//! buffer is ever built inside the audio callback.
//!
//! Linear interpolation is plenty here: the cry passband sits far below
//! the Nyquist frequency of every common device rate, and the classifier
//! only looks at band energy, not waveform fidelity.

// ---------------------------------------------------------------------------
// convert_chunk
// ---------------------------------------------------------------------------

/// Convert one interleaved capture chunk to mono at the analysis rate.
///
/// The output length is approximately
/// `frames * analysis_rate / native_rate` where
/// `frames = samples.len() / channels`. Matching rates skip the
/// interpolation and only downmix. A chunk shorter than one frame, zero
/// channels or a zero rate all yield an empty vector.
///
/// # Example
///
/// ```
/// use acalanto::audio::convert_chunk;
///
/// // One stereo chunk at 48 kHz: 240 frames become 80 analysis samples.
/// let chunk = vec![0.5_f32; 480];
/// let mono = convert_chunk(&chunk, 2, 48_000, 16_000);
/// assert_eq!(mono.len(), 80);
/// assert!((mono[0] - 0.5).abs() < 1e-6);
/// ```
pub fn convert_chunk(
    samples: &[f32],
    channels: u16,
    native_rate: u32,
    analysis_rate: u32,
) -> Vec<f32> {
    if channels == 0 || native_rate == 0 || analysis_rate == 0 {
        return Vec::new();
    }

    let channels = channels as usize;
    let frames = samples.len() / channels;
    if frames == 0 {
        return Vec::new();
    }

    let mono_at = |frame: usize| -> f32 {
        let start = frame * channels;
        samples[start..start + channels].iter().sum::<f32>() / channels as f32
    };

    // Same rate: downmix only.
    if native_rate == analysis_rate {
        return (0..frames).map(|f| mono_at(f)).collect();
    }

    // Walk the input at `step` frames per output sample, interpolating
    // between the two frames either side of the read position.
    let step = native_rate as f64 / analysis_rate as f64;
    let out_len = (frames as f64 / step).ceil() as usize;
    let mut out = Vec::with_capacity(out_len);
    let mut pos = 0.0_f64;

    for _ in 0..out_len {
        let idx = pos as usize;
        let value = if idx + 1 < frames {
            let frac = (pos - idx as f64) as f32;
            mono_at(idx) * (1.0 - frac) + mono_at(idx + 1) * frac
        } else {
            // Past the last frame pair: hold the final frame.
            mono_at(frames - 1)
        };
        out.push(value);
        pos += step;
    }

    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mono_at_equal_rates_is_a_passthrough() {
        let input = vec![0.1_f32, 0.2, 0.3];
        assert_eq!(convert_chunk(&input, 1, 16_000, 16_000), input);
    }

    #[test]
    fn stereo_at_equal_rates_averages_each_frame() {
        let input = vec![1.0_f32, -1.0, 0.5, 0.5];
        let out = convert_chunk(&input, 2, 16_000, 16_000);
        assert_eq!(out.len(), 2);
        assert!((out[0] - 0.0).abs() < 1e-6);
        assert!((out[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn mono_downsample_48k_length() {
        // 480 frames at 48 kHz cover 10 ms: 160 samples at 16 kHz.
        let input = vec![0.5_f32; 480];
        assert_eq!(convert_chunk(&input, 1, 48_000, 16_000).len(), 160);
    }

    #[test]
    fn stereo_downsample_48k_length() {
        // 480 interleaved stereo samples are 240 frames: 80 at 16 kHz.
        let input = vec![0.5_f32; 480];
        assert_eq!(convert_chunk(&input, 2, 48_000, 16_000).len(), 80);
    }

    #[test]
    fn downsample_44100_is_near_the_rate_ratio() {
        let input = vec![0.0_f32; 44_100];
        let out = convert_chunk(&input, 1, 44_100, 16_000);
        assert!(out.len().abs_diff(16_000) <= 1, "got {}", out.len());
    }

    #[test]
    fn upsample_interpolates_between_frames() {
        // 8 kHz → 16 kHz doubles the samples; the inserted sample sits
        // halfway between its neighbours and the tail holds the last frame.
        let out = convert_chunk(&[0.0, 1.0], 1, 8_000, 16_000);
        assert_eq!(out.len(), 4);
        assert!((out[0] - 0.0).abs() < 1e-6);
        assert!((out[1] - 0.5).abs() < 1e-6);
        assert!((out[2] - 1.0).abs() < 1e-6);
        assert!((out[3] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn dc_signal_keeps_its_amplitude_through_conversion() {
        let input = vec![0.5_f32; 960]; // stereo, 480 frames
        for &s in &convert_chunk(&input, 2, 48_000, 16_000) {
            assert!((s - 0.5).abs() < 1e-5, "amplitude drift: {s}");
        }
    }

    #[test]
    fn degenerate_inputs_yield_empty_output() {
        assert!(convert_chunk(&[], 2, 48_000, 16_000).is_empty());
        assert!(convert_chunk(&[0.5], 2, 48_000, 16_000).is_empty()); // half a frame
        assert!(convert_chunk(&[0.5, 0.5], 0, 48_000, 16_000).is_empty());
        assert!(convert_chunk(&[0.5, 0.5], 2, 0, 16_000).is_empty());
        assert!(convert_chunk(&[0.5, 0.5], 2, 48_000, 0).is_empty());
    }

    #[test]
    fn trailing_partial_frame_is_ignored() {
        // Five interleaved samples at two channels: two frames plus a
        // dangling value that never forms a frame.
        let out = convert_chunk(&[0.2, 0.4, 0.6, 0.8, 0.9], 2, 16_000, 16_000);
        assert_eq!(out.len(), 2);
        assert!((out[0] - 0.3).abs() < 1e-6);
        assert!((out[1] - 0.7).abs() < 1e-6);
    }
}
