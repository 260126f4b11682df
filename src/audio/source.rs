//! Sample acquisition behind the [`SampleSource`] trait.
//!
//! One acquisition yields a [`SampleWindow`]: an ordered, fixed-length run
//! of mono samples at the analysis rate, captured over a fixed duration.
//! The detection loop never sees a short window; acquisition either
//! delivers the exact configured length or fails with a [`SourceError`]
//! the loop treats as a recoverable hardware fault.
//!
//! [`MicSource`] is the production implementation. Its cpal callback plays
//! the role the DMA engine played on the original hardware: samples stream
//! into the [`WindowAccumulator`] without the control loop being involved
//! per sample, and `acquire_window` only blocks until the window is
//! complete.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

use super::convert::convert_chunk;

// ---------------------------------------------------------------------------
// SampleWindow
// ---------------------------------------------------------------------------

/// One fixed-duration batch of captured audio, processed as a unit.
///
/// Created fresh each detection cycle and consumed entirely by the filter
/// stage; nothing is retained across cycles.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl SampleWindow {
    /// Wrap captured samples with the rate they were captured at.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Number of samples in the window.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` when the window holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample rate of the window in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Duration covered by the window.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }

    /// Consume the window, handing the sample buffer to the filter stage.
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}

// ---------------------------------------------------------------------------
// SourceError
// ---------------------------------------------------------------------------

/// Hardware faults raised by sample acquisition.
///
/// Every variant is recoverable at the loop level: the orchestrator skips
/// the cycle, reports the fault to the status sink and retries.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("input device delivers {0:?} samples, expected f32")]
    UnsupportedFormat(cpal::SampleFormat),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start input stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("acquisition timed out after {waited_ms} ms")]
    Timeout { waited_ms: u64 },
}

// ---------------------------------------------------------------------------
// SampleSource trait
// ---------------------------------------------------------------------------

/// Blocking acquisition of one sample window per call.
///
/// # Contract
///
/// - Blocks until exactly the configured number of samples is available.
/// - The returned window length never varies between calls.
/// - On hardware failure returns a [`SourceError`] instead of a short
///   window; callers must not filter a partial window.
pub trait SampleSource {
    /// Capture the next window.
    fn acquire_window(&mut self) -> Result<SampleWindow, SourceError>;

    /// Analysis sample rate of the windows this source produces, in Hz.
    fn sample_rate(&self) -> u32;
}

// ---------------------------------------------------------------------------
// WindowAccumulator
// ---------------------------------------------------------------------------

/// Collects converted capture samples until one full window is available.
///
/// This deliberately does not wrap around: once `target` samples have
/// arrived, later chunks are dropped until the window is taken. A window
/// is therefore always the first `target` contiguous samples captured
/// after the last [`reset`](Self::reset), which is exactly the
/// fresh-capture contract of [`SampleSource::acquire_window`]. Anything
/// the microphone picks up between windows never leaks into the next one.
pub struct WindowAccumulator {
    samples: Vec<f32>,
    target: usize,
}

impl WindowAccumulator {
    /// Create an accumulator for windows of `target` samples.
    ///
    /// # Panics
    ///
    /// Panics if `target == 0`.
    pub fn new(target: usize) -> Self {
        assert!(target > 0, "window length must be > 0");
        Self {
            samples: Vec::with_capacity(target),
            target,
        }
    }

    /// Append a capture chunk, ignoring anything beyond the window length.
    pub fn extend(&mut self, chunk: &[f32]) {
        let room = self.target - self.samples.len();
        let take = chunk.len().min(room);
        self.samples.extend_from_slice(&chunk[..take]);
    }

    /// Number of samples collected so far.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` when nothing has been collected yet.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns `true` once a full window is available.
    pub fn is_full(&self) -> bool {
        self.samples.len() == self.target
    }

    /// Discard any partial capture so the next window starts fresh.
    pub fn reset(&mut self) {
        self.samples.clear();
    }

    /// Hand over the window once it is complete.
    ///
    /// Returns `None` while samples are still missing. On success the
    /// returned buffer is exactly `target` samples long and the
    /// accumulator is empty, ready for the next cycle. The window buffer
    /// is given away rather than copied; it is cycle-scoped and freed by
    /// the detection loop.
    pub fn take_window(&mut self) -> Option<Vec<f32>> {
        if !self.is_full() {
            return None;
        }
        Some(std::mem::replace(
            &mut self.samples,
            Vec::with_capacity(self.target),
        ))
    }
}

// ---------------------------------------------------------------------------
// MicSource
// ---------------------------------------------------------------------------

/// Microphone-backed [`SampleSource`] over a cpal input stream.
///
/// The stream runs continuously from [`MicSource::open`] on. The callback
/// converts each chunk to mono at the analysis rate and feeds the shared
/// [`WindowAccumulator`]; `acquire_window` resets the accumulator and
/// blocks until the window completes, so every window is a fresh capture
/// starting at the moment it was requested.
///
/// # Example
///
/// ```rust,no_run
/// use acalanto::audio::{MicSource, SampleSource};
///
/// // 16 kHz analysis rate, 2-second windows
/// let mut source = MicSource::open(16_000, 32_000).unwrap();
/// let window = source.acquire_window().unwrap();
/// assert_eq!(window.len(), 32_000);
/// ```
pub struct MicSource {
    /// RAII guard: dropping the stream stops capture.
    _stream: cpal::Stream,
    shared: Arc<Mutex<WindowAccumulator>>,
    analysis_rate: u32,
    window_samples: usize,
}

/// Interval at which `acquire_window` re-checks the accumulator.
const FILL_POLL: Duration = Duration::from_millis(10);

impl MicSource {
    /// Open the default input device and start streaming into the
    /// accumulator.
    ///
    /// # Errors
    ///
    /// [`SourceError::NoDevice`] when no input device exists,
    /// [`SourceError::UnsupportedFormat`] when the device does not deliver
    /// `f32` samples, or a stream construction error from cpal.
    pub fn open(analysis_rate: u32, window_samples: usize) -> Result<Self, SourceError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(SourceError::NoDevice)?;

        let supported = device.default_input_config()?;
        if supported.sample_format() != cpal::SampleFormat::F32 {
            return Err(SourceError::UnsupportedFormat(supported.sample_format()));
        }

        let channels = supported.channels();
        let native_rate = supported.sample_rate().0;
        let config: cpal::StreamConfig = supported.into();

        let shared = Arc::new(Mutex::new(WindowAccumulator::new(window_samples)));
        let sink = Arc::clone(&shared);

        let stream = device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let converted = convert_chunk(data, channels, native_rate, analysis_rate);
                // A poisoned lock means a consumer panicked; drop the chunk
                // rather than poisoning the audio thread too.
                if let Ok(mut window) = sink.lock() {
                    window.extend(&converted);
                }
            },
            |err: cpal::StreamError| {
                log::error!("capture stream error: {err}");
            },
            None,
        )?;

        stream.play()?;
        log::info!(
            "capture stream started ({native_rate} Hz native, {channels} ch, \
             {analysis_rate} Hz analysis)"
        );

        Ok(Self {
            _stream: stream,
            shared,
            analysis_rate,
            window_samples,
        })
    }
}

impl SampleSource for MicSource {
    fn acquire_window(&mut self) -> Result<SampleWindow, SourceError> {
        self.shared.lock().unwrap().reset();

        let expected = Duration::from_secs_f64(
            self.window_samples as f64 / self.analysis_rate.max(1) as f64,
        );
        // Three window-durations plus a second of slack covers device
        // startup hiccups without hiding a dead stream.
        let deadline = Instant::now() + expected * 3 + Duration::from_secs(1);
        let started = Instant::now();

        loop {
            if let Some(samples) = self.shared.lock().unwrap().take_window() {
                return Ok(SampleWindow::new(samples, self.analysis_rate));
            }

            if Instant::now() >= deadline {
                return Err(SourceError::Timeout {
                    waited_ms: started.elapsed().as_millis() as u64,
                });
            }

            std::thread::sleep(FILL_POLL);
        }
    }

    fn sample_rate(&self) -> u32 {
        self.analysis_rate
    }
}

// ---------------------------------------------------------------------------
// ScriptedSource  (test-only)
// ---------------------------------------------------------------------------

/// A test double that replays a scripted sequence of windows and faults
/// without touching any audio device.
#[cfg(test)]
pub struct ScriptedSource {
    sample_rate: u32,
    script: std::collections::VecDeque<Result<Vec<f32>, SourceError>>,
}

#[cfg(test)]
impl ScriptedSource {
    /// Create a source that yields nothing until windows are pushed.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            script: std::collections::VecDeque::new(),
        }
    }

    /// Queue a window to be returned by the next acquisition.
    pub fn push_window(&mut self, samples: Vec<f32>) -> &mut Self {
        self.script.push_back(Ok(samples));
        self
    }

    /// Queue a hardware fault.
    pub fn push_fault(&mut self) -> &mut Self {
        self.script.push_back(Err(SourceError::NoDevice));
        self
    }
}

#[cfg(test)]
impl SampleSource for ScriptedSource {
    fn acquire_window(&mut self) -> Result<SampleWindow, SourceError> {
        match self.script.pop_front() {
            Some(Ok(samples)) => Ok(SampleWindow::new(samples, self.sample_rate)),
            Some(Err(e)) => Err(e),
            // Script exhausted: behave like a stalled device.
            None => Err(SourceError::Timeout { waited_ms: 0 }),
        }
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- SampleWindow -------------------------------------------------------

    #[test]
    fn sample_window_reports_len_and_duration() {
        let window = SampleWindow::new(vec![0.0; 32_000], 16_000);
        assert_eq!(window.len(), 32_000);
        assert_eq!(window.sample_rate(), 16_000);
        assert!((window.duration().as_secs_f64() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn sample_window_zero_rate_has_zero_duration() {
        let window = SampleWindow::new(vec![0.0; 100], 0);
        assert_eq!(window.duration(), Duration::ZERO);
    }

    #[test]
    fn into_samples_hands_over_the_buffer() {
        let window = SampleWindow::new(vec![0.25, -0.25], 16_000);
        assert_eq!(window.into_samples(), vec![0.25, -0.25]);
    }

    // ---- WindowAccumulator --------------------------------------------------

    #[test]
    fn accumulator_fills_to_target_and_reports_full() {
        let mut acc = WindowAccumulator::new(4);
        assert!(acc.is_empty());

        acc.extend(&[1.0, 2.0]);
        assert_eq!(acc.len(), 2);
        assert!(!acc.is_full());

        acc.extend(&[3.0, 4.0]);
        assert!(acc.is_full());
    }

    #[test]
    fn take_window_returns_none_until_full() {
        let mut acc = WindowAccumulator::new(3);
        acc.extend(&[1.0, 2.0]);
        assert!(acc.take_window().is_none());
        // A refused take must not disturb the partial capture.
        assert_eq!(acc.len(), 2);
    }

    #[test]
    fn excess_samples_are_dropped_once_full() {
        // The chunk that completes the window may carry extra samples;
        // everything past the window boundary is discarded, never wrapped.
        let mut acc = WindowAccumulator::new(4);
        acc.extend(&[1.0, 2.0, 3.0]);
        acc.extend(&[4.0, 5.0, 6.0]);

        assert_eq!(acc.len(), 4);
        assert_eq!(acc.take_window().unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn chunks_after_the_window_completes_are_ignored() {
        let mut acc = WindowAccumulator::new(2);
        acc.extend(&[1.0, 2.0]);
        acc.extend(&[9.0, 9.0]); // arrives while the loop is busy classifying

        assert_eq!(acc.take_window().unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn take_window_leaves_the_accumulator_ready_for_the_next_cycle() {
        let mut acc = WindowAccumulator::new(2);
        acc.extend(&[1.0, 2.0]);
        assert_eq!(acc.take_window().unwrap(), vec![1.0, 2.0]);

        assert!(acc.is_empty());
        acc.extend(&[3.0, 4.0]);
        assert_eq!(acc.take_window().unwrap(), vec![3.0, 4.0]);
    }

    #[test]
    fn reset_discards_a_partial_capture() {
        let mut acc = WindowAccumulator::new(4);
        acc.extend(&[1.0, 2.0, 3.0]);
        acc.reset();

        assert!(acc.is_empty());
        acc.extend(&[5.0, 6.0, 7.0, 8.0]);
        assert_eq!(acc.take_window().unwrap(), vec![5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    #[should_panic(expected = "window length must be > 0")]
    fn zero_window_length_panics() {
        let _acc = WindowAccumulator::new(0);
    }

    // ---- ScriptedSource -----------------------------------------------------

    #[test]
    fn scripted_source_replays_in_order() {
        let mut source = ScriptedSource::new(16_000);
        source.push_window(vec![0.1; 4]).push_fault().push_window(vec![0.2; 4]);

        assert_eq!(source.acquire_window().unwrap().into_samples(), vec![0.1; 4]);
        assert!(matches!(
            source.acquire_window(),
            Err(SourceError::NoDevice)
        ));
        assert_eq!(source.acquire_window().unwrap().into_samples(), vec![0.2; 4]);
    }

    #[test]
    fn scripted_source_times_out_when_exhausted() {
        let mut source = ScriptedSource::new(16_000);
        assert!(matches!(
            source.acquire_window(),
            Err(SourceError::Timeout { .. })
        ));
    }

    // ---- SourceError --------------------------------------------------------

    #[test]
    fn source_error_display_mentions_timeout_duration() {
        let e = SourceError::Timeout { waited_ms: 7000 };
        assert!(e.to_string().contains("7000"));
    }

    /// The trait must stay object-safe; the orchestrator holds a
    /// `Box<dyn SampleSource>`.
    #[test]
    fn box_dyn_sample_source_compiles() {
        let mut source: Box<dyn SampleSource> = Box::new(ScriptedSource::new(8_000));
        assert_eq!(source.sample_rate(), 8_000);
        let _ = source.acquire_window();
    }
}
