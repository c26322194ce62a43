//! Error Tracker: latency-aligned bit error counting
//!
//! Compares decoded bits against the original payload. The payload reaches the
//! tracker directly from the transmit side, so it is held in a
//! [`DelayLine`] of length `tb_len` that is advanced once per decoder-input
//! symbol tick, whether or not the decoder produced a bit on that tick.
//!
//! A decoded bit is only compared once the delay line has been advanced at
//! least `tb_len` times. Earlier decoded bits would be compared against reset
//! fill, so they are counted as unaligned and logged instead.
//!
//! Counting stops for good when `compared` reaches `total_bits`; the flag
//! stays set until [`ErrorTracker::reset`].
//!
//! ## Example
//!
//! ```rust
//! use tlm_core::error_tracker::{ErrorTracker, TrackerInput};
//! use tlm_core::params::CodeParams;
//!
//! let params = CodeParams::builder().tb_len(2).total_bits(1).build().unwrap();
//! let mut tracker = ErrorTracker::new(&params).unwrap();
//!
//! tracker.tick(TrackerInput::reference(true));
//! let status = tracker.tick(TrackerInput::reference(false).with_decoded(true));
//! assert!(status.complete);
//! assert_eq!(status.compared, 1);
//! assert_eq!(status.errors, 0);
//! ```

use crate::delay::DelayLine;
use crate::params::CodeParams;
use crate::types::FecResult;

/// Inputs sampled by the tracker on one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerInput {
    /// Reference bit; `None` pushes zero fill.
    pub reference: Option<bool>,
    /// Advance the delay line (one decoder-input symbol tick).
    pub advance: bool,
    /// Decoder output for this tick, if valid.
    pub decoded: Option<bool>,
}

impl TrackerInput {
    /// A symbol tick carrying a valid reference bit.
    pub fn reference(bit: bool) -> Self {
        Self {
            reference: Some(bit),
            advance: true,
            decoded: None,
        }
    }

    /// A symbol tick past the end of the payload.
    pub fn fill() -> Self {
        Self {
            reference: None,
            advance: true,
            decoded: None,
        }
    }

    pub fn with_decoded(mut self, bit: bool) -> Self {
        self.decoded = Some(bit);
        self
    }
}

/// Tracker outputs after a tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerStatus {
    pub complete: bool,
    pub compared: u64,
    pub errors: u64,
}

/// Bit error tracker with a reference delay line.
#[derive(Debug, Clone)]
pub struct ErrorTracker {
    delay: DelayLine,
    total_bits: u64,
    compared: u64,
    errors: u64,
    unaligned: u64,
    complete: bool,
}

impl ErrorTracker {
    /// Create a tracker for `params.tb_len` latency and `params.total_bits` target.
    pub fn new(params: &CodeParams) -> FecResult<Self> {
        params.validate()?;
        Ok(Self {
            delay: DelayLine::new(params.tb_len),
            total_bits: params.total_bits,
            compared: 0,
            errors: 0,
            unaligned: 0,
            complete: false,
        })
    }

    /// Advance one tick.
    ///
    /// The delay line shifts before the comparison, so a decoded bit on the
    /// `k`-th symbol tick is checked against the reference bit pushed
    /// `tb_len` ticks earlier.
    pub fn tick(&mut self, input: TrackerInput) -> TrackerStatus {
        if input.advance {
            self.delay.advance(input.reference.unwrap_or(false));
        }

        if let Some(bit) = input.decoded {
            if !self.complete {
                if self.delay.is_primed() {
                    self.compare(bit);
                } else {
                    self.unaligned += 1;
                    tracing::warn!(
                        advances = self.delay.advances(),
                        tb_len = self.delay.depth(),
                        "decoded bit arrived before the reference delay line filled; not compared"
                    );
                }
            }
        }

        self.status()
    }

    fn compare(&mut self, decoded: bool) {
        let expected = self.delay.oldest();
        self.compared += 1;
        if decoded != expected {
            self.errors += 1;
            tracing::trace!(index = self.compared - 1, expected, decoded, "bit error");
        }
        if self.compared >= self.total_bits {
            self.complete = true;
            tracing::info!(
                compared = self.compared,
                errors = self.errors,
                unaligned = self.unaligned,
                ber = self.ber(),
                "error tracking complete"
            );
        }
    }

    /// Current outputs.
    pub fn status(&self) -> TrackerStatus {
        TrackerStatus {
            complete: self.complete,
            compared: self.compared,
            errors: self.errors,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn compared(&self) -> u64 {
        self.compared
    }

    pub fn errors(&self) -> u64 {
        self.errors
    }

    /// Decoded bits dropped because the delay line was not yet full.
    pub fn unaligned(&self) -> u64 {
        self.unaligned
    }

    pub fn total_bits(&self) -> u64 {
        self.total_bits
    }

    /// Read-only view of the reference delay line.
    pub fn delay_line(&self) -> &DelayLine {
        &self.delay
    }

    /// Errors over compared bits; zero before anything was compared.
    pub fn ber(&self) -> f64 {
        if self.compared == 0 {
            return 0.0;
        }
        self.errors as f64 / self.compared as f64
    }

    /// Normal-approximation confidence interval on the BER.
    pub fn confidence_interval(&self, confidence: f64) -> (f64, f64) {
        if self.compared == 0 {
            return (0.0, 1.0);
        }
        let p = self.ber();
        let n = self.compared as f64;
        let margin = z_score(confidence) * (p * (1.0 - p) / n).sqrt();
        ((p - margin).max(0.0), (p + margin).min(1.0))
    }

    pub fn summary(&self) -> String {
        let (lo, hi) = self.confidence_interval(0.95);
        format!(
            "BER: {:.6} ({} errors / {} bits) [{:.6}, {:.6}] 95% CI{}",
            self.ber(),
            self.errors,
            self.compared,
            lo,
            hi,
            if self.complete { " [COMPLETE]" } else { "" },
        )
    }

    /// Clear counters, the completion flag and the delay line.
    pub fn reset(&mut self) {
        self.delay.reset();
        self.compared = 0;
        self.errors = 0;
        self.unaligned = 0;
        self.complete = false;
    }
}

/// Normal distribution z-score approximation.
fn z_score(confidence: f64) -> f64 {
    match () {
        _ if (confidence - 0.90).abs() < 0.001 => 1.645,
        _ if (confidence - 0.95).abs() < 0.001 => 1.960,
        _ if (confidence - 0.99).abs() < 0.001 => 2.576,
        _ => {
            // Rational approximation for the probit function
            let p = (1.0 - confidence) / 2.0;
            let t = (-2.0 * p.ln()).sqrt();
            t - (2.515517 + 0.802853 * t + 0.010328 * t * t)
                / (1.0 + 1.432788 * t + 0.189269 * t * t + 0.001308 * t * t * t)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convolutional_encoder::ConvolutionalEncoder;
    use crate::viterbi_decoder::ViterbiDecoder;

    fn params(tb_len: usize, total_bits: u64) -> CodeParams {
        CodeParams::builder()
            .tb_len(tb_len)
            .total_bits(total_bits)
            .build()
            .unwrap()
    }

    /// Encode, decode and track `payload` followed by a `tb_len` zero tail.
    /// `corrupt` flips the decoded bit with that 0-based output index.
    fn run_chain(payload: &[bool], p: &CodeParams, corrupt: Option<usize>) -> ErrorTracker {
        let mut enc = ConvolutionalEncoder::new(p).unwrap();
        let mut dec = ViterbiDecoder::new(p).unwrap();
        let mut tracker = ErrorTracker::new(p).unwrap();
        let mut outputs = 0;

        let tail = std::iter::repeat(None).take(p.tb_len);
        for reference in payload.iter().copied().map(Some).chain(tail) {
            let symbol = enc.tick(Some(reference.unwrap_or(false))).symbol;
            let decoded = dec.tick(Some(symbol)).bit().map(|bit| {
                let flip = corrupt == Some(outputs);
                outputs += 1;
                bit ^ flip
            });
            tracker.tick(TrackerInput {
                reference,
                advance: true,
                decoded,
            });
        }
        tracker
    }

    fn payload10() -> Vec<bool> {
        [1, 0, 1, 1, 0, 0, 1, 0, 1, 1].iter().map(|&b| b == 1).collect()
    }

    #[test]
    fn test_clean_payload_completes() {
        let p = params(12, 10);
        let tracker = run_chain(&payload10(), &p, None);
        assert_eq!(tracker.compared(), 10);
        assert_eq!(tracker.errors(), 0);
        assert!(tracker.is_complete());
        assert_eq!(tracker.unaligned(), 0);
        assert_eq!(tracker.ber(), 0.0);
    }

    #[test]
    fn test_forced_mismatch_counted_once() {
        let p = params(12, 10);
        let tracker = run_chain(&payload10(), &p, Some(4));
        assert_eq!(tracker.compared(), 10);
        assert_eq!(tracker.errors(), 1);
        assert!(tracker.is_complete());
    }

    #[test]
    fn test_mismatch_after_completion_ignored() {
        // The run produces 11 decoded bits; the 11th arrives after completion
        let p = params(12, 10);
        let tracker = run_chain(&payload10(), &p, Some(10));
        assert_eq!(tracker.compared(), 10);
        assert_eq!(tracker.errors(), 0);
    }

    #[test]
    fn test_completion_is_idempotent() {
        let p = params(1, 2);
        let mut tracker = ErrorTracker::new(&p).unwrap();
        tracker.tick(TrackerInput::reference(true).with_decoded(true));
        let done = tracker.tick(TrackerInput::reference(false).with_decoded(true));
        assert!(done.complete);
        assert_eq!(done.compared, 2);
        assert_eq!(done.errors, 1);

        for _ in 0..5 {
            let status = tracker.tick(TrackerInput::reference(true).with_decoded(false));
            assert_eq!(status, done);
        }
    }

    #[test]
    fn test_unaligned_bits_not_compared() {
        let p = params(3, 10);
        let mut tracker = ErrorTracker::new(&p).unwrap();
        tracker.tick(TrackerInput::reference(true).with_decoded(true));
        tracker.tick(TrackerInput::reference(true).with_decoded(false));
        assert_eq!(tracker.compared(), 0);
        assert_eq!(tracker.unaligned(), 2);
        assert!(!tracker.delay_line().is_primed());

        // Third advance fills the line; the oldest entry is the first reference bit
        let status = tracker.tick(TrackerInput::reference(false).with_decoded(true));
        assert!(tracker.delay_line().is_primed());
        assert_eq!(status.compared, 1);
        assert_eq!(status.errors, 0);
    }

    #[test]
    fn test_no_advance_holds_delay_line() {
        let p = params(2, 10);
        let mut tracker = ErrorTracker::new(&p).unwrap();
        tracker.tick(TrackerInput::reference(true));
        tracker.tick(TrackerInput {
            reference: Some(false),
            advance: false,
            decoded: None,
        });
        assert_eq!(tracker.delay_line().advances(), 1);
        tracker.tick(TrackerInput::fill());
        assert!(tracker.delay_line().is_primed());
        assert!(tracker.delay_line().oldest());
    }

    #[test]
    fn test_reset_restarts_alignment() {
        let p = params(12, 10);
        let mut tracker = run_chain(&payload10(), &p, Some(0));
        assert!(tracker.is_complete());
        tracker.reset();
        assert_eq!(tracker.status(), TrackerStatus::default());
        assert_eq!(tracker.unaligned(), 0);
        assert!(!tracker.delay_line().is_primed());
    }

    #[test]
    fn test_deterministic() {
        let p = params(12, 10);
        let a = run_chain(&payload10(), &p, Some(3));
        let b = run_chain(&payload10(), &p, Some(3));
        assert_eq!(a.status(), b.status());
    }

    #[test]
    fn test_confidence_interval() {
        let p = params(1, 100);
        let mut tracker = ErrorTracker::new(&p).unwrap();
        assert_eq!(tracker.confidence_interval(0.95), (0.0, 1.0));
        for i in 0..100 {
            tracker.tick(TrackerInput::reference(false).with_decoded(i % 10 == 0));
        }
        assert!((tracker.ber() - 0.1).abs() < 1e-12);
        let (lo, hi) = tracker.confidence_interval(0.95);
        assert!(lo < 0.1 && hi > 0.1);
        assert!(tracker.summary().contains("[COMPLETE]"));
    }
}
