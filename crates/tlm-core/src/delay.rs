//! Reference Bit Delay Line
//!
//! Fixed-length window over the reference bit stream used to realign the
//! original payload with the decoder's `tb_len`-tick output latency. The
//! window starts zero-filled; [`DelayLine::is_primed`] reports whether it has
//! been advanced at least `len` times, i.e. whether [`DelayLine::oldest`]
//! holds a real reference bit rather than reset fill.
//!
//! ## Example
//!
//! ```rust
//! use tlm_core::delay::DelayLine;
//!
//! let mut line = DelayLine::new(3);
//! line.advance(true);
//! line.advance(false);
//! assert!(!line.is_primed());
//! line.advance(false);
//! assert!(line.is_primed());
//! assert!(line.oldest()); // the first bit pushed, three advances ago
//! ```

use std::collections::VecDeque;

/// Shift register of `len` bits with an explicit fill counter.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: VecDeque<bool>,
    len: usize,
    advances: u64,
}

impl DelayLine {
    /// Create a zero-filled delay line of `len` bits (`len >= 1`).
    pub fn new(len: usize) -> Self {
        let len = len.max(1);
        Self {
            buffer: std::iter::repeat(false).take(len).collect(),
            len,
            advances: 0,
        }
    }

    /// Shift `bit` in as the newest entry and drop the oldest.
    pub fn advance(&mut self, bit: bool) {
        self.buffer.pop_front();
        self.buffer.push_back(bit);
        self.advances = self.advances.saturating_add(1);
    }

    /// The entry pushed `len` advances ago (`len - 1` before the newest).
    pub fn oldest(&self) -> bool {
        self.buffer.front().copied().unwrap_or(false)
    }

    /// The entry pushed by the latest advance.
    pub fn newest(&self) -> bool {
        self.buffer.back().copied().unwrap_or(false)
    }

    /// True once every slot holds a pushed bit rather than reset fill.
    pub fn is_primed(&self) -> bool {
        self.advances >= self.len as u64
    }

    /// Advances since the last reset.
    pub fn advances(&self) -> u64 {
        self.advances
    }

    /// Number of slots, i.e. the lag between a push and its exit.
    pub fn depth(&self) -> usize {
        self.len
    }

    /// True once any bit has been pushed since the last reset.
    pub fn has_advanced(&self) -> bool {
        self.advances > 0
    }

    /// Refill with zeros and restart the fill counter.
    pub fn reset(&mut self) {
        self.buffer.iter_mut().for_each(|b| *b = false);
        self.advances = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_zero_filled() {
        let line = DelayLine::new(4);
        assert_eq!(line.depth(), 4);
        assert!(!line.oldest());
        assert!(!line.is_primed());
        assert!(!line.has_advanced());
    }

    #[test]
    fn test_oldest_lags_by_len() {
        let mut line = DelayLine::new(3);
        let input = [true, false, true, true, false, false, true];
        for (k, &bit) in input.iter().enumerate() {
            line.advance(bit);
            assert_eq!(line.newest(), bit);
            if k + 1 >= 3 {
                assert_eq!(line.oldest(), input[k + 1 - 3]);
            } else {
                assert!(!line.oldest());
            }
        }
    }

    #[test]
    fn test_primed_after_len_advances() {
        let mut line = DelayLine::new(12);
        for k in 1..=12 {
            line.advance(false);
            assert_eq!(line.is_primed(), k == 12, "advance {}", k);
        }
        line.advance(true);
        assert!(line.is_primed());
        assert_eq!(line.advances(), 13);
    }

    #[test]
    fn test_reset() {
        let mut line = DelayLine::new(2);
        line.advance(true);
        line.advance(true);
        assert!(line.oldest());
        line.reset();
        assert!(!line.oldest());
        assert!(!line.is_primed());
        assert_eq!(line.advances(), 0);
        assert_eq!(line.depth(), 2);
        assert!(!line.has_advanced());
    }

    #[test]
    fn test_len_one() {
        let mut line = DelayLine::new(1);
        line.advance(true);
        assert!(line.has_advanced());
        assert!(line.is_primed());
        assert!(line.oldest());
        line.advance(false);
        assert!(!line.oldest());
    }
}
