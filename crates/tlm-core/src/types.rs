//! Core types for the telemetry FEC chain
//!
//! The chain moves exactly one value per symbol tick between stages:
//!
//! ```text
//!   bit ──► Encoder ──► Symbol ──► (channel) ──► Decoder ──► bit ──► Tracker
//!    │                                                                 ▲
//!    └──────────────── reference bit (delayed by TB_LEN) ──────────────┘
//! ```
//!
//! A [`Symbol`] is the 2-bit hard decision the channel delivers for one
//! encoded input bit. Bit `y0` is the G0 parity and `y1` the G1 parity. On
//! the decoder's input pins the pair is packed as `{v1, v0}` with the G0
//! parity in the high bit, which is what [`Symbol::bits`] returns.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for FEC operations
pub type FecResult<T> = Result<T, FecError>;

/// Errors raised when constructing chain components.
///
/// Per-tick processing never fails; every variant here is a construction-time
/// rejection.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FecError {
    #[error("Invalid constraint length: {0}. Must be between 2 and {max}", max = crate::params::MAX_CONSTRAINT_LENGTH)]
    InvalidConstraintLength(usize),

    #[error("Invalid generator polynomial {poly:#o} for K={constraint_length}: must be nonzero and fit in K bits")]
    InvalidGenerator { poly: u32, constraint_length: usize },

    #[error("Invalid traceback length: {0}. Must be between 1 and {max}", max = crate::params::MAX_TB_LEN)]
    InvalidTracebackLength(usize),

    #[error("Invalid payload length: {0}. Must be between 1 and {max}", max = crate::params::MAX_TOTAL_BITS)]
    InvalidPayloadLength(u64),

    #[error("Invalid metric ceiling: {0}. Must be at least 2")]
    InvalidMetricCeiling(u32),

    #[error("Invalid symbol value: {0:#04b}. Symbols are 2 bits wide")]
    InvalidSymbol(u8),

    #[error("Invalid flip probability: {0}. Must be within [0, 1]")]
    InvalidProbability(f64),

    #[error("Sweep point {point} out of range: the sweep has {points} points")]
    InvalidSweepPoint { point: usize, points: usize },
}

/// One 2-bit hard-decision channel symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    /// Parity under generator G0.
    pub y0: bool,
    /// Parity under generator G1.
    pub y1: bool,
}

impl Symbol {
    pub const ZERO: Symbol = Symbol { y0: false, y1: false };

    pub fn new(y0: bool, y1: bool) -> Self {
        Self { y0, y1 }
    }

    /// Unpack a `{v1, v0}` pin value (G0 parity in bit 1).
    pub fn from_bits(bits: u8) -> FecResult<Self> {
        if bits > 0b11 {
            return Err(FecError::InvalidSymbol(bits));
        }
        Ok(Self {
            y0: bits & 0b10 != 0,
            y1: bits & 0b01 != 0,
        })
    }

    /// Pack into the `{v1, v0}` pin layout.
    pub fn bits(&self) -> u8 {
        ((self.y0 as u8) << 1) | self.y1 as u8
    }

    /// Hamming distance to another symbol (0, 1 or 2).
    pub fn distance(&self, other: Symbol) -> u32 {
        (self.bits() ^ other.bits()).count_ones()
    }

    /// Flip the bits selected by a 2-bit mask in the `{v1, v0}` layout.
    pub fn flipped(&self, mask: u8) -> Self {
        Self {
            y0: self.y0 ^ (mask & 0b10 != 0),
            y1: self.y1 ^ (mask & 0b01 != 0),
        }
    }

    /// Exchange the two pins.
    pub fn swapped(&self) -> Self {
        Self {
            y0: self.y1,
            y1: self.y0,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.y0 as u8, self.y1 as u8)
    }
}
