//! Convolutional Encoder (streaming, one bit per tick)
//!
//! Rate-1/2 feedforward encoder with a registered output stage: the symbol
//! computed from the bit presented on a tick is held in the output register
//! after that tick's clock edge, and `valid` mirrors the input-valid flag of
//! the same edge.
//!
//! ## Example
//!
//! ```rust
//! use tlm_core::convolutional_encoder::ConvolutionalEncoder;
//! use tlm_core::params::CodeParams;
//!
//! let mut encoder = ConvolutionalEncoder::new(&CodeParams::default()).unwrap();
//! let out = encoder.tick(Some(true));
//! assert!(out.valid);
//! assert_eq!(out.symbol.bits(), 0b11);
//!
//! // An idle tick deasserts valid
//! assert!(!encoder.tick(None).valid);
//! ```

use crate::params::CodeParams;
use crate::trellis::Trellis;
use crate::types::{FecResult, Symbol};

/// Registered encoder outputs after a tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncoderOutput {
    /// Output-valid flag.
    pub valid: bool,
    /// Coded symbol `(y0, y1)`.
    pub symbol: Symbol,
}

/// Convolutional encoder driven by the shared trellis tables.
#[derive(Debug, Clone)]
pub struct ConvolutionalEncoder {
    trellis: Trellis,
    /// K-1 most recent input bits, newest in the LSB.
    state: usize,
    output: EncoderOutput,
}

impl ConvolutionalEncoder {
    /// Create an encoder in the reset state.
    pub fn new(params: &CodeParams) -> FecResult<Self> {
        Ok(Self::with_trellis(Trellis::new(params)?))
    }

    /// Create an encoder sharing prebuilt (already validated) trellis tables.
    pub fn with_trellis(trellis: Trellis) -> Self {
        Self {
            trellis,
            state: 0,
            output: EncoderOutput::default(),
        }
    }

    /// Advance one tick.
    ///
    /// `Some(bit)` consumes the bit, registers its symbol and sets valid.
    /// `None` leaves the state alone, keeps the last symbol on the pins and
    /// deasserts valid.
    pub fn tick(&mut self, input: Option<bool>) -> EncoderOutput {
        match input {
            Some(bit) => {
                let symbol = self.trellis.output(self.state, bit);
                self.state = self.trellis.next_state(self.state, bit);
                self.output = EncoderOutput { valid: true, symbol };
            }
            None => self.output.valid = false,
        }
        self.output
    }

    /// Encode a bit sequence tick by tick, without termination.
    pub fn encode(&mut self, input: &[bool]) -> Vec<Symbol> {
        input.iter().map(|&bit| self.tick(Some(bit)).symbol).collect()
    }

    /// Current registered outputs.
    pub fn output(&self) -> EncoderOutput {
        self.output
    }

    /// Current shift-register contents.
    pub fn state(&self) -> usize {
        self.state
    }

    pub fn trellis(&self) -> &Trellis {
        &self.trellis
    }

    /// Clear memory and outputs; valid is deasserted.
    pub fn reset(&mut self) {
        self.state = 0;
        self.output = EncoderOutput::default();
    }
}
