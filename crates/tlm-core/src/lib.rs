//! # Telemetry FEC Core
//!
//! Streaming forward error correction for a telemetry link: a rate-1/2
//! convolutional encoder, a hard-decision Viterbi decoder and a bit error
//! tracker, each advanced one symbol tick at a time.
//!
//! ## Overview
//!
//! - **Trellis**: next-state, output and predecessor tables built once from
//!   K and the generator polynomials
//! - **Encoder**: one input bit in, one 2-bit symbol out per tick
//! - **Decoder**: add-compare-select over every state with saturating path
//!   metrics and register-exchange survivors; one decided bit per tick once
//!   `tb_len` symbols have been accepted
//! - **Tracker**: delays the reference stream by `tb_len` ticks and counts
//!   mismatches until `total_bits` bits have been compared
//!
//! ## Signal Flow
//!
//! ```text
//! TX: bits → ConvolutionalEncoder → Symbol ─┐
//!                                           ▼ (channel)
//! RX: Symbol → ViterbiDecoder → bit → ErrorTracker ◄── reference bits (DelayLine)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use tlm_core::prelude::*;
//!
//! let params = CodeParams::builder().tb_len(15).build().unwrap();
//! let mut encoder = ConvolutionalEncoder::new(&params).unwrap();
//! let mut decoder = ViterbiDecoder::new(&params).unwrap();
//!
//! let payload = [true, false, true, true, false, false, true, false];
//! let mut input = payload.to_vec();
//! input.extend(std::iter::repeat(false).take(params.tb_len));
//!
//! let decoded = decoder.decode(&encoder.encode(&input));
//! assert_eq!(&decoded[..payload.len()], &payload);
//! ```

pub mod config;
pub mod convolutional_encoder;
pub mod delay;
pub mod error_tracker;
pub mod observe;
pub mod params;
pub mod trellis;
pub mod types;
pub mod viterbi_decoder;

// Re-export main types
pub use config::{ConfigError, SweepSettings, TlmConfig};
pub use convolutional_encoder::{ConvolutionalEncoder, EncoderOutput};
pub use delay::DelayLine;
pub use error_tracker::{ErrorTracker, TrackerInput, TrackerStatus};
pub use params::{CodeParams, CodeParamsBuilder};
pub use trellis::{Edge, Trellis};
pub use types::{FecError, FecResult, Symbol};
pub use viterbi_decoder::{DecoderOutput, ViterbiDecoder};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::convolutional_encoder::{ConvolutionalEncoder, EncoderOutput};
    pub use crate::error_tracker::{ErrorTracker, TrackerInput, TrackerStatus};
    pub use crate::params::CodeParams;
    pub use crate::types::{FecError, FecResult, Symbol};
    pub use crate::viterbi_decoder::{DecoderOutput, ViterbiDecoder};
}
