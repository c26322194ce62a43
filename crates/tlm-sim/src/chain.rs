//! Lockstep Chain Driver
//!
//! Runs encoder, channel, decoder and tracker one symbol tick at a time:
//!
//! ```text
//!   payload ++ [0; tb_len]
//!        │
//!        ├──► Encoder ──► SymbolMapping ──► Channel ──► Decoder ──► decoded bit ──┐
//!        │                                                                        ▼
//!        └──────────────────────── reference bit ──────────────────────────► Tracker
//! ```
//!
//! The zero tail flushes the last payload bits out of the decoder's
//! `tb_len`-tick latency. Tail ticks advance the tracker's delay line with
//! zero fill.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use tlm_core::prelude::*;
use tlm_core::trellis::Trellis;

use crate::channel::{Noiseless, SymbolChannel};

/// Payload length of the calibration trial.
pub const CALIBRATION_BITS: usize = 64;

/// How the encoder's `(y0, y1)` pins are wired onto the decoder's `{v1, v0}`
/// input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolMapping {
    /// `y0` drives `v1`, `y1` drives `v0`
    #[default]
    Direct,
    /// `y1` drives `v1`, `y0` drives `v0`
    Swapped,
}

impl SymbolMapping {
    pub fn apply(self, symbol: Symbol) -> Symbol {
        match self {
            SymbolMapping::Direct => symbol,
            SymbolMapping::Swapped => symbol.swapped(),
        }
    }

    /// Name used in the results log.
    pub fn as_str(self) -> &'static str {
        match self {
            SymbolMapping::Direct => "y0_is_v1",
            SymbolMapping::Swapped => "y1_is_v1",
        }
    }
}

impl fmt::Display for SymbolMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one payload pushed through the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialResult {
    pub compared: u64,
    pub errors: u64,
    pub complete: bool,
    /// Decoded bits that arrived before the reference was aligned
    pub unaligned: u64,
    /// Coded bits the channel flipped
    pub flips: u64,
    /// Every decoded bit, in output order
    pub decoded: Vec<bool>,
}

impl TrialResult {
    pub fn ber(&self) -> f64 {
        if self.compared == 0 {
            return 0.0;
        }
        self.errors as f64 / self.compared as f64
    }
}

/// Encoder, decoder and tracker driven in lockstep.
#[derive(Debug, Clone)]
pub struct Chain {
    params: CodeParams,
    mapping: SymbolMapping,
    encoder: ConvolutionalEncoder,
    decoder: ViterbiDecoder,
    tracker: ErrorTracker,
}

impl Chain {
    /// Build a chain for payloads of exactly `params.total_bits` bits.
    pub fn new(params: &CodeParams, mapping: SymbolMapping) -> FecResult<Self> {
        let trellis = Trellis::new(params)?;
        Ok(Self {
            params: params.clone(),
            mapping,
            encoder: ConvolutionalEncoder::with_trellis(trellis.clone()),
            decoder: ViterbiDecoder::with_trellis(trellis, params)?,
            tracker: ErrorTracker::new(params)?,
        })
    }

    pub fn params(&self) -> &CodeParams {
        &self.params
    }

    pub fn mapping(&self) -> SymbolMapping {
        self.mapping
    }

    pub fn tracker(&self) -> &ErrorTracker {
        &self.tracker
    }

    /// Reset encoder, decoder and tracker, in that order.
    pub fn reset(&mut self) {
        self.encoder.reset();
        self.decoder.reset();
        self.tracker.reset();
    }

    /// Reset, then push `payload` and a `tb_len` zero tail through `channel`.
    pub fn run<C: SymbolChannel>(&mut self, payload: &[bool], mut channel: C) -> FecResult<TrialResult> {
        if payload.len() as u64 != self.params.total_bits {
            return Err(FecError::InvalidPayloadLength(payload.len() as u64));
        }
        self.reset();

        let flips_before = channel.flips();
        let tail = std::iter::repeat(None).take(self.params.tb_len);
        let mut decoded = Vec::with_capacity(payload.len() + 1);

        for reference in payload.iter().copied().map(Some).chain(tail) {
            let coded = self.encoder.tick(Some(reference.unwrap_or(false))).symbol;
            let received = channel.transmit(self.mapping.apply(coded));
            let bit = self.decoder.tick(Some(received)).bit();
            if let Some(b) = bit {
                decoded.push(b);
            }
            self.tracker.tick(TrackerInput {
                reference,
                advance: true,
                decoded: bit,
            });
        }

        let status = self.tracker.status();
        let result = TrialResult {
            compared: status.compared,
            errors: status.errors,
            complete: status.complete,
            unaligned: self.tracker.unaligned(),
            flips: channel.flips() - flips_before,
            decoded,
        };
        tracing::debug!(
            compared = result.compared,
            errors = result.errors,
            flips = result.flips,
            mapping = %self.mapping,
            "trial done"
        );
        Ok(result)
    }
}

/// Random payload of `len` bits.
pub fn random_payload(rng: &mut StdRng, len: usize) -> Vec<bool> {
    (0..len).map(|_| rng.gen::<bool>()).collect()
}

/// Pick the pin mapping that decodes a noiseless random payload best.
///
/// Both mappings run the same 64-bit payload; ties go to
/// [`SymbolMapping::Direct`].
pub fn calibrate_mapping(params: &CodeParams, seed: u64) -> FecResult<SymbolMapping> {
    let params = CodeParams {
        total_bits: CALIBRATION_BITS as u64,
        ..params.clone()
    };
    let payload = random_payload(&mut StdRng::seed_from_u64(seed), CALIBRATION_BITS);

    let direct = Chain::new(&params, SymbolMapping::Direct)?.run(&payload, Noiseless)?;
    let swapped = Chain::new(&params, SymbolMapping::Swapped)?.run(&payload, Noiseless)?;

    let mapping = if swapped.errors < direct.errors {
        SymbolMapping::Swapped
    } else {
        SymbolMapping::Direct
    };
    tracing::info!(
        direct_errors = direct.errors,
        swapped_errors = swapped.errors,
        bits = CALIBRATION_BITS,
        selected = %mapping,
        "pin mapping calibrated"
    );
    Ok(mapping)
}
