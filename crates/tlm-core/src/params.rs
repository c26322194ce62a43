//! Code Parameters
//!
//! Construction-time constants shared by every stage of the chain:
//!
//! | Parameter           | Default | Meaning                                         |
//! |---------------------|---------|-------------------------------------------------|
//! | `constraint_length` | 3       | K; the encoder keeps K-1 bits of memory         |
//! | `generators`        | 7, 5    | G0/G1 in octal, MSB taps the current input      |
//! | `tb_len`            | 12      | survivor depth and decoder latency in ticks     |
//! | `total_bits`        | 200     | bits the tracker compares before completing     |
//! | `metric_ceiling`    | 255     | saturation point of the path metrics            |
//!
//! Parameters are validated once in [`CodeParamsBuilder::build`] (or
//! [`CodeParams::validate`] after deserializing) and are immutable afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{FecError, FecResult};

/// Largest supported constraint length (256 trellis states).
pub const MAX_CONSTRAINT_LENGTH: usize = 9;

/// Survivor histories are held in a `u128` shift register.
pub const MAX_TB_LEN: usize = 128;

/// Upper bound on the tracker's target bit count (16 Mbit payloads).
pub const MAX_TOTAL_BITS: u64 = 1 << 24;

/// Default path-metric ceiling (an 8-bit metric register).
pub const DEFAULT_METRIC_CEILING: u32 = 255;

/// Rate-1/2 convolutional code plus the chain's latency and payload settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeParams {
    /// Constraint length K (memory + 1)
    pub constraint_length: usize,
    /// Generator polynomials G0, G1 in octal
    pub generators: [u32; 2],
    /// Traceback length TB_LEN
    pub tb_len: usize,
    /// Target bit count for the error tracker
    pub total_bits: u64,
    /// Saturation ceiling for path metrics
    pub metric_ceiling: u32,
}

impl Default for CodeParams {
    fn default() -> Self {
        Self {
            constraint_length: 3,
            generators: [0o7, 0o5],
            tb_len: 12,
            total_bits: 200,
            metric_ceiling: DEFAULT_METRIC_CEILING,
        }
    }
}

impl CodeParams {
    /// Start a builder from the default (7,5) K=3 parameters
    pub fn builder() -> CodeParamsBuilder {
        CodeParamsBuilder::new()
    }

    /// Rate 1/2, K=3, generators (7, 5): the telemetry default.
    pub fn k3_rate_half() -> Self {
        Self::default()
    }

    /// GSM rate 1/2, K=5 code, generators (23, 33).
    pub fn gsm_k5_rate_half() -> Self {
        Self {
            constraint_length: 5,
            generators: [0o23, 0o33],
            tb_len: 20,
            ..Self::default()
        }
    }

    /// NASA standard rate 1/2, K=7 code, generators (171, 133).
    pub fn nasa_k7_rate_half() -> Self {
        Self {
            constraint_length: 7,
            generators: [0o171, 0o133],
            tb_len: 35,
            ..Self::default()
        }
    }

    /// Number of trellis states: 2^(K-1).
    pub fn num_states(&self) -> usize {
        1 << (self.constraint_length - 1)
    }

    /// Traceback depth at which survivors have merged with high probability.
    pub fn recommended_tb_len(&self) -> usize {
        5 * (self.constraint_length - 1)
    }

    /// Smallest metric ceiling that no path can reach within one run of
    /// `total_bits + tb_len` symbols (two errors per symbol at most).
    pub fn saturation_free_ceiling(&self) -> u32 {
        let ticks = self.total_bits.saturating_add(self.tb_len as u64);
        u32::try_from(ticks.saturating_mul(2)).unwrap_or(u32::MAX)
    }

    /// True when a noisy run can pin path metrics at the ceiling. Once the
    /// best path saturates every state ties and decisions stop tracking the
    /// received symbols.
    pub fn metrics_may_saturate(&self) -> bool {
        self.metric_ceiling < self.saturation_free_ceiling()
    }

    /// Check every field against its allowed range.
    pub fn validate(&self) -> FecResult<()> {
        let k = self.constraint_length;
        if !(2..=MAX_CONSTRAINT_LENGTH).contains(&k) {
            return Err(FecError::InvalidConstraintLength(k));
        }
        for &poly in &self.generators {
            if poly == 0 || poly >> k != 0 {
                return Err(FecError::InvalidGenerator {
                    poly,
                    constraint_length: k,
                });
            }
        }
        if self.tb_len == 0 || self.tb_len > MAX_TB_LEN {
            return Err(FecError::InvalidTracebackLength(self.tb_len));
        }
        if self.total_bits == 0 || self.total_bits > MAX_TOTAL_BITS {
            return Err(FecError::InvalidPayloadLength(self.total_bits));
        }
        // Two is the largest branch metric; anything lower cannot rank paths.
        if self.metric_ceiling < 2 {
            return Err(FecError::InvalidMetricCeiling(self.metric_ceiling));
        }
        if self.tb_len < self.recommended_tb_len() {
            tracing::warn!(
                tb_len = self.tb_len,
                recommended = self.recommended_tb_len(),
                "traceback shorter than 5*(K-1); decisions may be made before survivors merge"
            );
        }
        Ok(())
    }
}

impl fmt::Display for CodeParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Conv(K={}, rate=1/2, generators=[{:o}, {:o}], tb_len={}, total_bits={})",
            self.constraint_length,
            self.generators[0],
            self.generators[1],
            self.tb_len,
            self.total_bits
        )
    }
}

/// Builder for [`CodeParams`]
#[derive(Debug, Clone, Default)]
pub struct CodeParamsBuilder {
    params: CodeParams,
}

impl CodeParamsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constraint_length(mut self, k: usize) -> Self {
        self.params.constraint_length = k;
        self
    }

    pub fn generators(mut self, g0: u32, g1: u32) -> Self {
        self.params.generators = [g0, g1];
        self
    }

    pub fn tb_len(mut self, tb_len: usize) -> Self {
        self.params.tb_len = tb_len;
        self
    }

    pub fn total_bits(mut self, total_bits: u64) -> Self {
        self.params.total_bits = total_bits;
        self
    }

    pub fn metric_ceiling(mut self, ceiling: u32) -> Self {
        self.params.metric_ceiling = ceiling;
        self
    }

    /// Validate and return the parameters.
    pub fn build(self) -> FecResult<CodeParams> {
        self.params.validate()?;
        Ok(self.params)
    }
}
