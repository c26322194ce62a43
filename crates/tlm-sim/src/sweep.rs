//! BER Sweep over a Binary Symmetric Channel
//!
//! For every flip probability, push `trials` random payloads through a fresh
//! [`Chain`] and accumulate the tracker's counts into one [`SweepRow`].
//!
//! Every trial owns its seed, derived from the base seed and the trial's
//! (point, trial) position, so results do not depend on execution order.
//! With the `parallel` feature the trials of a point run on rayon's pool and
//! produce the same rows as the sequential build.
//!
//! ## Example
//!
//! ```rust
//! use tlm_core::{CodeParams, SweepSettings};
//! use tlm_sim::sweep::{to_csv, BerSweep};
//!
//! let settings = SweepSettings {
//!     p_flips: vec![0.0, 0.05],
//!     trials: 2,
//!     payload_len: 32,
//!     ..Default::default()
//! };
//! let sweep = BerSweep::new(&CodeParams::default(), settings).unwrap();
//! let rows = sweep.run().unwrap();
//! assert_eq!(rows[0].errors, 0);
//! assert!(to_csv(&rows).starts_with("p_flip,ber,"));
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::path::Path;
use tlm_core::config::{SweepSettings, TlmConfig};
use tlm_core::params::MAX_TOTAL_BITS;
use tlm_core::types::{FecError, FecResult};
use tlm_core::CodeParams;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::chain::{calibrate_mapping, random_payload, Chain, SymbolMapping, TrialResult};
use crate::channel::BinarySymmetricChannel;

/// Column order of the results log.
pub const CSV_HEADER: &str = "p_flip,ber,errors,total_bits,trials,payload_len,tb_len,seed,mapping";

/// Accumulated result for one flip probability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepRow {
    pub p_flip: f64,
    pub ber: f64,
    pub errors: u64,
    /// Bits compared across all trials
    pub total_bits: u64,
    pub trials: usize,
    pub payload_len: u64,
    pub tb_len: usize,
    pub seed: u64,
    pub mapping: SymbolMapping,
}

/// BER sweep driver.
#[derive(Debug, Clone)]
pub struct BerSweep {
    params: CodeParams,
    settings: SweepSettings,
    mapping: SymbolMapping,
}

impl BerSweep {
    /// Validate the settings and fix the tracker target to `payload_len`.
    ///
    /// The metric ceiling is raised to [`CodeParams::saturation_free_ceiling`]
    /// when the configured one could clip path metrics within a trial.
    pub fn new(code: &CodeParams, settings: SweepSettings) -> FecResult<Self> {
        if let Some(&p) = settings.p_flips.iter().find(|p| !(0.0..=1.0).contains(*p)) {
            return Err(FecError::InvalidProbability(p));
        }
        if settings.payload_len == 0 || settings.payload_len > MAX_TOTAL_BITS {
            return Err(FecError::InvalidPayloadLength(settings.payload_len));
        }
        let mut params = CodeParams {
            total_bits: settings.payload_len,
            ..code.clone()
        };
        params.validate()?;
        if params.metrics_may_saturate() {
            let ceiling = params.saturation_free_ceiling();
            tracing::info!(
                configured = params.metric_ceiling,
                ceiling,
                payload_len = settings.payload_len,
                "raising metric ceiling so path metrics cannot saturate"
            );
            params.metric_ceiling = ceiling;
        }

        Ok(Self {
            params,
            settings,
            mapping: SymbolMapping::Direct,
        })
    }

    pub fn from_config(config: &TlmConfig) -> FecResult<Self> {
        Self::new(&config.code, config.sweep.clone())
    }

    pub fn with_mapping(mut self, mapping: SymbolMapping) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn params(&self) -> &CodeParams {
        &self.params
    }

    pub fn settings(&self) -> &SweepSettings {
        &self.settings
    }

    pub fn mapping(&self) -> SymbolMapping {
        self.mapping
    }

    /// Run the noiseless calibration trial and adopt its mapping.
    pub fn calibrate(&mut self) -> FecResult<SymbolMapping> {
        self.mapping = calibrate_mapping(&self.params, self.settings.seed)?;
        Ok(self.mapping)
    }

    /// Seed of trial `trial` at sweep point `point`.
    pub fn trial_seed(&self, point: usize, trial: usize) -> u64 {
        splitmix64(self.settings.seed ^ ((point as u64) << 32 | trial as u64))
    }

    /// One random payload through a binary symmetric channel.
    pub fn run_trial(&self, chain: &mut Chain, p_flip: f64, seed: u64) -> FecResult<TrialResult> {
        let mut rng = StdRng::seed_from_u64(seed);
        let payload = random_payload(&mut rng, self.settings.payload_len as usize);
        let channel = BinarySymmetricChannel::new(p_flip, rng.gen())?;
        chain.run(&payload, channel)
    }

    /// All trials of sweep point `point`.
    pub fn run_point(&self, point: usize) -> FecResult<SweepRow> {
        let points = self.settings.p_flips.len();
        let p_flip = self
            .settings
            .p_flips
            .get(point)
            .copied()
            .ok_or(FecError::InvalidSweepPoint { point, points })?;
        let template = Chain::new(&self.params, self.mapping)?;

        #[cfg(not(feature = "parallel"))]
        let trials = {
            let mut chain = template;
            (0..self.settings.trials)
                .map(|t| self.run_trial(&mut chain, p_flip, self.trial_seed(point, t)))
                .collect::<FecResult<Vec<_>>>()?
        };

        #[cfg(feature = "parallel")]
        let trials = (0..self.settings.trials)
            .into_par_iter()
            .map(|t| {
                let mut chain = template.clone();
                self.run_trial(&mut chain, p_flip, self.trial_seed(point, t))
            })
            .collect::<FecResult<Vec<_>>>()?;

        let errors: u64 = trials.iter().map(|t| t.errors).sum();
        let total_bits: u64 = trials.iter().map(|t| t.compared).sum();
        let ber = if total_bits == 0 {
            0.0
        } else {
            errors as f64 / total_bits as f64
        };

        tracing::info!(
            p_flip,
            errors,
            total_bits,
            ber,
            flips = trials.iter().map(|t| t.flips).sum::<u64>(),
            "sweep point done"
        );

        Ok(SweepRow {
            p_flip,
            ber,
            errors,
            total_bits,
            trials: self.settings.trials,
            payload_len: self.settings.payload_len,
            tb_len: self.params.tb_len,
            seed: self.settings.seed,
            mapping: self.mapping,
        })
    }

    /// Every sweep point, in configuration order.
    pub fn run(&self) -> FecResult<Vec<SweepRow>> {
        (0..self.settings.p_flips.len())
            .map(|point| self.run_point(point))
            .collect()
    }
}

/// Render rows as the CSV results log.
pub fn to_csv(rows: &[SweepRow]) -> String {
    let mut csv = format!("{}\n", CSV_HEADER);
    for r in rows {
        csv.push_str(&format!(
            "{},{:.10},{},{},{},{},{},{},{}\n",
            r.p_flip, r.ber, r.errors, r.total_bits, r.trials, r.payload_len, r.tb_len, r.seed, r.mapping
        ));
    }
    csv
}

/// Write the results log, creating parent directories.
pub fn write_csv(rows: &[SweepRow], path: &Path) -> std::io::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, to_csv(rows))
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}
