//! Viterbi Decoder: hard-decision, fixed-latency, register exchange
//!
//! Streaming maximum-likelihood decoder for the rate-1/2 code described by
//! [`CodeParams`]. Each state keeps a saturating path metric and a survivor
//! register of the last `tb_len` input-bit decisions. Every accepted symbol
//! runs add-compare-select over all states against the previous tick's
//! committed metrics, then the oldest survivor bit of the best state is
//! emitted.
//!
//! ```text
//!   tick k (1-based)   1 .. tb_len-1   tb_len   tb_len+1   ...
//!   output             -               u[0]     u[1]       ...
//! ```
//!
//! Tie-breaks are fixed so the output is bit-exact across runs and builds:
//! the edge from the predecessor with dropped bit 0 wins equal candidates,
//! and the lowest state index wins equal path metrics.
//!
//! ## Example
//!
//! ```rust
//! use tlm_core::convolutional_encoder::ConvolutionalEncoder;
//! use tlm_core::viterbi_decoder::ViterbiDecoder;
//! use tlm_core::params::CodeParams;
//!
//! let params = CodeParams::builder().tb_len(12).build().unwrap();
//! let mut encoder = ConvolutionalEncoder::new(&params).unwrap();
//! let mut decoder = ViterbiDecoder::new(&params).unwrap();
//!
//! let data = vec![true, false, true, true, false, false, true, false];
//! let mut input = data.clone();
//! input.extend(std::iter::repeat(false).take(params.tb_len));
//!
//! let decoded = decoder.decode(&encoder.encode(&input));
//! assert_eq!(&decoded[..data.len()], &data[..]);
//! ```

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::params::CodeParams;
use crate::trellis::Trellis;
use crate::types::{FecResult, Symbol};

/// Registered decoder outputs after a tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderOutput {
    /// A decoded bit was produced on this tick.
    pub valid: bool,
    /// Decoded bit; holds its last value while `valid` is low.
    pub bit: bool,
}

impl DecoderOutput {
    /// The decoded bit, if one was produced on this tick.
    pub fn bit(&self) -> Option<bool> {
        self.valid.then_some(self.bit)
    }
}

/// Add `branch` to `metric`, clamping at `ceiling`.
#[inline]
pub fn saturating_metric_add(metric: u32, branch: u32, ceiling: u32) -> u32 {
    metric.saturating_add(branch).min(ceiling)
}

/// Hard-decision Viterbi decoder with a `tb_len` decision delay.
#[derive(Debug, Clone)]
pub struct ViterbiDecoder {
    trellis: Trellis,
    tb_len: usize,
    metric_ceiling: u32,
    history_mask: u128,
    /// Committed path metrics, one per state.
    metrics: Vec<u32>,
    /// Committed survivor registers; newest decision in bit 0.
    histories: Vec<u128>,
    next_metrics: Vec<u32>,
    next_histories: Vec<u128>,
    accepted: u64,
    primed: bool,
    output: DecoderOutput,
}

impl ViterbiDecoder {
    /// Create a decoder in the reset state.
    pub fn new(params: &CodeParams) -> FecResult<Self> {
        Self::with_trellis(Trellis::new(params)?, params)
    }

    /// Create a decoder sharing prebuilt trellis tables.
    ///
    /// `params` supplies the traceback length and metric ceiling and is
    /// validated here; the trellis must describe the same code.
    pub fn with_trellis(trellis: Trellis, params: &CodeParams) -> FecResult<Self> {
        params.validate()?;
        let num_states = trellis.num_states();
        let history_mask = if params.tb_len >= 128 {
            u128::MAX
        } else {
            (1u128 << params.tb_len) - 1
        };
        tracing::debug!(
            constraint_length = trellis.constraint_length(),
            states = num_states,
            tb_len = params.tb_len,
            metric_ceiling = params.metric_ceiling,
            "viterbi decoder created"
        );
        let mut decoder = Self {
            trellis,
            tb_len: params.tb_len,
            metric_ceiling: params.metric_ceiling,
            history_mask,
            metrics: vec![0; num_states],
            histories: vec![0; num_states],
            next_metrics: vec![0; num_states],
            next_histories: vec![0; num_states],
            accepted: 0,
            primed: false,
            output: DecoderOutput::default(),
        };
        decoder.reset();
        Ok(decoder)
    }

    /// Advance one tick.
    ///
    /// `Some(symbol)` is accepted and decoded; `None` is an idle tick that
    /// changes nothing except deasserting `valid`.
    pub fn tick(&mut self, symbol: Option<Symbol>) -> DecoderOutput {
        let Some(symbol) = symbol else {
            self.output.valid = false;
            return self.output;
        };

        self.update(symbol);
        self.accepted = self.accepted.saturating_add(1);
        if self.accepted >= self.tb_len as u64 {
            self.primed = true;
        }

        if self.primed {
            let best = self.best_state();
            let bit = (self.histories[best] >> (self.tb_len - 1)) & 1 == 1;
            self.output = DecoderOutput { valid: true, bit };
        } else {
            self.output.valid = false;
        }
        self.output
    }

    /// Accept every symbol in turn and collect the bits produced.
    ///
    /// The last `tb_len - 1` decisions stay inside the decoder; append a tail
    /// of `tb_len` symbols to flush them.
    pub fn decode(&mut self, symbols: &[Symbol]) -> Vec<bool> {
        symbols
            .iter()
            .filter_map(|&s| self.tick(Some(s)).bit())
            .collect()
    }

    /// Add-compare-select for every state, then commit all of them at once.
    fn update(&mut self, symbol: Symbol) {
        let Self {
            trellis,
            metrics,
            histories,
            next_metrics,
            next_histories,
            metric_ceiling,
            history_mask,
            ..
        } = self;
        let (trellis, metrics, histories) = (&*trellis, &metrics[..], &histories[..]);
        let (ceiling, mask) = (*metric_ceiling, *history_mask);

        #[cfg(not(feature = "parallel"))]
        for (q, (m, h)) in next_metrics.iter_mut().zip(next_histories.iter_mut()).enumerate() {
            (*m, *h) = add_compare_select(trellis, metrics, histories, ceiling, mask, q, symbol);
        }

        #[cfg(feature = "parallel")]
        next_metrics
            .par_iter_mut()
            .zip(next_histories.par_iter_mut())
            .enumerate()
            .for_each(|(q, (m, h))| {
                (*m, *h) = add_compare_select(trellis, metrics, histories, ceiling, mask, q, symbol);
            });

        std::mem::swap(&mut self.metrics, &mut self.next_metrics);
        std::mem::swap(&mut self.histories, &mut self.next_histories);
    }

    /// State with the smallest path metric; lowest index on ties.
    pub fn best_state(&self) -> usize {
        let mut best = 0;
        for (state, &metric) in self.metrics.iter().enumerate() {
            if metric < self.metrics[best] {
                best = state;
            }
        }
        best
    }

    /// Committed path metrics, indexed by state.
    pub fn path_metrics(&self) -> &[u32] {
        &self.metrics
    }

    /// Survivor decisions for `state`, oldest first, `tb_len` entries.
    pub fn survivor(&self, state: usize) -> Vec<bool> {
        let h = self.histories[state];
        (0..self.tb_len).rev().map(|i| (h >> i) & 1 == 1).collect()
    }

    /// True once `tb_len` symbols have been accepted since reset.
    pub fn is_primed(&self) -> bool {
        self.primed
    }

    /// Symbols accepted since reset.
    pub fn accepted_symbols(&self) -> u64 {
        self.accepted
    }

    pub fn output(&self) -> DecoderOutput {
        self.output
    }

    pub fn tb_len(&self) -> usize {
        self.tb_len
    }

    pub fn metric_ceiling(&self) -> u32 {
        self.metric_ceiling
    }

    pub fn trellis(&self) -> &Trellis {
        &self.trellis
    }

    /// Force the known start state: state 0 at metric 0, the rest at the
    /// ceiling, survivors cleared, latency counter restarted.
    pub fn reset(&mut self) {
        self.metrics.fill(self.metric_ceiling);
        self.metrics[0] = 0;
        self.histories.fill(0);
        self.accepted = 0;
        self.primed = false;
        self.output = DecoderOutput::default();
    }
}

/// Survivor selection for next-state `q`; reads only committed state.
#[inline]
fn add_compare_select(
    trellis: &Trellis,
    metrics: &[u32],
    histories: &[u128],
    ceiling: u32,
    mask: u128,
    q: usize,
    symbol: Symbol,
) -> (u32, u128) {
    let [e0, e1] = trellis.incoming(q);
    let m0 = saturating_metric_add(metrics[e0.from], e0.output.distance(symbol), ceiling);
    let m1 = saturating_metric_add(metrics[e1.from], e1.output.distance(symbol), ceiling);
    let (metric, edge) = if m0 <= m1 { (m0, e0) } else { (m1, e1) };
    let history = ((histories[edge.from] << 1) | edge.input as u128) & mask;
    (metric, history)
}
