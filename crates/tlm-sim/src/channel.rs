//! Symbol Channels for Hard-Decision Simulation
//!
//! The decoder sees one 2-bit symbol per tick, so the channel works on whole
//! [`Symbol`]s rather than on samples:
//!
//! 1. **Noiseless**: symbols pass through untouched
//! 2. **Binary symmetric**: every coded bit flips independently with
//!    probability `p_flip`
//! 3. **Scripted**: fixed flip masks at chosen symbol indices, for
//!    reproducible error patterns
//!
//! ## Usage
//!
//! ```rust
//! use tlm_sim::channel::{BinarySymmetricChannel, SymbolChannel};
//! use tlm_core::types::Symbol;
//!
//! let mut channel = BinarySymmetricChannel::new(0.0, 42).unwrap();
//! let sym = Symbol::new(true, false);
//! assert_eq!(channel.transmit(sym), sym);
//! assert_eq!(channel.flips(), 0);
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use tlm_core::types::{FecError, FecResult, Symbol};

/// Anything that carries one symbol per tick from encoder to decoder.
pub trait SymbolChannel {
    /// Pass one symbol through the channel.
    fn transmit(&mut self, symbol: Symbol) -> Symbol;

    /// Coded bits flipped so far.
    fn flips(&self) -> u64 {
        0
    }
}

impl<C: SymbolChannel + ?Sized> SymbolChannel for &mut C {
    fn transmit(&mut self, symbol: Symbol) -> Symbol {
        (**self).transmit(symbol)
    }

    fn flips(&self) -> u64 {
        (**self).flips()
    }
}

/// Perfect channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct Noiseless;

impl SymbolChannel for Noiseless {
    fn transmit(&mut self, symbol: Symbol) -> Symbol {
        symbol
    }
}

/// Binary symmetric channel applied independently to both coded bits.
#[derive(Debug, Clone)]
pub struct BinarySymmetricChannel {
    p_flip: f64,
    rng: StdRng,
    flips: u64,
}

impl BinarySymmetricChannel {
    /// Create a channel with flip probability `p_flip` and a fixed seed.
    pub fn new(p_flip: f64, seed: u64) -> FecResult<Self> {
        if !(0.0..=1.0).contains(&p_flip) {
            return Err(FecError::InvalidProbability(p_flip));
        }
        Ok(Self {
            p_flip,
            rng: StdRng::seed_from_u64(seed),
            flips: 0,
        })
    }

    pub fn p_flip(&self) -> f64 {
        self.p_flip
    }

    fn flip(&mut self, bit: bool) -> bool {
        if self.rng.gen::<f64>() < self.p_flip {
            self.flips += 1;
            !bit
        } else {
            bit
        }
    }
}

impl SymbolChannel for BinarySymmetricChannel {
    fn transmit(&mut self, symbol: Symbol) -> Symbol {
        let y0 = self.flip(symbol.y0);
        let y1 = self.flip(symbol.y1);
        Symbol::new(y0, y1)
    }

    fn flips(&self) -> u64 {
        self.flips
    }
}

/// Deterministic error injection: XOR a `{v1, v0}` mask into chosen symbols.
#[derive(Debug, Clone, Default)]
pub struct ScriptedChannel {
    masks: BTreeMap<u64, u8>,
    index: u64,
    flips: u64,
}

impl ScriptedChannel {
    /// Masks keyed by 0-based symbol index; only the low two bits are used.
    pub fn new(masks: impl IntoIterator<Item = (u64, u8)>) -> Self {
        Self {
            masks: masks.into_iter().map(|(i, m)| (i, m & 0b11)).collect(),
            index: 0,
            flips: 0,
        }
    }

    /// Flip one coded bit (`y0` when `first` is set) of symbol `index`.
    pub fn single(index: u64, first: bool) -> Self {
        Self::new([(index, if first { 0b10 } else { 0b01 })])
    }

    /// Symbols transmitted so far.
    pub fn position(&self) -> u64 {
        self.index
    }

    /// Restart at symbol index 0.
    pub fn rewind(&mut self) {
        self.index = 0;
        self.flips = 0;
    }
}

impl SymbolChannel for ScriptedChannel {
    fn transmit(&mut self, symbol: Symbol) -> Symbol {
        let mask = self.masks.get(&self.index).copied().unwrap_or(0);
        self.index += 1;
        self.flips += mask.count_ones() as u64;
        symbol.flipped(mask)
    }

    fn flips(&self) -> u64 {
        self.flips
    }
}
