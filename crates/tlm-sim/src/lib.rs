//! # Telemetry FEC Simulation
//!
//! Drives the `tlm-core` encoder, decoder and tracker through a hard-decision
//! channel and measures bit error rates:
//!
//! - [`channel`]: noiseless, binary symmetric and scripted symbol channels
//! - [`chain`]: lockstep chain driver, pin mapping and its calibration
//! - [`sweep`]: BER sweep over flip probabilities with a CSV results log
//!
//! ## Example
//!
//! ```rust
//! use tlm_core::CodeParams;
//! use tlm_sim::chain::{Chain, SymbolMapping};
//! use tlm_sim::channel::ScriptedChannel;
//!
//! let params = CodeParams::builder().total_bits(8).build().unwrap();
//! let mut chain = Chain::new(&params, SymbolMapping::Direct).unwrap();
//!
//! let payload = [true, true, false, true, false, false, true, false];
//! let result = chain.run(&payload, ScriptedChannel::single(2, true)).unwrap();
//! assert!(result.complete);
//! assert_eq!(result.errors, 0);
//! ```

pub mod chain;
pub mod channel;
pub mod sweep;

pub use chain::{calibrate_mapping, Chain, SymbolMapping, TrialResult};
pub use channel::{BinarySymmetricChannel, Noiseless, ScriptedChannel, SymbolChannel};
pub use sweep::{to_csv, write_csv, BerSweep, SweepRow};
