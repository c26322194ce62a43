//! # Observability
//!
//! Structured logging for the FEC chain via `tracing`. Library code only
//! emits events; binaries and tests decide whether a subscriber is installed.
//!
//! | Event                                   | Level   |
//! |-----------------------------------------|---------|
//! | decoder constructed                     | `debug` |
//! | `tb_len` shorter than `5*(K-1)`         | `warn`  |
//! | decoded bit before delay line filled    | `warn`  |
//! | tracker completion                      | `info`  |
//! | per-bit error                           | `trace` |

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
