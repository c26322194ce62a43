//! BER sweep: encoder -> bit-flip channel -> Viterbi decoder -> tracker
//!
//! Run with: cargo run -p tlm-sim --bin ber_sweep -- --p-flip 0,0.02,0.05,0.1

use clap::Parser;
use std::path::PathBuf;
use tlm_core::config::TlmConfig;
use tlm_core::observe::{init_logging, LogLevel};
use tlm_sim::sweep::{write_csv, BerSweep};

#[derive(Parser, Debug)]
#[command(name = "ber_sweep", version, about = "Hard-decision BER sweep for the telemetry FEC chain")]
struct Args {
    /// YAML configuration file (default: TLM_CONFIG or the standard search path)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Named code profile from the configuration
    #[arg(long)]
    profile: Option<String>,

    /// Output CSV path
    #[arg(long, env = "BER_CSV")]
    csv: Option<PathBuf>,

    /// Flip probabilities, comma separated
    #[arg(long, value_delimiter = ',')]
    p_flip: Vec<f64>,

    /// Trials per flip probability
    #[arg(long)]
    trials: Option<usize>,

    /// Payload bits per trial
    #[arg(long)]
    payload_len: Option<u64>,

    /// Traceback length
    #[arg(long)]
    tb_len: Option<usize>,

    /// Base seed
    #[arg(long)]
    seed: Option<u64>,

    /// Skip pin-mapping calibration and wire y0 to v1
    #[arg(long)]
    no_calibrate: bool,

    #[arg(long)]
    log_level: Option<LogLevel>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match args.config {
        Some(ref path) => TlmConfig::load_from(path)?,
        None => TlmConfig::load()?,
    };
    if let Some(ref name) = args.profile {
        config = config.with_profile(name)?;
    }
    apply_overrides(&mut config, &args);
    config.validate()?;

    init_logging(&config.logging);
    tracing::info!(code = %config.code, trials = config.sweep.trials, payload_len = config.sweep.payload_len, "starting BER sweep");

    let mut sweep = BerSweep::from_config(&config)?;
    if config.sweep.calibrate {
        sweep.calibrate()?;
    }

    let rows = sweep.run()?;
    for row in &rows {
        println!(
            "p_flip={:.3}  errors={}/{}  BER={:.6}",
            row.p_flip, row.errors, row.total_bits, row.ber
        );
    }

    write_csv(&rows, &config.sweep.csv_path)?;
    tracing::info!(path = %config.sweep.csv_path.display(), rows = rows.len(), "BER summary CSV written");
    Ok(())
}

fn apply_overrides(config: &mut TlmConfig, args: &Args) {
    if let Some(ref csv) = args.csv {
        config.sweep.csv_path = csv.clone();
    }
    if !args.p_flip.is_empty() {
        config.sweep.p_flips = args.p_flip.clone();
    }
    if let Some(trials) = args.trials {
        config.sweep.trials = trials;
    }
    if let Some(payload_len) = args.payload_len {
        config.sweep.payload_len = payload_len;
    }
    if let Some(tb_len) = args.tb_len {
        config.code.tb_len = tb_len;
    }
    if let Some(seed) = args.seed {
        config.sweep.seed = seed;
    }
    if args.no_calibrate {
        config.sweep.calibrate = false;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
}
