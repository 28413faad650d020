use anyhow::Result;
use clap::Parser;
use fsprobe::chaos::ChaosFs;
use fsprobe::cli::{Cli, OutputFormat};
use fsprobe::config::ProbeConfig;
use fsprobe::report::{self, JsonReport};
use fsprobe::verifier::{HostFs, ProbeFs, RoundTripVerifier, VerificationResult};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Merge the config file (if any) with command-line overrides
fn resolve_config(args: &Cli) -> Result<ProbeConfig> {
    let mut config = match &args.config {
        Some(path) => ProbeConfig::from_file(path)?,
        None => ProbeConfig::default(),
    };

    if let Some(path) = &args.path {
        config.path = path.clone();
    }
    config.set_payload(args.payload.clone(), args.payload_hex.clone())?;
    if let Some(format) = args.format {
        config.format = format;
    }
    Ok(config)
}

/// Run the probe and print its report, returning the outcome
fn run_probe<F: ProbeFs>(
    verifier: &RoundTripVerifier<F>,
    config: &ProbeConfig,
) -> Result<VerificationResult> {
    let payload = config.payload()?;
    let (result, readback) = verifier.verify_with_readback(&config.path, &payload);

    match config.format {
        OutputFormat::Text => print!(
            "{}",
            report::render_text(&config.path, &payload, &result, readback.as_deref())
        ),
        OutputFormat::Json => println!(
            "{}",
            JsonReport::new(&config.path, &payload, &result).to_json()?
        ),
    }
    Ok(result)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let config = resolve_config(&args)?;
    let chaos = args.chaos_config();

    let result = if chaos.is_active() {
        tracing::debug!(?chaos, "fault injection enabled");
        run_probe(&RoundTripVerifier::with_fs(ChaosFs::new(HostFs, chaos)), &config)?
    } else {
        run_probe(&RoundTripVerifier::new(), &config)?
    };

    if !result.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
