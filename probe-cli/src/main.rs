//! J-Link Serial Number Resolver
//!
//! Prints the serial number of the J-Link probe behind each COM port given
//! on the command line, using the Windows device registry.

mod cli;
mod settings;

use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::Parser;
use probe_detect::{ConnectedProbes, NrfjprogScanner, ScannerConfig, ScannerKind, UsbProbeScanner};
use probe_registry::{KeyCorrelator, RegCommand};
use probe_resolve::{Resolution, SerialNumberResolver};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;
use settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "probe_serial={0},probe_registry={0},probe_detect={0},probe_resolve={0}",
                    default_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut settings = Settings::load();
    cli.apply(&mut settings);

    if cli.save {
        let path = settings.save().map_err(|e| anyhow!(e))?;
        tracing::info!("Saved settings to {}", path.display());
    }

    if !cfg!(windows) {
        tracing::warn!("Registry lookups only work on Windows");
    }

    let resolution = resolve(&settings, &cli.ports).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&resolution)?);
    } else {
        for (port, serial) in &resolution.resolved {
            println!("{} -> {}", port, serial);
        }
        for warning in &resolution.warnings {
            eprintln!("warning: {}", warning);
        }
    }

    Ok(())
}

/// Build the resolver described by `settings` and run one batch
async fn resolve(settings: &Settings, ports: &[String]) -> anyhow::Result<Resolution> {
    let reg = RegCommand::with_program(settings.reg_program.clone());
    tracing::debug!("Querying registry with {}", reg.program());
    let correlator = KeyCorrelator::with_root(reg, settings.registry_root.clone());
    tracing::debug!("Searching {}", correlator.root());

    let probes: Box<dyn ConnectedProbes> = match settings.scanner {
        ScannerKind::Usb => Box::new(UsbProbeScanner::with_config(ScannerConfig {
            vendor_id: settings.vendor_id,
        })),
        ScannerKind::Nrfjprog => {
            Box::new(NrfjprogScanner::with_program(settings.nrfjprog_program.clone()))
        }
    };
    tracing::debug!("Using {} scanner", settings.scanner.name());

    let resolver = SerialNumberResolver::new(correlator, probes);
    let batch = resolver.get_serial_number_map(ports);

    let resolution = if settings.timeout_ms == 0 {
        batch.await?
    } else {
        tokio::time::timeout(Duration::from_millis(settings.timeout_ms), batch)
            .await
            .with_context(|| format!("resolution timed out after {} ms", settings.timeout_ms))??
    };

    Ok(resolution)
}
