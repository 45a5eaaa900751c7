//! Command-line entry point for the PanelBridge cockpit panel bridge.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use panelbridge_core::config::{self, BridgeConfig};
use panelbridge_core::prelude::*;
use panelbridge_devices::{DeviceLink, LinkConfig, SerialOpener};

/// PanelBridge - connect a hardware autopilot panel to X-Plane.
#[derive(Parser, Debug)]
#[command(name = "panelbridge")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Aircraft profile (overrides ACTIVE_PLANE).
    #[arg(short, long)]
    aircraft: Option<Aircraft>,

    /// X-Plane host (overrides XPLANE_HOST).
    #[arg(long)]
    host: Option<String>,

    /// X-Plane web API port (overrides XPLANE_PORT).
    #[arg(long)]
    port: Option<u16>,

    /// Serial device path; autodiscovered when omitted.
    #[arg(long)]
    serial_port: Option<String>,

    /// Serial baud rate (overrides ARDUINO_BAUD).
    #[arg(long)]
    baud: Option<u32>,

    /// Delay before reconnecting, in milliseconds.
    #[arg(long)]
    reconnect_delay_ms: Option<u64>,

    /// List supported aircraft and exit.
    #[arg(long)]
    list_aircraft: bool,

    /// Verbose output.
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn apply(&self, config: &mut BridgeConfig) {
        if let Some(host) = &self.host {
            config.xplane_host = host.clone();
        }
        if let Some(port) = self.port {
            config.xplane_port = port;
        }
        if let Some(path) = &self.serial_port {
            config.serial_port = Some(path.clone());
        }
        if let Some(baud) = self.baud {
            config.baud_rate = baud;
        }
        if let Some(ms) = self.reconnect_delay_ms {
            config.reconnect_delay = Duration::from_millis(ms);
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "panelbridge=debug" } else { "panelbridge=info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    if config::json_logging() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.list_aircraft {
        for aircraft in Aircraft::ALL {
            println!("{:<10} {}", aircraft.id(), aircraft.label());
        }
        return Ok(());
    }

    init_logging(args.verbose);

    let mut bridge_config = BridgeConfig::from_env();
    args.apply(&mut bridge_config);

    let aircraft = match args.aircraft {
        Some(aircraft) => aircraft,
        None => config::active_plane()
            .parse::<Aircraft>()
            .map_err(anyhow::Error::msg)?,
    };

    info!(aircraft = aircraft.id(), "Initializing mappings for {}", aircraft);
    let registry = Arc::new(
        aircraft
            .registry()
            .with_context(|| format!("invalid mappings for {}", aircraft.id()))?,
    );
    info!(
        outputs = registry.outbound_len(),
        inputs = registry.inbound_len(),
        "Mappings loaded"
    );

    let (link, inputs) = DeviceLink::new(
        SerialOpener::new(bridge_config.serial_port.clone(), bridge_config.baud_rate),
        LinkConfig {
            reconnect_delay: bridge_config.reconnect_delay,
            ..LinkConfig::default()
        },
    );
    let link = Arc::new(link);

    let client = XPlaneClient::new(bridge_config.rest_url())
        .context("failed to build simulator HTTP client")?;
    let resolver = Arc::new(IdentifierResolver::new(Arc::new(client)));
    let session = Arc::new(ProtocolSession::new(
        SessionConfig::new(bridge_config.websocket_url(), bridge_config.reconnect_delay),
        Arc::clone(&registry),
        resolver,
        Arc::clone(&link) as Arc<dyn DeviceSink>,
    ));
    let dispatcher = Arc::new(Dispatcher::new(registry, Arc::clone(&session)));

    info!(
        rest = %bridge_config.rest_url(),
        websocket = %bridge_config.websocket_url(),
        "Starting bridge"
    );
    let session_task = tokio::spawn(Arc::clone(&session).run());
    let link_task = tokio::spawn(Arc::clone(&link).run());
    let dispatch_task = tokio::spawn(dispatcher.run(inputs));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;

    info!("Shutting down");
    session.close();
    link.close();
    let (session_result, link_result) = tokio::join!(session_task, link_task);
    session_result.context("session task panicked")?;
    link_result.context("panel link task panicked")?;
    dispatch_task.abort();

    info!("Bridge closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "panelbridge",
            "--aircraft",
            "ff_757",
            "--host",
            "10.0.0.5",
            "--serial-port",
            "/dev/ttyACM0",
            "--reconnect-delay-ms",
            "250",
        ]);
        assert_eq!(args.aircraft, Some(Aircraft::Ff757));

        let mut config = BridgeConfig::default();
        args.apply(&mut config);
        assert_eq!(config.xplane_host, "10.0.0.5");
        assert_eq!(config.xplane_port, 8086);
        assert_eq!(config.serial_port.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(config.reconnect_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_rejects_unknown_aircraft() {
        assert!(Args::try_parse_from(["panelbridge", "--aircraft", "a320"]).is_err());
    }
}
