//! fridged: poll an Alpicool-compatible BLE fridge and log its status

use clap::Parser;
use fridged::{
    AvailabilitySnapshot, BleFridgeTransport, LinkSession, PollSupervisor, SessionConfig,
    SnapshotListener, SupervisorConfig,
};
use log::info;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(name = "fridged", about = "BLE polling daemon for Alpicool-compatible fridges")]
struct Args {
    /// Bluetooth MAC address of the fridge (format: AA:BB:CC:DD:EE:FF)
    #[arg(value_name = "MAC_ADDRESS")]
    mac_address: String,

    /// Bluetooth adapter name (default: system default adapter)
    #[arg(long)]
    adapter: Option<String>,

    /// Poll interval while connected, in seconds
    #[arg(long, default_value = "30")]
    poll_interval: u64,

    /// Delay between reconnect attempts while disconnected, in seconds
    #[arg(long, default_value = "60")]
    reconnect_backoff: u64,

    /// Seconds without a successful query before the fridge is declared
    /// unavailable
    #[arg(long, default_value = "300")]
    staleness_timeout: u64,

    /// Seconds to wait for a QUERY response
    #[arg(long, default_value = "10")]
    query_timeout: u64,

    /// Repeat the BIND handshake on every reconnect (some firmware needs it)
    #[arg(long)]
    bind_on_reconnect: bool,
}

struct LoggingListener;

impl SnapshotListener for LoggingListener {
    fn on_snapshot_changed(&self, snapshot: &AvailabilitySnapshot) {
        match &snapshot.status {
            Some(status) => {
                let right = status
                    .right
                    .as_ref()
                    .map(|r| format!(", right {}° (current {}°)", r.target, r.current))
                    .unwrap_or_default();
                let protection = status
                    .battery_protection()
                    .map(|p| p.to_string())
                    .unwrap_or_else(|_| format!("level {}", status.bat_saver));
                info!(
                    "Fridge: power {}, left {}° (current {}°){}, battery {}% {:.2}V, protection {}",
                    if status.powered_on { "on" } else { "off" },
                    status.left_target,
                    status.left_current,
                    right,
                    status.bat_percent,
                    status.battery_voltage(),
                    protection,
                );
            }
            None => info!(
                "Fridge unavailable{}",
                if snapshot.is_available { "" } else { " (no data)" }
            ),
        }
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let ble_session = bluer::Session::new().await?;
    let adapter = match &args.adapter {
        Some(name) => ble_session.adapter(name)?,
        None => ble_session.default_adapter().await?,
    };
    adapter.set_powered(true).await?;
    info!(
        "Using adapter {} for fridge {}",
        adapter.name(),
        args.mac_address
    );

    let session_config = SessionConfig {
        query_timeout: Duration::from_secs(args.query_timeout),
        bind_on_reconnect: args.bind_on_reconnect,
        ..Default::default()
    };
    let supervisor_config = SupervisorConfig {
        poll_interval: Duration::from_secs(args.poll_interval),
        reconnect_backoff: Duration::from_secs(args.reconnect_backoff),
        staleness_threshold: Duration::from_secs(args.staleness_timeout),
    };

    let transport = Arc::new(BleFridgeTransport::new(&adapter, &args.mac_address)?);
    let session = Arc::new(LinkSession::new(transport, session_config));
    let supervisor = Arc::new(PollSupervisor::new(session, supervisor_config));
    supervisor.subscribe(Box::new(LoggingListener));

    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let runner = {
        let supervisor = Arc::clone(&supervisor);
        tokio::spawn(async move { supervisor.run(shutdown_rx).await })
    };

    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received, shutting down");
    let _ = shutdown_tx.send(()).await;
    runner.await?;

    Ok(())
}
