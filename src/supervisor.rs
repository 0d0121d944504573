//! Polling supervisor: keeps the link alive and publishes status snapshots
//!
//! The supervisor runs one cooperative loop per fridge. Each cycle it
//! reconnects if needed, queries the status, updates the availability
//! snapshot, and notifies listeners. A single missed poll is routine on a
//! lossy BLE link; the device only becomes unavailable after a sustained
//! staleness window, at which point the cached status is cleared atomically
//! so consumers never see a half-stale record.

use crate::command::{self, StatusPatch};
use crate::session::LinkSession;
use crate::status::StatusRecord;
use crate::types::{FridgeError, Result, Zone};
use log::{debug, info, warn};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::sleep;

/// Configuration for the poll supervisor
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Poll cadence while the session is ready
    pub poll_interval: Duration,

    /// Sleep between reconnect attempts while the link is down. Fixed, not
    /// exponential: the device's own reconnect cost bounds retry pressure.
    pub reconnect_backoff: Duration,

    /// Maximum tolerated time since the last successful query before the
    /// device is declared unavailable
    pub staleness_threshold: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            reconnect_backoff: Duration::from_secs(60),
            staleness_threshold: Duration::from_secs(300),
        }
    }
}

/// Last-known status plus availability, as published to consumers
#[derive(Debug, Clone, Default)]
pub struct AvailabilitySnapshot {
    /// Most recent decoded status; `None` when unavailable
    pub status: Option<StatusRecord>,

    /// False until the first successful query, and after sustained staleness
    pub is_available: bool,

    /// Time of the last successful query
    pub last_success: Option<Instant>,
}

/// Callback invoked after every poll cycle so consumers can re-read the
/// snapshot
pub trait SnapshotListener: Send + Sync {
    fn on_snapshot_changed(&self, snapshot: &AvailabilitySnapshot);
}

/// Supervises one fridge session: polling, reconnection, availability
pub struct PollSupervisor {
    session: Arc<LinkSession>,
    config: SupervisorConfig,
    snapshot: Mutex<AvailabilitySnapshot>,
    listeners: Mutex<Vec<Box<dyn SnapshotListener>>>,
}

impl PollSupervisor {
    /// Create a supervisor over an existing session
    pub fn new(session: Arc<LinkSession>, config: SupervisorConfig) -> Self {
        Self {
            session,
            config,
            snapshot: Mutex::new(AvailabilitySnapshot::default()),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Read-only copy of the current snapshot
    pub fn snapshot(&self) -> AvailabilitySnapshot {
        self.snapshot.lock().unwrap().clone()
    }

    /// Register a listener notified after every poll cycle and on shutdown
    pub fn subscribe(&self, listener: Box<dyn SnapshotListener>) {
        self.listeners.lock().unwrap().push(listener);
    }

    fn notify_listeners(&self) {
        let snapshot = self.snapshot();
        for listener in self.listeners.lock().unwrap().iter() {
            listener.on_snapshot_changed(&snapshot);
        }
    }

    /// All snapshot mutation funnels through here
    fn record_success(&self, status: StatusRecord) {
        let mut snapshot = self.snapshot.lock().unwrap();
        snapshot.status = Some(status);
        snapshot.is_available = true;
        snapshot.last_success = Some(Instant::now());
    }

    fn mark_unavailable(&self) {
        let mut snapshot = self.snapshot.lock().unwrap();
        snapshot.status = None;
        snapshot.is_available = false;
    }

    /// Clear the whole record once the last success is older than the
    /// staleness threshold. One missed poll is tolerated; a sustained gap is
    /// surfaced as "no data", never as stale data.
    fn check_staleness(&self) {
        let mut snapshot = self.snapshot.lock().unwrap();
        if !snapshot.is_available {
            return;
        }
        let stale = match snapshot.last_success {
            Some(at) => at.elapsed() > self.config.staleness_threshold,
            None => true,
        };
        if stale {
            warn!(
                "No successful query for over {:?}; marking unavailable",
                self.config.staleness_threshold
            );
            snapshot.status = None;
            snapshot.is_available = false;
        }
    }

    /// Run the poll loop until `shutdown` fires.
    ///
    /// Every failure inside the loop is converted into availability state;
    /// nothing propagates out. On exit the device is marked unavailable so
    /// no stale "available" state survives shutdown.
    pub async fn run(&self, mut shutdown: mpsc::Receiver<()>) {
        info!(
            "Poll supervisor started (poll {:?}, backoff {:?}, staleness {:?})",
            self.config.poll_interval, self.config.reconnect_backoff, self.config.staleness_threshold
        );

        loop {
            if !self.session.is_ready() {
                match self.session.connect().await {
                    Ok(()) => info!("Reconnected to fridge"),
                    Err(e) => debug!("Reconnect attempt failed: {}", e),
                }
            }

            if self.session.is_ready() {
                match self.session.query().await {
                    Ok(status) => {
                        debug!(
                            "Status update: target {}°, battery {}%",
                            status.left_target, status.bat_percent
                        );
                        self.record_success(status);
                    }
                    Err(FridgeError::Timeout) => {
                        warn!("Query timed out; keeping last status for now");
                    }
                    Err(e) => {
                        warn!("Query failed: {}", e);
                    }
                }
            }

            self.check_staleness();
            self.notify_listeners();

            let interval = if self.session.is_ready() {
                self.config.poll_interval
            } else {
                self.config.reconnect_backoff
            };
            tokio::select! {
                _ = sleep(interval) => {}
                _ = shutdown.recv() => {
                    info!("Poll supervisor shutting down");
                    break;
                }
            }
        }

        self.session.disconnect().await;
        self.mark_unavailable();
        self.notify_listeners();
    }

    /// Apply a partial settings change.
    ///
    /// The SET payload is the full settings block, so a baseline status must
    /// exist; callers are rejected with `NoBaseline` until the first
    /// successful query. The confirmed status updates the snapshot
    /// immediately.
    pub async fn set_values(&self, patch: &StatusPatch) -> Result<()> {
        let baseline = self
            .snapshot
            .lock()
            .unwrap()
            .status
            .clone()
            .ok_or(FridgeError::NoBaseline)?;

        let frame = command::set_frame(Some(&baseline), patch);
        let confirmed = self.session.send_and_confirm(&frame).await?;
        self.record_success(confirmed);
        self.notify_listeners();
        Ok(())
    }

    /// Set one zone's target temperature
    pub async fn set_temperature(&self, zone: Zone, celsius: i8) -> Result<()> {
        if self.snapshot.lock().unwrap().status.is_none() {
            return Err(FridgeError::NoBaseline);
        }

        let frame = command::temperature_frame(zone, celsius);
        let confirmed = self.session.send_and_confirm(&frame).await?;
        self.record_success(confirmed);
        self.notify_listeners();
        Ok(())
    }
}
