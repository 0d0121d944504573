//! BLE link session: connect/bind handshake, request/response handling
//!
//! One `LinkSession` owns one physical connection. All inbound notification
//! bytes flow through a single reader task that reassembles frames and wakes
//! the (at most one) registered response waiter. Query and send paths are
//! serialized through an operation gate because the protocol has no request
//! IDs: a response is attributed to whatever query is currently in flight.

use crate::packet::{Frame, FrameBuffer, BIND_FRAME, QUERY_FRAME};
use crate::status::{self, StatusRecord};
use crate::types::{FridgeError, Request, Result};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex as AsyncMutex};
use tokio::time::{sleep, timeout};

/// Write modes advertised by the read/write characteristic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteCapabilities {
    pub write: bool,
    pub write_without_response: bool,
}

/// Write mode selected from the characteristic properties
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    WithoutResponse,
    WithResponse,
}

/// Lifecycle of a link session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    CharacteristicsDiscovered,
    NotifyActive,
    Bound,
    Ready,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Disconnected => write!(f, "Disconnected"),
            SessionState::Connecting => write!(f, "Connecting"),
            SessionState::CharacteristicsDiscovered => write!(f, "CharacteristicsDiscovered"),
            SessionState::NotifyActive => write!(f, "NotifyActive"),
            SessionState::Bound => write!(f, "Bound"),
            SessionState::Ready => write!(f, "Ready"),
        }
    }
}

/// Trait for the BLE operations a session needs from the platform
#[async_trait]
pub trait FridgeTransport: Send + Sync {
    /// Establish the transport-level connection
    async fn connect(&self) -> Result<()>;

    /// Tear down the transport-level connection
    async fn disconnect(&self) -> Result<()>;

    /// Resolve the protocol characteristics and report the write modes the
    /// read/write characteristic advertises
    async fn discover(&self) -> Result<WriteCapabilities>;

    /// Write a frame to the read/write characteristic
    async fn write(&self, data: &[u8], with_response: bool) -> Result<()>;

    /// Subscribe to notifications, forwarding every inbound chunk to `sink`
    async fn start_notifications(&self, sink: mpsc::Sender<Vec<u8>>) -> Result<()>;

    /// Unsubscribe from notifications
    async fn stop_notifications(&self) -> Result<()>;

    /// Whether the transport currently reports a live connection
    async fn is_connected(&self) -> bool;
}

/// Timeouts and handshake policy for a session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Maximum time for the transport-level connect
    pub connect_timeout: Duration,

    /// Maximum time to wait for a QUERY response frame
    pub query_timeout: Duration,

    /// Maximum time to wait for the BIND echo; expiry is not fatal since
    /// some firmware never echoes BIND
    pub bind_timeout: Duration,

    /// Delay between a SET write and the confirming QUERY
    pub settle_delay: Duration,

    /// Whether to repeat the BIND handshake on every reconnect. Firmware
    /// variants disagree on whether this is required; default is first
    /// connect only.
    pub bind_on_reconnect: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(20),
            query_timeout: Duration::from_secs(10),
            bind_timeout: Duration::from_secs(3),
            settle_delay: Duration::from_millis(500),
            bind_on_reconnect: false,
        }
    }
}

/// Shared session state touched by the reader task and the operation paths
struct SessionShared {
    state: SessionState,
    write_mode: Option<WriteMode>,
    query_waiter: Option<oneshot::Sender<Vec<u8>>>,
    bind_waiter: Option<oneshot::Sender<()>>,
    bound_once: bool,
    /// Incremented per reader task; lets a superseded reader tell that it no
    /// longer owns the link
    reader_epoch: u64,
}

impl SessionShared {
    fn new() -> Self {
        Self {
            state: SessionState::Disconnected,
            write_mode: None,
            query_waiter: None,
            bind_waiter: None,
            bound_once: false,
            reader_epoch: 0,
        }
    }
}

/// One logical session with one fridge
pub struct LinkSession {
    transport: Arc<dyn FridgeTransport>,
    config: SessionConfig,
    shared: Arc<Mutex<SessionShared>>,
    /// Serializes query/send/set paths; responses carry no request ID
    ops: AsyncMutex<()>,
    reader_shutdown: Mutex<Option<mpsc::Sender<()>>>,
}

impl LinkSession {
    /// Create a session over the given transport
    pub fn new(transport: Arc<dyn FridgeTransport>, config: SessionConfig) -> Self {
        Self {
            transport,
            config,
            shared: Arc::new(Mutex::new(SessionShared::new())),
            ops: AsyncMutex::new(()),
            reader_shutdown: Mutex::new(None),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.shared.lock().unwrap().state
    }

    /// Whether commands may be issued
    pub fn is_ready(&self) -> bool {
        self.state() == SessionState::Ready
    }

    fn set_state(&self, state: SessionState) {
        let mut shared = self.shared.lock().unwrap();
        if shared.state != state {
            debug!("Session state: {} -> {}", shared.state, state);
            shared.state = state;
        }
    }

    fn require_ready(&self) -> Result<()> {
        let state = self.state();
        if state == SessionState::Ready {
            Ok(())
        } else {
            Err(FridgeError::NotReady(state.to_string()))
        }
    }

    /// Run the full connect sequence: transport connect, characteristic
    /// discovery, notification subscription, and the optional BIND handshake.
    ///
    /// Any failure tears the session back down to `Disconnected`; partial
    /// handshake state is never reused across attempts.
    pub async fn connect(&self) -> Result<()> {
        if self.is_ready() {
            return Ok(());
        }
        self.set_state(SessionState::Connecting);

        match self.establish().await {
            Ok(()) => {
                self.set_state(SessionState::Ready);
                info!("Session ready");
                Ok(())
            }
            Err(e) => {
                warn!("Connect failed: {}", e);
                self.disconnect().await;
                Err(e)
            }
        }
    }

    async fn establish(&self) -> Result<()> {
        timeout(self.config.connect_timeout, self.transport.connect())
            .await
            .map_err(|_| FridgeError::Timeout)??;

        let caps = self.transport.discover().await?;
        let mode = if caps.write_without_response {
            WriteMode::WithoutResponse
        } else if caps.write {
            WriteMode::WithResponse
        } else {
            return Err(FridgeError::NoUsableWriteMode);
        };
        debug!("Selected write mode: {:?}", mode);
        self.shared.lock().unwrap().write_mode = Some(mode);
        self.set_state(SessionState::CharacteristicsDiscovered);

        let (notify_tx, notify_rx) = mpsc::channel::<Vec<u8>>(32);
        self.transport.start_notifications(notify_tx).await?;
        self.spawn_reader(notify_rx);
        self.set_state(SessionState::NotifyActive);

        let should_bind = {
            let shared = self.shared.lock().unwrap();
            !shared.bound_once || self.config.bind_on_reconnect
        };
        if should_bind {
            self.bind().await?;
        } else {
            debug!("Skipping BIND on reconnect");
        }

        Ok(())
    }

    /// Send BIND and wait briefly for its echo. A missing echo is tolerated:
    /// the session proceeds regardless.
    async fn bind(&self) -> Result<()> {
        let rx = {
            let mut shared = self.shared.lock().unwrap();
            let (tx, rx) = oneshot::channel();
            shared.bind_waiter = Some(tx);
            rx
        };

        self.write_frame(&BIND_FRAME).await?;

        match timeout(self.config.bind_timeout, rx).await {
            Ok(Ok(())) => {
                info!("BIND acknowledged");
                self.set_state(SessionState::Bound);
            }
            _ => {
                self.shared.lock().unwrap().bind_waiter = None;
                warn!("No BIND echo within {:?}; proceeding anyway", self.config.bind_timeout);
            }
        }
        self.shared.lock().unwrap().bound_once = true;
        Ok(())
    }

    /// Spawn the reader task owning the frame buffer for this connection.
    /// A fresh buffer per connection discards any partial frame from a
    /// previous link.
    fn spawn_reader(&self, mut notify_rx: mpsc::Receiver<Vec<u8>>) {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        if let Some(old) = self.reader_shutdown.lock().unwrap().replace(shutdown_tx) {
            let _ = old.try_send(());
        }

        let shared = Arc::clone(&self.shared);
        let epoch = {
            let mut guard = shared.lock().unwrap();
            guard.reader_epoch += 1;
            guard.reader_epoch
        };
        tokio::spawn(async move {
            let mut frame_buffer = FrameBuffer::new();
            loop {
                tokio::select! {
                    chunk = notify_rx.recv() => {
                        match chunk {
                            Some(bytes) => {
                                debug!("Notification chunk: {} bytes", bytes.len());
                                for frame in frame_buffer.feed(&bytes) {
                                    Self::dispatch_frame(&shared, frame);
                                }
                            }
                            None => {
                                // The notify stream died under us; without a
                                // dispatcher the session can never answer a
                                // query, so the link must go down for the
                                // supervisor's reconnect path to engage
                                warn!("Notification channel closed; dropping link");
                                Self::fail_link(&shared, epoch);
                                break;
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        debug!("Reader shutdown requested");
                        break;
                    }
                }
            }
        });
    }

    /// Mark the session disconnected from inside the reader task, unless a
    /// newer reader has already taken over the link
    fn fail_link(shared: &Mutex<SessionShared>, epoch: u64) {
        let mut guard = shared.lock().unwrap();
        if guard.reader_epoch != epoch {
            return;
        }
        // Dropping the senders resolves pending waits as Cancelled
        guard.query_waiter = None;
        guard.bind_waiter = None;
        guard.write_mode = None;
        if guard.state != SessionState::Disconnected {
            debug!("Session state: {} -> Disconnected", guard.state);
            guard.state = SessionState::Disconnected;
        }
    }

    /// Route one reassembled frame. QUERY responses wake the registered
    /// waiter; BIND echoes complete the handshake; SET-family echoes are
    /// write-acknowledgement noise and are dropped.
    fn dispatch_frame(shared: &Mutex<SessionShared>, frame: Frame) {
        let mut guard = shared.lock().unwrap();
        match Request::from_u8(frame.command) {
            Ok(Request::Query) => {
                if let Some(waiter) = guard.query_waiter.take() {
                    let _ = waiter.send(frame.payload);
                } else {
                    debug!("Unsolicited status frame ({} bytes)", frame.payload.len());
                }
            }
            Ok(Request::Bind) => {
                if let Some(waiter) = guard.bind_waiter.take() {
                    let _ = waiter.send(());
                } else {
                    debug!("Stray BIND echo");
                }
            }
            Ok(cmd @ (Request::Set | Request::SetLeft | Request::SetRight | Request::Reset)) => {
                debug!("Discarding {} echo frame", cmd);
            }
            Err(_) => {
                debug!("Frame with unknown command {:#04x}", frame.command);
            }
        }
    }

    /// Issue a QUERY and wait for the decoded status response.
    ///
    /// Fails with `Timeout` when nothing answers within the deadline (the
    /// routine failure mode on a lossy link) and with `Cancelled` when the
    /// session is torn down mid-wait.
    pub async fn query(&self) -> Result<StatusRecord> {
        let _gate = self.ops.lock().await;
        self.query_locked().await
    }

    async fn query_locked(&self) -> Result<StatusRecord> {
        self.require_ready()?;

        let rx = {
            let mut shared = self.shared.lock().unwrap();
            let (tx, rx) = oneshot::channel();
            shared.query_waiter = Some(tx);
            rx
        };

        if let Err(e) = self.write_frame(&QUERY_FRAME).await {
            self.shared.lock().unwrap().query_waiter = None;
            return Err(e);
        }

        match timeout(self.config.query_timeout, rx).await {
            Ok(Ok(payload)) => status::decode(&payload),
            Ok(Err(_)) => Err(FridgeError::Cancelled),
            Err(_) => {
                // Clear the stale waiter so a late response is not
                // misattributed to the next query
                self.shared.lock().unwrap().query_waiter = None;
                Err(FridgeError::Timeout)
            }
        }
    }

    /// Send a pre-encoded frame through the operation gate
    pub async fn send(&self, frame: &[u8]) -> Result<()> {
        let _gate = self.ops.lock().await;
        self.require_ready()?;
        self.write_frame(frame).await
    }

    /// Send a pre-encoded command frame, give the firmware a moment to apply
    /// it, then query the new status on the same gate so no other request
    /// can interleave between the write and its confirmation.
    pub async fn send_and_confirm(&self, frame: &[u8]) -> Result<StatusRecord> {
        let _gate = self.ops.lock().await;
        self.require_ready()?;
        self.write_frame(frame).await?;
        sleep(self.config.settle_delay).await;
        self.query_locked().await
    }

    async fn write_frame(&self, frame: &[u8]) -> Result<()> {
        if !self.transport.is_connected().await {
            self.set_state(SessionState::Disconnected);
            return Err(FridgeError::NotConnected);
        }
        let with_response = match self.shared.lock().unwrap().write_mode {
            Some(WriteMode::WithResponse) => true,
            Some(WriteMode::WithoutResponse) => false,
            None => return Err(FridgeError::NotReady(self.state().to_string())),
        };
        self.transport.write(frame, with_response).await
    }

    /// Tear the session down. In-flight waits resolve as `Cancelled`, never
    /// as `Timeout`, so callers can tell "nobody answered" from "the session
    /// went away".
    pub async fn disconnect(&self) {
        if let Some(tx) = self.reader_shutdown.lock().unwrap().take() {
            let _ = tx.try_send(());
        }
        if let Err(e) = self.transport.stop_notifications().await {
            debug!("stop_notifications failed during teardown: {}", e);
        }
        if let Err(e) = self.transport.disconnect().await {
            debug!("Transport disconnect failed during teardown: {}", e);
        }

        let mut shared = self.shared.lock().unwrap();
        // Dropping the senders resolves pending waits as Cancelled
        shared.query_waiter = None;
        shared.bind_waiter = None;
        shared.write_mode = None;
        if shared.state != SessionState::Disconnected {
            debug!("Session state: {} -> Disconnected", shared.state);
            shared.state = SessionState::Disconnected;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::sum16;
    use crate::packet::PREAMBLE;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Build a status response frame as the fridge would emit it
    fn status_frame(payload: &[u8]) -> Vec<u8> {
        let mut frame = Vec::new();
        frame.extend_from_slice(&PREAMBLE);
        frame.push((payload.len() + 3) as u8);
        frame.push(Request::Query.to_u8());
        frame.extend_from_slice(payload);
        let checksum = sum16(&frame);
        frame.extend_from_slice(&checksum.to_be_bytes());
        frame
    }

    fn single_zone_payload() -> Vec<u8> {
        vec![0, 1, 0, 0, 5, 20, 236, 1, 0, 0, 10, 5, 0, 20, 8, 75, 12, 5]
    }

    struct MockTransport {
        connected: AtomicBool,
        caps: WriteCapabilities,
        answer_queries: AtomicBool,
        echo_bind: AtomicBool,
        sink: Mutex<Option<mpsc::Sender<Vec<u8>>>>,
        writes: Mutex<Vec<Vec<u8>>>,
    }

    impl MockTransport {
        fn new() -> Self {
            Self::with_caps(WriteCapabilities {
                write: true,
                write_without_response: true,
            })
        }

        fn with_caps(caps: WriteCapabilities) -> Self {
            Self {
                connected: AtomicBool::new(false),
                caps,
                answer_queries: AtomicBool::new(true),
                echo_bind: AtomicBool::new(true),
                sink: Mutex::new(None),
                writes: Mutex::new(Vec::new()),
            }
        }

        fn sender(&self) -> mpsc::Sender<Vec<u8>> {
            self.sink.lock().unwrap().clone().expect("notifications not started")
        }

        async fn notify(&self, bytes: Vec<u8>) {
            self.sender().send(bytes).await.unwrap();
        }
    }

    #[async_trait]
    impl FridgeTransport for MockTransport {
        async fn connect(&self) -> Result<()> {
            self.connected.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn disconnect(&self) -> Result<()> {
            self.connected.store(false, Ordering::SeqCst);
            Ok(())
        }

        async fn discover(&self) -> Result<WriteCapabilities> {
            Ok(self.caps)
        }

        async fn write(&self, data: &[u8], _with_response: bool) -> Result<()> {
            self.writes.lock().unwrap().push(data.to_vec());
            if data == BIND_FRAME && self.echo_bind.load(Ordering::SeqCst) {
                self.notify(BIND_FRAME.to_vec()).await;
            }
            if data == QUERY_FRAME && self.answer_queries.load(Ordering::SeqCst) {
                self.notify(status_frame(&single_zone_payload())).await;
            }
            Ok(())
        }

        async fn start_notifications(&self, sink: mpsc::Sender<Vec<u8>>) -> Result<()> {
            *self.sink.lock().unwrap() = Some(sink);
            Ok(())
        }

        async fn stop_notifications(&self) -> Result<()> {
            *self.sink.lock().unwrap() = None;
            Ok(())
        }

        async fn is_connected(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }
    }

    fn fast_config() -> SessionConfig {
        SessionConfig {
            connect_timeout: Duration::from_millis(200),
            query_timeout: Duration::from_millis(200),
            bind_timeout: Duration::from_millis(100),
            settle_delay: Duration::from_millis(10),
            bind_on_reconnect: false,
        }
    }

    #[tokio::test]
    async fn test_connect_reaches_ready_with_bind_echo() {
        let transport = Arc::new(MockTransport::new());
        let session = LinkSession::new(transport.clone(), fast_config());

        session.connect().await.unwrap();
        assert_eq!(session.state(), SessionState::Ready);

        let writes = transport.writes.lock().unwrap();
        assert_eq!(writes[0], BIND_FRAME.to_vec());
    }

    #[tokio::test]
    async fn test_connect_ready_without_bind_echo() {
        let transport = Arc::new(MockTransport::new());
        transport.echo_bind.store(false, Ordering::SeqCst);
        let session = LinkSession::new(transport, fast_config());

        session.connect().await.unwrap();
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn test_bind_skipped_on_reconnect() {
        let transport = Arc::new(MockTransport::new());
        let session = LinkSession::new(transport.clone(), fast_config());

        session.connect().await.unwrap();
        session.disconnect().await;
        session.connect().await.unwrap();

        let bind_count = transport
            .writes
            .lock()
            .unwrap()
            .iter()
            .filter(|w| w.as_slice() == BIND_FRAME)
            .count();
        assert_eq!(bind_count, 1);
    }

    #[tokio::test]
    async fn test_bind_repeated_when_configured() {
        let transport = Arc::new(MockTransport::new());
        let mut config = fast_config();
        config.bind_on_reconnect = true;
        let session = LinkSession::new(transport.clone(), config);

        session.connect().await.unwrap();
        session.disconnect().await;
        session.connect().await.unwrap();

        let bind_count = transport
            .writes
            .lock()
            .unwrap()
            .iter()
            .filter(|w| w.as_slice() == BIND_FRAME)
            .count();
        assert_eq!(bind_count, 2);
    }

    #[tokio::test]
    async fn test_no_usable_write_mode() {
        let transport = Arc::new(MockTransport::with_caps(WriteCapabilities {
            write: false,
            write_without_response: false,
        }));
        let session = LinkSession::new(transport, fast_config());

        let err = session.connect().await.unwrap_err();
        assert!(matches!(err, FridgeError::NoUsableWriteMode));
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn test_query_returns_decoded_status() {
        let transport = Arc::new(MockTransport::new());
        let session = LinkSession::new(transport, fast_config());
        session.connect().await.unwrap();

        let status = session.query().await.unwrap();
        assert_eq!(status.left_target, 5);
        assert_eq!(status.temp_min, -20);
        assert!(!status.is_dual_zone());
    }

    #[tokio::test]
    async fn test_query_before_connect_fails_fast() {
        let transport = Arc::new(MockTransport::new());
        let session = LinkSession::new(transport, fast_config());

        let err = session.query().await.unwrap_err();
        assert!(matches!(err, FridgeError::NotReady(_)));
    }

    #[tokio::test]
    async fn test_query_timeout() {
        let transport = Arc::new(MockTransport::new());
        transport.answer_queries.store(false, Ordering::SeqCst);
        let session = LinkSession::new(transport, fast_config());
        session.connect().await.unwrap();

        let err = session.query().await.unwrap_err();
        assert!(matches!(err, FridgeError::Timeout));
    }

    #[tokio::test]
    async fn test_query_cancelled_by_disconnect() {
        let transport = Arc::new(MockTransport::new());
        transport.answer_queries.store(false, Ordering::SeqCst);
        let mut config = fast_config();
        config.query_timeout = Duration::from_secs(5);
        let session = Arc::new(LinkSession::new(transport, config));
        session.connect().await.unwrap();

        let querier = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.query().await })
        };
        sleep(Duration::from_millis(50)).await;
        session.disconnect().await;

        let err = querier.await.unwrap().unwrap_err();
        assert!(matches!(err, FridgeError::Cancelled));
    }

    #[tokio::test]
    async fn test_notify_stream_death_drops_link() {
        let transport = Arc::new(MockTransport::new());
        let session = LinkSession::new(transport.clone(), fast_config());
        session.connect().await.unwrap();
        assert_eq!(session.state(), SessionState::Ready);

        // The notification path dies while the transport stays connected
        *transport.sink.lock().unwrap() = None;
        sleep(Duration::from_millis(50)).await;

        assert_eq!(session.state(), SessionState::Disconnected);
        let err = session.query().await.unwrap_err();
        assert!(matches!(err, FridgeError::NotReady(_)));
    }

    #[tokio::test]
    async fn test_notify_stream_death_cancels_pending_query() {
        let transport = Arc::new(MockTransport::new());
        transport.answer_queries.store(false, Ordering::SeqCst);
        let mut config = fast_config();
        config.query_timeout = Duration::from_secs(5);
        let session = Arc::new(LinkSession::new(transport.clone(), config));
        session.connect().await.unwrap();

        let querier = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.query().await })
        };
        sleep(Duration::from_millis(50)).await;
        *transport.sink.lock().unwrap() = None;

        let err = querier.await.unwrap().unwrap_err();
        assert!(matches!(err, FridgeError::Cancelled));
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn test_reconnect_after_notify_stream_death() {
        let transport = Arc::new(MockTransport::new());
        let session = LinkSession::new(transport.clone(), fast_config());
        session.connect().await.unwrap();

        *transport.sink.lock().unwrap() = None;
        sleep(Duration::from_millis(50)).await;
        assert_eq!(session.state(), SessionState::Disconnected);

        session.connect().await.unwrap();
        assert_eq!(session.state(), SessionState::Ready);
        let status = session.query().await.unwrap();
        assert_eq!(status.bat_percent, 75);
    }

    #[tokio::test]
    async fn test_echo_frames_are_discarded() {
        let transport = Arc::new(MockTransport::new());
        transport.answer_queries.store(false, Ordering::SeqCst);
        let session = LinkSession::new(transport.clone(), fast_config());
        session.connect().await.unwrap();

        // A SET echo followed by a real status response in one delivery
        let mut bytes = crate::packet::encode(Request::Set, &[0; 14]);
        bytes.extend_from_slice(&status_frame(&single_zone_payload()));

        let session = Arc::new(session);
        let querier = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.query().await })
        };
        sleep(Duration::from_millis(50)).await;
        transport.notify(bytes).await;

        let status = querier.await.unwrap().unwrap();
        assert_eq!(status.bat_percent, 75);
    }

    #[tokio::test]
    async fn test_send_and_confirm() {
        let transport = Arc::new(MockTransport::new());
        let session = LinkSession::new(transport.clone(), fast_config());
        session.connect().await.unwrap();

        let frame = crate::command::temperature_frame(crate::types::Zone::Left, -5);
        let status = session.send_and_confirm(&frame).await.unwrap();
        assert_eq!(status.bat_percent, 75);

        let writes = transport.writes.lock().unwrap();
        assert!(writes.iter().any(|w| w.as_slice() == frame.as_slice()));
    }
}
