//! Alpicool-compatible BLE fridge protocol engine
//!
//! This library talks to battery-powered compressor fridges over a BLE GATT
//! link using their proprietary framed protocol: frame reassembly over the
//! notification byte stream, checksum validation, status decoding (including
//! the variable-length dual-zone extension), the connect/bind handshake, and
//! a supervising poll loop with staleness detection and reconnect backoff.
//!
//! # Modules
//!
//! - `checksum`: additive 8/16-bit checksums
//! - `packet`: frame encoding and streaming reassembly
//! - `status`: QUERY response decoding
//! - `command`: SET payload construction and temperature commands
//! - `session`: connection lifecycle and request/response handling
//! - `supervisor`: polling, availability, and reconnection
//! - `ble`: BlueZ transport implementation

pub mod ble;
pub mod checksum;
pub mod command;
pub mod packet;
pub mod session;
pub mod status;
pub mod supervisor;
pub mod types;

pub use ble::{BleFridgeTransport, FRIDGE_NOTIFY_UUID, FRIDGE_RW_CHARACTERISTIC_UUID};
pub use command::{build_set_payload, reset_frame, set_frame, temperature_frame, StatusPatch};
pub use packet::{encode, Frame, FrameBuffer, BIND_FRAME, QUERY_FRAME};
pub use session::{
    FridgeTransport, LinkSession, SessionConfig, SessionState, WriteCapabilities, WriteMode,
};
pub use status::{decode, RightZone, StatusRecord};
pub use supervisor::{AvailabilitySnapshot, PollSupervisor, SnapshotListener, SupervisorConfig};
pub use types::{BatteryProtection, FridgeError, Request, Result, Zone};
