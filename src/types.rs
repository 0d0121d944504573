//! Common types, enums, and error definitions for the fridge protocol

use std::fmt;
use thiserror::Error;

/// Result type alias for fridge operations
pub type Result<T> = std::result::Result<T, FridgeError>;

/// Error types for fridge communication
#[derive(Error, Debug)]
pub enum FridgeError {
    #[error("Bluetooth error: {0}")]
    Bluetooth(String),

    #[error("Characteristic {0} not found on device")]
    MissingCharacteristic(String),

    #[error("Write characteristic advertises neither write mode")]
    NoUsableWriteMode,

    #[error("Not connected")]
    NotConnected,

    #[error("Session not ready (state: {0})")]
    NotReady(String),

    #[error("Timed out waiting for a response")]
    Timeout,

    #[error("Wait cancelled by session teardown")]
    Cancelled,

    #[error("Status payload too short: {0} bytes (need at least 18)")]
    StatusTooShort(usize),

    #[error("No baseline status available yet")]
    NoBaseline,

    #[error("Unknown request code: {0:#04x}")]
    UnknownRequest(u8),

    #[error("Unknown battery protection level: {0}")]
    UnknownBatteryProtection(u8),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Wire command codes understood by the fridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Request {
    Bind = 0x00,
    Query = 0x01,
    Set = 0x02,
    Reset = 0x04,
    SetLeft = 0x05,
    SetRight = 0x06,
}

impl Request {
    /// Convert a byte to a Request
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0x00 => Ok(Request::Bind),
            0x01 => Ok(Request::Query),
            0x02 => Ok(Request::Set),
            0x04 => Ok(Request::Reset),
            0x05 => Ok(Request::SetLeft),
            0x06 => Ok(Request::SetRight),
            _ => Err(FridgeError::UnknownRequest(value)),
        }
    }

    /// Convert Request to a byte
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Bind => write!(f, "BIND"),
            Request::Query => write!(f, "QUERY"),
            Request::Set => write!(f, "SET"),
            Request::Reset => write!(f, "RESET"),
            Request::SetLeft => write!(f, "SET_LEFT"),
            Request::SetRight => write!(f, "SET_RIGHT"),
        }
    }
}

/// A temperature-controlled compartment. Single-zone fridges only expose
/// `Left`; dual-zone fridges also expose `Right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Left,
    Right,
}

impl Zone {
    /// The single-field temperature command for this zone
    pub fn temperature_request(self) -> Request {
        match self {
            Zone::Left => Request::SetLeft,
            Zone::Right => Request::SetRight,
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Left => write!(f, "left"),
            Zone::Right => write!(f, "right"),
        }
    }
}

/// Battery protection levels reported in the `bat_saver` status field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BatteryProtection {
    Low = 0,
    Medium = 1,
    High = 2,
}

impl BatteryProtection {
    /// Convert a byte to a BatteryProtection level
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(BatteryProtection::Low),
            1 => Ok(BatteryProtection::Medium),
            2 => Ok(BatteryProtection::High),
            _ => Err(FridgeError::UnknownBatteryProtection(value)),
        }
    }

    /// Convert BatteryProtection to a byte
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for BatteryProtection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatteryProtection::Low => write!(f, "Low"),
            BatteryProtection::Medium => write!(f, "Medium"),
            BatteryProtection::High => write!(f, "High"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_conversion() {
        assert_eq!(Request::from_u8(0x00).unwrap(), Request::Bind);
        assert_eq!(Request::from_u8(0x01).unwrap(), Request::Query);
        assert_eq!(Request::from_u8(0x06).unwrap(), Request::SetRight);
        assert!(Request::from_u8(0x03).is_err());
        assert!(Request::from_u8(0xFF).is_err());
    }

    #[test]
    fn test_request_to_u8() {
        assert_eq!(Request::Query.to_u8(), 0x01);
        assert_eq!(Request::Reset.to_u8(), 0x04);
    }

    #[test]
    fn test_zone_temperature_request() {
        assert_eq!(Zone::Left.temperature_request(), Request::SetLeft);
        assert_eq!(Zone::Right.temperature_request(), Request::SetRight);
    }

    #[test]
    fn test_battery_protection_conversion() {
        assert_eq!(
            BatteryProtection::from_u8(1).unwrap(),
            BatteryProtection::Medium
        );
        assert!(BatteryProtection::from_u8(3).is_err());
    }
}
