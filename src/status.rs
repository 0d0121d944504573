//! Status payload decoding
//!
//! A QUERY response carries a fixed 18-byte single-zone block, optionally
//! followed by a right-zone extension on dual-zone fridges. The physical
//! layout is never configured: a device is dual-zone exactly when its status
//! payload is long enough to carry the extension.

use crate::types::{BatteryProtection, FridgeError, Result};

/// Minimum payload length for a valid single-zone status
const MIN_STATUS_LEN: usize = 18;

/// Payload length at which the right-zone extension is present
const DUAL_ZONE_LEN: usize = 28;

/// Reinterpret an unsigned byte as a signed byte (two's complement)
pub fn to_signed_byte(b: u8) -> i8 {
    b as i8
}

/// Reinterpret a signed byte as its unsigned wire form
pub fn to_unsigned_byte(v: i8) -> u8 {
    v as u8
}

/// Right-zone extension of a dual-zone status payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RightZone {
    pub target: i8,
    /// Offsets 19-20 of the payload. Populated inconsistently across firmware
    /// variants; kept raw for diagnostics rather than interpreted.
    pub reserved: [u8; 2],
    pub ret_diff: i8,
    pub tc_hot: i8,
    pub tc_mid: i8,
    pub tc_cold: i8,
    pub tc_halt: i8,
    pub current: i8,
    pub running_status: u8,
}

/// Decoded fridge status
///
/// Temperature-like fields are signed bytes (-128..127). `right` is `Some`
/// only for dual-zone devices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRecord {
    pub locked: bool,
    pub powered_on: bool,
    pub run_mode: u8,
    pub bat_saver: u8,
    pub left_target: i8,
    pub temp_max: i8,
    pub temp_min: i8,
    pub left_ret_diff: i8,
    pub start_delay: u8,
    pub unit: u8,
    pub left_tc_hot: i8,
    pub left_tc_mid: i8,
    pub left_tc_cold: i8,
    pub left_tc_halt: i8,
    pub left_current: i8,
    pub bat_percent: u8,
    pub bat_vol_int: u8,
    pub bat_vol_dec: u8,
    pub right: Option<RightZone>,
}

impl StatusRecord {
    /// Whether this status came from a dual-zone fridge
    pub fn is_dual_zone(&self) -> bool {
        self.right.is_some()
    }

    /// Battery voltage composed from its integer and decimal bytes
    pub fn battery_voltage(&self) -> f32 {
        self.bat_vol_int as f32 + self.bat_vol_dec as f32 / 100.0
    }

    /// The `bat_saver` field as a battery protection level; fails on values
    /// no known firmware emits
    pub fn battery_protection(&self) -> Result<BatteryProtection> {
        BatteryProtection::from_u8(self.bat_saver)
    }
}

/// Decode a QUERY response payload into a [`StatusRecord`].
///
/// The payload may include trailing checksum bytes; only known offsets are
/// read. Fails if the payload is shorter than the single-zone block.
pub fn decode(payload: &[u8]) -> Result<StatusRecord> {
    if payload.len() < MIN_STATUS_LEN {
        return Err(FridgeError::StatusTooShort(payload.len()));
    }

    let right = if payload.len() >= DUAL_ZONE_LEN {
        Some(RightZone {
            target: to_signed_byte(payload[18]),
            reserved: [payload[19], payload[20]],
            ret_diff: to_signed_byte(payload[21]),
            tc_hot: to_signed_byte(payload[22]),
            tc_mid: to_signed_byte(payload[23]),
            tc_cold: to_signed_byte(payload[24]),
            tc_halt: to_signed_byte(payload[25]),
            current: to_signed_byte(payload[26]),
            running_status: payload[27],
        })
    } else {
        None
    };

    Ok(StatusRecord {
        locked: payload[0] != 0,
        powered_on: payload[1] != 0,
        run_mode: payload[2],
        bat_saver: payload[3],
        left_target: to_signed_byte(payload[4]),
        temp_max: to_signed_byte(payload[5]),
        temp_min: to_signed_byte(payload[6]),
        left_ret_diff: to_signed_byte(payload[7]),
        start_delay: payload[8],
        unit: payload[9],
        left_tc_hot: to_signed_byte(payload[10]),
        left_tc_mid: to_signed_byte(payload[11]),
        left_tc_cold: to_signed_byte(payload[12]),
        left_tc_halt: to_signed_byte(payload[13]),
        left_current: to_signed_byte(payload[14]),
        bat_percent: payload[15],
        bat_vol_int: payload[16],
        bat_vol_dec: payload[17],
        right,
    })
}
