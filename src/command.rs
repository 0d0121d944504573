//! Outbound command construction
//!
//! The SET command carries the complete settings block, not a delta, so a
//! partial change is merged into the last known status before serializing.
//! Single-field temperature changes have their own commands per zone.

use crate::packet;
use crate::status::{to_unsigned_byte, StatusRecord};
use crate::types::{Request, Zone};

/// Defaults applied when no baseline status exists yet
const DEFAULT_POWERED_ON: bool = true;
const DEFAULT_TEMP_MAX: i8 = 20;
const DEFAULT_TEMP_MIN: i8 = -20;
const DEFAULT_RET_DIFF: i8 = 1;

/// A partial settings change. Fields left as `None` retain the value from
/// the baseline status (or the documented default when no baseline exists).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusPatch {
    pub locked: Option<bool>,
    pub powered_on: Option<bool>,
    pub run_mode: Option<u8>,
    pub bat_saver: Option<u8>,
    pub left_target: Option<i8>,
    pub temp_max: Option<i8>,
    pub temp_min: Option<i8>,
    pub left_ret_diff: Option<i8>,
    pub start_delay: Option<u8>,
    pub unit: Option<u8>,
    pub left_tc_hot: Option<i8>,
    pub left_tc_mid: Option<i8>,
    pub left_tc_cold: Option<i8>,
    pub left_tc_halt: Option<i8>,
    pub right_target: Option<i8>,
    pub right_ret_diff: Option<i8>,
    pub right_tc_hot: Option<i8>,
    pub right_tc_mid: Option<i8>,
    pub right_tc_cold: Option<i8>,
    pub right_tc_halt: Option<i8>,
}

impl StatusPatch {
    /// True when the patch changes nothing
    pub fn is_empty(&self) -> bool {
        *self == StatusPatch::default()
    }
}

/// Build the full SET payload by overlaying `patch` on `baseline`.
///
/// The single-zone block is always 14 bytes. The 11-byte right-zone block is
/// appended only when the baseline identifies a dual-zone device; its pad
/// bytes are zero on the wire for every observed firmware.
pub fn build_set_payload(baseline: Option<&StatusRecord>, patch: &StatusPatch) -> Vec<u8> {
    let locked = patch
        .locked
        .unwrap_or_else(|| baseline.map(|s| s.locked).unwrap_or(false));
    let powered_on = patch
        .powered_on
        .unwrap_or_else(|| baseline.map(|s| s.powered_on).unwrap_or(DEFAULT_POWERED_ON));
    let run_mode = patch
        .run_mode
        .unwrap_or_else(|| baseline.map(|s| s.run_mode).unwrap_or(0));
    let bat_saver = patch
        .bat_saver
        .unwrap_or_else(|| baseline.map(|s| s.bat_saver).unwrap_or(0));
    let left_target = patch
        .left_target
        .unwrap_or_else(|| baseline.map(|s| s.left_target).unwrap_or(0));
    let temp_max = patch
        .temp_max
        .unwrap_or_else(|| baseline.map(|s| s.temp_max).unwrap_or(DEFAULT_TEMP_MAX));
    let temp_min = patch
        .temp_min
        .unwrap_or_else(|| baseline.map(|s| s.temp_min).unwrap_or(DEFAULT_TEMP_MIN));
    let left_ret_diff = patch
        .left_ret_diff
        .unwrap_or_else(|| baseline.map(|s| s.left_ret_diff).unwrap_or(DEFAULT_RET_DIFF));
    let start_delay = patch
        .start_delay
        .unwrap_or_else(|| baseline.map(|s| s.start_delay).unwrap_or(0));
    let unit = patch
        .unit
        .unwrap_or_else(|| baseline.map(|s| s.unit).unwrap_or(0));
    let left_tc_hot = patch
        .left_tc_hot
        .unwrap_or_else(|| baseline.map(|s| s.left_tc_hot).unwrap_or(0));
    let left_tc_mid = patch
        .left_tc_mid
        .unwrap_or_else(|| baseline.map(|s| s.left_tc_mid).unwrap_or(0));
    let left_tc_cold = patch
        .left_tc_cold
        .unwrap_or_else(|| baseline.map(|s| s.left_tc_cold).unwrap_or(0));
    let left_tc_halt = patch
        .left_tc_halt
        .unwrap_or_else(|| baseline.map(|s| s.left_tc_halt).unwrap_or(0));

    let mut data = vec![
        locked as u8,
        powered_on as u8,
        run_mode,
        bat_saver,
        to_unsigned_byte(left_target),
        to_unsigned_byte(temp_max),
        to_unsigned_byte(temp_min),
        to_unsigned_byte(left_ret_diff),
        start_delay,
        unit,
        to_unsigned_byte(left_tc_hot),
        to_unsigned_byte(left_tc_mid),
        to_unsigned_byte(left_tc_cold),
        to_unsigned_byte(left_tc_halt),
    ];

    if let Some(right) = baseline.and_then(|s| s.right.as_ref()) {
        let right_target = patch.right_target.unwrap_or(right.target);
        let right_ret_diff = patch.right_ret_diff.unwrap_or(right.ret_diff);
        let right_tc_hot = patch.right_tc_hot.unwrap_or(right.tc_hot);
        let right_tc_mid = patch.right_tc_mid.unwrap_or(right.tc_mid);
        let right_tc_cold = patch.right_tc_cold.unwrap_or(right.tc_cold);
        let right_tc_halt = patch.right_tc_halt.unwrap_or(right.tc_halt);

        data.extend_from_slice(&[
            to_unsigned_byte(right_target),
            0,
            0,
            to_unsigned_byte(right_ret_diff),
            to_unsigned_byte(right_tc_hot),
            to_unsigned_byte(right_tc_mid),
            to_unsigned_byte(right_tc_cold),
            to_unsigned_byte(right_tc_halt),
            0,
            0,
            0,
        ]);
    }

    data
}

/// Build a complete SET frame from a baseline status and a patch
pub fn set_frame(baseline: Option<&StatusRecord>, patch: &StatusPatch) -> Vec<u8> {
    packet::encode(Request::Set, &build_set_payload(baseline, patch))
}

/// Build a complete single-zone temperature frame (SET_LEFT / SET_RIGHT)
pub fn temperature_frame(zone: Zone, celsius: i8) -> Vec<u8> {
    packet::encode(zone.temperature_request(), &[to_unsigned_byte(celsius)])
}

/// Build a factory-reset frame
pub fn reset_frame() -> Vec<u8> {
    packet::encode(Request::Reset, &[])
}
