//! Frame codec for the fridge wire protocol
//!
//! Frames are delimited by a two-byte `0xFE 0xFE` preamble followed by a
//! length byte covering everything from the command byte through the trailing
//! checksum. BLE notifications deliver frames in arbitrarily sized chunks,
//! so decoding buffers carry-over bytes between calls.

use crate::checksum::sum16;
use crate::types::Request;
use log::debug;

/// Frame preamble
pub const PREAMBLE: [u8; 2] = [0xFE, 0xFE];

/// Smallest valid length byte: command byte plus a two-byte checksum. The
/// fixed BIND and QUERY frames sit exactly at this bound.
const MIN_LENGTH_BYTE: usize = 3;

/// Fixed BIND frame, discovered empirically; not produced by the generic
/// encoder.
pub const BIND_FRAME: [u8; 6] = [0xFE, 0xFE, 0x03, 0x00, 0x01, 0xFF];

/// Fixed QUERY frame, discovered empirically; not produced by the generic
/// encoder.
pub const QUERY_FRAME: [u8; 6] = [0xFE, 0xFE, 0x03, 0x01, 0x02, 0x00];

/// One complete protocol message extracted from the byte stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Command byte (offset 3 of the raw frame)
    pub command: u8,
    /// Everything after the command byte. The trailing checksum bytes are
    /// included; consumers use bounds-checked field access.
    pub payload: Vec<u8>,
}

/// Build an outbound frame for the given command and payload.
///
/// BIND and QUERY have fixed byte forms the firmware expects verbatim. All
/// other commands get a computed length byte and a big-endian 16-bit additive
/// checksum over the whole frame so far, preamble included.
pub fn encode(cmd: Request, payload: &[u8]) -> Vec<u8> {
    match cmd {
        Request::Bind => BIND_FRAME.to_vec(),
        Request::Query => QUERY_FRAME.to_vec(),
        _ => {
            let mut packet = Vec::with_capacity(payload.len() + 6);
            packet.extend_from_slice(&PREAMBLE);
            // command byte + payload + 2 checksum bytes
            packet.push((payload.len() + 3) as u8);
            packet.push(cmd.to_u8());
            packet.extend_from_slice(payload);
            let checksum = sum16(&packet);
            packet.extend_from_slice(&checksum.to_be_bytes());
            packet
        }
    }
}

/// Streaming frame extractor with carry-over buffering
///
/// Owned by exactly one session; fed from the notification path and drained
/// by the frame dispatcher on the same task.
#[derive(Default)]
pub struct FrameBuffer {
    buffer: Vec<u8>,
}

impl FrameBuffer {
    /// Create a new, empty frame buffer
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(64),
        }
    }

    /// Append received bytes and extract every complete frame now available.
    ///
    /// Frames are returned in arrival order. Leftover bytes (a partial frame,
    /// or nothing) stay buffered for the next call. Bytes preceding a
    /// preamble cannot belong to any valid frame and are discarded; if no
    /// preamble exists anywhere the whole buffer is dropped.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Frame> {
        self.buffer.extend_from_slice(bytes);
        let mut frames = Vec::new();

        loop {
            let start = match find_preamble(&self.buffer) {
                Some(pos) => pos,
                None => {
                    // Keep a trailing 0xFE in case its partner arrives next
                    let keep = (self.buffer.last() == Some(&0xFE)) as usize;
                    let discard = self.buffer.len() - keep;
                    if discard > 0 {
                        debug!("Discarding {} bytes with no frame preamble", discard);
                        self.buffer.drain(..discard);
                    }
                    return frames;
                }
            };
            if start > 0 {
                debug!("Discarding {} bytes before frame preamble", start);
                self.buffer.drain(..start);
            }

            if self.buffer.len() < 3 {
                return frames;
            }
            let length_byte = self.buffer[2] as usize;
            if length_byte < MIN_LENGTH_BYTE {
                // Line noise can produce a preamble followed by a length too
                // small to hold a command and checksum; no real frame starts
                // here, so skip this preamble and rescan
                debug!("Skipping preamble with invalid length byte {}", length_byte);
                self.buffer.drain(..2);
                continue;
            }
            let frame_len = 3 + length_byte;
            if self.buffer.len() < frame_len {
                return frames;
            }

            let raw: Vec<u8> = self.buffer.drain(..frame_len).collect();
            frames.push(Frame {
                command: raw[3],
                payload: raw[4..].to_vec(),
            });
        }
    }

}

fn find_preamble(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|w| w == PREAMBLE)
}
