//! Additive checksums used by the fridge wire protocol
//!
//! Dynamically built frames (SET, SET_LEFT, SET_RIGHT, RESET) carry a 16-bit
//! big-endian trailing checksum. A legacy command family, and the fixed BIND
//! and QUERY frames, use the single-byte variant.

/// Sum of all bytes modulo 256
pub fn sum8(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Sum of all bytes modulo 65536
pub fn sum16(data: &[u8]) -> u16 {
    data.iter().fold(0u16, |acc, &b| acc.wrapping_add(b as u16))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum8_empty() {
        assert_eq!(sum8(&[]), 0);
    }

    #[test]
    fn test_sum8_wraps() {
        assert_eq!(sum8(&[0xFF, 0x02]), 0x01);
        assert_eq!(sum8(&[0x80, 0x80]), 0x00);
    }

    #[test]
    fn test_sum16_empty() {
        assert_eq!(sum16(&[]), 0);
    }

    #[test]
    fn test_sum16_simple() {
        assert_eq!(sum16(&[0x01, 0x02, 0x03]), 0x0006);
        // Query frame header: FE FE 03 01 sums to 0x0200
        assert_eq!(sum16(&[0xFE, 0xFE, 0x03, 0x01]), 0x0200);
    }

    #[test]
    fn test_sum16_wraps() {
        let data = vec![0xFF; 257];
        // 257 * 255 = 65535, mod 65536
        assert_eq!(sum16(&data), 0xFFFF);
        let data = vec![0xFF; 258];
        assert_eq!(sum16(&data), 0x00FE);
    }
}
