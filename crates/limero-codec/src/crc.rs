//! CRC-16/CCITT checksum (poly 0x1021, init 0xFFFF, MSB first, no final XOR).

/// Size of the checksum trailer in bytes.
pub const CRC_SIZE: usize = 2;

const POLY: u16 = 0x1021;
const INIT: u16 = 0xFFFF;

/// Compute the CRC-16/CCITT of `data`.
pub fn crc16(data: &[u8]) -> u16 {
    data.iter().fold(INIT, |crc, &byte| update(crc, byte))
}

fn update(mut crc: u16, byte: u8) -> u16 {
    crc ^= u16::from(byte) << 8;
    for _ in 0..8 {
        crc = if crc & 0x8000 != 0 {
            (crc << 1) ^ POLY
        } else {
            crc << 1
        };
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_value() {
        assert_eq!(crc16(b"123456789"), 0x29B1);
    }

    #[test]
    fn empty_input_is_init() {
        assert_eq!(crc16(&[]), 0xFFFF);
    }

    #[test]
    fn single_bit_changes_checksum() {
        let data = [0xBF, 0x01, 0x1A, 0x00, 0x6C, 0x6D, 0x31, 0x02, 0x01, 0xFF];
        let reference = crc16(&data);
        for byte in 0..data.len() {
            for bit in 0..8 {
                let mut mutated = data;
                mutated[byte] ^= 1 << bit;
                assert_ne!(crc16(&mutated), reference, "byte {byte} bit {bit}");
            }
        }
    }
}
