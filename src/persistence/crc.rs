//! CRC-16 (reflected polynomial 0xA001) used to seal EEPROM records.
//!
//! Bit-for-bit compatible with avr-libc `_crc16_update`, so records written
//! by earlier controller firmware validate unchanged.

/// Seed for record checksums.
pub const RECORD_SEED: u16 = 7;

/// Fold one byte into a running CRC.
pub fn crc16_update(mut crc: u16, byte: u8) -> u16 {
    crc ^= u16::from(byte);
    for _ in 0..8 {
        if crc & 1 != 0 {
            crc = (crc >> 1) ^ 0xA001;
        } else {
            crc >>= 1;
        }
    }
    crc
}

/// CRC over `data` starting from `seed`.
pub fn crc16(seed: u16, data: &[u8]) -> u16 {
    data.iter().fold(seed, |crc, &b| crc16_update(crc, b))
}
