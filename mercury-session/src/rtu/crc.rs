//! CRC-16/Modbus checksum for RTU frames

/// CRC calculation constants
const INITIAL_CRC: u16 = 0xFFFF;
const KEY: u16 = 0xA001; // Bit-reversed 0x8005

/// Precomputed CRC table
static CRC_TABLE: once_cell::sync::Lazy<[u16; 256]> = once_cell::sync::Lazy::new(|| {
    let mut table = [0u16; 256];
    for b in 0..=0xFF {
        let mut v = b as u16;
        for _ in 0..8 {
            if (v & 1) == 1 {
                v = (v >> 1) ^ KEY;
            } else {
                v >>= 1;
            }
        }
        table[b as usize] = v;
    }
    table
});

/// Incremental CRC-16/Modbus calculator
#[derive(Debug, Clone, Copy)]
pub struct Crc16 {
    crc_value: u16,
}

impl Crc16 {
    /// Create a new CRC calculator
    pub fn new() -> Self {
        Self {
            crc_value: INITIAL_CRC,
        }
    }

    /// Reset the CRC value to initial state
    pub fn reset(&mut self) {
        self.crc_value = INITIAL_CRC;
    }

    /// Update the CRC value with a single byte
    pub fn update(&mut self, data: u8) {
        self.crc_value =
            (self.crc_value >> 8) ^ CRC_TABLE[((self.crc_value ^ data as u16) & 0xFF) as usize];
    }

    /// Update the CRC value with multiple bytes
    pub fn update_bytes(&mut self, data: &[u8]) {
        for &byte in data {
            self.update(byte);
        }
    }

    /// Get the current CRC value
    pub fn value(&self) -> u16 {
        self.crc_value
    }

    /// Get the CRC value as transmitted on the wire (little-endian)
    pub fn to_le_bytes(&self) -> [u8; 2] {
        self.crc_value.to_le_bytes()
    }
}

impl Default for Crc16 {
    fn default() -> Self {
        Self::new()
    }
}

/// CRC-16/Modbus of `data`
pub fn checksum(data: &[u8]) -> u16 {
    let mut crc = Crc16::new();
    crc.update_bytes(data);
    crc.value()
}
