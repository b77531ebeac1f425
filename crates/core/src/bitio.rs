//! Bit-level I/O for BITS transmissions.
//!
//! `BitCursor` turns a hex (or binary) string into a packed byte buffer and
//! hands out MSB-first unsigned fields from it. `BitWriter` is the inverse,
//! used by the encoder to lay packets back out on the wire.
//!
//! # Padding Rules
//! - BitWriter: pads incomplete bytes with trailing zeros
//! - BitCursor: tracks the exact bit length of its source (4 bits per hex
//!   digit), so a trailing half-byte never counts as data
//!
//! # Example
//! ```
//! use bits_core::bitio::{BitCursor, BitWriter};
//!
//! let mut cursor = BitCursor::from_hex("D2FE28").unwrap();
//! assert_eq!(cursor.pop(3).unwrap(), 6);
//! assert_eq!(cursor.pop(3).unwrap(), 4);
//! assert_eq!(cursor.remaining(), 18);
//!
//! let mut writer = BitWriter::new();
//! writer.write_bits(0b110, 3).unwrap();
//! writer.write_bits(0b100, 3).unwrap();
//! assert_eq!(writer.finish(), vec![0b1101_0000]);
//! ```

use crate::error::{BitIoError, EncodeError, Result};

/// Widest field a single `pop` or `write_bits` call can move.
pub const MAX_FIELD_BITS: usize = 64;

/// Writes bits MSB-first into a byte buffer.
///
/// Accumulates bits in a buffer and flushes complete bytes to the output.
/// When finished, pads the final partial byte with zeros.
///
/// # Invariants
/// - `bit_count` is always < 8
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    /// Completed bytes
    bytes: Vec<u8>,
    /// Accumulator for the current partial byte (MSB-aligned)
    bit_buffer: u8,
    /// Number of bits in bit_buffer (0-7)
    bit_count: u8,
}

impl BitWriter {
    /// Create a new BitWriter with empty output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer whose output buffer can hold `bits` without reallocating.
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bits.div_ceil(8)),
            ..Self::default()
        }
    }

    /// Write the lowest `count` bits of `value`, MSB-first.
    ///
    /// # Errors
    /// Returns `BitIoError::InvalidBitCount` if count > 64.
    pub fn write_bits(&mut self, value: u64, count: usize) -> Result<()> {
        if count > MAX_FIELD_BITS {
            return Err(BitIoError::InvalidBitCount(count).into());
        }

        let mut remaining = count;
        while remaining > 0 {
            let free = 8 - self.bit_count as usize;
            let take = remaining.min(free);
            let shift = remaining - take;
            let bits = ((value >> shift) & low_mask(take)) as u8;

            self.bit_buffer |= bits << (free - take);
            self.bit_count += take as u8;

            if self.bit_count == 8 {
                self.bytes.push(self.bit_buffer);
                self.bit_buffer = 0;
                self.bit_count = 0;
            }

            remaining = shift;
        }

        Ok(())
    }

    /// Write a fixed-width header field, rejecting values that do not fit.
    ///
    /// `field` names the value in the resulting `EncodeError::FieldOverflow`.
    pub fn write_field(&mut self, field: &'static str, value: u64, width: usize) -> Result<()> {
        if width < MAX_FIELD_BITS && value >> width != 0 {
            return Err(EncodeError::FieldOverflow {
                field,
                value,
                width,
            }
            .into());
        }
        self.write_bits(value, width)
    }

    /// Finish writing and return the output bytes, zero-padded to a byte boundary.
    pub fn finish(mut self) -> Vec<u8> {
        if self.bit_count > 0 {
            self.bytes.push(self.bit_buffer);
        }
        self.bytes
    }

    /// Return the total number of bits written (including partial byte).
    pub fn bit_len(&self) -> usize {
        self.bytes.len() * 8 + self.bit_count as usize
    }
}

/// An exclusively owned, read-once bit sequence.
///
/// Bits are stored packed, 8 per byte, MSB-first. `len` is the number of
/// meaningful bits; it can be smaller than `data.len() * 8` when the source
/// had an odd number of hex digits.
///
/// # Invariants
/// - `position <= len <= data.len() * 8`
/// - `position` never decreases
#[derive(Debug, Clone)]
pub struct BitCursor {
    data: Vec<u8>,
    len: usize,
    position: usize,
}

impl BitCursor {
    /// Wrap a byte buffer; every bit of it is data.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let len = data.len() * 8;
        Self {
            data,
            len,
            position: 0,
        }
    }

    /// Build a cursor from hexadecimal text, 4 bits per digit, MSB-first.
    ///
    /// Digits are case-insensitive. Whitespace is not accepted here; callers
    /// strip the line terminator first.
    ///
    /// # Errors
    /// `BitIoError::MalformedInput` on the first non-hex character.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let mut data = Vec::with_capacity(hex.len().div_ceil(2));
        let mut digits = 0;

        for (index, character) in hex.chars().enumerate() {
            let nibble = character
                .to_digit(16)
                .ok_or(BitIoError::MalformedInput { character, index })? as u8;

            if digits % 2 == 0 {
                data.push(nibble << 4);
            } else if let Some(last) = data.last_mut() {
                *last |= nibble;
            }
            digits += 1;
        }

        Ok(Self {
            data,
            len: digits * 4,
            position: 0,
        })
    }

    /// Build a cursor from a string of `0` and `1` characters.
    pub fn from_binary_string(binary: &str) -> Result<Self> {
        let mut writer = BitWriter::with_capacity(binary.len());
        for (index, character) in binary.chars().enumerate() {
            let bit = match character {
                '0' => 0,
                '1' => 1,
                _ => return Err(BitIoError::MalformedInput { character, index }.into()),
            };
            writer.write_bits(bit, 1)?;
        }

        let len = writer.bit_len();
        Ok(Self {
            data: writer.finish(),
            len,
            position: 0,
        })
    }

    /// Consume the next `count` bits and return them as an unsigned integer.
    ///
    /// # Errors
    /// - `BitIoError::InvalidBitCount` if count is 0 or > 64
    /// - `BitIoError::InsufficientBits` if fewer than `count` bits remain;
    ///   the cursor is left where it was
    pub fn pop(&mut self, count: usize) -> Result<u64> {
        if count == 0 || count > MAX_FIELD_BITS {
            return Err(BitIoError::InvalidBitCount(count).into());
        }

        let available = self.remaining();
        if count > available {
            return Err(BitIoError::InsufficientBits {
                requested: count,
                available,
                position: self.position,
            }
            .into());
        }

        let mut result = 0u64;
        let mut remaining = count;

        while remaining > 0 {
            let byte = self.data[self.position / 8];
            let bits_in_byte = 8 - self.position % 8;
            let take = remaining.min(bits_in_byte);
            let bits = (byte >> (bits_in_byte - take)) as u64 & low_mask(take);

            result = (result << take) | bits;
            self.position += take;
            remaining -= take;
        }

        Ok(result)
    }

    /// Consume a single bit.
    pub fn pop_flag(&mut self) -> Result<bool> {
        Ok(self.pop(1)? == 1)
    }

    /// Number of unconsumed bits.
    pub fn remaining(&self) -> usize {
        self.len - self.position
    }

    /// Number of bits consumed so far.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Total number of bits in the source.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True when every unconsumed bit is zero.
    pub fn rest_is_zero(&self) -> bool {
        (self.position..self.len).all(|index| self.data[index / 8] & (0x80 >> (index % 8)) == 0)
    }
}

/// Render bytes as uppercase hex, two digits per byte.
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02X}")).collect()
}

/// Render bytes as a string of `0`/`1` characters, MSB-first.
pub fn to_binary_string(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:08b}")).collect()
}

fn low_mask(bits: usize) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_hex_digits_are_four_bits_each() {
        let mut cursor = BitCursor::from_hex("D2FE28").unwrap();
        assert_eq!(cursor.len(), 24);
        assert_eq!(cursor.pop(3).unwrap(), 0b110);
        assert_eq!(cursor.pop(3).unwrap(), 0b100);
        assert_eq!(cursor.pop(5).unwrap(), 0b10111);
        assert_eq!(cursor.pop(5).unwrap(), 0b11110);
        assert_eq!(cursor.pop(5).unwrap(), 0b00101);
        assert_eq!(cursor.remaining(), 3);
    }

    #[test]
    fn test_hex_is_case_insensitive() {
        let mut upper = BitCursor::from_hex("ABCDEF").unwrap();
        let mut lower = BitCursor::from_hex("abcdef").unwrap();
        assert_eq!(upper.pop(24).unwrap(), lower.pop(24).unwrap());
    }

    #[test]
    fn test_odd_digit_count() {
        let mut cursor = BitCursor::from_hex("F0F").unwrap();
        assert_eq!(cursor.len(), 12);
        assert_eq!(cursor.pop(12).unwrap(), 0xF0F);
        assert!(cursor.pop(1).is_err());
    }

    #[test]
    fn test_malformed_hex() {
        let result = BitCursor::from_hex("12G4");
        assert!(matches!(
            result,
            Err(Error::BitIo(BitIoError::MalformedInput {
                character: 'G',
                index: 2
            }))
        ));
    }

    #[test]
    fn test_binary_string() {
        let mut cursor = BitCursor::from_binary_string("1011001").unwrap();
        assert_eq!(cursor.len(), 7);
        assert_eq!(cursor.pop(7).unwrap(), 0b1011001);

        assert!(BitCursor::from_binary_string("0120").is_err());
    }

    #[test]
    fn test_pop_across_byte_boundary() {
        let mut cursor = BitCursor::from_bytes(vec![0b0000_0111, 0b1100_0000]);
        cursor.pop(5).unwrap();
        assert_eq!(cursor.pop(5).unwrap(), 0b11111);
        assert_eq!(cursor.position(), 10);
    }

    #[test]
    fn test_insufficient_bits_reports_position() {
        let mut cursor = BitCursor::from_hex("FF").unwrap();
        cursor.pop(6).unwrap();

        let err = cursor.pop(3).unwrap_err();
        assert!(matches!(
            err,
            Error::BitIo(BitIoError::InsufficientBits {
                requested: 3,
                available: 2,
                position: 6
            })
        ));
        // A failed pop does not move the cursor.
        assert_eq!(cursor.position(), 6);
    }

    #[test]
    fn test_invalid_bit_counts() {
        let mut cursor = BitCursor::from_bytes(vec![0; 16]);
        assert!(cursor.pop(0).is_err());
        assert!(cursor.pop(65).is_err());
        assert_eq!(cursor.pop(64).unwrap(), 0);
    }

    #[test]
    fn test_rest_is_zero() {
        let mut cursor = BitCursor::from_binary_string("1100000").unwrap();
        assert!(!cursor.rest_is_zero());
        cursor.pop(2).unwrap();
        assert!(cursor.rest_is_zero());

        let mut cursor = BitCursor::from_binary_string("000001").unwrap();
        cursor.pop(2).unwrap();
        assert!(!cursor.rest_is_zero());
    }

    #[test]
    fn test_write_partial_bits() {
        let mut writer = BitWriter::new();
        writer.write_bits(0b101, 3).unwrap();
        writer.write_bits(0b11, 2).unwrap();
        assert_eq!(writer.bit_len(), 5);
        assert_eq!(writer.finish(), vec![0b1011_1000]);
    }

    #[test]
    fn test_write_64_bit_value() {
        let mut writer = BitWriter::new();
        writer.write_bits(1, 1).unwrap();
        writer.write_bits(0x1234_5678_9ABC_DEF0, 64).unwrap();
        let bytes = writer.finish();

        let mut cursor = BitCursor::from_bytes(bytes);
        assert_eq!(cursor.pop(1).unwrap(), 1);
        assert_eq!(cursor.pop(64).unwrap(), 0x1234_5678_9ABC_DEF0);
    }

    #[test]
    fn test_write_field_overflow() {
        let mut writer = BitWriter::new();
        writer.write_field("version", 7, 3).unwrap();

        let err = writer.write_field("version", 8, 3).unwrap_err();
        assert!(matches!(
            err,
            Error::Encode(EncodeError::FieldOverflow {
                field: "version",
                value: 8,
                width: 3
            })
        ));
    }

    #[test]
    fn test_hex_and_binary_rendering() {
        assert_eq!(to_hex(&[0xD2, 0xFE, 0x28]), "D2FE28");
        assert_eq!(to_binary_string(&[0xA5]), "10100101");
    }
}
