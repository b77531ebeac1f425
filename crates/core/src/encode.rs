//! Packet encoding.
//!
//! The inverse of `decode`: lays a `Packet` tree out as MSB-first bits and
//! zero-pads the result to a whole number of bytes.
//!
//! Operators are framed according to a `LengthPolicy`. With the default
//! `Preserve` policy every operator keeps the length mode it was decoded
//! with, so `encode(decode(bits))` reproduces `bits` up to trailing padding.

use crate::bitio::{to_hex, BitWriter};
use crate::error::{EncodeError, Result};
use crate::packet::{LengthMode, Operator, Packet};

const HEADER_BITS: usize = 6;
const GROUP_BITS: usize = 5;

/// How the encoder chooses each operator's length mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthPolicy {
    /// Use the mode stored on the operator.
    #[default]
    Preserve,
    /// Always emit an 11-bit child count.
    AlwaysCount,
    /// Always emit a 15-bit child section length.
    AlwaysTotalBits,
}

impl LengthPolicy {
    pub(crate) fn mode_for(self, op: &Operator) -> LengthMode {
        match self {
            LengthPolicy::Preserve => op.length_mode,
            LengthPolicy::AlwaysCount => LengthMode::ImmediateCount,
            LengthPolicy::AlwaysTotalBits => LengthMode::TotalBits,
        }
    }
}

/// Serializes packet trees under one length policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct Encoder {
    policy: LengthPolicy,
}

impl Encoder {
    pub fn new(policy: LengthPolicy) -> Self {
        Self { policy }
    }

    /// Encode `packet` into bytes, zero-padded to a byte boundary.
    ///
    /// # Errors
    /// - `EncodeError::FieldOverflow` if a version, child count or child
    ///   section length does not fit its field
    /// - `EncodeError::InvalidArity` for an operator without children, or a
    ///   comparison without exactly two
    pub fn encode(&self, packet: &Packet) -> Result<Vec<u8>> {
        let mut writer = BitWriter::with_capacity(self.bit_len(packet));
        self.write(&mut writer, packet)?;
        Ok(writer.finish())
    }

    /// Exact number of bits `packet` occupies, without padding.
    pub fn bit_len(&self, packet: &Packet) -> usize {
        match packet {
            Packet::Literal { value, .. } => HEADER_BITS + GROUP_BITS * literal_groups(*value),
            Packet::Operator(op) => {
                let mode = self.policy.mode_for(op);
                HEADER_BITS + 1 + mode.field_width() + self.children_bit_len(op)
            }
        }
    }

    fn children_bit_len(&self, op: &Operator) -> usize {
        op.children.iter().map(|child| self.bit_len(child)).sum()
    }

    fn write(&self, writer: &mut BitWriter, packet: &Packet) -> Result<()> {
        writer.write_field("version", packet.version() as u64, 3)?;
        writer.write_bits(packet.packet_type().code() as u64, 3)?;

        match packet {
            Packet::Literal { value, .. } => write_literal(writer, *value),
            Packet::Operator(op) => self.write_operator(writer, op),
        }
    }

    fn write_operator(&self, writer: &mut BitWriter, op: &Operator) -> Result<()> {
        if !op.operation.accepts(op.children.len()) {
            return Err(EncodeError::InvalidArity {
                operation: op.operation,
                children: op.children.len(),
            }
            .into());
        }

        let mode = self.policy.mode_for(op);
        writer.write_bits(mode.bit(), 1)?;
        match mode {
            LengthMode::TotalBits => {
                let section = self.children_bit_len(op) as u64;
                writer.write_field("child bit length", section, mode.field_width())?;
            }
            LengthMode::ImmediateCount => {
                let count = op.children.len() as u64;
                writer.write_field("child count", count, mode.field_width())?;
            }
        }

        for child in &op.children {
            self.write(writer, child)?;
        }
        Ok(())
    }
}

/// Number of 4-bit groups in the minimal encoding of `value` (at least one).
pub(crate) fn literal_groups(value: u64) -> usize {
    let significant = 64 - value.leading_zeros() as usize;
    significant.div_ceil(4).max(1)
}

fn write_literal(writer: &mut BitWriter, value: u64) -> Result<()> {
    for index in (0..literal_groups(value)).rev() {
        let more = u64::from(index > 0);
        let group = (value >> (4 * index)) & 0xF;
        writer.write_bits((more << 4) | group, GROUP_BITS)?;
    }
    Ok(())
}

/// Encode with the `Preserve` policy.
pub fn encode(packet: &Packet) -> Result<Vec<u8>> {
    Encoder::default().encode(packet)
}

/// Encode with an explicit length policy.
pub fn encode_with(packet: &Packet, policy: LengthPolicy) -> Result<Vec<u8>> {
    Encoder::new(policy).encode(packet)
}

/// Encode with the `Preserve` policy and render as uppercase hex.
pub fn encode_hex(packet: &Packet) -> Result<String> {
    encode(packet).map(|bytes| to_hex(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_outer;
    use crate::error::Error;
    use crate::packet::Operation;

    #[test]
    fn test_literal_fixture() {
        let packet = Packet::literal(6, 2021);
        assert_eq!(encode_hex(&packet).unwrap(), "D2FE28");
    }

    #[test]
    fn test_literal_zero_uses_one_group() {
        let packet = Packet::literal(0, 0);
        assert_eq!(Encoder::default().bit_len(&packet), 11);
        assert_eq!(encode(&packet).unwrap(), vec![0b0001_0000, 0b0000_0000]);
    }

    #[test]
    fn test_literal_group_counts() {
        assert_eq!(literal_groups(0), 1);
        assert_eq!(literal_groups(15), 1);
        assert_eq!(literal_groups(16), 2);
        assert_eq!(literal_groups(u64::MAX), 16);
    }

    #[test]
    fn test_preserve_is_bit_exact() {
        for hex in ["38006F45291200", "EE00D40C823060", "D2FE28"] {
            let packet = decode_outer(hex).unwrap();
            assert_eq!(encode_hex(&packet).unwrap(), hex);
        }
    }

    #[test]
    fn test_count_policy_keeps_semantics() {
        let packet = decode_outer("38006F45291200").unwrap();
        let bytes = encode_with(&packet, LengthPolicy::AlwaysCount).unwrap();
        let reparsed = decode_outer(&to_hex(&bytes)).unwrap();

        let Packet::Operator(op) = reparsed else {
            panic!("expected operator");
        };
        assert_eq!(op.length_mode, LengthMode::ImmediateCount);
        assert_eq!(op.operation, Operation::LessThan);
        assert_eq!(
            op.children,
            vec![Packet::literal(6, 10), Packet::literal(2, 20)]
        );
    }

    #[test]
    fn test_bit_len_matches_output() {
        let packet = decode_outer("9C0141080250320F1802104A08").unwrap();
        for policy in [
            LengthPolicy::Preserve,
            LengthPolicy::AlwaysCount,
            LengthPolicy::AlwaysTotalBits,
        ] {
            let encoder = Encoder::new(policy);
            let bytes = encoder.encode(&packet).unwrap();
            assert_eq!(bytes.len(), encoder.bit_len(&packet).div_ceil(8));
        }
    }

    #[test]
    fn test_version_overflow() {
        let packet = Packet::literal(8, 1);
        assert!(matches!(
            encode(&packet),
            Err(Error::Encode(EncodeError::FieldOverflow {
                field: "version",
                value: 8,
                width: 3
            }))
        ));
    }

    #[test]
    fn test_empty_operator() {
        let packet = Packet::Operator(Operator {
            version: 0,
            operation: Operation::Sum,
            length_mode: LengthMode::ImmediateCount,
            children: Vec::new(),
        });
        assert!(matches!(
            encode(&packet),
            Err(Error::Encode(EncodeError::InvalidArity {
                operation: Operation::Sum,
                children: 0
            }))
        ));
    }

    #[test]
    fn test_comparison_with_three_children() {
        let comparison = |children| {
            Packet::Operator(Operator {
                version: 0,
                operation: Operation::LessThan,
                length_mode: LengthMode::ImmediateCount,
                children: vec![Packet::literal(0, 1); children],
            })
        };
        assert!(matches!(
            encode(&comparison(3)),
            Err(Error::Encode(EncodeError::InvalidArity {
                operation: Operation::LessThan,
                children: 3
            }))
        ));
        assert!(encode(&comparison(2)).is_ok());
    }

    #[test]
    fn test_child_count_overflow() {
        let children = vec![Packet::literal(0, 1); 2048];
        let packet = Packet::operator(0, Operation::Sum, LengthMode::ImmediateCount, children).unwrap();
        assert!(matches!(
            encode(&packet),
            Err(Error::Encode(EncodeError::FieldOverflow {
                field: "child count",
                value: 2048,
                width: 11
            }))
        ));

        // 2048 literals are 22528 bits, which still fits a 15-bit length.
        assert!(encode_with(&packet, LengthPolicy::AlwaysTotalBits).is_ok());
    }

    #[test]
    fn test_child_section_overflow() {
        let children = vec![Packet::literal(0, 1); 3000];
        let packet = Packet::operator(0, Operation::Sum, LengthMode::TotalBits, children).unwrap();
        assert!(matches!(
            encode(&packet),
            Err(Error::Encode(EncodeError::FieldOverflow {
                field: "child bit length",
                width: 15,
                ..
            }))
        ));
    }
}
