//! Packet data model.
//!
//! A BITS transmission carries a single packet at its outermost layer, which
//! is either a literal value or an operator over one or more sub-packets.
//!
//! # Packet Header
//!
//! ```text
//! +-------------------+
//! | version (3 bits)  |  metadata, summed for checksums
//! +-------------------+
//! | type (3 bits)     |  0-7, see PacketType
//! +-------------------+
//! | body              |  literal groups, or length mode + length + children
//! +-------------------+
//! ```
//!
//! The tree is built bottom-up by the decoder and is immutable afterwards.
//! Children are owned by their parent; there is no sharing.

use std::fmt;

use crate::error::{DecodeError, Result};

/// Highest value a 3-bit version field can hold.
pub const MAX_VERSION: u8 = 0b111;

/// Wire type codes, one per 3-bit `type` field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketType {
    Sum = 0,
    Product = 1,
    Minimum = 2,
    Maximum = 3,
    Literal = 4,
    GreaterThan = 5,
    LessThan = 6,
    EqualTo = 7,
}

impl PacketType {
    /// The 3-bit wire code.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// The operation this type performs, or `None` for literals.
    pub fn operation(self) -> Option<Operation> {
        match self {
            PacketType::Sum => Some(Operation::Sum),
            PacketType::Product => Some(Operation::Product),
            PacketType::Minimum => Some(Operation::Minimum),
            PacketType::Maximum => Some(Operation::Maximum),
            PacketType::Literal => None,
            PacketType::GreaterThan => Some(Operation::GreaterThan),
            PacketType::LessThan => Some(Operation::LessThan),
            PacketType::EqualTo => Some(Operation::EqualTo),
        }
    }
}

impl TryFrom<u8> for PacketType {
    type Error = DecodeError;

    fn try_from(code: u8) -> std::result::Result<Self, Self::Error> {
        Ok(match code {
            0 => PacketType::Sum,
            1 => PacketType::Product,
            2 => PacketType::Minimum,
            3 => PacketType::Maximum,
            4 => PacketType::Literal,
            5 => PacketType::GreaterThan,
            6 => PacketType::LessThan,
            7 => PacketType::EqualTo,
            other => return Err(DecodeError::UnknownPacketType(other)),
        })
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operation() {
            Some(operation) => write!(f, "{operation}"),
            None => f.write_str("LITERAL"),
        }
    }
}

/// The seven operator packet types.
///
/// Kept separate from `PacketType` so an operator can never carry the
/// literal type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Sum,
    Product,
    Minimum,
    Maximum,
    GreaterThan,
    LessThan,
    EqualTo,
}

impl Operation {
    pub const ALL: [Operation; 7] = [
        Operation::Sum,
        Operation::Product,
        Operation::Minimum,
        Operation::Maximum,
        Operation::GreaterThan,
        Operation::LessThan,
        Operation::EqualTo,
    ];

    pub fn packet_type(self) -> PacketType {
        match self {
            Operation::Sum => PacketType::Sum,
            Operation::Product => PacketType::Product,
            Operation::Minimum => PacketType::Minimum,
            Operation::Maximum => PacketType::Maximum,
            Operation::GreaterThan => PacketType::GreaterThan,
            Operation::LessThan => PacketType::LessThan,
            Operation::EqualTo => PacketType::EqualTo,
        }
    }

    /// Comparisons take exactly two operands.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Operation::GreaterThan | Operation::LessThan | Operation::EqualTo
        )
    }

    /// Whether `children` operands is a legal count for this operation.
    pub fn accepts(self, children: usize) -> bool {
        if self.is_comparison() {
            children == 2
        } else {
            children >= 1
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Sum => "SUM",
            Operation::Product => "PRODUCT",
            Operation::Minimum => "MINIMUM",
            Operation::Maximum => "MAXIMUM",
            Operation::GreaterThan => "GREATER_THAN",
            Operation::LessThan => "LESS_THAN",
            Operation::EqualTo => "EQUAL_TO",
        })
    }
}

/// How an operator frames its children on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LengthMode {
    /// Next 15 bits give the bit length of the whole children section.
    TotalBits,
    /// Next 11 bits give the number of immediate children.
    ImmediateCount,
}

impl LengthMode {
    /// Width of the length field that follows the mode bit.
    pub fn field_width(self) -> usize {
        match self {
            LengthMode::TotalBits => 15,
            LengthMode::ImmediateCount => 11,
        }
    }

    /// The 1-bit length type id.
    pub fn bit(self) -> u64 {
        match self {
            LengthMode::TotalBits => 0,
            LengthMode::ImmediateCount => 1,
        }
    }

    pub fn from_bit(bit: bool) -> Self {
        if bit {
            LengthMode::ImmediateCount
        } else {
            LengthMode::TotalBits
        }
    }
}

/// An operator packet: an operation applied to its children in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    pub version: u8,
    pub operation: Operation,
    /// Framing used on the wire; retained so re-encoding is bit-exact.
    pub length_mode: LengthMode,
    pub children: Vec<Packet>,
}

/// A node of the decoded expression tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Literal { version: u8, value: u64 },
    Operator(Operator),
}

impl Packet {
    /// Create a literal packet.
    pub fn literal(version: u8, value: u64) -> Self {
        Packet::Literal { version, value }
    }

    /// Create an operator packet, checking the child count.
    ///
    /// Fields of `Operator` are public, so trees that skip this check can
    /// still be built by hand; the encoder and evaluator re-check what they
    /// depend on.
    ///
    /// # Errors
    /// `DecodeError::InvalidStructure` when the operation does not accept
    /// `children.len()` operands (position is reported as 0).
    pub fn operator(
        version: u8,
        operation: Operation,
        length_mode: LengthMode,
        children: Vec<Packet>,
    ) -> Result<Self> {
        if !operation.accepts(children.len()) {
            return Err(DecodeError::InvalidStructure {
                operation,
                children: children.len(),
                position: 0,
            }
            .into());
        }

        Ok(Packet::Operator(Operator {
            version,
            operation,
            length_mode,
            children,
        }))
    }

    pub fn version(&self) -> u8 {
        match self {
            Packet::Literal { version, .. } => *version,
            Packet::Operator(op) => op.version,
        }
    }

    pub fn packet_type(&self) -> PacketType {
        match self {
            Packet::Literal { .. } => PacketType::Literal,
            Packet::Operator(op) => op.operation.packet_type(),
        }
    }

    /// Immediate children; empty for literals.
    pub fn children(&self) -> &[Packet] {
        match self {
            Packet::Literal { .. } => &[],
            Packet::Operator(op) => &op.children,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Packet::Literal { .. })
    }
}
