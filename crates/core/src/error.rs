//! Error types for the BITS codec.
//!
//! All operations return structured errors rather than panicking.
//! Decoding is all-or-nothing: any error aborts the whole transmission and
//! no partial packet tree is returned.

use thiserror::Error;

use crate::packet::Operation;

/// Top-level error type for all operations in the codec.
///
/// Each variant corresponds to a specific failure domain:
/// - Bit I/O: turning hex text into bits and reading them back
/// - Decode: framing and structure of the packet tree
/// - Encode: fields that do not fit their wire width
/// - Eval: arithmetic over hand-built or decoded trees
/// - I/O and configuration: used by the command-line front end
#[derive(Debug, Error)]
pub enum Error {
    /// Bit I/O operation failed (e.g., reading past end of buffer)
    #[error("bit I/O error: {0}")]
    BitIo(#[from] BitIoError),

    /// Packet tree could not be decoded from the bit stream
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Packet tree could not be serialized
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Expression evaluation failed
    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Bit-level I/O errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BitIoError {
    /// Source text contained something other than a hex (or binary) digit
    #[error("malformed input: unexpected character {character:?} at index {index}")]
    MalformedInput { character: char, index: usize },

    /// Attempted to read more bits than remain in the cursor
    #[error("insufficient bits at bit {position}: requested {requested}, available {available}")]
    InsufficientBits {
        requested: usize,
        available: usize,
        position: usize,
    },

    /// Invalid bit count (requesting 0 bits or more than 64 bits)
    #[error("invalid bit count: {0}")]
    InvalidBitCount(usize),
}

/// Packet decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Total-bits framing: children consumed a different number of bits than declared
    #[error("framing mismatch at bit {position}: declared {declared} child bits, consumed {consumed}")]
    FramingMismatch {
        declared: usize,
        consumed: usize,
        position: usize,
    },

    /// Operator without children, or a comparison without exactly two
    #[error("invalid structure at bit {position}: {operation} operator with {children} children")]
    InvalidStructure {
        operation: Operation,
        children: usize,
        position: usize,
    },

    /// Type code outside 0..=7
    #[error("unknown packet type code {0}")]
    UnknownPacketType(u8),

    /// Literal value does not fit in 64 bits
    #[error("literal overflows 64 bits at bit {position}")]
    LiteralOverflow { position: usize },

    /// Packets nested deeper than the configured ceiling
    #[error("nesting depth limit {limit} exceeded at bit {position}")]
    DepthLimitExceeded { limit: usize, position: usize },

    /// More packets in one transmission than the configured ceiling
    #[error("packet count limit {limit} exceeded at bit {position}")]
    PacketLimitExceeded { limit: usize, position: usize },
}

/// Packet encoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// A header or length field does not fit its fixed wire width
    #[error("{field} value {value} does not fit in {width} bits")]
    FieldOverflow {
        field: &'static str,
        value: u64,
        width: usize,
    },

    /// Operator child count the decoder would reject (none, or a
    /// comparison without exactly two)
    #[error("{operation} operator cannot be encoded with {children} children")]
    InvalidArity {
        operation: Operation,
        children: usize,
    },
}

/// Expression evaluation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// Operator has the wrong number of operands
    #[error("{operation} expects {expected} operands, got {actual}")]
    Arity {
        operation: Operation,
        expected: &'static str,
        actual: usize,
    },

    /// Result does not fit in 64 bits
    #[error("{operation} overflowed 64 bits")]
    Overflow { operation: Operation },
}

/// Type alias for Result with our Error type
pub type Result<T> = std::result::Result<T, Error>;
