//! bits-core: codec for BITS packet transmissions
//!
//! A BITS transmission is a hexadecimal string that packs one arithmetic
//! expression into a self-delimiting bit stream. This library:
//! - Reads the hex text into a bit cursor
//! - Decodes the outer packet and everything nested in it
//! - Evaluates the expression and sums the version fields
//! - Re-encodes packet trees, bit-exact when the original framing is kept
//!
//! # Architecture
//!
//! - `bitio`: Bit cursor and MSB-first bit writer
//! - `packet`: Packet types and the packet tree
//! - `decode`: Recursive decoder with depth and size limits
//! - `encode`: Encoder with selectable length framing
//! - `eval`: Evaluation, version sums and text rendering
//! - `explain`: Bit-by-bit layout labels
//! - `stats`: Tree shape statistics
//!
//! # Example
//!
//! ```
//! use bits_core::{decode_outer, evaluate, render, version_sum};
//!
//! let packet = decode_outer("9C0141080250320F1802104A08").unwrap();
//! assert_eq!(evaluate(&packet).unwrap(), 1);
//! assert_eq!(render(&packet).unwrap(), "((1 + 3) == (2 * 2)) = 1");
//! assert_eq!(version_sum(&decode_outer("8A004A801A8002F478").unwrap()), 16);
//! ```

pub mod bitio;
pub mod decode;
pub mod encode;
pub mod error;
pub mod eval;
pub mod explain;
pub mod packet;
pub mod stats;

// Re-export commonly used types
pub use bitio::BitCursor;
pub use decode::{
    decode, decode_outer, decode_transmission, DecodeLimits, Decoder, Transmission,
    DEFAULT_MAX_DEPTH, DEFAULT_MAX_PACKETS,
};
pub use encode::{encode, encode_hex, encode_with, Encoder, LengthPolicy};
pub use error::{Error, Result};
pub use eval::{evaluate, render, version_sum};
pub use explain::explain;
pub use packet::{LengthMode, Operation, Operator, Packet, PacketType};
pub use stats::PacketStats;
