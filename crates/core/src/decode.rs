//! Packet decoding.
//!
//! Turns a `BitCursor` into a `Packet` tree. Operators frame their children
//! in one of two ways, selected by the bit right after the type field:
//!
//! ```text
//! mode 0:  VVV TTT 0 LLLLLLLLLLLLLLL <children, exactly L bits>
//! mode 1:  VVV TTT 1 NNNNNNNNNNN     <exactly N children>
//! ```
//!
//! Literals follow the header with 5-bit groups: a continue flag and four
//! value bits, the last group flagged 0.
//!
//! # Resource Bounds
//!
//! Decoding recurses once per nesting level. `DecodeLimits` caps both the
//! nesting depth and the number of packets in one transmission so that a
//! hostile input cannot exhaust the stack.

use tracing::{debug, trace, warn};

use crate::bitio::BitCursor;
use crate::error::{DecodeError, Result};
use crate::packet::{LengthMode, Operation, Operator, Packet, PacketType};

/// Default ceiling on packet nesting depth (the outer packet is depth 1).
///
/// Decode, evaluate, render and encode all recurse per level; a tree this
/// deep stays well inside a 2 MiB thread stack in unoptimized builds.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Default ceiling on packets per transmission.
pub const DEFAULT_MAX_PACKETS: usize = 65_536;

/// Resource ceilings applied while decoding one transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    pub max_depth: usize,
    pub max_packets: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_packets: DEFAULT_MAX_PACKETS,
        }
    }
}

/// Recursive-descent decoder over a borrowed cursor.
///
/// One decoder handles one packet tree; it is not reused across
/// transmissions.
pub struct Decoder<'c> {
    cursor: &'c mut BitCursor,
    limits: DecodeLimits,
    packets: usize,
}

impl<'c> Decoder<'c> {
    pub fn new(cursor: &'c mut BitCursor, limits: DecodeLimits) -> Self {
        Self {
            cursor,
            limits,
            packets: 0,
        }
    }

    /// Decode one complete packet (and everything nested in it).
    pub fn decode_packet(&mut self) -> Result<Packet> {
        self.packet(1)
    }

    /// Number of packets decoded so far.
    pub fn packets_decoded(&self) -> usize {
        self.packets
    }

    fn packet(&mut self, depth: usize) -> Result<Packet> {
        let start = self.cursor.position();

        if depth > self.limits.max_depth {
            return Err(DecodeError::DepthLimitExceeded {
                limit: self.limits.max_depth,
                position: start,
            }
            .into());
        }

        self.packets += 1;
        if self.packets > self.limits.max_packets {
            return Err(DecodeError::PacketLimitExceeded {
                limit: self.limits.max_packets,
                position: start,
            }
            .into());
        }

        let version = self.cursor.pop(3)? as u8;
        let packet_type = PacketType::try_from(self.cursor.pop(3)? as u8)?;
        trace!(position = start, version, %packet_type, depth, "packet header");

        match packet_type.operation() {
            None => self.literal(version),
            Some(operation) => self.operator(version, operation, start, depth),
        }
    }

    fn literal(&mut self, version: u8) -> Result<Packet> {
        let mut value = 0u64;
        loop {
            let position = self.cursor.position();
            let more = self.cursor.pop_flag()?;
            let group = self.cursor.pop(4)?;

            if value > u64::MAX >> 4 {
                return Err(DecodeError::LiteralOverflow { position }.into());
            }
            value = (value << 4) | group;

            if !more {
                return Ok(Packet::Literal { version, value });
            }
        }
    }

    fn operator(
        &mut self,
        version: u8,
        operation: Operation,
        start: usize,
        depth: usize,
    ) -> Result<Packet> {
        let length_mode = LengthMode::from_bit(self.cursor.pop_flag()?);
        let length = self.cursor.pop(length_mode.field_width())? as usize;
        let section_start = self.cursor.position();

        let mut children = Vec::new();
        match length_mode {
            LengthMode::TotalBits => {
                while self.cursor.position() - section_start < length {
                    children.push(self.packet(depth + 1)?);
                }

                let consumed = self.cursor.position() - section_start;
                if consumed != length {
                    return Err(DecodeError::FramingMismatch {
                        declared: length,
                        consumed,
                        position: self.cursor.position(),
                    }
                    .into());
                }
            }
            LengthMode::ImmediateCount => {
                children.reserve(length);
                for _ in 0..length {
                    children.push(self.packet(depth + 1)?);
                }
            }
        }

        if !operation.accepts(children.len()) {
            return Err(DecodeError::InvalidStructure {
                operation,
                children: children.len(),
                position: start,
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
}

/// Decode one packet from `cursor` with the default limits.
pub fn decode(cursor: &mut BitCursor) -> Result<Packet> {
    Decoder::new(cursor, DecodeLimits::default()).decode_packet()
}

/// A decoded outer packet plus what was left over after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transmission {
    pub packet: Packet,
    /// Bits occupied by the outer packet.
    pub packet_bits: usize,
    /// Bits in the whole transmission, padding included.
    pub total_bits: usize,
    /// Whether every bit after the outer packet is zero.
    pub padding_is_zero: bool,
}

impl Transmission {
    /// Bits after the outer packet.
    pub fn trailing_bits(&self) -> usize {
        self.total_bits - self.packet_bits
    }
}

/// Decode a whole hex transmission, keeping the padding details.
///
/// Trailing whitespace (such as the line terminator) is stripped first.
/// Non-zero bits after the outer packet are logged as a warning, not
/// rejected.
pub fn decode_transmission(hex: &str, limits: DecodeLimits) -> Result<Transmission> {
    let mut cursor = BitCursor::from_hex(hex.trim_end())?;
    let total_bits = cursor.len();

    let mut decoder = Decoder::new(&mut cursor, limits);
    let packet = decoder.decode_packet()?;
    let packets = decoder.packets_decoded();

    let packet_bits = cursor.position();
    let padding_is_zero = cursor.rest_is_zero();
    if !padding_is_zero {
        warn!(
            packet_bits,
            trailing_bits = cursor.remaining(),
            "non-zero bits after outer packet"
        );
    }
    debug!(total_bits, packet_bits, packets, "transmission decoded");

    Ok(Transmission {
        packet,
        packet_bits,
        total_bits,
        padding_is_zero,
    })
}

/// Decode the outer packet of a hex transmission.
pub fn decode_outer(hex: &str) -> Result<Packet> {
    decode_transmission(hex, DecodeLimits::default()).map(|transmission| transmission.packet)
}
