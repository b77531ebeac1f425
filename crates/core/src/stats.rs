//! Shape statistics for decoded packet trees.
//!
//! Collected in one pass over the tree with an explicit work stack, so even
//! trees built by hand deeper than the decoder would allow are safe to
//! measure. `encoded_bits` assumes each operator keeps its own length mode.

use std::fmt;

use crate::encode::literal_groups;
use crate::packet::{LengthMode, Packet};

/// Counts and sizes describing one packet tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PacketStats {
    /// Total packets, outer packet included
    pub packets: usize,

    /// Literal packets
    pub literals: usize,

    /// Operator packets
    pub operators: usize,

    /// Deepest nesting level (outer packet is depth 1)
    pub max_depth: usize,

    /// Sum of all version fields
    pub version_sum: u64,

    /// Largest literal value in the tree
    pub max_literal: u64,

    /// Operators framed by child count
    pub count_framed: usize,

    /// Bits the tree occupies when re-encoded with its own length modes
    pub encoded_bits: usize,
}

impl PacketStats {
    /// Walk `packet` and gather its statistics.
    pub fn collect(packet: &Packet) -> Self {
        let mut stats = Self::default();

        let mut stack = vec![(packet, 1usize)];
        while let Some((node, depth)) = stack.pop() {
            stats.packets += 1;
            stats.max_depth = stats.max_depth.max(depth);
            stats.version_sum += node.version() as u64;

            match node {
                Packet::Literal { value, .. } => {
                    stats.literals += 1;
                    stats.encoded_bits += 6 + 5 * literal_groups(*value);
                    stats.max_literal = stats.max_literal.max(*value);
                }
                Packet::Operator(op) => {
                    stats.operators += 1;
                    stats.encoded_bits += 7 + op.length_mode.field_width();
                    if op.length_mode == LengthMode::ImmediateCount {
                        stats.count_framed += 1;
                    }
                    stack.extend(op.children.iter().map(|child| (child, depth + 1)));
                }
            }
        }

        stats
    }

    /// Export as `key=value` lines (for parsing/testing).
    pub fn export_text(&self) -> String {
        format!(
            "packets={}\n\
             literals={}\n\
             operators={}\n\
             max_depth={}\n\
             version_sum={}\n\
             max_literal={}\n\
             count_framed={}\n\
             encoded_bits={}\n",
            self.packets,
            self.literals,
            self.operators,
            self.max_depth,
            self.version_sum,
            self.max_literal,
            self.count_framed,
            self.encoded_bits,
        )
    }
}

impl fmt::Display for PacketStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Packet Tree ===")?;
        writeln!(
            f,
            "Packets: {} ({} literals, {} operators)",
            self.packets, self.literals, self.operators
        )?;
        writeln!(f, "Max depth: {}", self.max_depth)?;
        writeln!(f, "Version sum: {}", self.version_sum)?;
        writeln!(f, "Largest literal: {}", self.max_literal)?;
        writeln!(
            f,
            "Framing: {} by count, {} by bit length",
            self.count_framed,
            self.operators - self.count_framed
        )?;
        write!(f, "Encoded size: {} bits", self.encoded_bits)
    }
}
