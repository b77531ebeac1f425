//! Sample transmission generation.
//!
//! When no input file is specified, we generate random but valid packet
//! trees and encode them to hex, so every part of the pipeline has something
//! to chew on.
//!
//! # Design
//!
//! Generated trees have:
//! - Every operation, with comparisons always given two operands
//! - Both length modes, chosen per operator
//! - Literals of mixed magnitude (mostly small, occasionally wide)
//!
//! Each tree is capped at `MAX_GENERATED_PACKETS` packets, which keeps every
//! child count and child section inside its wire field however deep the
//! requested nesting. Trees that still fail to evaluate (64-bit overflow) or
//! to encode are rerolled, so every sample survives the whole pipeline.

use bits_core::{encode, encode_hex, evaluate, LengthMode, Operation, Operator, Packet, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Attempts at drawing a tree that evaluates and encodes.
const MAX_REROLLS: usize = 16;

/// Packets per generated tree. Even at 16 literal groups each, this many
/// packets fit in a 15-bit child section.
pub const MAX_GENERATED_PACKETS: usize = 256;

/// Generate `count` hex transmissions from `seed`.
///
/// # Arguments
/// - `seed`: random seed for determinism
/// - `count`: number of transmissions
/// - `max_depth`: deepest nesting level of each tree (outer packet is 1)
pub fn generate_transmissions(seed: u64, count: usize, max_depth: usize) -> Result<Vec<String>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| encode_hex(&generate_packet(&mut rng, max_depth)))
        .collect()
}

/// Draw one packet tree that evaluates and encodes without error.
pub fn generate_packet(rng: &mut ChaCha8Rng, max_depth: usize) -> Packet {
    for _ in 0..MAX_REROLLS {
        let mut budget = MAX_GENERATED_PACKETS - 1;
        let packet = random_packet(rng, max_depth.max(1), &mut budget);
        if evaluate(&packet).is_ok() && encode(&packet).is_ok() {
            return packet;
        }
    }
    random_literal(rng)
}

/// `budget` is the number of packets the whole tree may still add below
/// this one. Children are paid for before they are built.
fn random_packet(rng: &mut ChaCha8Rng, depth: usize, budget: &mut usize) -> Packet {
    // Leaves get likelier as the depth budget shrinks.
    if depth <= 1 || *budget < 2 || rng.gen_range(0..depth + 1) == 0 {
        return random_literal(rng);
    }

    let operation = Operation::ALL[rng.gen_range(0..Operation::ALL.len())];
    let children = if operation.is_comparison() {
        2
    } else {
        rng.gen_range(1..=4.min(*budget))
    };
    *budget -= children;
    let length_mode = if rng.gen_bool(0.5) {
        LengthMode::ImmediateCount
    } else {
        LengthMode::TotalBits
    };

    Packet::Operator(Operator {
        version: rng.gen_range(0..8),
        operation,
        length_mode,
        children: (0..children)
            .map(|_| random_packet(rng, depth - 1, budget))
            .collect(),
    })
}

fn random_literal(rng: &mut ChaCha8Rng) -> Packet {
    let value = match rng.gen_range(0..10) {
        // 70% small values
        0..=6 => rng.gen_range(0..=255),
        // 20% medium
        7..=8 => rng.gen_range(256..=1 << 20),
        // 10% wide (up to 36 bits)
        _ => rng.gen_range(0..=1u64 << 36),
    };
    Packet::literal(rng.gen_range(0..8), value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bits_core::{decode_outer, PacketStats};

    #[test]
    fn test_generate_transmissions() {
        let samples = generate_transmissions(42, 10, 4).unwrap();
        assert_eq!(samples.len(), 10);
        for hex in &samples {
            let packet = decode_outer(hex).unwrap();
            assert!(evaluate(&packet).is_ok());
        }
    }

    #[test]
    fn test_determinism() {
        let a = generate_transmissions(12345, 5, 5).unwrap();
        let b = generate_transmissions(12345, 5, 5).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds() {
        let a = generate_transmissions(1, 8, 5).unwrap();
        let b = generate_transmissions(2, 8, 5).unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn test_depth_bound() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for depth in [1, 2, 3, 6] {
            for _ in 0..20 {
                let packet = generate_packet(&mut rng, depth);
                assert!(PacketStats::collect(&packet).max_depth <= depth);
            }
        }
    }

    #[test]
    fn test_deep_generation_stays_encodable() {
        let samples = generate_transmissions(11, 12, 40).unwrap();
        assert_eq!(samples.len(), 12);

        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..12 {
            let packet = generate_packet(&mut rng, 40);
            assert!(PacketStats::collect(&packet).packets <= MAX_GENERATED_PACKETS);
            assert!(encode(&packet).is_ok());
        }
    }

    #[test]
    fn test_reencode_matches_generated_tree() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        for _ in 0..20 {
            let packet = generate_packet(&mut rng, 4);
            let hex = encode_hex(&packet).unwrap();
            assert_eq!(decode_outer(&hex).unwrap(), packet);
        }
    }
}
