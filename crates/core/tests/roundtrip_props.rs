//! Property tests: encode/decode round trips over generated packet trees.

use bits_core::{
    bitio::to_hex, decode_outer, encode, encode_with, evaluate, version_sum, LengthMode,
    LengthPolicy, Operation, Operator, Packet,
};
use proptest::prelude::*;

fn length_mode() -> impl Strategy<Value = LengthMode> {
    prop_oneof![Just(LengthMode::TotalBits), Just(LengthMode::ImmediateCount)]
}

fn policy() -> impl Strategy<Value = LengthPolicy> {
    prop_oneof![
        Just(LengthPolicy::Preserve),
        Just(LengthPolicy::AlwaysCount),
        Just(LengthPolicy::AlwaysTotalBits),
    ]
}

/// Valid trees: versions fit 3 bits, comparisons get exactly two operands.
fn packet_tree() -> impl Strategy<Value = Packet> {
    let leaf = (0u8..8, 0u64..100_000).prop_map(|(version, value)| Packet::literal(version, value));

    leaf.prop_recursive(6, 96, 5, |inner| {
        (
            0u8..8,
            0usize..Operation::ALL.len(),
            length_mode(),
            prop::collection::vec(inner, 1..5),
        )
            .prop_map(|(version, index, length_mode, mut children)| {
                let operation = Operation::ALL[index];
                if operation.is_comparison() {
                    children.truncate(2);
                    if children.len() < 2 {
                        children.push(children[0].clone());
                    }
                }
                Packet::Operator(Operator {
                    version,
                    operation,
                    length_mode,
                    children,
                })
            })
    })
}

fn reparse(bytes: &[u8]) -> Packet {
    decode_outer(&to_hex(bytes)).unwrap()
}

proptest! {
    #[test]
    fn proptest_semantic_round_trip(packet in packet_tree(), policy in policy()) {
        let decoded = reparse(&encode_with(&packet, policy).unwrap());

        prop_assert_eq!(evaluate(&decoded).ok(), evaluate(&packet).ok());
        prop_assert_eq!(version_sum(&decoded), version_sum(&packet));
    }

    #[test]
    fn proptest_preserve_reproduces_tree(packet in packet_tree()) {
        let decoded = reparse(&encode(&packet).unwrap());
        prop_assert_eq!(decoded, packet);
    }

    #[test]
    fn proptest_reencode_is_bit_exact(packet in packet_tree()) {
        let bits = encode(&packet).unwrap();
        let reencoded = encode(&reparse(&bits)).unwrap();
        prop_assert_eq!(reencoded, bits);
    }

    #[test]
    fn proptest_literal_idempotence(version in 0u8..8, value in 0u64..=(1u64 << 36)) {
        let packet = Packet::literal(version, value);
        prop_assert_eq!(reparse(&encode(&packet).unwrap()), packet);
    }

    #[test]
    fn proptest_literal_full_width(value in any::<u64>()) {
        let packet = Packet::literal(0, value);
        prop_assert_eq!(evaluate(&reparse(&encode(&packet).unwrap())).unwrap(), value);
    }

    #[test]
    fn proptest_garbage_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let hex = to_hex(&bytes);
        if let Ok(packet) = decode_outer(&hex) {
            // Whatever decodes must survive a re-encode.
            prop_assert!(encode(&packet).is_ok());
        }
    }
}

#[test]
fn literal_round_trip_boundaries() {
    let values = [
        0u64,
        1,
        15,
        16,
        255,
        256,
        (1 << 32) - 1,
        1 << 36,
        u64::MAX >> 4,
        u64::MAX,
    ];
    for value in values {
        let packet = Packet::literal(7, value);
        assert_eq!(reparse(&encode(&packet).unwrap()), packet, "{value}");
    }
}
