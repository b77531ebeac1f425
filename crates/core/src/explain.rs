//! Bit-layout explanations.
//!
//! Prints the encoded bits of a packet with a label under every bit:
//!
//! ```text
//! 110100101111111000101000
//! VVVTTTAAAAABBBBBCCCCC
//! ```
//!
//! - `V` version, `T` type, `I` length mode, `L` length field
//! - letters `A`, `B`, ... mark consecutive literal groups, or the bits of
//!   consecutive sub-packets of an operator (wrapping after `Z`)
//!
//! Padding bits at the end of the first line are left unlabeled.

use crate::bitio::to_binary_string;
use crate::encode::{encode_with, literal_groups, LengthPolicy};
use crate::error::Result;
use crate::packet::Packet;

/// Two-line explanation of how `packet` is laid out under `policy`.
pub fn explain(packet: &Packet, policy: LengthPolicy) -> Result<String> {
    let bytes = encode_with(packet, policy)?;
    Ok(format!("{}\n{}", to_binary_string(&bytes), labels(packet, policy)))
}

/// The label line alone, one character per packet bit.
pub fn labels(packet: &Packet, policy: LengthPolicy) -> String {
    let mut out = String::from("VVVTTT");
    match packet {
        Packet::Literal { value, .. } => {
            for group in 0..literal_groups(*value) {
                push_repeated(&mut out, letter(group), 5);
            }
        }
        Packet::Operator(op) => {
            let mode = policy.mode_for(op);
            out.push('I');
            push_repeated(&mut out, 'L', mode.field_width());
            for (index, child) in op.children.iter().enumerate() {
                let width = labels(child, policy).len();
                push_repeated(&mut out, letter(index), width);
            }
        }
    }
    out
}

fn letter(index: usize) -> char {
    (b'A' + (index % 26) as u8) as char
}

fn push_repeated(out: &mut String, label: char, count: usize) {
    out.extend(std::iter::repeat(label).take(count));
}
