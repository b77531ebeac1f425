//! Expression evaluation over packet trees.
//!
//! - `evaluate`: the arithmetic value of a packet
//! - `version_sum`: sum of every version field in the tree
//! - `render`: the expression as text, followed by its value
//!
//! All three are pure. The evaluator re-checks operand counts itself, since
//! trees can be built by hand without going through the decoder.

use std::fmt;

use crate::error::{EvalError, Result};
use crate::packet::{Operation, Operator, Packet};

/// Compute the value of `packet`.
///
/// # Errors
/// - `EvalError::Arity` if an operator has no operands, or a comparison
///   does not have exactly two
/// - `EvalError::Overflow` if a sum or product does not fit in 64 bits
pub fn evaluate(packet: &Packet) -> Result<u64> {
    match packet {
        Packet::Literal { value, .. } => Ok(*value),
        Packet::Operator(op) => apply(op),
    }
}

fn apply(op: &Operator) -> Result<u64> {
    let operation = op.operation;
    let arity = || EvalError::Arity {
        operation,
        expected: if operation.is_comparison() {
            "exactly 2"
        } else {
            "at least 1"
        },
        actual: op.children.len(),
    };
    if !operation.accepts(op.children.len()) {
        return Err(arity().into());
    }

    let values = op
        .children
        .iter()
        .map(evaluate)
        .collect::<Result<Vec<u64>>>()?;
    let overflow = || EvalError::Overflow { operation };

    let value = match operation {
        Operation::Sum => values
            .iter()
            .try_fold(0u64, |acc, &v| acc.checked_add(v))
            .ok_or_else(overflow)?,
        Operation::Product => values
            .iter()
            .try_fold(1u64, |acc, &v| acc.checked_mul(v))
            .ok_or_else(overflow)?,
        Operation::Minimum => values.iter().copied().min().ok_or_else(arity)?,
        Operation::Maximum => values.iter().copied().max().ok_or_else(arity)?,
        Operation::GreaterThan => {
            let (a, b) = operands(&values).ok_or_else(arity)?;
            u64::from(a > b)
        }
        Operation::LessThan => {
            let (a, b) = operands(&values).ok_or_else(arity)?;
            u64::from(a < b)
        }
        Operation::EqualTo => {
            let (a, b) = operands(&values).ok_or_else(arity)?;
            u64::from(a == b)
        }
    };

    Ok(value)
}

fn operands(values: &[u64]) -> Option<(u64, u64)> {
    match values {
        [a, b] => Some((*a, *b)),
        _ => None,
    }
}

/// Sum of the version fields of `packet` and all of its descendants.
pub fn version_sum(packet: &Packet) -> u64 {
    match packet {
        Packet::Literal { version, .. } => *version as u64,
        Packet::Operator(op) => {
            op.version as u64 + op.children.iter().map(version_sum).sum::<u64>()
        }
    }
}

/// Render the expression followed by its value, e.g. `(1 + 2) = 3`.
///
/// Literals render as their bare value.
pub fn render(packet: &Packet) -> Result<String> {
    let value = evaluate(packet)?;
    Ok(match packet {
        Packet::Literal { .. } => value.to_string(),
        Packet::Operator(_) => format!("{packet} = {value}"),
    })
}

/// Writes the expression only, without its value.
impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Packet::Literal { value, .. } => return write!(f, "{value}"),
            Packet::Operator(op) => op,
        };

        let (open, separator) = match op.operation {
            Operation::Sum => ("(", " + "),
            Operation::Product => ("(", " * "),
            Operation::Minimum => ("min(", ", "),
            Operation::Maximum => ("max(", ", "),
            Operation::GreaterThan => ("(", " > "),
            Operation::LessThan => ("(", " < "),
            Operation::EqualTo => ("(", " == "),
        };

        f.write_str(open)?;
        for (index, child) in op.children.iter().enumerate() {
            if index > 0 {
                f.write_str(separator)?;
            }
            write!(f, "{child}")?;
        }
        f.write_str(")")
    }
}
