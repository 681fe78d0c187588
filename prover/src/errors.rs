//! Error taxonomy for transition validation.
//!
//! Every failure is reported, never recovered: the validator does not retry
//! or repair a witness.
use thiserror::Error;

use crate::transition::{Violation, ViolationKind};

/// Errors produced while validating a transition witness
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransitionError {
    /// Leaf index does not fit in the configured tree depth
    #[error("Invalid index: {index} does not fit in a depth-{depth} tree")]
    InvalidIndex { index: u64, depth: usize },

    /// Wrong path length or roots that disagree across proofs
    #[error("Malformed proof: {0}")]
    MalformedProof(String),

    /// Signature equation does not hold
    #[error("Invalid signature")]
    InvalidSignature,

    /// One or more transition invariants failed
    #[error("Invariant violation: {}", describe(.0))]
    InvariantViolation(Vec<Violation>),

    /// A transfer the witness builder refuses to apply
    #[error("Invalid transfer: {0}")]
    InvalidTransfer(String),

    /// Witness could not be decoded or a value is not a valid curve element
    #[error("Encoding error: {0}")]
    Encoding(String),
}

/// Result type for validation operations
pub type Result<T> = std::result::Result<T, TransitionError>;

fn describe(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl TransitionError {
    /// Build the error reported for a rejected witness.
    ///
    /// The most severe kind present decides the variant, in the order
    /// `InvalidIndex`, `MalformedProof`, `InvalidSignature`,
    /// `InvariantViolation`. The result does not depend on the order the
    /// violations were found in.
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        let out_of_range = violations.iter().find_map(|v| match v {
            Violation::IndexOutOfRange { index, depth, .. } => Some((*index, *depth)),
            _ => None,
        });
        if let Some((index, depth)) = out_of_range {
            return Self::InvalidIndex { index, depth };
        }

        let has = |kind: ViolationKind| violations.iter().any(|v| v.kind() == kind);
        if has(ViolationKind::MalformedProof) {
            Self::MalformedProof(describe(&violations))
        } else if has(ViolationKind::InvalidSignature) {
            Self::InvalidSignature
        } else {
            Self::InvariantViolation(violations)
        }
    }
}
