//! Transition validity predicate
//!
//! Decides whether one transfer between two accounts of the account tree is
//! a valid state transition from `root_before` to `root_after`.
//!
//! Checks (all evaluated, none skipped):
//! 1. Nonce progression: sender nonce +1, transfer nonce = sender nonce,
//!    receiver nonce unchanged
//! 2. Solvency: amount <= sender balance
//! 3. Sender balance update: after = before - amount
//! 4. Receiver balance update: after = before + amount (no overflow)
//! 5. Key immutability for both accounts
//! 6. Signature validity, with the transfer's keys matching the accounts
//! 7. Root consistency: before proofs share `root_before`, after proofs
//!    share `root_after`
//! 8. Index binding across all four account states
//! 9. Inclusion: each proof's leaf commits to its account and the path
//!    recomputes the root
//!
//! Every check is an unconditional assertion in the proving context, so the
//! validator collects all failures instead of returning at the first one.

use std::fmt;
use std::sync::Arc;

use log::debug;
use rollup_config::ValidatorConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::circuit::hash::{HashFunction, SharedHasher, account_leaf, hasher_for};
use crate::circuit::merkle::{MerkleVerifier, PathVerifier};
use crate::circuit::signature::{SchnorrVerifier, SignatureScheme};
use crate::errors::{Result, TransitionError};
use crate::witness::{Account, MerkleProof, TransitionWitness};

/// Which of the four inclusion proofs a violation refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProofSlot {
    SenderBefore,
    SenderAfter,
    ReceiverBefore,
    ReceiverAfter,
}

impl ProofSlot {
    pub const ALL: [ProofSlot; 4] = [
        ProofSlot::SenderBefore,
        ProofSlot::SenderAfter,
        ProofSlot::ReceiverBefore,
        ProofSlot::ReceiverAfter,
    ];
}

impl fmt::Display for ProofSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProofSlot::SenderBefore => "sender/before",
            ProofSlot::SenderAfter => "sender/after",
            ProofSlot::ReceiverBefore => "receiver/before",
            ProofSlot::ReceiverAfter => "receiver/after",
        };
        f.write_str(name)
    }
}

/// Sender or receiver side of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Party {
    Sender,
    Receiver,
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Party::Sender => f.write_str("sender"),
            Party::Receiver => f.write_str("receiver"),
        }
    }
}

/// Error category of a violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    InvalidIndex,
    MalformedProof,
    InvalidSignature,
    InvariantViolation,
}

/// A single failed transition invariant
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Violation {
    #[error("sender nonce must advance by one: before {before}, after {after}")]
    NonceProgression { before: u64, after: u64 },

    #[error("transfer nonce {transfer} does not match sender nonce {account}")]
    TransferNonce { transfer: u64, account: u64 },

    #[error("receiver nonce changed from {before} to {after}")]
    ReceiverNonceChanged { before: u64, after: u64 },

    #[error("insufficient balance: amount {amount} exceeds balance {balance}")]
    Solvency { amount: u64, balance: u64 },

    #[error("sender balance update does not match transfer amount")]
    SenderBalanceUpdate,

    #[error("receiver balance update does not match transfer amount")]
    ReceiverBalanceUpdate,

    #[error("{0} public key changed")]
    KeyRotated(Party),

    #[error("transfer {0} key does not match account key")]
    TransferKeyMismatch(Party),

    #[error("signature does not verify")]
    InvalidSignature,

    #[error("{slot} proof root does not match the committed root")]
    RootMismatch { slot: ProofSlot },

    #[error("{slot} account index does not match the claimed index")]
    IndexMismatch { slot: ProofSlot },

    #[error("{slot} index {index} does not fit in a depth-{depth} tree")]
    IndexOutOfRange {
        slot: ProofSlot,
        index: u64,
        depth: usize,
    },

    #[error("{slot} proof path has {len} elements, expected {depth}")]
    PathLength {
        slot: ProofSlot,
        len: usize,
        depth: usize,
    },

    #[error("{slot} proof leaf is not the hash of the account")]
    LeafMismatch { slot: ProofSlot },

    #[error("{slot} proof path does not lead to its root")]
    InclusionFailed { slot: ProofSlot },

    #[error("{slot} proof rejected by the verifier: {reason}")]
    ProofRejected { slot: ProofSlot, reason: String },
}

impl Violation {
    pub fn kind(&self) -> ViolationKind {
        match self {
            Violation::IndexOutOfRange { .. } => ViolationKind::InvalidIndex,
            Violation::PathLength { .. }
            | Violation::RootMismatch { .. }
            | Violation::ProofRejected { .. } => ViolationKind::MalformedProof,
            Violation::InvalidSignature | Violation::TransferKeyMismatch(_) => {
                ViolationKind::InvalidSignature
            }
            _ => ViolationKind::InvariantViolation,
        }
    }
}

/// Verdict of a transition check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(Vec<Violation>),
}

impl ValidationResult {
    fn from_violations(violations: Vec<Violation>) -> Self {
        if violations.is_empty() {
            Self::Valid
        } else {
            Self::Invalid(violations)
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::Valid => &[],
            Self::Invalid(v) => v,
        }
    }

    /// True if any violation falls in `kind`
    pub fn has_kind(&self, kind: ViolationKind) -> bool {
        self.violations().iter().any(|v| v.kind() == kind)
    }

    pub fn into_result(self) -> Result<()> {
        match self {
            Self::Valid => Ok(()),
            Self::Invalid(v) => Err(TransitionError::from_violations(v)),
        }
    }
}

/// The transition validity predicate.
///
/// Depends only on the three capability traits; the tree depth is carried
/// by the Merkle verifier.
#[derive(Debug, Clone)]
pub struct TransitionValidator<H, S, M> {
    hasher: H,
    signatures: S,
    merkle: M,
}

/// Validator stack built from configuration
pub type DefaultValidator =
    TransitionValidator<SharedHasher, SchnorrVerifier<SharedHasher>, PathVerifier<SharedHasher>>;

impl DefaultValidator {
    /// Schnorr + fixed-depth path verifier over the configured hash
    pub fn from_config(config: &ValidatorConfig) -> Self {
        let hasher = hasher_for(config.hash.kind);
        Self::new(
            Arc::clone(&hasher),
            SchnorrVerifier::new(Arc::clone(&hasher)),
            PathVerifier::new(hasher, config.tree.depth),
        )
    }
}

impl<H, S, M> TransitionValidator<H, S, M>
where
    H: HashFunction,
    S: SignatureScheme,
    M: MerkleVerifier,
{
    pub fn new(hasher: H, signatures: S, merkle: M) -> Self {
        Self {
            hasher,
            signatures,
            merkle,
        }
    }

    pub fn depth(&self) -> usize {
        self.merkle.depth()
    }

    /// Evaluate every invariant against `witness`
    pub fn check(&self, witness: &TransitionWitness) -> ValidationResult {
        let mut violations = Vec::new();

        self.check_nonces(witness, &mut violations);
        self.check_balances(witness, &mut violations);
        self.check_keys(witness, &mut violations);
        self.check_signature(witness, &mut violations);
        for slot in ProofSlot::ALL {
            self.check_slot(witness, slot, &mut violations);
        }

        for v in &violations {
            debug!("transition check failed: {}", v);
        }

        ValidationResult::from_violations(violations)
    }

    /// Hard-precondition form of [`check`](Self::check)
    pub fn check_strict(&self, witness: &TransitionWitness) -> Result<()> {
        self.check(witness).into_result()
    }

    fn check_nonces(&self, w: &TransitionWitness, out: &mut Vec<Violation>) {
        let before = w.sender_before.nonce;
        if before.checked_add(1) != Some(w.sender_after.nonce) {
            out.push(Violation::NonceProgression {
                before,
                after: w.sender_after.nonce,
            });
        }

        if w.transfer.nonce != before {
            out.push(Violation::TransferNonce {
                transfer: w.transfer.nonce,
                account: before,
            });
        }

        if w.receiver_before.nonce != w.receiver_after.nonce {
            out.push(Violation::ReceiverNonceChanged {
                before: w.receiver_before.nonce,
                after: w.receiver_after.nonce,
            });
        }
    }

    fn check_balances(&self, w: &TransitionWitness, out: &mut Vec<Violation>) {
        let amount = w.transfer.amount;

        if amount > w.sender_before.balance {
            out.push(Violation::Solvency {
                amount,
                balance: w.sender_before.balance,
            });
        }

        if w.sender_before.balance.checked_sub(amount) != Some(w.sender_after.balance) {
            out.push(Violation::SenderBalanceUpdate);
        }

        if w.receiver_before.balance.checked_add(amount) != Some(w.receiver_after.balance) {
            out.push(Violation::ReceiverBalanceUpdate);
        }
    }

    fn check_keys(&self, w: &TransitionWitness, out: &mut Vec<Violation>) {
        if w.sender_before.public_key != w.sender_after.public_key {
            out.push(Violation::KeyRotated(Party::Sender));
        }
        if w.receiver_before.public_key != w.receiver_after.public_key {
            out.push(Violation::KeyRotated(Party::Receiver));
        }
    }

    fn check_signature(&self, w: &TransitionWitness, out: &mut Vec<Violation>) {
        if w.transfer.sender_public_key != w.sender_before.public_key {
            out.push(Violation::TransferKeyMismatch(Party::Sender));
        }
        if w.transfer.receiver_public_key != w.receiver_before.public_key {
            out.push(Violation::TransferKeyMismatch(Party::Receiver));
        }
        if !self.signatures.verify(&w.transfer) {
            out.push(Violation::InvalidSignature);
        }
    }

    /// Root, index, leaf and path checks for one proof
    fn check_slot(&self, w: &TransitionWitness, slot: ProofSlot, out: &mut Vec<Violation>) {
        let (account, proof, index, root) = slot_parts(w, slot);

        if proof.root_hash != root {
            out.push(Violation::RootMismatch { slot });
        }

        if account.index != index {
            out.push(Violation::IndexMismatch { slot });
        }

        if account_leaf(&self.hasher, account) != proof.leaf {
            out.push(Violation::LeafMismatch { slot });
        }

        match self.merkle.verify(proof, index) {
            Ok(true) => {}
            Ok(false) => out.push(Violation::InclusionFailed { slot }),
            Err(TransitionError::InvalidIndex { index, depth }) => {
                out.push(Violation::IndexOutOfRange { slot, index, depth })
            }
            Err(TransitionError::MalformedProof(_)) if proof.path.len() != self.merkle.depth() => {
                out.push(Violation::PathLength {
                    slot,
                    len: proof.path.len(),
                    depth: self.merkle.depth(),
                })
            }
            Err(e) => out.push(Violation::ProofRejected {
                slot,
                reason: e.to_string(),
            }),
        }
    }
}

fn slot_parts(w: &TransitionWitness, slot: ProofSlot) -> (&Account, &MerkleProof, u64, crate::Fr) {
    match slot {
        ProofSlot::SenderBefore => (
            &w.sender_before,
            &w.proof_sender_before,
            w.index_sender,
            w.root_before,
        ),
        ProofSlot::SenderAfter => (
            &w.sender_after,
            &w.proof_sender_after,
            w.index_sender,
            w.root_after,
        ),
        ProofSlot::ReceiverBefore => (
            &w.receiver_before,
            &w.proof_receiver_before,
            w.index_receiver,
            w.root_before,
        ),
        ProofSlot::ReceiverAfter => (
            &w.receiver_after,
            &w.proof_receiver_after,
            w.index_receiver,
            w.root_after,
        ),
    }
}
