//! Validity predicate for single-transfer rollup state transitions.
//!
//! A [`TransitionWitness`] carries the before/after states of a sender and a
//! receiver, four Merkle inclusion proofs, a signed [`Transfer`] and the two
//! public roots. [`TransitionValidator::check`] accepts it iff every rollup
//! invariant holds.

pub mod constants;
pub mod errors;
pub mod serde_utils;
pub mod transition;
pub mod witness;
pub mod witness_builder;

pub mod circuit;

/// Field all hashes and curve coordinates live in (BLS12-381 scalar field,
/// the Jubjub base field)
pub type Fr = ark_bls12_381::Fr;

/// Jubjub scalar field
pub type Scalar = ark_ed_on_bls12_381::Fr;

// Re-export key types for external usage
pub use circuit::{
    hash::{HashFunction, SharedHasher, account_leaf, hasher_for},
    merkle::{MerkleVerifier, PathVerifier},
    mimc::MimcHasher,
    poseidon::PoseidonHasher,
    signature::{SchnorrVerifier, SignatureScheme, SigningKey, transfer_digest},
};
pub use errors::{Result, TransitionError};
pub use transition::{
    DefaultValidator, Party, ProofSlot, TransitionValidator, ValidationResult, Violation,
    ViolationKind,
};
pub use witness::{
    Account, CurvePoint, MerkleProof, PublicInputs, PublicKey, Signature, Transfer,
    TransitionWitness,
};
pub use witness_builder::AccountTree;
