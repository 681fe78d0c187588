//! Transition witness data model
//!
//! ```text
//!            root_before                      root_after
//!           /           \                    /          \
//!        ...             ...              ...            ...
//!        |                 |               |               |
//!  sender_before   receiver_before   sender_after   receiver_after
//!         \___________  ____________________/_______________/
//!                     \/
//!                  Transfer (signed by sender)
//! ```
//!
//! Every value here is immutable once built and consumed by exactly one
//! validation.

use ark_ed_on_bls12_381::EdwardsAffine;
use serde::{Deserialize, Serialize};

use crate::serde_utils::{hex_field, hex_field_vec};
use crate::{Fr, Scalar};

/// An affine point on the Jubjub curve, kept as raw coordinates.
///
/// Coordinates are not validated on construction; [`CurvePoint::to_affine`]
/// rejects anything off the curve or outside the prime-order subgroup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurvePoint {
    #[serde(with = "hex_field")]
    pub x: Fr,
    #[serde(with = "hex_field")]
    pub y: Fr,
}

/// Public keys are curve points `(X, Y)`
pub type PublicKey = CurvePoint;

impl CurvePoint {
    pub fn new(x: Fr, y: Fr) -> Self {
        Self { x, y }
    }

    /// Convert to an arkworks point, checking curve and subgroup membership
    pub fn to_affine(&self) -> Option<EdwardsAffine> {
        let point = EdwardsAffine::new_unchecked(self.x, self.y);
        (point.is_on_curve() && point.is_in_correct_subgroup_assuming_on_curve()).then_some(point)
    }

    /// The neutral element `(0, 1)`
    pub fn identity() -> Self {
        Self::from(EdwardsAffine::zero())
    }
}

impl From<EdwardsAffine> for CurvePoint {
    fn from(point: EdwardsAffine) -> Self {
        Self {
            x: point.x,
            y: point.y,
        }
    }
}

/// One rollup participant's committed state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub nonce: u64,
    pub balance: u64,
    /// Leaf position in the account tree; fixed for the account's lifetime
    pub index: u64,
    pub public_key: PublicKey,
}

/// Schnorr signature `(R, s)` over Jubjub
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub r: CurvePoint,
    #[serde(with = "hex_field")]
    pub s: Scalar,
}

/// A proposed balance movement authorized by the sender
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub amount: u64,
    pub nonce: u64,
    pub sender_public_key: PublicKey,
    pub receiver_public_key: PublicKey,
    pub signature: Signature,
}

/// Merkle inclusion proof for one account leaf
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    #[serde(with = "hex_field")]
    pub root_hash: Fr,
    /// Sibling hashes, leaf level first
    #[serde(with = "hex_field_vec")]
    pub path: Vec<Fr>,
    #[serde(with = "hex_field")]
    pub leaf: Fr,
}

/// Public inputs a proving backend commits to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicInputs {
    pub root_before: Fr,
    pub root_after: Fr,
}

/// Everything a single-transfer validity check is evaluated against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionWitness {
    pub sender_before: Account,
    pub receiver_before: Account,
    pub sender_after: Account,
    pub receiver_after: Account,

    pub transfer: Transfer,

    pub proof_sender_before: MerkleProof,
    pub proof_sender_after: MerkleProof,
    pub proof_receiver_before: MerkleProof,
    pub proof_receiver_after: MerkleProof,

    pub index_sender: u64,
    pub index_receiver: u64,

    #[serde(with = "hex_field")]
    pub root_before: Fr,
    #[serde(with = "hex_field")]
    pub root_after: Fr,
}

impl TransitionWitness {
    pub fn public_inputs(&self) -> PublicInputs {
        PublicInputs {
            root_before: self.root_before,
            root_after: self.root_after,
        }
    }

    /// Parse a witness from its JSON encoding
    pub fn from_json(json: &str) -> crate::errors::Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| crate::errors::TransitionError::Encoding(e.to_string()))
    }

    pub fn to_json(&self) -> crate::errors::Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| crate::errors::TransitionError::Encoding(e.to_string()))
    }
}
