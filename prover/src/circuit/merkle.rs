//! Merkle inclusion verification
//!
//! ```text
//!                    Root
//!                   /    \
//!                 H01    H23         level 1: bit 1 of index
//!                /  \   /   \
//!               L0  L1 L2   L3       level 0: bit 0 of index
//! ```
//!
//! `path[i]` is the sibling at level `i`. When bit `i` of the index is 0 the
//! running node is the left child: `H(running, path[i])`; otherwise
//! `H(path[i], running)`.

use crate::Fr;
use crate::errors::{Result, TransitionError};
use crate::witness::MerkleProof;

use super::hash::HashFunction;

/// Checks a Merkle proof against its claimed root
pub trait MerkleVerifier: Send + Sync {
    /// `Ok(true)` iff the path recomputes `proof.root_hash` from
    /// `proof.leaf` at `index`. Out-of-range indices and wrong path lengths
    /// are errors, not `false`.
    fn verify(&self, proof: &MerkleProof, index: u64) -> Result<bool>;

    /// Tree depth D this verifier expects
    fn depth(&self) -> usize;
}

/// Fixed-depth authentication path verifier
#[derive(Debug, Clone)]
pub struct PathVerifier<H> {
    hasher: H,
    depth: usize,
}

impl<H: HashFunction> PathVerifier<H> {
    pub fn new(hasher: H, depth: usize) -> Self {
        Self { hasher, depth }
    }

    /// Ensure `index` is representable in exactly `depth` bits
    pub fn check_index(&self, index: u64) -> Result<()> {
        if fits_in_depth(index, self.depth) {
            Ok(())
        } else {
            Err(TransitionError::InvalidIndex {
                index,
                depth: self.depth,
            })
        }
    }

    /// Recompute the root from a leaf and its authentication path
    pub fn compute_root(&self, leaf: Fr, path: &[Fr], index: u64) -> Result<Fr> {
        self.check_index(index)?;
        if path.len() != self.depth {
            return Err(TransitionError::MalformedProof(format!(
                "path has {} elements, expected {}",
                path.len(),
                self.depth
            )));
        }

        let mut current = leaf;
        for (level, sibling) in path.iter().enumerate() {
            let bit = index.checked_shr(level as u32).unwrap_or(0) & 1;
            current = if bit == 0 {
                self.hasher.hash2(current, *sibling)
            } else {
                self.hasher.hash2(*sibling, current)
            };
        }

        Ok(current)
    }
}

impl<H: HashFunction> MerkleVerifier for PathVerifier<H> {
    fn verify(&self, proof: &MerkleProof, index: u64) -> Result<bool> {
        let computed = self.compute_root(proof.leaf, &proof.path, index)?;
        Ok(computed == proof.root_hash)
    }

    fn depth(&self) -> usize {
        self.depth
    }
}

/// `index < 2^depth`
pub fn fits_in_depth(index: u64, depth: usize) -> bool {
    u32::try_from(depth)
        .ok()
        .and_then(|d| index.checked_shr(d))
        .is_none_or(|rest| rest == 0)
}
