//! MiMC Hash
//!
//! MiMC-7 permutation in a simple sponge over the BLS12-381 scalar field.
//!
//! ```text
//! state_0   = 0
//! state_i+1 = P(state_i + x_i, 0)          for x in [len, inputs...]
//! P(x, k)   = rounds of (x + k + c_j)^7, then + k
//! ```
//!
//! The input count is absorbed first so `hash([a])` and `hash([a, 0])`
//! never collide.

use ark_ff::{Field, Zero};

use super::hash::HashFunction;
use crate::Fr;

/// Number of MiMC rounds
const MIMC_ROUNDS: usize = 91;

/// MiMC hasher with precomputed round constants
#[derive(Debug, Clone)]
pub struct MimcHasher {
    round_constants: Vec<Fr>,
}

impl Default for MimcHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl MimcHasher {
    pub fn new() -> Self {
        let round_constants: Vec<Fr> = (0..MIMC_ROUNDS).map(Self::compute_round_constant).collect();

        Self { round_constants }
    }

    /// RC[i] = (i+1)^3 + (i+1)
    fn compute_round_constant(i: usize) -> Fr {
        let idx = Fr::from((i + 1) as u64);
        let idx_cubed = idx * idx * idx;
        idx_cubed + idx
    }

    /// MiMC round function: (x + k + c)^7
    fn round(&self, x: Fr, k: Fr, c: Fr) -> Fr {
        let t = x + k + c;
        let t2 = t.square();
        let t4 = t2.square();
        let t6 = t4 * t2;
        t6 * t
    }

    /// MiMC permutation: encrypts x with key k
    fn permute(&self, x: Fr, k: Fr) -> Fr {
        let mut state = x;
        for c in &self.round_constants {
            state = self.round(state, k, *c);
        }
        state + k
    }
}

impl HashFunction for MimcHasher {
    fn hash(&self, inputs: &[Fr]) -> Fr {
        let mut state = Fr::zero();
        let domain = Fr::from(inputs.len() as u64);

        for input in std::iter::once(&domain).chain(inputs) {
            state = self.permute(state + *input, Fr::zero());
        }

        state
    }
}
