use ark_crypto_primitives::sponge::{
    CryptographicSponge,
    poseidon::{PoseidonConfig, PoseidonSponge, find_poseidon_ark_and_mds},
};
use ark_ff::PrimeField;
use std::sync::Arc;

use super::hash::HashFunction;
use crate::Fr;

/// Poseidon configuration
///
/// Field: BLS12-381 Fr (255 bits)
/// Rate: 2
/// Capacity: 1
/// Security: 128 bits
pub fn poseidon_config() -> PoseidonConfig<Fr> {
    let prime_bits = Fr::MODULUS_BIT_SIZE as u64;
    let rate: usize = 2;
    let capacity: usize = 1;

    let full_rounds: u64 = 8;
    let partial_rounds: u64 = 57;

    // alpha = 5 is standard for Poseidon over large prime fields
    let alpha: u64 = 5;

    let skip_matrices: u64 = 0;

    let (ark, mds) = find_poseidon_ark_and_mds::<Fr>(
        prime_bits,
        rate,
        full_rounds,
        partial_rounds,
        skip_matrices,
    );

    PoseidonConfig::new(
        full_rounds as usize,
        partial_rounds as usize,
        alpha,
        mds,
        ark,
        rate,
        capacity,
    )
}

/// Poseidon sponge hasher; a new sponge is created for every call
#[derive(Clone)]
pub struct PoseidonHasher {
    config: Arc<PoseidonConfig<Fr>>,
}

impl PoseidonHasher {
    pub fn new() -> Self {
        Self {
            config: Arc::new(poseidon_config()),
        }
    }
}

impl Default for PoseidonHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl HashFunction for PoseidonHasher {
    fn hash(&self, inputs: &[Fr]) -> Fr {
        let mut sponge = PoseidonSponge::<Fr>::new(self.config.as_ref());

        sponge.absorb(&Fr::from(inputs.len() as u64));
        for input in inputs {
            sponge.absorb(input);
        }

        let out: Vec<Fr> = sponge.squeeze_field_elements(1);
        out[0]
    }
}
