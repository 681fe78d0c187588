#![allow(dead_code)]

use ark_std::rand::{SeedableRng, rngs::StdRng};
use rollup_config::{HashKind, ValidatorConfig};
use rollup_prover::{
    AccountTree, DefaultValidator, SharedHasher, SigningKey, TransitionWitness, hasher_for,
};

pub const DEPTH: usize = 5;

pub struct Fixture {
    pub tree: AccountTree<SharedHasher>,
    pub sender: SigningKey,
    pub receiver: SigningKey,
    pub validator: DefaultValidator,
}

pub fn config(kind: HashKind, depth: usize) -> ValidatorConfig {
    let mut config = ValidatorConfig::default();
    config.hash.kind = kind;
    config.tree.depth = depth;
    config
}

/// Sender {nonce 3, balance 100, index 2}, receiver {nonce 7, balance 10, index 5}
pub fn fixture(kind: HashKind) -> Fixture {
    let mut rng = StdRng::seed_from_u64(42);
    let sender = SigningKey::random(&mut rng);
    let receiver = SigningKey::random(&mut rng);

    let mut tree = AccountTree::new(hasher_for(kind), DEPTH);
    tree.insert_at(2, 3, 100, sender.public_key()).unwrap();
    tree.insert_at(5, 7, 10, receiver.public_key()).unwrap();

    // unrelated accounts so sibling paths are non-trivial
    for index in [0u64, 9, 17, 30] {
        let key = SigningKey::random(&mut rng);
        tree.insert_at(index, index, 1_000 + index, key.public_key())
            .unwrap();
    }

    Fixture {
        tree,
        sender,
        receiver,
        validator: DefaultValidator::from_config(&config(kind, DEPTH)),
    }
}

/// The spec'd example transfer of 40 from index 2 to index 5
pub fn example_witness(kind: HashKind) -> (Fixture, TransitionWitness) {
    let mut f = fixture(kind);
    let sender = f.sender.clone();
    let witness = f.tree.transfer(2, 5, 40, &sender).unwrap();
    (f, witness)
}
