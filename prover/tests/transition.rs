mod common;

use ark_ff::{BigInteger, PrimeField};
use ark_std::rand::{Rng, SeedableRng, rngs::StdRng};
use rollup_config::HashKind;
use rollup_prover::{
    Fr, ProofSlot, SigningKey, TransitionError, TransitionWitness, ValidationResult, Violation,
    ViolationKind, hasher_for,
};

use common::{DEPTH, config, example_witness, fixture};

fn flip_bit(value: Fr, bit: usize) -> Fr {
    let mut bytes = value.into_bigint().to_bytes_le();
    bytes[bit / 8] ^= 1 << (bit % 8);
    Fr::from_le_bytes_mod_order(&bytes)
}

fn proof_mut(w: &mut TransitionWitness, slot: ProofSlot) -> &mut rollup_prover::MerkleProof {
    match slot {
        ProofSlot::SenderBefore => &mut w.proof_sender_before,
        ProofSlot::SenderAfter => &mut w.proof_sender_after,
        ProofSlot::ReceiverBefore => &mut w.proof_receiver_before,
        ProofSlot::ReceiverAfter => &mut w.proof_receiver_after,
    }
}

#[test]
fn example_transfer_is_valid() {
    for kind in [HashKind::Mimc, HashKind::Poseidon] {
        let (f, w) = example_witness(kind);

        assert_eq!(w.sender_after.nonce, 4);
        assert_eq!(w.sender_after.balance, 60);
        assert_eq!(w.sender_after.index, 2);
        assert_eq!(w.receiver_after.nonce, 7);
        assert_eq!(w.receiver_after.balance, 50);
        assert_eq!(w.receiver_after.index, 5);

        assert_eq!(f.validator.check(&w), ValidationResult::Valid);
        assert!(f.validator.check_strict(&w).is_ok());
    }
}

#[test]
fn amount_mismatch_is_invalid() {
    let (f, mut w) = example_witness(HashKind::Mimc);
    // re-sign honestly for 41 so only the after-state disagrees
    let hasher = hasher_for(HashKind::Mimc);
    w.transfer = f
        .sender
        .sign_transfer(&hasher, 41, 3, f.receiver.public_key());

    let result = f.validator.check(&w);
    assert!(!result.is_valid());
    assert!(result.violations().contains(&Violation::SenderBalanceUpdate));
    assert!(result.violations().contains(&Violation::ReceiverBalanceUpdate));
    assert!(!result.violations().contains(&Violation::InvalidSignature));
}

#[test]
fn tampered_amount_breaks_signature() {
    let (f, mut w) = example_witness(HashKind::Mimc);
    w.transfer.amount = 41;

    let result = f.validator.check(&w);
    assert!(result.violations().contains(&Violation::InvalidSignature));
    assert!(result.has_kind(ViolationKind::InvalidSignature));
}

#[test]
fn conservation_holds_for_valid_transitions() {
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..8 {
        let mut f = fixture(HashKind::Mimc);
        let sender = f.sender.clone();
        let amount = rng.gen_range(0..=100u64);
        let w = f.tree.transfer(2, 5, amount, &sender).unwrap();

        assert!(f.validator.check(&w).is_valid());
        assert_eq!(
            w.sender_before.balance + w.receiver_before.balance,
            w.sender_after.balance + w.receiver_after.balance
        );
    }
}

#[test]
fn consecutive_transfers_validate() {
    let mut f = fixture(HashKind::Mimc);
    let sender = f.sender.clone();
    let receiver = f.receiver.clone();

    let w1 = f.tree.transfer(2, 5, 10, &sender).unwrap();
    let w2 = f.tree.transfer(5, 2, 25, &receiver).unwrap();
    let w3 = f.tree.transfer(2, 5, 0, &sender).unwrap();

    assert_eq!(w1.root_after, w2.root_before);
    assert_eq!(w2.root_after, w3.root_before);
    for w in [&w1, &w2, &w3] {
        assert!(f.validator.check(w).is_valid());
    }
    assert_eq!(w3.sender_after.nonce, 5);
    assert_eq!(w2.sender_after.nonce, 8);
}

#[test]
fn nonce_must_advance_by_exactly_one() {
    let (f, w) = example_witness(HashKind::Mimc);

    for after in [3u64, 5, 0, u64::MAX] {
        let mut bad = w.clone();
        bad.sender_after.nonce = after;

        let result = f.validator.check(&bad);
        assert!(
            result.violations().contains(&Violation::NonceProgression { before: 3, after }),
            "nonce {} should be rejected",
            after
        );
    }
}

#[test]
fn nonce_overflow_is_rejected() {
    let (f, mut w) = example_witness(HashKind::Mimc);
    w.sender_before.nonce = u64::MAX;
    w.sender_after.nonce = 0;

    let result = f.validator.check(&w);
    assert!(result.violations().contains(&Violation::NonceProgression {
        before: u64::MAX,
        after: 0
    }));
}

#[test]
fn overdraft_is_rejected() {
    let (f, mut w) = example_witness(HashKind::Mimc);
    let hasher = hasher_for(HashKind::Mimc);
    // internally consistent apart from the balance going negative
    w.transfer = f
        .sender
        .sign_transfer(&hasher, 101, 3, f.receiver.public_key());
    w.sender_after.balance = 0;
    w.receiver_after.balance = 111;

    let result = f.validator.check(&w);
    assert!(result.violations().contains(&Violation::Solvency {
        amount: 101,
        balance: 100
    }));
    assert!(result.violations().contains(&Violation::SenderBalanceUpdate));
}

#[test]
fn merkle_path_bit_flips_are_rejected() {
    let (f, w) = example_witness(HashKind::Mimc);
    let bits = [0usize, 1, 7, 63, 128, 200, 254];

    for slot in ProofSlot::ALL {
        for level in 0..DEPTH {
            for bit in bits {
                let mut bad = w.clone();
                let proof = proof_mut(&mut bad, slot);
                proof.path[level] = flip_bit(proof.path[level], bit);

                let result = f.validator.check(&bad);
                assert!(
                    result
                        .violations()
                        .contains(&Violation::InclusionFailed { slot }),
                    "flip of bit {} at level {} of {} not detected",
                    bit,
                    level,
                    slot
                );
            }
        }
    }
}

#[test]
fn reused_proof_for_other_content_is_rejected() {
    let (f, mut w) = example_witness(HashKind::Mimc);
    // claim a richer sender while keeping the honest proof
    w.sender_before.balance = 1_000;
    w.sender_after.balance = 960;

    let result = f.validator.check(&w);
    assert!(result.violations().contains(&Violation::LeafMismatch {
        slot: ProofSlot::SenderBefore
    }));
    assert!(result.violations().contains(&Violation::LeafMismatch {
        slot: ProofSlot::SenderAfter
    }));
}

#[test]
fn receiver_swap_breaks_signature() {
    let (f, mut w) = example_witness(HashKind::Mimc);
    let mut rng = StdRng::seed_from_u64(99);
    let mallory = SigningKey::random(&mut rng);

    w.transfer.receiver_public_key = mallory.public_key();

    let result = f.validator.check(&w);
    assert!(result.violations().contains(&Violation::InvalidSignature));
    assert_eq!(
        ValidationResult::Invalid(result.violations().to_vec()).into_result(),
        Err(TransitionError::InvalidSignature)
    );
}

#[test]
fn mismatched_before_roots_are_malformed() {
    let (f, mut w) = example_witness(HashKind::Mimc);
    let mut other = fixture(HashKind::Mimc);
    other.tree.insert_at(31, 0, 5, f.sender.public_key()).unwrap();

    // individually valid proof against a different tree
    w.proof_receiver_before = other.tree.proof(5).unwrap();
    assert_ne!(w.proof_receiver_before.root_hash, w.root_before);

    let result = f.validator.check(&w);
    assert!(result.violations().contains(&Violation::RootMismatch {
        slot: ProofSlot::ReceiverBefore
    }));
    assert!(result.has_kind(ViolationKind::MalformedProof));
    assert!(!result.violations().contains(&Violation::InclusionFailed {
        slot: ProofSlot::ReceiverBefore
    }));
    assert!(matches!(
        f.validator.check_strict(&w),
        Err(TransitionError::MalformedProof(_))
    ));
}

#[test]
fn index_binding_is_checked_in_all_states() {
    let (f, mut w) = example_witness(HashKind::Mimc);
    w.receiver_after.index = 6;

    let result = f.validator.check(&w);
    assert!(result.violations().contains(&Violation::IndexMismatch {
        slot: ProofSlot::ReceiverAfter
    }));
}

#[test]
fn swapped_claimed_index_fails_inclusion() {
    let (f, mut w) = example_witness(HashKind::Mimc);
    w.index_sender = 3;

    let result = f.validator.check(&w);
    assert!(result.violations().contains(&Violation::InclusionFailed {
        slot: ProofSlot::SenderBefore
    }));
    assert!(result.violations().contains(&Violation::IndexMismatch {
        slot: ProofSlot::SenderBefore
    }));
}

#[test]
fn out_of_range_index_is_reported() {
    let (f, mut w) = example_witness(HashKind::Mimc);
    w.index_receiver = 1 << DEPTH;

    let result = f.validator.check(&w);
    assert!(result.violations().contains(&Violation::IndexOutOfRange {
        slot: ProofSlot::ReceiverBefore,
        index: 32,
        depth: DEPTH
    }));
    assert_eq!(
        f.validator.check_strict(&w),
        Err(TransitionError::InvalidIndex {
            index: 32,
            depth: DEPTH
        })
    );
}

#[test]
fn short_path_is_malformed() {
    let (f, mut w) = example_witness(HashKind::Mimc);
    w.proof_sender_after.path.pop();

    let result = f.validator.check(&w);
    assert!(result.violations().contains(&Violation::PathLength {
        slot: ProofSlot::SenderAfter,
        len: DEPTH - 1,
        depth: DEPTH
    }));
}

#[test]
fn witness_survives_json() {
    let (f, w) = example_witness(HashKind::Poseidon);
    let json = w.to_json().unwrap();
    let back = TransitionWitness::from_json(&json).unwrap();

    assert_eq!(back, w);
    assert!(f.validator.check(&back).is_valid());
}

#[test]
fn witness_from_other_hash_is_rejected() {
    let (_, w) = example_witness(HashKind::Mimc);
    let poseidon = rollup_prover::DefaultValidator::from_config(&config(HashKind::Poseidon, DEPTH));

    assert!(!poseidon.check(&w).is_valid());
}

#[test]
fn validators_are_shareable_across_threads() {
    let (f, w) = example_witness(HashKind::Mimc);
    let mut bad = w.clone();
    bad.transfer.amount += 1;

    std::thread::scope(|s| {
        let good = s.spawn(|| f.validator.check(&w));
        let rejected = s.spawn(|| f.validator.check(&bad));
        assert!(good.join().unwrap().is_valid());
        assert!(!rejected.join().unwrap().is_valid());
    });
}

#[test]
fn witness_file_round_trip() {
    let (f, w) = example_witness(HashKind::Mimc);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("witness.json");

    std::fs::write(&path, w.to_json().unwrap()).unwrap();
    let json = std::fs::read_to_string(&path).unwrap();
    let back = TransitionWitness::from_json(&json).unwrap();

    assert!(f.validator.check(&back).is_valid());
}

#[test]
fn garbage_json_is_an_encoding_error() {
    assert!(matches!(
        TransitionWitness::from_json("{\"sender_before\": 1}"),
        Err(TransitionError::Encoding(_))
    ));
}

#[test]
fn root_mismatch_outranks_balance_errors() {
    let (f, mut w) = example_witness(HashKind::Mimc);
    w.proof_receiver_before.root_hash = w.root_after;
    w.transfer.amount = 41;

    let result = f.validator.check(&w);
    assert!(result.violations().contains(&Violation::SenderBalanceUpdate));
    assert!(result.violations().contains(&Violation::InvalidSignature));
    assert!(result.violations().contains(&Violation::RootMismatch {
        slot: ProofSlot::ReceiverBefore
    }));

    match f.validator.check_strict(&w) {
        Err(TransitionError::MalformedProof(msg)) => {
            assert!(msg.contains("receiver/before proof root"));
            assert!(msg.contains("sender balance"));
        }
        other => panic!("expected MalformedProof, got {:?}", other),
    }
}

#[test]
fn public_inputs_are_the_tree_roots() {
    let mut f = fixture(HashKind::Mimc);
    let sender = f.sender.clone();
    let before = f.tree.root();

    let w = f.tree.transfer(2, 5, 40, &sender).unwrap();
    let inputs = w.public_inputs();

    assert_eq!(inputs.root_before, before);
    assert_eq!(inputs.root_after, f.tree.root());
    assert_ne!(inputs.root_before, inputs.root_after);
}
