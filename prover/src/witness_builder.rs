//! Witness builder
//!
//! Sequencer-side assembly of a [`TransitionWitness`]: holds the current
//! account set in a sparse in-memory tree, applies one transfer and collects
//! the four inclusion proofs around it. Nothing is persisted.
//!
//! ```text
//!                    Root (level D)
//!                   /              \
//!              H(0,1)              H(2,3)
//!             /      \            /      \
//!          Leaf0    Leaf1      Leaf2    Leaf3
//! ```
//!
//! Each occupied leaf is `H(nonce, balance, pk.X, pk.Y)`; empty leaves are 0.

use ark_ff::Zero;
use log::debug;
use std::collections::HashMap;

use crate::Fr;
use crate::circuit::hash::{HashFunction, account_leaf};
use crate::circuit::merkle::fits_in_depth;
use crate::circuit::signature::SigningKey;
use crate::errors::{Result, TransitionError};
use crate::transition::{Party, Violation};
use crate::witness::{Account, MerkleProof, PublicKey, TransitionWitness};

/// Sparse account tree of fixed depth
pub struct AccountTree<H> {
    hasher: H,
    depth: usize,
    /// Non-empty nodes: (level, index) -> hash
    nodes: HashMap<(usize, u64), Fr>,
    accounts: HashMap<u64, Account>,
    /// Root of an empty subtree at each level
    empty_roots: Vec<Fr>,
    root: Fr,
}

impl<H: HashFunction> AccountTree<H> {
    /// Create an empty tree
    pub fn new(hasher: H, depth: usize) -> Self {
        let mut empty_roots = vec![Fr::zero()];
        for level in 0..depth {
            let prev = empty_roots[level];
            empty_roots.push(hasher.hash2(prev, prev));
        }
        let root = empty_roots[depth];

        Self {
            hasher,
            depth,
            nodes: HashMap::new(),
            accounts: HashMap::new(),
            empty_roots,
            root,
        }
    }

    pub fn root(&self) -> Fr {
        self.root
    }

    pub fn account(&self, index: u64) -> Option<&Account> {
        self.accounts.get(&index)
    }

    /// Create or overwrite the account at `index`
    pub fn insert_at(
        &mut self,
        index: u64,
        nonce: u64,
        balance: u64,
        public_key: PublicKey,
    ) -> Result<()> {
        self.set(Account {
            nonce,
            balance,
            index,
            public_key,
        })
    }

    /// Store an account at its own index and update the path to the root
    pub fn set(&mut self, account: Account) -> Result<()> {
        let position = account.index;
        if !fits_in_depth(position, self.depth) {
            return Err(TransitionError::InvalidIndex {
                index: position,
                depth: self.depth,
            });
        }

        let mut current_hash = account_leaf(&self.hasher, &account);
        self.nodes.insert((0, position), current_hash);
        self.accounts.insert(position, account);

        let mut current_index = position;
        for level in 0..self.depth {
            let sibling = self.node(level, current_index ^ 1);

            current_hash = if current_index & 1 == 1 {
                self.hasher.hash2(sibling, current_hash)
            } else {
                self.hasher.hash2(current_hash, sibling)
            };

            current_index /= 2;
            self.nodes.insert((level + 1, current_index), current_hash);
        }

        self.root = current_hash;
        Ok(())
    }

    fn node(&self, level: usize, index: u64) -> Fr {
        self.nodes
            .get(&(level, index))
            .copied()
            .unwrap_or(self.empty_roots[level])
    }

    /// Inclusion proof for the leaf at `index`, occupied or not
    pub fn proof(&self, index: u64) -> Result<MerkleProof> {
        if !fits_in_depth(index, self.depth) {
            return Err(TransitionError::InvalidIndex {
                index,
                depth: self.depth,
            });
        }

        let mut path = Vec::with_capacity(self.depth);
        let mut current_index = index;
        for level in 0..self.depth {
            path.push(self.node(level, current_index ^ 1));
            current_index /= 2;
        }

        Ok(MerkleProof {
            root_hash: self.root,
            path,
            leaf: self.node(0, index),
        })
    }

    /// Apply a signed transfer and return the witness describing it.
    ///
    /// The tree is left in the after state on success and untouched on
    /// failure.
    pub fn transfer(
        &mut self,
        sender_index: u64,
        receiver_index: u64,
        amount: u64,
        sender_key: &SigningKey,
    ) -> Result<TransitionWitness> {
        if sender_index == receiver_index {
            return Err(TransitionError::InvalidTransfer(format!(
                "sender and receiver share leaf {}",
                sender_index
            )));
        }

        let sender_before = self.existing(sender_index)?;
        let receiver_before = self.existing(receiver_index)?;

        if sender_key.public_key() != sender_before.public_key {
            return Err(TransitionError::InvariantViolation(vec![
                Violation::TransferKeyMismatch(Party::Sender),
            ]));
        }

        let sender_balance = sender_before.balance.checked_sub(amount).ok_or_else(|| {
            TransitionError::InvariantViolation(vec![Violation::Solvency {
                amount,
                balance: sender_before.balance,
            }])
        })?;
        let receiver_balance = receiver_before.balance.checked_add(amount).ok_or_else(|| {
            TransitionError::InvariantViolation(vec![Violation::ReceiverBalanceUpdate])
        })?;
        let sender_nonce = sender_before.nonce.checked_add(1).ok_or_else(|| {
            TransitionError::InvariantViolation(vec![Violation::NonceProgression {
                before: sender_before.nonce,
                after: sender_before.nonce,
            }])
        })?;

        let transfer = sender_key.sign_transfer(
            &self.hasher,
            amount,
            sender_before.nonce,
            receiver_before.public_key,
        );

        let root_before = self.root;
        let proof_sender_before = self.proof(sender_index)?;
        let proof_receiver_before = self.proof(receiver_index)?;

        let sender_after = Account {
            nonce: sender_nonce,
            balance: sender_balance,
            ..sender_before.clone()
        };
        let receiver_after = Account {
            balance: receiver_balance,
            ..receiver_before.clone()
        };

        self.set(sender_after.clone())?;
        self.set(receiver_after.clone())?;

        let root_after = self.root;
        let proof_sender_after = self.proof(sender_index)?;
        let proof_receiver_after = self.proof(receiver_index)?;

        debug!(
            "built transfer witness: {} -> {} amount {}",
            sender_index, receiver_index, amount
        );

        Ok(TransitionWitness {
            sender_before,
            receiver_before,
            sender_after,
            receiver_after,
            transfer,
            proof_sender_before,
            proof_sender_after,
            proof_receiver_before,
            proof_receiver_after,
            index_sender: sender_index,
            index_receiver: receiver_index,
            root_before,
            root_after,
        })
    }

    fn existing(&self, index: u64) -> Result<Account> {
        if !fits_in_depth(index, self.depth) {
            return Err(TransitionError::InvalidIndex {
                index,
                depth: self.depth,
            });
        }
        self.accounts
            .get(&index)
            .cloned()
            .ok_or_else(|| TransitionError::InvalidTransfer(format!("no account at index {}", index)))
    }
}
