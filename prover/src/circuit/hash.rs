use std::sync::Arc;

use rollup_config::HashKind;

use crate::Fr;
use crate::witness::Account;

use super::{mimc::MimcHasher, poseidon::PoseidonHasher};

/// A one-way, collision-resistant compression function over `Fr`.
///
/// Every call starts from a fresh internal state, so digests of different
/// inputs never share sponge state.
pub trait HashFunction: Send + Sync {
    fn hash(&self, inputs: &[Fr]) -> Fr;

    /// Two-to-one compression used for Merkle nodes
    fn hash2(&self, left: Fr, right: Fr) -> Fr {
        self.hash(&[left, right])
    }
}

impl<H: HashFunction + ?Sized> HashFunction for Arc<H> {
    fn hash(&self, inputs: &[Fr]) -> Fr {
        (**self).hash(inputs)
    }
}

impl<H: HashFunction + ?Sized> HashFunction for &H {
    fn hash(&self, inputs: &[Fr]) -> Fr {
        (**self).hash(inputs)
    }
}

/// Shared, type-erased hasher selected at runtime
pub type SharedHasher = Arc<dyn HashFunction>;

/// Build the hasher named in configuration
pub fn hasher_for(kind: HashKind) -> SharedHasher {
    match kind {
        HashKind::Mimc => Arc::new(MimcHasher::new()),
        HashKind::Poseidon => Arc::new(PoseidonHasher::new()),
    }
}

/// Leaf commitment: H(nonce, balance, pk.X, pk.Y)
pub fn account_leaf<H: HashFunction + ?Sized>(hasher: &H, account: &Account) -> Fr {
    hasher.hash(&[
        Fr::from(account.nonce),
        Fr::from(account.balance),
        account.public_key.x,
        account.public_key.y,
    ])
}
