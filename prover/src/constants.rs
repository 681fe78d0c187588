pub use rollup_config::{DEFAULT_TREE_DEPTH, MAX_TREE_DEPTH};

/// Domain tag absorbed before a signer's secret when deriving the nonce.
pub const SIGNING_NONCE_DOMAIN: u64 = 0x4e4f4e43; // "NONC"
