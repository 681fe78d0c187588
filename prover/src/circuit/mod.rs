pub mod hash;
pub mod merkle;
pub mod mimc;
pub mod poseidon;
pub mod signature;
