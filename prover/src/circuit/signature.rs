//! Schnorr signatures over Jubjub
//!
//! ```text
//! digest = H(nonce, amount, A_s.X, A_s.Y, A_r.X, A_r.Y)
//! c      = H(R.X, R.Y, A_s.X, A_s.Y, digest)   (reduced into the scalar field)
//! accept iff [8][s]B == [8](R + [c]A_s)
//! ```
//!
//! The receiver key is part of the digest, so a signature cannot be
//! replayed toward a different receiver.

use ark_ec::{AffineRepr, CurveGroup};
use ark_ed_on_bls12_381::EdwardsAffine;
use ark_ff::{BigInteger, PrimeField, UniformRand};
use ark_std::rand::Rng;

use super::hash::HashFunction;
use crate::constants::SIGNING_NONCE_DOMAIN;
use crate::witness::{CurvePoint, PublicKey, Signature, Transfer};
use crate::{Fr, Scalar};

/// Verifies the sender's authorization of a transfer
pub trait SignatureScheme: Send + Sync {
    fn verify(&self, transfer: &Transfer) -> bool;
}

/// Canonical transfer digest, computed from a fresh hash state
pub fn transfer_digest<H: HashFunction + ?Sized>(hasher: &H, transfer: &Transfer) -> Fr {
    digest_fields(
        hasher,
        transfer.nonce,
        transfer.amount,
        &transfer.sender_public_key,
        &transfer.receiver_public_key,
    )
}

fn digest_fields<H: HashFunction + ?Sized>(
    hasher: &H,
    nonce: u64,
    amount: u64,
    sender: &PublicKey,
    receiver: &PublicKey,
) -> Fr {
    hasher.hash(&[
        Fr::from(nonce),
        Fr::from(amount),
        sender.x,
        sender.y,
        receiver.x,
        receiver.y,
    ])
}

/// Fiat-Shamir challenge binding the commitment, the key and the message
fn challenge<H: HashFunction + ?Sized>(
    hasher: &H,
    r: &CurvePoint,
    public_key: &PublicKey,
    digest: Fr,
) -> Scalar {
    let c = hasher.hash(&[r.x, r.y, public_key.x, public_key.y, digest]);
    field_to_scalar(c)
}

/// Reduce a base-field element into the Jubjub scalar field
pub fn field_to_scalar(f: Fr) -> Scalar {
    Scalar::from_le_bytes_mod_order(&f.into_bigint().to_bytes_le())
}

/// Schnorr verifier over Jubjub
#[derive(Debug, Clone)]
pub struct SchnorrVerifier<H> {
    hasher: H,
}

impl<H: HashFunction> SchnorrVerifier<H> {
    pub fn new(hasher: H) -> Self {
        Self { hasher }
    }

    /// Check `signature` over `digest` against `public_key`
    pub fn verify_digest(&self, public_key: &PublicKey, digest: Fr, signature: &Signature) -> bool {
        let Some(a) = public_key.to_affine() else {
            return false;
        };
        if a.is_zero() {
            return false;
        }
        let Some(r) = signature.r.to_affine() else {
            return false;
        };

        let c = challenge(&self.hasher, &signature.r, public_key, digest);

        let lhs = (EdwardsAffine::generator() * signature.s).into_affine();
        let rhs = (r.into_group() + a * c).into_affine();

        lhs.mul_by_cofactor() == rhs.mul_by_cofactor()
    }
}

impl<H: HashFunction> SignatureScheme for SchnorrVerifier<H> {
    fn verify(&self, transfer: &Transfer) -> bool {
        let digest = transfer_digest(&self.hasher, transfer);
        self.verify_digest(&transfer.sender_public_key, digest, &transfer.signature)
    }
}

/// Secret signing key for a rollup account.
///
/// Used to produce honest witnesses; keys are never persisted here.
#[derive(Clone)]
pub struct SigningKey {
    secret: Scalar,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

impl SigningKey {
    /// Generate a random signing key
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self {
            secret: Scalar::rand(rng),
        }
    }

    pub fn from_scalar(secret: Scalar) -> Self {
        Self { secret }
    }

    pub fn public_key(&self) -> PublicKey {
        (EdwardsAffine::generator() * self.secret)
            .into_affine()
            .into()
    }

    /// Sign a message digest with a deterministic nonce
    pub fn sign_digest<H: HashFunction + ?Sized>(&self, hasher: &H, digest: Fr) -> Signature {
        let public_key = self.public_key();

        let secret_f = Fr::from_le_bytes_mod_order(&self.secret.into_bigint().to_bytes_le());
        let k = field_to_scalar(hasher.hash(&[Fr::from(SIGNING_NONCE_DOMAIN), secret_f, digest]));
        let r: CurvePoint = (EdwardsAffine::generator() * k).into_affine().into();

        let c = challenge(hasher, &r, &public_key, digest);
        Signature {
            r,
            s: k + c * self.secret,
        }
    }

    /// Build and sign a transfer from this key to `receiver`
    pub fn sign_transfer<H: HashFunction + ?Sized>(
        &self,
        hasher: &H,
        amount: u64,
        nonce: u64,
        receiver: PublicKey,
    ) -> Transfer {
        let sender = self.public_key();
        let digest = digest_fields(hasher, nonce, amount, &sender, &receiver);

        Transfer {
            amount,
            nonce,
            sender_public_key: sender,
            receiver_public_key: receiver,
            signature: self.sign_digest(hasher, digest),
        }
    }
}
