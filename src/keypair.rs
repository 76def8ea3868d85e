//! Contribution keys: secret scalars and proofs of possession
//!
//! A contribution multiplies fresh secrets {tau, alpha, beta} into the
//! transcript. Each secret `x` ships with a public proof binding it to the
//! prior challenge digest:
//!
//! - an auxiliary scalar `r` gives `g1_s = r·G1` and `g1_sx = x·g1_s`,
//! - `sp = hash_to_g2(personalization ‖ prior ‖ g1_s ‖ g1_sx)` is a G2 point
//!   of unknown discrete log, sampled from a ChaCha generator seeded with
//!   the Blake2b digest of its inputs,
//! - `g2_spx = x·sp` closes the proof.
//!
//! `e(g1_sx, sp) == e(g1_s, g2_spx)` then holds exactly when the same `x`
//! links both sides, and because `sp` commits to the prior challenge a key
//! generated for one transcript state cannot be replayed against another
//! (the "rogue contribution" defense).
//!
//! Derivation is a pure function of the seed: fixed randomness and entropy
//! text reproduce the key bit for bit. Only the seed's origin (64 bytes from
//! the OS mixed with contributor-typed text) is non-deterministic in
//! production use.

#![forbid(unsafe_code)]
#![allow(missing_docs)]

use ark_bn254::{Bn254, G2Projective};
use ark_ec::{pairing::Pairing, AffineRepr, CurveGroup};
use ark_ff::{PrimeField, UniformRand};
use blake2::{Blake2b512, Digest};
use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::group::{encode_uncompressed, CeremonyGroup};
use crate::hashchain::DIGEST_SIZE;
use crate::{Scalar, G1, G2};

/// Serialized public-key blob size: six uncompressed G1 points and three
/// uncompressed G2 points.
pub const PUBLIC_KEY_SIZE: usize =
    6 * <G1 as CeremonyGroup>::UNCOMPRESSED_SIZE + 3 * <G2 as CeremonyGroup>::UNCOMPRESSED_SIZE;

/// Errors surfaced while parsing public key material.
#[derive(Debug, thiserror::Error)]
pub enum KeypairError {
    #[error("public key blob of {got} bytes (expected {expected})")]
    Size { got: usize, expected: usize },
    #[error("public key point decode failed: {0}")]
    Point(String),
}

/// Domain tag separating the three per-secret proofs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Personalization {
    Tau = 0,
    Alpha = 1,
    Beta = 2,
}

/// Seed for the deterministic key generator.
///
/// `Blake2b512(secure_random_64 ‖ utf8(entropy))`, with the first 32 digest
/// bytes split into eight big-endian words that seed a ChaCha20 stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySeed {
    words: [u32; 8],
}

impl KeySeed {
    /// Derive a seed from its two ingredients. Pure and reproducible.
    pub fn derive(random: &[u8; 64], entropy: &str) -> Self {
        let mut hasher = Blake2b512::new();
        hasher.update(random);
        hasher.update(entropy.as_bytes());
        let digest = hasher.finalize();

        let mut words = [0u32; 8];
        for (i, word) in words.iter_mut().enumerate() {
            let mut be = [0u8; 4];
            be.copy_from_slice(&digest[i * 4..(i + 1) * 4]);
            *word = u32::from_be_bytes(be);
        }
        Self { words }
    }

    /// Derive a seed from 64 fresh bytes of `rng` plus the entropy text.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R, entropy: &str) -> Self {
        let mut random = [0u8; 64];
        rng.fill_bytes(&mut random);
        Self::derive(&random, entropy)
    }

    fn stream(&self) -> ChaCha20Rng {
        let mut seed = [0u8; 32];
        for (i, word) in self.words.iter().enumerate() {
            seed[i * 4..(i + 1) * 4].copy_from_slice(&word.to_be_bytes());
        }
        ChaCha20Rng::from_seed(seed)
    }
}

/// Public half of one per-secret proof of possession.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKeyPart {
    /// `r·G1`.
    pub g1_s: G1,
    /// `x·r·G1`.
    pub g1_sx: G1,
    /// `x·sp` for the bound G2 base `sp`.
    pub g2_spx: G2,
}

impl PublicKeyPart {
    /// Check the pairing identity `e(g1_sx, sp) == e(g1_s, g2_spx)` against
    /// the prior challenge this key claims to be bound to.
    pub fn verify(&self, personalization: Personalization, prior: &[u8; DIGEST_SIZE]) -> bool {
        let sp = hash_to_g2(personalization, prior, &self.g1_s, &self.g1_sx);
        Bn254::pairing(self.g1_sx, sp) == Bn254::pairing(self.g1_s, self.g2_spx)
    }
}

/// Public key material of a whole contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey {
    pub tau: PublicKeyPart,
    pub alpha: PublicKeyPart,
    pub beta: PublicKeyPart,
}

impl PublicKey {
    /// Serialize to the canonical blob fed to the response accumulator and
    /// stored in the contribution record: the six G1 points first, then the
    /// three G2 points, tau/alpha/beta order within each block.
    pub fn to_bytes(&self) -> Vec<u8> {
        let g1_points = [
            self.tau.g1_s,
            self.tau.g1_sx,
            self.alpha.g1_s,
            self.alpha.g1_sx,
            self.beta.g1_s,
            self.beta.g1_sx,
        ];
        let g2_points = [self.tau.g2_spx, self.alpha.g2_spx, self.beta.g2_spx];

        let mut out = encode_uncompressed::<G1>(&g1_points).expect("encode public G1");
        out.extend(encode_uncompressed::<G2>(&g2_points).expect("encode public G2"));
        debug_assert_eq!(out.len(), PUBLIC_KEY_SIZE);
        out
    }

    /// Parse the canonical blob.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeypairError> {
        if bytes.len() != PUBLIC_KEY_SIZE {
            return Err(KeypairError::Size { got: bytes.len(), expected: PUBLIC_KEY_SIZE });
        }
        let g1_size = <G1 as CeremonyGroup>::UNCOMPRESSED_SIZE;
        let g1 = crate::group::decode_points::<G1>(&bytes[..6 * g1_size])
            .map_err(|e| KeypairError::Point(e.to_string()))?;
        let g2 = crate::group::decode_points::<G2>(&bytes[6 * g1_size..])
            .map_err(|e| KeypairError::Point(e.to_string()))?;

        Ok(Self {
            tau: PublicKeyPart { g1_s: g1[0], g1_sx: g1[1], g2_spx: g2[0] },
            alpha: PublicKeyPart { g1_s: g1[2], g1_sx: g1[3], g2_spx: g2[1] },
            beta: PublicKeyPart { g1_s: g1[4], g1_sx: g1[5], g2_spx: g2[2] },
        })
    }
}

/// One secret scalar with its public proof.
#[derive(Debug, Clone)]
pub struct KeyPair {
    /// The toxic-waste scalar. Never serialized; dropped with the key.
    pub secret: Scalar,
    /// The proof of possession that outlives the secret.
    pub public: PublicKeyPart,
}

/// The three keypairs of one contribution.
#[derive(Debug, Clone)]
pub struct CeremonyKey {
    pub tau: KeyPair,
    pub alpha: KeyPair,
    pub beta: KeyPair,
}

impl CeremonyKey {
    /// Generate all three keypairs from the seed, bound to `prior`.
    ///
    /// Sampling order is fixed (the three secrets, then each proof's
    /// auxiliary scalar in tau/alpha/beta order) so a seed reproduces the
    /// same key everywhere.
    pub fn generate(prior: &[u8; DIGEST_SIZE], seed: &KeySeed) -> Self {
        let mut rng = seed.stream();
        let tau_secret = Scalar::rand(&mut rng);
        let alpha_secret = Scalar::rand(&mut rng);
        let beta_secret = Scalar::rand(&mut rng);

        Self {
            tau: KeyPair::bind(Personalization::Tau, tau_secret, prior, &mut rng),
            alpha: KeyPair::bind(Personalization::Alpha, alpha_secret, prior, &mut rng),
            beta: KeyPair::bind(Personalization::Beta, beta_secret, prior, &mut rng),
        }
    }

    /// The public material of all three proofs.
    pub fn public(&self) -> PublicKey {
        PublicKey {
            tau: self.tau.public,
            alpha: self.alpha.public,
            beta: self.beta.public,
        }
    }
}

impl KeyPair {
    fn bind(
        personalization: Personalization,
        secret: Scalar,
        prior: &[u8; DIGEST_SIZE],
        rng: &mut ChaCha20Rng,
    ) -> Self {
        let r = Scalar::rand(rng);
        let g1_s: G1 = G1::generator().mul_bigint(r.into_bigint()).into_affine();
        let g1_sx: G1 = g1_s.mul_bigint(secret.into_bigint()).into_affine();
        let sp = hash_to_g2(personalization, prior, &g1_s, &g1_sx);
        let g2_spx: G2 = sp.mul_bigint(secret.into_bigint()).into_affine();

        Self { secret, public: PublicKeyPart { g1_s, g1_sx, g2_spx } }
    }
}

/// Deterministically sample the G2 base point a proof is anchored to.
///
/// The discrete log of the result is unknown to everyone: the digest seeds a
/// ChaCha stream and the point is drawn by rejection sampling on the curve,
/// never as a multiple of the generator.
pub fn hash_to_g2(
    personalization: Personalization,
    prior: &[u8; DIGEST_SIZE],
    g1_s: &G1,
    g1_sx: &G1,
) -> G2 {
    let mut hasher = Blake2b512::new();
    hasher.update([personalization as u8]);
    hasher.update(prior);
    hasher.update(encode_uncompressed::<G1>(&[*g1_s]).expect("encode g1_s"));
    hasher.update(encode_uncompressed::<G1>(&[*g1_sx]).expect("encode g1_sx"));
    let digest = hasher.finalize();

    let mut seed = [0u8; 32];
    seed.copy_from_slice(&digest[..32]);
    let mut rng = ChaCha20Rng::from_seed(seed);
    G2Projective::rand(&mut rng).into_affine()
}

// ============================================================================
// Tests
// ============================================================================
