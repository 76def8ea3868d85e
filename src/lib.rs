//! Crate root: public surface, core aliases, and ceremony-wide invariants
//!
//! `ptau` implements one step of a multi-party Powers of Tau trusted-setup
//! ceremony on BN254: given an existing transcript container, it produces a
//! new container that folds in a fresh secret contribution while maintaining
//! the verifiable challenge/response hash chain.
//!
//! ## Invariants
//!
//! - **Field & curve.** The scalar field is `ark_bn254::Fr` ([`Scalar`]);
//!   points live in `ark_bn254::G1Affine` / `G2Affine` ([`G1`], [`G2`]). The
//!   header pins the curve by its base-field modulus, so a foreign
//!   transcript fails loudly instead of decoding into garbage. We **forbid
//!   unsafe** throughout the crate.
//!
//! - **Streaming discipline.** Point sections are gigabyte-scale; every
//!   transform streams fixed-budget chunks and peak memory stays near one
//!   chunk of raw plus encoded bytes, independent of transcript size. The
//!   only state carried across chunks is the running scalar and the two
//!   accumulators, threaded explicitly.
//!
//! - **Hash chain.** Two Blake2b-512 accumulators run per contribution,
//!   seeded with the prior next-challenge digest: the challenge side over
//!   canonical uncompressed bytes, the response side over canonical
//!   compressed bytes plus the contributor's public key material. Feeding
//!   order is strict; the chain is what lets an auditor confirm the
//!   transcript was extended correctly without learning any secret.
//!
//! - **Failure mode.** Validation happens before the output file exists;
//!   any later I/O or format error aborts the run and the partial output is
//!   discarded. Nothing is retried, nothing falls back to defaults.
//!
//! The ceremony is sequential by construction — one party holds the evolving
//! secret at a time — so nothing here is concurrent across contributions.

#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms)]

/// Sectioned binary transcript containers (magic/version, section table,
/// reserve-and-patch lengths).
pub mod container;
/// Orchestration of one full contribution step.
pub mod contribute;
/// Contribution log records and their (de)serialization.
pub mod contribution;
/// Entropy source abstraction (stdin prompt, fixed test double).
pub mod entropy;
/// Curve-group seam: point codecs and batch key application.
pub mod group;
/// Rolling challenge/response hash accumulators.
pub mod hashchain;
/// Transcript header and the first-challenge digest.
pub mod header;
/// Fresh all-generator transcript creation.
pub mod initialize;
/// Contribution keys and proofs of possession.
pub mod keypair;
/// The streaming section transform.
pub mod transform;

// ============================================================================
// Canonical aliases and root-level re-exports
// ============================================================================

/// Scalar field of the ceremony curve (BN254).
pub type Scalar = ark_bn254::Fr;

/// Affine G1 point of the ceremony curve.
///
/// Spelled as the concrete short-Weierstrass `Affine<g1::Config>` rather than
/// the `ark_bn254::G1Affine` projection alias: the two name the identical
/// type, but the projection form trips a coherence-checker limitation that
/// makes the `G1`/`G2` `CeremonyGroup` impls look overlapping.
pub type G1 = ark_bn254::g1::G1Affine;

/// Affine G2 point of the ceremony curve. See [`G1`] for why this is spelled
/// via the `g2` submodule alias instead of `ark_bn254::G2Affine`.
pub type G2 = ark_bn254::g2::G2Affine;

pub use crate::container::{ContainerError, ContainerReader, ContainerWriter};
pub use crate::contribute::{contribute, contribute_with, ContributeError, ContributeOptions};
pub use crate::contribution::{read_contribution_log, Contribution};
pub use crate::entropy::{EntropySource, FixedEntropy, StdinEntropy};
pub use crate::header::{first_challenge_hash, PtauHeader, MAX_POWER};
pub use crate::hashchain::{HashAccumulator, PartialHashState, DIGEST_SIZE};
pub use crate::initialize::{initialize_transcript, InitializeError};
pub use crate::keypair::{CeremonyKey, KeySeed, PublicKey};
