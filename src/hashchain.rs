//! Rolling challenge/response hash accumulators
//!
//! Every contribution maintains two Blake2b-512 accumulators over two
//! canonical encodings of the same transformed points: the **challenge**
//! accumulator over uncompressed bytes and the **response** accumulator over
//! compressed bytes. Both are seeded with the prior contribution's
//! next-challenge digest before any section bytes, so each transcript's
//! digests chain onto its predecessor's.
//!
//! Digesting never consumes the running state (the hasher is cloned first,
//! mirroring the clone-before-digest discipline of the rest of this
//! codebase), and [`HashAccumulator::snapshot`] captures an opaque checkpoint
//! of the response accumulator just before the public-key bytes are folded
//! in — a verifier recomputing the stream checks the checkpoint at the same
//! byte offset instead of rehashing past it.

#![forbid(unsafe_code)]

use blake2::{Blake2b512, Digest};

/// Width of every ceremony digest in bytes.
pub const DIGEST_SIZE: usize = 64;

/// Serialized width of a [`PartialHashState`].
pub const PARTIAL_STATE_SIZE: usize = 8 + DIGEST_SIZE;

/// A rolling Blake2b-512 digest with checkpoint support.
#[derive(Clone)]
pub struct HashAccumulator {
    hasher: Blake2b512,
    consumed: u64,
}

impl HashAccumulator {
    /// Fresh accumulator with nothing absorbed.
    pub fn new() -> Self {
        Self { hasher: Blake2b512::new(), consumed: 0 }
    }

    /// Accumulator seeded with a prior digest, the chain link every
    /// contribution starts from.
    pub fn seeded(prior: &[u8; DIGEST_SIZE]) -> Self {
        let mut acc = Self::new();
        acc.update(prior);
        acc
    }

    /// Absorb `bytes`. Order-sensitive: the five point sections must be fed
    /// strictly in transcript order.
    pub fn update(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
        self.consumed += bytes.len() as u64;
    }

    /// Total bytes absorbed so far.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Digest of everything absorbed so far, without consuming the state.
    pub fn digest(&self) -> [u8; DIGEST_SIZE] {
        let mut out = [0u8; DIGEST_SIZE];
        out.copy_from_slice(&self.hasher.clone().finalize());
        out
    }

    /// Opaque checkpoint of the current state.
    pub fn snapshot(&self) -> PartialHashState {
        PartialHashState { consumed: self.consumed, checkpoint: self.digest() }
    }
}

impl Default for HashAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Checkpoint of a response accumulator, stored in each contribution record.
///
/// Carries the byte offset at which the checkpoint was taken and the digest
/// of everything absorbed up to it. The container stores this length-prefixed
/// and opaque, so the representation can evolve without a format break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialHashState {
    /// Bytes absorbed when the checkpoint was taken.
    pub consumed: u64,
    /// Digest of the stream up to the checkpoint.
    pub checkpoint: [u8; DIGEST_SIZE],
}

impl PartialHashState {
    /// Serialize to the fixed on-disk form.
    pub fn to_bytes(&self) -> [u8; PARTIAL_STATE_SIZE] {
        let mut out = [0u8; PARTIAL_STATE_SIZE];
        out[..8].copy_from_slice(&self.consumed.to_le_bytes());
        out[8..].copy_from_slice(&self.checkpoint);
        out
    }

    /// Parse the fixed on-disk form. Returns `None` on a wrong length.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != PARTIAL_STATE_SIZE {
            return None;
        }
        let mut consumed = [0u8; 8];
        consumed.copy_from_slice(&bytes[..8]);
        let mut checkpoint = [0u8; DIGEST_SIZE];
        checkpoint.copy_from_slice(&bytes[8..]);
        Some(Self { consumed: u64::from_le_bytes(consumed), checkpoint })
    }
}

// ============================================================================
// Tests
// ============================================================================
