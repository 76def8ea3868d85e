//! Curve-group seam: point codecs and batch key application
//!
//! The streaming transformer is generic over the two BN254 source groups.
//! This module pins that seam: per-group encoded sizes, raw-chunk decode,
//! the batch scalar application `P_i ← (start·inc^i)·P_i`, and the two
//! canonical chunk encodings the hash chain consumes (uncompressed for the
//! challenge side, compressed for the response side).
//!
//! Raw on-disk form **is** the canonical uncompressed encoding, so the bytes
//! written to the output transcript double as the challenge-hash feed.

#![forbid(unsafe_code)]
#![allow(missing_docs)]

use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::PrimeField;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

use crate::Scalar;

/// Byte budget one raw chunk may occupy, independent of section size.
pub const CHUNK_BYTE_BUDGET: usize = 1 << 20;

/// A BN254 source group the ceremony transforms points in.
pub trait CeremonyGroup:
    AffineRepr<ScalarField = Scalar> + CanonicalSerialize + CanonicalDeserialize
{
    /// Canonical uncompressed point size (the raw on-disk size).
    const UNCOMPRESSED_SIZE: usize;
    /// Canonical compressed point size.
    const COMPRESSED_SIZE: usize;
    /// Group label for diagnostics.
    const NAME: &'static str;
}

impl CeremonyGroup for crate::G1 {
    const UNCOMPRESSED_SIZE: usize = 64;
    const COMPRESSED_SIZE: usize = 32;
    const NAME: &'static str = "G1";
}

impl CeremonyGroup for crate::G2 {
    const UNCOMPRESSED_SIZE: usize = 128;
    const COMPRESSED_SIZE: usize = 64;
    const NAME: &'static str = "G2";
}

/// Errors surfaced by the point codecs.
#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    #[error("{group} point decode failed: {reason}")]
    Decode { group: &'static str, reason: String },
    #[error("{group} point encode failed: {reason}")]
    Encode { group: &'static str, reason: String },
    #[error("{group} chunk of {len} bytes is not a multiple of the {size}-byte point size")]
    Ragged { group: &'static str, len: usize, size: usize },
}

/// Points per chunk under [`CHUNK_BYTE_BUDGET`]; at least one even for point
/// encodings larger than the budget.
pub fn chunk_points<G: CeremonyGroup>() -> usize {
    (CHUNK_BYTE_BUDGET / G::UNCOMPRESSED_SIZE).max(1)
}

/// Decode a raw chunk of canonical uncompressed points.
pub fn decode_points<G: CeremonyGroup>(bytes: &[u8]) -> Result<Vec<G>, GroupError> {
    if bytes.len() % G::UNCOMPRESSED_SIZE != 0 {
        return Err(GroupError::Ragged {
            group: G::NAME,
            len: bytes.len(),
            size: G::UNCOMPRESSED_SIZE,
        });
    }
    let mut points = Vec::with_capacity(bytes.len() / G::UNCOMPRESSED_SIZE);
    for raw in bytes.chunks_exact(G::UNCOMPRESSED_SIZE) {
        let point = G::deserialize_uncompressed(raw)
            .map_err(|e| GroupError::Decode { group: G::NAME, reason: format!("{e}") })?;
        points.push(point);
    }
    Ok(points)
}

/// Multiply `points[i]` by `start·inc^i` and return the normalized result.
///
/// The caller carries the running scalar across chunks; within the chunk the
/// exponent advances multiplicatively per point, exactly reproducing a
/// whole-section `start·inc^i` schedule regardless of where chunk boundaries
/// fall.
pub fn apply_key_chunk<G: CeremonyGroup>(points: &[G], start: Scalar, inc: Scalar) -> Vec<G> {
    let mut t = start;
    let mut projective = Vec::with_capacity(points.len());
    for point in points {
        projective.push(point.mul_bigint(t.into_bigint()));
        t *= inc;
    }
    <G::Group as CurveGroup>::normalize_batch(&projective)
}

/// Canonical uncompressed encoding of a transformed chunk.
pub fn encode_uncompressed<G: CeremonyGroup>(points: &[G]) -> Result<Vec<u8>, GroupError> {
    let mut out = Vec::with_capacity(points.len() * G::UNCOMPRESSED_SIZE);
    for point in points {
        point
            .serialize_uncompressed(&mut out)
            .map_err(|e| GroupError::Encode { group: G::NAME, reason: format!("{e}") })?;
    }
    Ok(out)
}

/// Canonical compressed encoding of a transformed chunk.
pub fn encode_compressed<G: CeremonyGroup>(points: &[G]) -> Result<Vec<u8>, GroupError> {
    let mut out = Vec::with_capacity(points.len() * G::COMPRESSED_SIZE);
    for point in points {
        point
            .serialize_compressed(&mut out)
            .map_err(|e| GroupError::Encode { group: G::NAME, reason: format!("{e}") })?;
    }
    Ok(out)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{G1, G2};
    use ark_ff::{Field, One};

    #[test]
    fn declared_sizes_match_arkworks() {
        assert_eq!(G1::generator().uncompressed_size(), G1::UNCOMPRESSED_SIZE);
        assert_eq!(G1::generator().compressed_size(), G1::COMPRESSED_SIZE);
        assert_eq!(G2::generator().uncompressed_size(), G2::UNCOMPRESSED_SIZE);
        assert_eq!(G2::generator().compressed_size(), G2::COMPRESSED_SIZE);
    }

    #[test]
    fn chunk_budget_bounds() {
        assert_eq!(chunk_points::<G1>(), CHUNK_BYTE_BUDGET / 64);
        assert_eq!(chunk_points::<G2>(), CHUNK_BYTE_BUDGET / 128);
        assert!(chunk_points::<G1>() * G1::UNCOMPRESSED_SIZE <= CHUNK_BYTE_BUDGET);
        assert!(chunk_points::<G2>() * G2::UNCOMPRESSED_SIZE <= CHUNK_BYTE_BUDGET);
    }

    #[test]
    fn codec_roundtrip() {
        let points: Vec<G1> = apply_key_chunk(
            &[G1::generator(); 3],
            Scalar::from(5u64),
            Scalar::from(3u64),
        );
        let raw = encode_uncompressed(&points).unwrap();
        assert_eq!(raw.len(), 3 * G1::UNCOMPRESSED_SIZE);
        assert_eq!(decode_points::<G1>(&raw).unwrap(), points);

        let compressed = encode_compressed(&points).unwrap();
        assert_eq!(compressed.len(), 3 * G1::COMPRESSED_SIZE);
    }

    #[test]
    fn ragged_chunk_is_rejected() {
        assert!(matches!(
            decode_points::<G1>(&[0u8; 65]),
            Err(GroupError::Ragged { len: 65, size: 64, .. })
        ));
    }

    #[test]
    fn key_application_matches_per_point_exponents() {
        let start = Scalar::from(7u64);
        let inc = Scalar::from(11u64);
        let base = [G1::generator(); 5];
        let transformed = apply_key_chunk(&base, start, inc);

        let mut exponent = start;
        for (i, point) in transformed.iter().enumerate() {
            let expected: G1 = base[i].mul_bigint(exponent.into_bigint()).into();
            assert_eq!(*point, expected, "exponent schedule diverged at index {i}");
            exponent *= inc;
        }
    }

    #[test]
    fn split_application_equals_whole() {
        // Carrying t across a chunk boundary with t·inc^len must match the
        // unsplit schedule.
        let start = Scalar::from(2u64);
        let inc = Scalar::from(9u64);
        let base = [G2::generator(); 6];

        let whole = apply_key_chunk(&base, start, inc);

        let first = apply_key_chunk(&base[..4], start, inc);
        let carried = start * inc.pow([4u64]);
        let second = apply_key_chunk(&base[4..], carried, inc);

        assert_eq!(whole[..4], first[..]);
        assert_eq!(whole[4..], second[..]);
    }

    #[test]
    fn empty_chunk_is_fine() {
        let none: Vec<G1> = decode_points::<G1>(&[]).unwrap();
        assert!(none.is_empty());
        assert!(apply_key_chunk::<G1>(&[], Scalar::one(), Scalar::one()).is_empty());
    }
}
