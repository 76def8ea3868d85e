//! Transcript header: curve identity, declared power, ceremony power
//!
//! The header section pins the curve by its base-field size and modulus
//! bytes (a transcript for another curve must fail loudly, not decode into
//! garbage points) and carries two powers: `power`, the size the transcript
//! currently holds, and `ceremony_power`, the size the ceremony was started
//! at. They differ only on a transcript that was reduced after the fact, and
//! such a transcript accepts no further contributions.

#![forbid(unsafe_code)]
#![allow(missing_docs)]

use ark_ec::AffineRepr;
use ark_ff::{BigInteger, PrimeField};
use blake2::{Blake2b512, Digest};

use crate::container::{sections, ContainerError, ContainerReader, ContainerWriter};
use crate::group::encode_uncompressed;
use crate::hashchain::DIGEST_SIZE;
use crate::{G1, G2};

/// Largest power a transcript may declare (2^28 tau-G1 pairs ≈ 34 GiB).
pub const MAX_POWER: u32 = 28;

/// BN254 base-field element size in bytes.
pub const BASE_FIELD_SIZE: u32 = 32;

/// Errors surfaced while reading or writing a header.
#[derive(Debug, thiserror::Error)]
pub enum HeaderError {
    #[error(transparent)]
    Container(#[from] ContainerError),
    #[error("unsupported base-field size {got} bytes (expected {expected})")]
    FieldSize { got: u32, expected: u32 },
    #[error("base-field modulus does not match BN254")]
    CurveMismatch,
    #[error("power {got} out of range (1..={max})")]
    PowerOutOfRange { got: u32, max: u32 },
}

/// Parsed transcript header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PtauHeader {
    /// Power of two the transcript currently holds points for.
    pub power: u32,
    /// Power of two the ceremony was originally run at.
    pub ceremony_power: u32,
}

impl PtauHeader {
    /// Header of a fresh transcript: both powers equal.
    pub fn new(power: u32) -> Result<Self, HeaderError> {
        check_power(power)?;
        Ok(Self { power, ceremony_power: power })
    }

    /// Read and validate the header section.
    pub fn read(reader: &mut ContainerReader) -> Result<Self, HeaderError> {
        reader.seek_to_section(sections::HEADER)?;
        let n8 = reader.read_u32()?;
        if n8 != BASE_FIELD_SIZE {
            return Err(HeaderError::FieldSize { got: n8, expected: BASE_FIELD_SIZE });
        }
        let q = reader.read_bytes(n8 as usize)?;
        if q != base_field_modulus_le() {
            return Err(HeaderError::CurveMismatch);
        }
        let power = reader.read_u32()?;
        let ceremony_power = reader.read_u32()?;
        check_power(power)?;
        check_power(ceremony_power)?;
        Ok(Self { power, ceremony_power })
    }

    /// Write the header section.
    pub fn write(&self, writer: &mut ContainerWriter) -> Result<(), HeaderError> {
        writer.start_section(sections::HEADER)?;
        writer.write_u32(BASE_FIELD_SIZE)?;
        writer.write_all(&base_field_modulus_le())?;
        writer.write_u32(self.power)?;
        writer.write_u32(self.ceremony_power)?;
        writer.end_section()?;
        Ok(())
    }

    /// Point count of the tau-G1 section: `2·2^power − 1`.
    pub fn tau_g1_count(&self) -> u64 {
        (1u64 << self.power) * 2 - 1
    }

    /// Point count of the tau-G2, alpha-tau-G1 and beta-tau-G1 sections.
    pub fn per_power_count(&self) -> u64 {
        1u64 << self.power
    }
}

fn check_power(power: u32) -> Result<(), HeaderError> {
    if power < 1 || power > MAX_POWER {
        return Err(HeaderError::PowerOutOfRange { got: power, max: MAX_POWER });
    }
    Ok(())
}

/// Little-endian BN254 base-field modulus, as stored in the header.
pub fn base_field_modulus_le() -> Vec<u8> {
    ark_bn254::Fq::MODULUS.to_bytes_le()
}

/// Challenge digest a first contribution chains from.
///
/// A predecessor-less transcript has no stored next-challenge, so the chain
/// starts at the digest its all-generator point sections would hash to:
/// `Blake2b512(Blake2b512("") ‖ tauG1 ‖ tauG2 ‖ alphaTauG1 ‖ betaTauG1 ‖
/// betaG2)` with every point the group generator.
pub fn first_challenge_hash(power: u32) -> [u8; DIGEST_SIZE] {
    let header = PtauHeader { power, ceremony_power: power };
    let g1 = encode_uncompressed::<G1>(&[G1::generator()]).expect("encode G1 generator");
    let g2 = encode_uncompressed::<G2>(&[G2::generator()]).expect("encode G2 generator");

    let mut hasher = Blake2b512::new();
    hasher.update(Blake2b512::digest(b""));
    for _ in 0..header.tau_g1_count() {
        hasher.update(&g1);
    }
    for _ in 0..header.per_power_count() {
        hasher.update(&g2);
    }
    for _ in 0..header.per_power_count() {
        hasher.update(&g1);
    }
    for _ in 0..header.per_power_count() {
        hasher.update(&g1);
    }
    hasher.update(&g2);

    let mut out = [0u8; DIGEST_SIZE];
    out.copy_from_slice(&hasher.finalize());
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::CeremonyGroup;

    #[test]
    fn roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.ptau");

        let header = PtauHeader { power: 5, ceremony_power: 7 };
        let mut w = ContainerWriter::create(&path, 1).unwrap();
        header.write(&mut w).unwrap();
        w.finish().unwrap();

        let mut r = ContainerReader::open(&path).unwrap();
        assert_eq!(PtauHeader::read(&mut r).unwrap(), header);
    }

    #[test]
    fn rejects_foreign_modulus() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.ptau");

        let mut w = ContainerWriter::create(&path, 1).unwrap();
        w.start_section(sections::HEADER).unwrap();
        w.write_u32(BASE_FIELD_SIZE).unwrap();
        w.write_all(&[0xffu8; 32]).unwrap();
        w.write_u32(3).unwrap();
        w.write_u32(3).unwrap();
        w.end_section().unwrap();
        w.finish().unwrap();

        let mut r = ContainerReader::open(&path).unwrap();
        assert!(matches!(PtauHeader::read(&mut r), Err(HeaderError::CurveMismatch)));
    }

    #[test]
    fn rejects_out_of_range_power() {
        assert!(matches!(
            PtauHeader::new(0),
            Err(HeaderError::PowerOutOfRange { got: 0, .. })
        ));
        assert!(matches!(
            PtauHeader::new(MAX_POWER + 1),
            Err(HeaderError::PowerOutOfRange { .. })
        ));
        assert!(PtauHeader::new(MAX_POWER).is_ok());
    }

    #[test]
    fn counts_match_declared_power() {
        let header = PtauHeader::new(3).unwrap();
        assert_eq!(header.tau_g1_count(), 15);
        assert_eq!(header.per_power_count(), 8);
    }

    #[test]
    fn first_challenge_is_deterministic_and_power_sensitive() {
        assert_eq!(first_challenge_hash(3), first_challenge_hash(3));
        assert_ne!(first_challenge_hash(3), first_challenge_hash(4));
    }

    #[test]
    fn first_challenge_matches_manual_reconstruction() {
        let g1 = encode_uncompressed::<crate::G1>(&[crate::G1::generator()]).unwrap();
        let g2 = encode_uncompressed::<crate::G2>(&[crate::G2::generator()]).unwrap();
        assert_eq!(g1.len(), crate::G1::UNCOMPRESSED_SIZE);

        let mut hasher = Blake2b512::new();
        hasher.update(Blake2b512::digest(b""));
        for _ in 0..3 {
            hasher.update(&g1); // tauG1: 2·2^1 − 1
        }
        for _ in 0..2 {
            hasher.update(&g2); // tauG2
        }
        for _ in 0..2 {
            hasher.update(&g1); // alphaTauG1
        }
        for _ in 0..2 {
            hasher.update(&g1); // betaTauG1
        }
        hasher.update(&g2); // betaG2

        let mut expected = [0u8; DIGEST_SIZE];
        expected.copy_from_slice(&hasher.finalize());
        assert_eq!(first_challenge_hash(1), expected);
    }
}
