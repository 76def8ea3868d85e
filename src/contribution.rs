//! Contribution log records
//!
//! Section 7 of a transcript holds the ordered history of contributions:
//! `u32` count, then per record a `u32` byte length followed by that many
//! bytes. Within a record every variable-width field (name, key blob,
//! partial hash snapshot) carries its own explicit length, since key and
//! proof sizes depend on curve parameters. Records are immutable once
//! appended; a contribution rewrites the whole log section with one new
//! entry at the end.

#![forbid(unsafe_code)]
#![allow(missing_docs)]

use crate::container::{sections, ContainerError, ContainerReader, ContainerWriter};
use crate::group::{decode_points, encode_uncompressed, CeremonyGroup};
use crate::hashchain::{PartialHashState, DIGEST_SIZE};
use crate::keypair::{KeypairError, PublicKey, PUBLIC_KEY_SIZE};
use crate::{G1, G2};

/// Longest contributor name the log accepts, in bytes.
pub const MAX_NAME_LEN: usize = 64;

/// Record kind of an ordinary contribution. The value 0 historically marks a
/// beacon; other values are carried opaquely and never branched on.
pub const KIND_BEACON: u32 = 0;

/// Errors surfaced while reading or writing the contribution log.
#[derive(Debug, thiserror::Error)]
pub enum ContributionError {
    #[error(transparent)]
    Container(#[from] ContainerError),
    #[error("contribution log truncated at byte {at}")]
    Truncated { at: usize },
    #[error("contribution record length {claimed} does not match its {parsed} parsed bytes")]
    RecordLength { claimed: usize, parsed: usize },
    #[error("contribution log has {extra} trailing bytes")]
    TrailingBytes { extra: usize },
    #[error("contributor name is not valid utf-8")]
    BadName,
    #[error("contributor name of {got} bytes exceeds the {max}-byte limit")]
    NameTooLong { got: usize, max: usize },
    #[error("bad key material: {0}")]
    Key(#[from] KeypairError),
    #[error("bad checkpoint point: {0}")]
    Point(String),
    #[error("bad partial hash snapshot of {got} bytes")]
    BadPartialState { got: usize },
}

/// One entry of the contribution history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contribution {
    /// Contributor-chosen display name.
    pub name: String,
    /// Record kind; see [`KIND_BEACON`].
    pub kind: u32,
    /// Public proof-of-possession material.
    pub key: PublicKey,
    /// First two transformed tau-G1 points.
    pub tau_g1: [G1; 2],
    /// First two transformed tau-G2 points.
    pub tau_g2: [G2; 2],
    /// First transformed alpha-tau-G1 point.
    pub alpha_tau_g1: G1,
    /// First transformed beta-tau-G1 point.
    pub beta_tau_g1: G1,
    /// The transformed beta-G2 point.
    pub beta_g2: G2,
    /// Challenge digest the next contribution chains from.
    pub next_challenge: [u8; DIGEST_SIZE],
    /// Response accumulator snapshot taken before the key bytes.
    pub partial: PartialHashState,
    /// Response digest over compressed sections plus key material.
    pub response: [u8; DIGEST_SIZE],
}

/// Read the full contribution history from section 7.
pub fn read_contribution_log(
    reader: &mut ContainerReader,
) -> Result<Vec<Contribution>, ContributionError> {
    let len = reader.seek_to_section(sections::CONTRIBUTIONS)?;
    let payload = reader.read_bytes(len as usize)?;
    let mut cur = Cursor { buf: &payload, pos: 0 };

    let count = cur.u32()?;
    let mut log = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let record_len = cur.u32()? as usize;
        let record = cur.take(record_len)?;
        log.push(parse_record(record)?);
    }
    if cur.pos != payload.len() {
        return Err(ContributionError::TrailingBytes { extra: payload.len() - cur.pos });
    }
    Ok(log)
}

/// Write the full contribution history as section 7.
pub fn write_contribution_log(
    writer: &mut ContainerWriter,
    log: &[Contribution],
) -> Result<(), ContributionError> {
    writer.start_section(sections::CONTRIBUTIONS)?;
    writer.write_u32(log.len() as u32)?;
    for contribution in log {
        let record = build_record(contribution)?;
        writer.write_u32(record.len() as u32)?;
        writer.write_all(&record)?;
    }
    writer.end_section()?;
    Ok(())
}

fn build_record(c: &Contribution) -> Result<Vec<u8>, ContributionError> {
    if c.name.len() > MAX_NAME_LEN {
        return Err(ContributionError::NameTooLong { got: c.name.len(), max: MAX_NAME_LEN });
    }
    let mut out = Vec::new();
    out.extend_from_slice(&(c.name.len() as u32).to_le_bytes());
    out.extend_from_slice(c.name.as_bytes());
    out.extend_from_slice(&c.kind.to_le_bytes());

    let key = c.key.to_bytes();
    out.extend_from_slice(&(key.len() as u32).to_le_bytes());
    out.extend_from_slice(&key);

    out.extend(encode_points_err(&c.tau_g1)?);
    out.extend(encode_points_err(&c.tau_g2)?);
    out.extend(encode_points_err(&[c.alpha_tau_g1])?);
    out.extend(encode_points_err(&[c.beta_tau_g1])?);
    out.extend(encode_points_err(&[c.beta_g2])?);

    out.extend_from_slice(&c.next_challenge);
    let partial = c.partial.to_bytes();
    out.extend_from_slice(&(partial.len() as u32).to_le_bytes());
    out.extend_from_slice(&partial);
    out.extend_from_slice(&c.response);
    Ok(out)
}

fn parse_record(record: &[u8]) -> Result<Contribution, ContributionError> {
    let mut cur = Cursor { buf: record, pos: 0 };

    let name_len = cur.u32()? as usize;
    if name_len > MAX_NAME_LEN {
        return Err(ContributionError::NameTooLong { got: name_len, max: MAX_NAME_LEN });
    }
    let name = std::str::from_utf8(cur.take(name_len)?)
        .map_err(|_| ContributionError::BadName)?
        .to_owned();
    let kind = cur.u32()?;

    let key_len = cur.u32()? as usize;
    if key_len != PUBLIC_KEY_SIZE {
        return Err(ContributionError::Key(KeypairError::Size {
            got: key_len,
            expected: PUBLIC_KEY_SIZE,
        }));
    }
    let key = PublicKey::from_bytes(cur.take(key_len)?)?;

    let tau_g1 = decode_points_err::<G1>(&mut cur, 2)?;
    let tau_g2 = decode_points_err::<G2>(&mut cur, 2)?;
    let alpha_tau_g1 = decode_points_err::<G1>(&mut cur, 1)?[0];
    let beta_tau_g1 = decode_points_err::<G1>(&mut cur, 1)?[0];
    let beta_g2 = decode_points_err::<G2>(&mut cur, 1)?[0];

    let mut next_challenge = [0u8; DIGEST_SIZE];
    next_challenge.copy_from_slice(cur.take(DIGEST_SIZE)?);

    let partial_len = cur.u32()? as usize;
    let partial = PartialHashState::from_bytes(cur.take(partial_len)?)
        .ok_or(ContributionError::BadPartialState { got: partial_len })?;

    let mut response = [0u8; DIGEST_SIZE];
    response.copy_from_slice(cur.take(DIGEST_SIZE)?);

    if cur.pos != record.len() {
        return Err(ContributionError::RecordLength { claimed: record.len(), parsed: cur.pos });
    }

    Ok(Contribution {
        name,
        kind,
        key,
        tau_g1: [tau_g1[0], tau_g1[1]],
        tau_g2: [tau_g2[0], tau_g2[1]],
        alpha_tau_g1,
        beta_tau_g1,
        beta_g2,
        next_challenge,
        partial,
        response,
    })
}

fn encode_points_err<G: CeremonyGroup>(points: &[G]) -> Result<Vec<u8>, ContributionError> {
    encode_uncompressed(points).map_err(|e| ContributionError::Point(e.to_string()))
}

fn decode_points_err<G: CeremonyGroup>(
    cur: &mut Cursor<'_>,
    n: usize,
) -> Result<Vec<G>, ContributionError> {
    let raw = cur.take(n * G::UNCOMPRESSED_SIZE)?;
    decode_points(raw).map_err(|e| ContributionError::Point(e.to_string()))
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], ContributionError> {
        if self.pos + n > self.buf.len() {
            return Err(ContributionError::Truncated { at: self.pos });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn u32(&mut self) -> Result<u32, ContributionError> {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(bytes))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashchain::HashAccumulator;
    use crate::keypair::{CeremonyKey, KeySeed};
    use ark_ec::AffineRepr;

    fn sample(name: &str, kind: u32, tag: u8) -> Contribution {
        let seed = KeySeed::derive(&[tag; 64], name);
        let key = CeremonyKey::generate(&[tag; DIGEST_SIZE], &seed);
        let mut acc = HashAccumulator::seeded(&[tag; DIGEST_SIZE]);
        acc.update(b"payload");
        Contribution {
            name: name.to_owned(),
            kind,
            key: key.public(),
            tau_g1: [G1::generator(), key.tau.public.g1_s],
            tau_g2: [G2::generator(), key.tau.public.g2_spx],
            alpha_tau_g1: key.alpha.public.g1_sx,
            beta_tau_g1: key.beta.public.g1_sx,
            beta_g2: key.beta.public.g2_spx,
            next_challenge: [tag; DIGEST_SIZE],
            partial: acc.snapshot(),
            response: acc.digest(),
        }
    }

    fn roundtrip(log: &[Contribution]) -> Vec<Contribution> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.ptau");
        let mut w = ContainerWriter::create(&path, 1).unwrap();
        write_contribution_log(&mut w, log).unwrap();
        w.finish().unwrap();
        let mut r = ContainerReader::open(&path).unwrap();
        read_contribution_log(&mut r).unwrap()
    }

    #[test]
    fn empty_log_roundtrips() {
        assert!(roundtrip(&[]).is_empty());
    }

    #[test]
    fn records_roundtrip_in_order() {
        let log = vec![sample("alice", KIND_BEACON, 1), sample("bob", 5, 2)];
        let back = roundtrip(&log);
        assert_eq!(back, log);
        // Unknown kinds ride through untouched.
        assert_eq!(back[1].kind, 5);
    }

    #[test]
    fn oversized_name_is_rejected_on_write() {
        let mut c = sample("x", KIND_BEACON, 3);
        c.name = "n".repeat(MAX_NAME_LEN + 1);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.ptau");
        let mut w = ContainerWriter::create(&path, 1).unwrap();
        assert!(matches!(
            write_contribution_log(&mut w, &[c]),
            Err(ContributionError::NameTooLong { .. })
        ));
    }

    #[test]
    fn truncated_record_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.ptau");
        let mut w = ContainerWriter::create(&path, 1).unwrap();
        w.start_section(sections::CONTRIBUTIONS).unwrap();
        w.write_u32(1).unwrap(); // one record claimed
        w.write_u32(500).unwrap(); // that claims 500 bytes
        w.write_all(&[0u8; 20]).unwrap(); // but only 20 follow
        w.end_section().unwrap();
        w.finish().unwrap();

        let mut r = ContainerReader::open(&path).unwrap();
        assert!(matches!(
            read_contribution_log(&mut r),
            Err(ContributionError::Truncated { .. })
        ));
    }

    #[test]
    fn trailing_bytes_are_detected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.ptau");
        let mut w = ContainerWriter::create(&path, 1).unwrap();
        w.start_section(sections::CONTRIBUTIONS).unwrap();
        w.write_u32(0).unwrap();
        w.write_all(&[1, 2, 3]).unwrap();
        w.end_section().unwrap();
        w.finish().unwrap();

        let mut r = ContainerReader::open(&path).unwrap();
        assert!(matches!(
            read_contribution_log(&mut r),
            Err(ContributionError::TrailingBytes { extra: 3 })
        ));
    }
}
