//! Fresh transcript creation
//!
//! A ceremony starts from a transcript whose every point is the group
//! generator (the secret exponent is still 1) and whose contribution log is
//! empty. The first real contribution then chains from the well-defined
//! first-challenge digest of exactly this file.

#![forbid(unsafe_code)]
#![allow(missing_docs)]

use tracing::info;

use crate::container::{sections, ContainerError, ContainerWriter, TRANSCRIPT_SECTIONS};
use crate::contribution::{write_contribution_log, ContributionError};
use crate::group::{chunk_points, encode_uncompressed, CeremonyGroup};
use crate::header::{HeaderError, PtauHeader};
use crate::{G1, G2};

/// Errors surfaced while creating a fresh transcript.
#[derive(Debug, thiserror::Error)]
pub enum InitializeError {
    #[error(transparent)]
    Container(#[from] ContainerError),
    #[error(transparent)]
    Header(#[from] HeaderError),
    #[error(transparent)]
    Contribution(#[from] ContributionError),
    #[error("generator encode failed: {0}")]
    Encode(String),
}

/// Create a power-`power` transcript at `path` with all-generator sections
/// and an empty contribution log.
pub fn initialize_transcript(
    path: impl AsRef<std::path::Path>,
    power: u32,
) -> Result<(), InitializeError> {
    let header = PtauHeader::new(power)?;
    let mut writer = ContainerWriter::create(path.as_ref(), TRANSCRIPT_SECTIONS)?;
    header.write(&mut writer)?;

    write_generator_section::<G1>(&mut writer, sections::TAU_G1, header.tau_g1_count())?;
    write_generator_section::<G2>(&mut writer, sections::TAU_G2, header.per_power_count())?;
    write_generator_section::<G1>(&mut writer, sections::ALPHA_TAU_G1, header.per_power_count())?;
    write_generator_section::<G1>(&mut writer, sections::BETA_TAU_G1, header.per_power_count())?;
    write_generator_section::<G2>(&mut writer, sections::BETA_G2, 1)?;

    write_contribution_log(&mut writer, &[])?;
    writer.finish()?;

    info!(power, path = %path.as_ref().display(), "initialized fresh transcript");
    Ok(())
}

/// Stream `count` copies of the group generator into section `id`, reusing
/// one chunk-sized buffer.
fn write_generator_section<G: CeremonyGroup>(
    writer: &mut ContainerWriter,
    id: u32,
    count: u64,
) -> Result<(), InitializeError> {
    writer.start_section(id)?;
    let one = encode_uncompressed::<G>(&[G::generator()])
        .map_err(|e| InitializeError::Encode(e.to_string()))?;

    let per_chunk = chunk_points::<G>().min(count.max(1) as usize);
    let mut buf = Vec::with_capacity(per_chunk * one.len());
    for _ in 0..per_chunk {
        buf.extend_from_slice(&one);
    }

    let mut left = count;
    while left > 0 {
        let n = (per_chunk as u64).min(left) as usize;
        writer.write_all(&buf[..n * one.len()])?;
        left -= n as u64;
    }
    writer.end_section()?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ContainerReader;
    use crate::contribution::read_contribution_log;
    use crate::group::decode_points;
    use ark_ec::AffineRepr;

    #[test]
    fn fresh_transcript_has_generator_sections_and_empty_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.ptau");
        initialize_transcript(&path, 2).unwrap();

        let mut r = ContainerReader::open(&path).unwrap();
        let header = PtauHeader::read(&mut r).unwrap();
        assert_eq!(header.power, 2);
        assert_eq!(header.ceremony_power, 2);

        let len = r.seek_to_section(sections::TAU_G1).unwrap();
        assert_eq!(len, 7 * G1::UNCOMPRESSED_SIZE as u64);
        let points = decode_points::<G1>(&r.read_bytes(len as usize).unwrap()).unwrap();
        assert!(points.iter().all(|p| *p == G1::generator()));

        let len = r.seek_to_section(sections::TAU_G2).unwrap();
        assert_eq!(len, 4 * G2::UNCOMPRESSED_SIZE as u64);
        let points = decode_points::<G2>(&r.read_bytes(len as usize).unwrap()).unwrap();
        assert!(points.iter().all(|p| *p == G2::generator()));

        assert_eq!(r.seek_to_section(sections::ALPHA_TAU_G1).unwrap(), 4 * 64);
        assert_eq!(r.seek_to_section(sections::BETA_TAU_G1).unwrap(), 4 * 64);
        assert_eq!(r.seek_to_section(sections::BETA_G2).unwrap(), 128);

        assert!(read_contribution_log(&mut r).unwrap().is_empty());
        assert!(!r.has_section(sections::PHASE2_FLAG));
    }

    #[test]
    fn rejects_out_of_range_power() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.ptau");
        assert!(matches!(
            initialize_transcript(&path, 0),
            Err(InitializeError::Header(HeaderError::PowerOutOfRange { got: 0, .. }))
        ));
        assert!(!path.exists());
    }
}
