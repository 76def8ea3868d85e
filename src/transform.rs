//! Streaming section transform — the core of a contribution
//!
//! Each of the five point-group sections is rewritten as
//! `P_i ← (start·inc^i)·P_i` without ever holding more than one chunk in
//! memory. A running scalar `t` starts at `start` and advances
//! multiplicatively by `inc^len` after each chunk, so the per-point exponent
//! schedule is identical no matter where chunk boundaries fall. Every
//! transformed chunk is written to the output section (uncompressed, which
//! doubles as the challenge-hash feed) and re-encoded compressed for the
//! response hash; the first two transformed points are retained as
//! checkpoints for the contribution record.
//!
//! The section length is unknown to a forward writer until the stream ends,
//! so the output section is opened with a zero-length placeholder and
//! patched afterwards (see the container module). All mutable state — the
//! running scalar and both accumulators — is threaded through an explicit
//! per-section context, never captured ambiently.

#![forbid(unsafe_code)]
#![allow(missing_docs)]

use ark_ff::Field;
use tracing::debug;

use crate::container::{ContainerError, ContainerReader, ContainerWriter};
use crate::group::{
    apply_key_chunk, chunk_points, decode_points, encode_compressed, encode_uncompressed,
    CeremonyGroup, GroupError,
};
use crate::hashchain::HashAccumulator;
use crate::Scalar;

/// Errors surfaced while transforming a section.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error(transparent)]
    Container(#[from] ContainerError),
    #[error(transparent)]
    Group(#[from] GroupError),
    #[error("section {label}: {got} bytes on disk, expected {expected} for {count} points")]
    SectionSize { label: &'static str, expected: u64, got: u64, count: u64 },
}

/// Everything a section transform mutates, passed explicitly.
pub struct SectionContext<'a> {
    /// Input transcript, positioned per section.
    pub reader: &'a mut ContainerReader,
    /// Output transcript, holding the open section being streamed.
    pub writer: &'a mut ContainerWriter,
    /// Challenge accumulator (uncompressed encoding).
    pub challenge: &'a mut HashAccumulator,
    /// Response accumulator (compressed encoding).
    pub response: &'a mut HashAccumulator,
}

/// Immutable description of one section transform.
#[derive(Debug, Clone)]
pub struct SectionPlan {
    /// Container section id.
    pub id: u32,
    /// Section label for diagnostics.
    pub label: &'static str,
    /// Number of points the section must hold.
    pub count: u64,
    /// Exponent of the first point.
    pub start: Scalar,
    /// Multiplicative step between consecutive points.
    pub inc: Scalar,
    /// Points per chunk; defaults to the byte-budget-derived size.
    pub chunk: usize,
}

impl SectionPlan {
    /// Plan a section transform with the default chunk size for `G`.
    pub fn new<G: CeremonyGroup>(
        id: u32,
        label: &'static str,
        count: u64,
        start: Scalar,
        inc: Scalar,
    ) -> Self {
        Self { id, label, count, start, inc, chunk: chunk_points::<G>() }
    }
}

/// Result of one section transform.
pub struct TransformOutcome<G> {
    /// The first `min(2, count)` transformed points.
    pub checkpoints: Vec<G>,
    /// Patched payload length of the output section.
    pub bytes_written: u64,
}

/// Stream section `plan.id` from the input to the output transcript,
/// applying the key and feeding both accumulators.
pub fn transform_section<G: CeremonyGroup>(
    ctx: &mut SectionContext<'_>,
    plan: &SectionPlan,
) -> Result<TransformOutcome<G>, TransformError> {
    let point_size = G::UNCOMPRESSED_SIZE as u64;
    let expected = plan.count * point_size;
    let got = ctx.reader.seek_to_section(plan.id)?;
    if got != expected {
        return Err(TransformError::SectionSize {
            label: plan.label,
            expected,
            got,
            count: plan.count,
        });
    }

    ctx.writer.start_section(plan.id)?;

    let mut t = plan.start;
    let mut checkpoints: Vec<G> = Vec::new();
    let mut done: u64 = 0;
    while done < plan.count {
        let n = plan.chunk.min((plan.count - done) as usize);
        let raw = ctx.reader.read_bytes(n * G::UNCOMPRESSED_SIZE)?;
        let points = decode_points::<G>(&raw)?;
        let transformed = apply_key_chunk(&points, t, plan.inc);

        let raw_out = encode_uncompressed(&transformed)?;
        ctx.writer.write_all(&raw_out)?;
        ctx.challenge.update(&raw_out);
        ctx.response.update(&encode_compressed(&transformed)?);

        if done == 0 {
            checkpoints.extend_from_slice(&transformed[..transformed.len().min(2)]);
        }

        t *= plan.inc.pow([n as u64]);
        done += n as u64;
        debug!(section = plan.label, done, total = plan.count, "transformed chunk");
    }

    let bytes_written = ctx.writer.end_section()?;
    debug_assert_eq!(bytes_written, expected);
    Ok(TransformOutcome { checkpoints, bytes_written })
}

// ============================================================================
// Tests
// ============================================================================
