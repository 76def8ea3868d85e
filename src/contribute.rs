//! Contribution orchestration
//!
//! One ceremony step, start to finish: open and validate the input
//! transcript, chain onto its last challenge digest, derive fresh keys from
//! entropy, stream the five point sections through the key, and append the
//! new contribution record. The order is load-bearing — validation happens
//! before the output file exists, the accumulators are seeded before any
//! section bytes, and the response digest folds in the public key material
//! only after its checkpoint snapshot is taken.
//!
//! There is no resume path. An interrupted run leaves an unusable partial
//! output; the only recovery is to delete it and restart from the untouched
//! input transcript.

#![forbid(unsafe_code)]
#![allow(missing_docs)]

use std::path::Path;

use ark_ff::One;
use rand::{rngs::OsRng, CryptoRng, RngCore};
use tracing::{info, warn};

use crate::container::{
    sections, ContainerError, ContainerReader, ContainerWriter, TRANSCRIPT_SECTIONS,
};
use crate::contribution::{
    read_contribution_log, write_contribution_log, Contribution, ContributionError, KIND_BEACON,
    MAX_NAME_LEN,
};
use crate::entropy::{EntropySource, StdinEntropy};
use crate::header::{first_challenge_hash, HeaderError, PtauHeader};
use crate::hashchain::HashAccumulator;
use crate::keypair::{CeremonyKey, KeySeed};
use crate::transform::{transform_section, SectionContext, SectionPlan, TransformError};
use crate::{Scalar, G1, G2};

/// Errors surfaced by a contribution run.
#[derive(Debug, thiserror::Error)]
pub enum ContributeError {
    #[error(transparent)]
    Container(#[from] ContainerError),
    #[error(transparent)]
    Header(#[from] HeaderError),
    #[error(transparent)]
    Contribution(#[from] ContributionError),
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error(
        "transcript was reduced to power {power} from ceremony power {ceremony_power} \
         and accepts no further contributions"
    )]
    ReducedTranscript { power: u32, ceremony_power: u32 },
    #[error("contributor name of {got} bytes exceeds the {max}-byte limit")]
    NameTooLong { got: usize, max: usize },
    #[error("entropy collection failed: {0}")]
    Entropy(std::io::Error),
}

/// Caller-supplied parameters of one contribution.
#[derive(Debug, Clone)]
pub struct ContributeOptions {
    /// Contributor display name recorded in the log.
    pub name: String,
    /// Pre-supplied entropy text; when absent the injected source is asked.
    pub entropy: Option<String>,
}

/// Contribute to the transcript at `input`, writing the extended transcript
/// to `output`. Production entry point: OS randomness, stdin entropy prompt.
pub fn contribute(
    input: &Path,
    output: &Path,
    options: &ContributeOptions,
) -> Result<Contribution, ContributeError> {
    contribute_with(input, output, options, &mut OsRng, &mut StdinEntropy)
}

/// [`contribute`] with the secure-randomness source and entropy source
/// injected. With both fixed, the output file is byte-identical across runs.
pub fn contribute_with<R, E>(
    input: &Path,
    output: &Path,
    options: &ContributeOptions,
    rng: &mut R,
    entropy_source: &mut E,
) -> Result<Contribution, ContributeError>
where
    R: RngCore + CryptoRng,
    E: EntropySource + ?Sized,
{
    let mut reader = ContainerReader::open(input)?;
    let header = PtauHeader::read(&mut reader)?;
    if header.power != header.ceremony_power {
        return Err(ContributeError::ReducedTranscript {
            power: header.power,
            ceremony_power: header.ceremony_power,
        });
    }
    if options.name.len() > MAX_NAME_LEN {
        return Err(ContributeError::NameTooLong { got: options.name.len(), max: MAX_NAME_LEN });
    }
    if reader.has_section(sections::PHASE2_FLAG) {
        warn!("transcript has phase-2 parameters derived from it; contributing invalidates them");
    }

    let mut log = read_contribution_log(&mut reader)?;
    let prior = match log.last() {
        Some(last) => last.next_challenge,
        None => first_challenge_hash(header.power),
    };
    info!(
        power = header.power,
        contributions = log.len(),
        prior = %hex::encode(prior),
        "contributing"
    );

    let entropy = match &options.entropy {
        Some(text) => text.clone(),
        None => entropy_source.obtain().map_err(ContributeError::Entropy)?,
    };
    let seed = KeySeed::generate(rng, &entropy);
    let key = CeremonyKey::generate(&prior, &seed);

    let mut challenge = HashAccumulator::seeded(&prior);
    let mut response = HashAccumulator::seeded(&prior);

    let mut writer = ContainerWriter::create(output, TRANSCRIPT_SECTIONS)?;
    header.write(&mut writer)?;

    let one = Scalar::one();
    let mut ctx = SectionContext {
        reader: &mut reader,
        writer: &mut writer,
        challenge: &mut challenge,
        response: &mut response,
    };
    let tau_g1 = transform_section::<G1>(
        &mut ctx,
        &SectionPlan::new::<G1>(
            sections::TAU_G1,
            "tauG1",
            header.tau_g1_count(),
            one,
            key.tau.secret,
        ),
    )?;
    let tau_g2 = transform_section::<G2>(
        &mut ctx,
        &SectionPlan::new::<G2>(
            sections::TAU_G2,
            "tauG2",
            header.per_power_count(),
            one,
            key.tau.secret,
        ),
    )?;
    let alpha_tau_g1 = transform_section::<G1>(
        &mut ctx,
        &SectionPlan::new::<G1>(
            sections::ALPHA_TAU_G1,
            "alphaTauG1",
            header.per_power_count(),
            key.alpha.secret,
            key.tau.secret,
        ),
    )?;
    let beta_tau_g1 = transform_section::<G1>(
        &mut ctx,
        &SectionPlan::new::<G1>(
            sections::BETA_TAU_G1,
            "betaTauG1",
            header.per_power_count(),
            key.beta.secret,
            key.tau.secret,
        ),
    )?;
    let beta_g2 = transform_section::<G2>(
        &mut ctx,
        &SectionPlan::new::<G2>(sections::BETA_G2, "betaG2", 1, key.beta.secret, key.tau.secret),
    )?;

    let next_challenge = challenge.digest();
    let partial = response.snapshot();
    response.update(&key.public().to_bytes());
    let response_hash = response.digest();

    info!(next_challenge = %hex::encode(next_challenge), "new challenge digest");
    info!(response = %hex::encode(response_hash), "contribution response digest");

    let contribution = Contribution {
        name: options.name.clone(),
        kind: KIND_BEACON,
        key: key.public(),
        tau_g1: [tau_g1.checkpoints[0], tau_g1.checkpoints[1]],
        tau_g2: [tau_g2.checkpoints[0], tau_g2.checkpoints[1]],
        alpha_tau_g1: alpha_tau_g1.checkpoints[0],
        beta_tau_g1: beta_tau_g1.checkpoints[0],
        beta_g2: beta_g2.checkpoints[0],
        next_challenge,
        partial,
        response: response_hash,
    };
    log.push(contribution.clone());
    write_contribution_log(&mut writer, &log)?;
    writer.finish()?;

    Ok(contribution)
}

// ============================================================================
// Tests
// ============================================================================
