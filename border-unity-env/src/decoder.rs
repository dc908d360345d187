//! Decoding of a batch of agent records.
use crate::{
    build_action_masks,
    error::UnityEnvError,
    obs::{process_vector_observation, process_visual_observation},
    AgentGroupSpec, AgentInfo, BatchDecoderConfig, BatchedStepResult, ObservationKind,
    ObservationSlot,
};
use log::{debug, trace, warn};
use ndarray::{Array1, ArrayD};
use std::collections::HashMap;

/// Decodes records with a fixed [`AgentGroupSpec`] and [`BatchDecoderConfig`].
///
/// The decoder holds no mutable state and can be shared across threads.
#[derive(Debug, Clone)]
pub struct BatchDecoder {
    spec: AgentGroupSpec,
    config: BatchDecoderConfig,
}

impl BatchDecoder {
    /// Creates a decoder.
    pub fn new(spec: AgentGroupSpec, config: BatchDecoderConfig) -> Self {
        Self { spec, config }
    }

    /// The group specification.
    pub fn spec(&self) -> &AgentGroupSpec {
        &self.spec
    }

    /// The configuration.
    pub fn config(&self) -> &BatchDecoderConfig {
        &self.config
    }

    /// Decodes a batch of records, see [`decode_batch`].
    pub fn decode(&self, records: &[AgentInfo]) -> Result<BatchedStepResult, UnityEnvError> {
        decode(records, &self.spec, &self.config)
    }
}

/// Decodes the records of the agents of a group into a [`BatchedStepResult`].
///
/// The steps are applied in the following order, and the first failure is returned:
///
/// 1. agent ids are collected; duplicated ids are a [`UnityEnvError::MalformedRecord`],
/// 2. rewards are checked for NaN and infinity before any observation is touched,
/// 3. every record must have one observation per slot,
/// 4. slots are assembled in order and each assembled array is checked for NaN and infinity,
/// 5. action masks are sliced for discrete action spaces.
///
/// A reward and an observation both poisoned in the same batch are therefore reported as a
/// reward error.
pub fn decode_batch(
    records: &[AgentInfo],
    spec: &AgentGroupSpec,
) -> Result<BatchedStepResult, UnityEnvError> {
    decode(records, spec, &BatchDecoderConfig::default())
}

fn decode(
    records: &[AgentInfo],
    spec: &AgentGroupSpec,
    config: &BatchDecoderConfig,
) -> Result<BatchedStepResult, UnityEnvError> {
    trace!("decode_batch(n_agents = {})", records.len());

    let mut agent_id = Vec::with_capacity(records.len());
    let mut agent_id_to_index = HashMap::with_capacity(records.len());
    for (ix, record) in records.iter().enumerate() {
        if agent_id_to_index.insert(record.id, ix).is_some() {
            warn!("Duplicated agent id {} in a batch", record.id);
            return Err(UnityEnvError::MalformedRecord {
                agent_id: record.id,
                reason: "duplicated agent id".to_string(),
            });
        }
        agent_id.push(record.id);
    }

    let reward = records
        .iter()
        .map(|r| r.reward as f32)
        .collect::<Array1<_>>();
    let done = records.iter().map(|r| r.done).collect::<Array1<_>>();
    let max_step = records
        .iter()
        .map(|r| r.max_step_reached)
        .collect::<Array1<_>>();
    check_rewards(records, &reward)?;

    let n_slots = spec.observation_slots().len();
    if let Some(record) = records.iter().find(|r| r.observations.len() != n_slots) {
        warn!(
            "Agent {} has {} observations, expected {}",
            record.id,
            record.observations.len(),
            n_slots
        );
        return Err(UnityEnvError::MalformedRecord {
            agent_id: record.id,
            reason: format!(
                "{} observations, expected {}",
                record.observations.len(),
                n_slots
            ),
        });
    }

    let obs = assemble_slots(records, spec.observation_slots(), config)?;

    let action_mask = match spec.discrete_action_branches() {
        Some(branches) => Some(build_action_masks(records, branches)?),
        None => None,
    };

    debug!(
        "Decoded a batch of {} agents with {} observation slots",
        records.len(),
        obs.len()
    );

    Ok(BatchedStepResult {
        agent_id,
        agent_id_to_index,
        reward,
        done,
        max_step,
        obs,
        action_mask,
    })
}

/// Fails on the first reward that is NaN or infinite, also after conversion to `f32`.
fn check_rewards(records: &[AgentInfo], reward: &Array1<f32>) -> Result<(), UnityEnvError> {
    match records
        .iter()
        .zip(reward.iter())
        .find(|(r, r32)| !r.reward.is_finite() || !r32.is_finite())
    {
        Some((record, _)) => {
            warn!("Non-finite reward {} for agent {}", record.reward, record.id);
            Err(UnityEnvError::NumericSafety {
                agent_id: record.id,
                slot: None,
                value: record.reward,
            })
        }
        None => Ok(()),
    }
}

/// Fails on the first NaN or infinite element of an assembled slot.
fn check_observations(
    records: &[AgentInfo],
    slot: usize,
    batch: &ArrayD<f32>,
) -> Result<(), UnityEnvError> {
    let per_agent = (batch.len() / records.len().max(1)).max(1);
    match batch.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        Some((pos, &v)) => {
            let record = &records[pos / per_agent];
            let value = v as f64;
            warn!(
                "Non-finite observation {} for agent {} in slot {}",
                value, record.id, slot
            );
            Err(UnityEnvError::NumericSafety {
                agent_id: record.id,
                slot: Some(slot),
                value,
            })
        }
        None => Ok(()),
    }
}

fn assemble_slot(
    records: &[AgentInfo],
    ix: usize,
    slot: &ObservationSlot,
    config: &BatchDecoderConfig,
) -> Result<ArrayD<f32>, UnityEnvError> {
    let batch = match slot.kind {
        ObservationKind::Visual => {
            process_visual_observation(ix, &slot.shape, records, config.grayscale_visual)?
        }
        ObservationKind::Vector => process_vector_observation(ix, &slot.shape, records)?,
    };
    check_observations(records, ix, &batch)?;
    Ok(batch)
}

#[cfg(not(feature = "rayon"))]
fn assemble_slots(
    records: &[AgentInfo],
    slots: &[ObservationSlot],
    config: &BatchDecoderConfig,
) -> Result<Vec<ArrayD<f32>>, UnityEnvError> {
    slots
        .iter()
        .enumerate()
        .map(|(ix, slot)| assemble_slot(records, ix, slot, config))
        .collect()
}

#[cfg(feature = "rayon")]
fn assemble_slots(
    records: &[AgentInfo],
    slots: &[ObservationSlot],
    config: &BatchDecoderConfig,
) -> Result<Vec<ArrayD<f32>>, UnityEnvError> {
    use ndarray::parallel::prelude::*;

    if !config.parallel {
        return slots
            .iter()
            .enumerate()
            .map(|(ix, slot)| assemble_slot(records, ix, slot, config))
            .collect();
    }

    // Collected in slot order, so the error of the lowest failing slot is returned.
    let results: Vec<_> = slots
        .par_iter()
        .enumerate()
        .map(|(ix, slot)| assemble_slot(records, ix, slot, config))
        .collect();
    results.into_iter().collect()
}
