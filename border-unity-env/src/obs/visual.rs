use super::decode_observation;
use crate::{error::UnityEnvError, AgentInfo, ObservationProto};
use log::trace;
use ndarray::{ArrayD, Axis, IxDyn};

pub(crate) fn slot_observation(
    record: &AgentInfo,
    slot: usize,
) -> Result<&ObservationProto, UnityEnvError> {
    record
        .observations
        .get(slot)
        .ok_or_else(|| UnityEnvError::MalformedRecord {
            agent_id: record.id,
            reason: format!(
                "missing observation for slot {} ({} observations)",
                slot,
                record.observations.len()
            ),
        })
}

/// Stacks the visual observations of slot `slot` into an array of shape `[n_agents, *shape]`.
///
/// The compression of each observation is read from its own payload, so compressed and
/// uncompressed observations may be mixed in a slot. Single-channel decoding is used when
/// `shape` has one channel or `grayscale` is `true`. A failure for any agent fails the batch.
pub fn process_visual_observation(
    slot: usize,
    shape: &[usize],
    records: &[AgentInfo],
    grayscale: bool,
) -> Result<ArrayD<f32>, UnityEnvError> {
    trace!("process_visual_observation(slot = {}, shape = {:?})", slot, shape);

    let grayscale = grayscale || shape.get(2) == Some(&1);
    let mut batch_shape = vec![records.len()];
    batch_shape.extend_from_slice(shape);
    let mut batch = ArrayD::zeros(IxDyn(&batch_shape));

    for (ix, record) in records.iter().enumerate() {
        let obs = slot_observation(record, slot)?;
        let declared = obs
            .shape
            .iter()
            .map(|&d| d.max(0) as usize)
            .collect::<Vec<_>>();
        if declared != shape {
            return Err(UnityEnvError::ShapeMismatch {
                agent_id: record.id,
                slot,
                expected: shape.to_vec(),
                actual: declared,
            });
        }

        let arr = decode_observation(obs, shape, grayscale)
            .map_err(|e| e.into_env_error(record.id, slot))?;
        batch.index_axis_mut(Axis(0), ix).assign(&arr);
    }

    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test::{
        generate_compressed_observation, generate_uncompressed_observation, random_pixels,
    };

    fn record(id: i32, obs: ObservationProto) -> AgentInfo {
        AgentInfo {
            id,
            observations: vec![obs],
            ..AgentInfo::default()
        }
    }

    #[test]
    fn test_process_visual_observation() -> anyhow::Result<()> {
        let in_array_1 = random_pixels(128, 64);
        let in_array_2 = random_pixels(128, 64);
        let records = vec![
            record(0, generate_compressed_observation(&in_array_1)?),
            record(1, generate_uncompressed_observation(&in_array_2.clone().into_dyn())),
        ];
        let arr = process_visual_observation(0, &[128, 64, 3], &records, false)?;

        assert_eq!(arr.shape(), &[2, 128, 64, 3]);
        let diff_1 = &arr.index_axis(Axis(0), 0) - &in_array_1.into_dyn();
        let diff_2 = &arr.index_axis(Axis(0), 1) - &in_array_2.into_dyn();
        assert!(diff_1.iter().all(|d| d.abs() < 0.01));
        assert!(diff_2.iter().all(|d| d.abs() < 1e-6));
        Ok(())
    }

    #[test]
    fn test_process_visual_observation_bad_shape() -> anyhow::Result<()> {
        let records = vec![record(5, generate_compressed_observation(&random_pixels(128, 64))?)];

        match process_visual_observation(0, &[128, 42, 3], &records, false) {
            Err(UnityEnvError::ShapeMismatch { agent_id, slot, .. }) => {
                assert_eq!(agent_id, 5);
                assert_eq!(slot, 0);
            }
            r => panic!("unexpected result {:?}", r),
        }
        Ok(())
    }

    #[test]
    fn test_process_visual_observation_single_channel() -> anyhow::Result<()> {
        let in_array = random_pixels(16, 8);
        let mut obs = generate_compressed_observation(&in_array)?;
        obs.shape = vec![16, 8, 1];
        let arr = process_visual_observation(0, &[16, 8, 1], &[record(0, obs)], false)?;

        assert_eq!(arr.shape(), &[1, 16, 8, 1]);
        Ok(())
    }

    #[test]
    fn test_process_visual_observation_empty() -> Result<(), UnityEnvError> {
        let arr = process_visual_observation(0, &[4, 4, 3], &[], false)?;
        assert_eq!(arr.shape(), &[0, 4, 4, 3]);
        Ok(())
    }
}
