use super::visual::slot_observation;
use crate::{error::UnityEnvError, AgentInfo, ObservationData};
use log::trace;
use ndarray::{ArrayD, Axis, IxDyn};

/// Stacks the flat float observations of slot `slot` into an array of shape
/// `[n_agents, *shape]`.
///
/// Payloads are copied without decompression; every payload must have as many elements as
/// `shape`.
pub fn process_vector_observation(
    slot: usize,
    shape: &[usize],
    records: &[AgentInfo],
) -> Result<ArrayD<f32>, UnityEnvError> {
    trace!("process_vector_observation(slot = {}, shape = {:?})", slot, shape);

    let len = shape.iter().product::<usize>();
    let mut batch_shape = vec![records.len()];
    batch_shape.extend_from_slice(shape);
    let mut batch = ArrayD::zeros(IxDyn(&batch_shape));

    for (ix, record) in records.iter().enumerate() {
        let data = match &slot_observation(record, slot)?.data {
            ObservationData::FloatData(data) => data,
            ObservationData::CompressedData(_) => {
                return Err(UnityEnvError::MalformedRecord {
                    agent_id: record.id,
                    reason: format!("compressed observation in vector slot {}", slot),
                })
            }
        };
        if data.len() != len {
            return Err(UnityEnvError::ShapeMismatch {
                agent_id: record.id,
                slot,
                expected: shape.to_vec(),
                actual: vec![data.len()],
            });
        }

        // Rows of a freshly allocated array iterate in row-major order.
        batch
            .index_axis_mut(Axis(0), ix)
            .iter_mut()
            .zip(data.iter())
            .for_each(|(dst, src)| *dst = *src);
    }

    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        util::test::{generate_agent_infos, GenerateOptions},
        ObservationProto,
    };

    #[test]
    fn test_vector_observation() -> Result<(), UnityEnvError> {
        let n_agents = 10;
        let shapes = vec![vec![3], vec![4]];
        let records = generate_agent_infos(n_agents, &shapes, &GenerateOptions::default());

        for (slot, shape) in shapes.iter().enumerate() {
            let arr = process_vector_observation(slot, shape, &records)?;
            let mut expected = vec![n_agents];
            expected.extend(shape);
            assert_eq!(arr.shape(), expected.as_slice());
            assert!(arr.iter().all(|v| (v - 0.1).abs() < 0.01));
        }
        Ok(())
    }

    #[test]
    fn test_vector_observation_keeps_order() -> Result<(), UnityEnvError> {
        let records: Vec<_> = (0..3)
            .map(|i| AgentInfo {
                id: 10 + i,
                observations: vec![ObservationProto::uncompressed(
                    vec![2, 2],
                    (0..4).map(|j| (i * 4 + j) as f32).collect(),
                )],
                ..AgentInfo::default()
            })
            .collect();
        let arr = process_vector_observation(0, &[2, 2], &records)?;

        assert_eq!(arr.shape(), &[3, 2, 2]);
        assert_eq!(
            arr.iter().cloned().collect::<Vec<_>>(),
            (0..12).map(|v| v as f32).collect::<Vec<_>>()
        );
        Ok(())
    }

    #[test]
    fn test_vector_observation_wrong_length() {
        let mut records = generate_agent_infos(3, &[vec![3]], &GenerateOptions::default());
        records[2].observations[0] = ObservationProto::uncompressed(vec![4], vec![0.0; 4]);

        match process_vector_observation(0, &[3], &records) {
            Err(UnityEnvError::ShapeMismatch {
                agent_id,
                actual,
                ..
            }) => {
                assert_eq!(agent_id, 2);
                assert_eq!(actual, vec![4]);
            }
            r => panic!("unexpected result {:?}", r),
        }
    }

    #[test]
    fn test_vector_observation_missing_slot() {
        let records = generate_agent_infos(2, &[vec![3]], &GenerateOptions::default());

        match process_vector_observation(1, &[3], &records) {
            Err(UnityEnvError::MalformedRecord { agent_id, .. }) => assert_eq!(agent_id, 0),
            r => panic!("unexpected result {:?}", r),
        }
    }
}
