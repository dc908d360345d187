//! Action masks of discrete action spaces.
use crate::{error::UnityEnvError, AgentInfo};
use log::{trace, warn};
use ndarray::Array2;

/// Offsets at which a flat action mask is split into branches.
///
/// The offset of the first branch, always zero, is omitted, i.e., branch sizes `[2, 2, 6]`
/// give `[2, 4]`.
pub fn split_indices(branches: &[usize]) -> Vec<usize> {
    branches
        .iter()
        .take(branches.len().saturating_sub(1))
        .scan(0, |offset, &size| {
            *offset += size;
            Some(*offset)
        })
        .collect()
}

/// Slices the action masks of `records` into one matrix of shape `[n_agents, branch_size]`
/// per branch.
///
/// Row `i` of the matrix of branch `b` is the range `[o, o + s)` of the mask of the `i`-th
/// record, where `s` is the size of `b` and `o` the sum of the sizes of the preceding
/// branches. Values are copied as they are; no meaning is attached to `true` or `false`.
///
/// Every mask must have exactly `branches.iter().sum()` elements.
pub fn build_action_masks(
    records: &[AgentInfo],
    branches: &[usize],
) -> Result<Vec<Array2<bool>>, UnityEnvError> {
    trace!("build_action_masks(branches = {:?})", branches);

    let total = branches.iter().sum::<usize>();
    if let Some(record) = records.iter().find(|r| r.action_mask.len() != total) {
        warn!(
            "Action mask of agent {} has {} elements, expected {}",
            record.id,
            record.action_mask.len(),
            total
        );
        return Err(UnityEnvError::MalformedRecord {
            agent_id: record.id,
            reason: format!(
                "action mask has {} elements, expected {}",
                record.action_mask.len(),
                total
            ),
        });
    }

    let offsets = std::iter::once(0).chain(split_indices(branches));
    let masks = offsets
        .zip(branches.iter())
        .map(|(offset, &size)| {
            Array2::from_shape_fn((records.len(), size), |(i, j)| {
                records[i].action_mask[offset + j]
            })
        })
        .collect();

    Ok(masks)
}
