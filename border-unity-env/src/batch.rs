//! Batched step result.
use crate::AgentGroupSpec;
use ndarray::{Array1, Array2, ArrayD, Axis, IxDyn};
use std::collections::HashMap;

/// Telemetry of all agents of a group at a simulation step.
///
/// Every array has the number of agents as its leading dimension, in the order of the
/// records the batch was decoded from.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchedStepResult {
    /// Agent ids.
    pub agent_id: Vec<i32>,

    /// Maps an agent id to its index in the batch.
    pub agent_id_to_index: HashMap<i32, usize>,

    /// Rewards.
    pub reward: Array1<f32>,

    /// Flags denoting that episodes terminated.
    pub done: Array1<bool>,

    /// Flags denoting that episodes were interrupted by the step limit.
    pub max_step: Array1<bool>,

    /// Observations, one array of shape `[n_agents, *slot_shape]` per slot.
    pub obs: Vec<ArrayD<f32>>,

    /// Action masks, one matrix of shape `[n_agents, branch_size]` per branch.
    /// `None` for continuous action spaces.
    pub action_mask: Option<Vec<Array2<bool>>>,
}

/// Telemetry of a single agent, taken out of a [`BatchedStepResult`].
#[derive(Debug, Clone, PartialEq)]
pub struct AgentStepResult {
    /// Agent id.
    pub agent_id: i32,

    /// Reward.
    pub reward: f32,

    /// Flag denoting that the episode terminated.
    pub done: bool,

    /// Flag denoting that the episode was interrupted by the step limit.
    pub max_step: bool,

    /// Observations, one per slot.
    pub obs: Vec<ArrayD<f32>>,

    /// Action mask, one row per branch.
    pub action_mask: Option<Vec<Array1<bool>>>,
}

impl BatchedStepResult {
    /// A batch without agents.
    pub fn empty(spec: &AgentGroupSpec) -> Self {
        let obs = spec
            .observation_slots()
            .iter()
            .map(|slot| {
                let mut shape = vec![0];
                shape.extend_from_slice(&slot.shape);
                ArrayD::zeros(IxDyn(&shape))
            })
            .collect();
        let action_mask = spec.discrete_action_branches().map(|branches| {
            branches
                .iter()
                .map(|&size| Array2::from_elem((0, size), false))
                .collect()
        });

        Self {
            agent_id: vec![],
            agent_id_to_index: HashMap::new(),
            reward: Array1::zeros(0),
            done: Array1::from_elem(0, false),
            max_step: Array1::from_elem(0, false),
            obs,
            action_mask,
        }
    }

    /// The number of agents in the batch.
    pub fn n_agents(&self) -> usize {
        self.agent_id.len()
    }

    /// Returns `true` if the batch has an agent with the given id.
    pub fn contains_agent(&self, agent_id: i32) -> bool {
        self.agent_id_to_index.contains_key(&agent_id)
    }

    /// Telemetry of the agent with the given id.
    pub fn agent_step(&self, agent_id: i32) -> Option<AgentStepResult> {
        let ix = *self.agent_id_to_index.get(&agent_id)?;
        Some(AgentStepResult {
            agent_id,
            reward: self.reward[ix],
            done: self.done[ix],
            max_step: self.max_step[ix],
            obs: self
                .obs
                .iter()
                .map(|o| o.index_axis(Axis(0), ix).to_owned())
                .collect(),
            action_mask: self
                .action_mask
                .as_ref()
                .map(|masks| masks.iter().map(|m| m.row(ix).to_owned()).collect()),
        })
    }
}
