//! Specification of an agent group.
use crate::{error::UnityEnvError, AgentInfo, BrainParameters, CompressionType};
use log::debug;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// Type of the action space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    /// Discrete actions with the given branch sizes.
    Discrete(Vec<usize>),

    /// A continuous action vector of the given length.
    Continuous(usize),
}

/// How the observations of a slot are assembled into a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObservationKind {
    /// Images of shape `[height, width, channels]`, possibly compressed.
    Visual,

    /// Flat numeric observations.
    Vector,
}

impl ObservationKind {
    /// Visual for rank-3 shapes, vector otherwise.
    pub fn from_shape(shape: &[usize]) -> Self {
        if shape.len() == 3 {
            Self::Visual
        } else {
            Self::Vector
        }
    }
}

/// An observation channel shared by all agents of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationSlot {
    /// Shape of the observation of a single agent.
    pub shape: Vec<usize>,

    /// Visual or vector assembly.
    pub kind: ObservationKind,

    /// Compression seen on the record the slot was resolved from.
    /// Each observation is decoded according to its own payload regardless of this field.
    pub compression: CompressionType,
}

impl ObservationSlot {
    /// Creates a slot of uncompressed observations.
    pub fn new(shape: Vec<usize>) -> Self {
        let kind = ObservationKind::from_shape(&shape);
        Self {
            shape,
            kind,
            compression: CompressionType::None,
        }
    }

    /// The number of elements of an observation.
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    /// `true` if observations in the slot have no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Actions for a batch of agents, the shape of [`AgentGroupSpec::empty_action`] and
/// [`AgentGroupSpec::random_action`].
#[derive(Debug, Clone, PartialEq)]
pub enum GroupActions {
    /// `[n_agents, n_branches]` branch indices.
    Discrete(Array2<i32>),

    /// `[n_agents, action_size]` action vectors.
    Continuous(Array2<f32>),
}

impl GroupActions {
    /// The number of agents.
    pub fn n_agents(&self) -> usize {
        match self {
            Self::Discrete(a) => a.nrows(),
            Self::Continuous(a) => a.nrows(),
        }
    }
}

/// Specification of an agent group: observation slots and the action space.
///
/// It is resolved once per session and then shared read-only by every batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentGroupSpec {
    observation_slots: Vec<ObservationSlot>,
    action_type: ActionType,
}

impl AgentGroupSpec {
    /// Creates a specification from observation shapes and an action type.
    ///
    /// Fails if a dimension, a branch size or the continuous action size is zero,
    /// or if a discrete action space has no branch.
    pub fn new(
        observation_shapes: Vec<Vec<usize>>,
        action_type: ActionType,
    ) -> Result<Self, UnityEnvError> {
        let observation_slots = observation_shapes
            .into_iter()
            .map(ObservationSlot::new)
            .collect();
        Self::from_slots(observation_slots, action_type)
    }

    fn from_slots(
        observation_slots: Vec<ObservationSlot>,
        action_type: ActionType,
    ) -> Result<Self, UnityEnvError> {
        for (ix, slot) in observation_slots.iter().enumerate() {
            if slot.shape.is_empty() || slot.shape.iter().any(|&d| d == 0) {
                return Err(UnityEnvError::InvalidSpec(format!(
                    "observation slot {} has invalid shape {:?}",
                    ix, slot.shape
                )));
            }
        }
        match &action_type {
            ActionType::Discrete(branches) => {
                if branches.is_empty() {
                    return Err(UnityEnvError::InvalidSpec(
                        "discrete action space without branches".to_string(),
                    ));
                }
                if branches.iter().any(|&b| b == 0) {
                    return Err(UnityEnvError::InvalidSpec(format!(
                        "discrete branch sizes must be positive: {:?}",
                        branches
                    )));
                }
            }
            ActionType::Continuous(size) => {
                if *size == 0 {
                    return Err(UnityEnvError::InvalidSpec(
                        "continuous action size must be positive".to_string(),
                    ));
                }
            }
        }
        Ok(Self {
            observation_slots,
            action_type,
        })
    }

    /// Observation slots in order.
    pub fn observation_slots(&self) -> &[ObservationSlot] {
        &self.observation_slots
    }

    /// Observation shapes in order.
    pub fn observation_shapes(&self) -> Vec<Vec<usize>> {
        self.observation_slots
            .iter()
            .map(|s| s.shape.clone())
            .collect()
    }

    /// Action type.
    pub fn action_type(&self) -> &ActionType {
        &self.action_type
    }

    /// `true` for discrete action spaces.
    pub fn is_action_discrete(&self) -> bool {
        matches!(self.action_type, ActionType::Discrete(_))
    }

    /// `true` for continuous action spaces.
    pub fn is_action_continuous(&self) -> bool {
        matches!(self.action_type, ActionType::Continuous(_))
    }

    /// The number of branches for discrete actions, the vector length for continuous actions.
    pub fn action_size(&self) -> usize {
        match &self.action_type {
            ActionType::Discrete(branches) => branches.len(),
            ActionType::Continuous(size) => *size,
        }
    }

    /// Branch sizes, `None` for continuous action spaces.
    pub fn discrete_action_branches(&self) -> Option<&[usize]> {
        match &self.action_type {
            ActionType::Discrete(branches) => Some(branches),
            ActionType::Continuous(_) => None,
        }
    }

    /// Zero actions for `n_agents` agents.
    pub fn empty_action(&self, n_agents: usize) -> GroupActions {
        match &self.action_type {
            ActionType::Discrete(branches) => {
                GroupActions::Discrete(Array2::zeros((n_agents, branches.len())))
            }
            ActionType::Continuous(size) => {
                GroupActions::Continuous(Array2::zeros((n_agents, *size)))
            }
        }
    }

    /// Random actions for `n_agents` agents.
    ///
    /// Discrete actions are drawn uniformly from each branch, continuous actions uniformly
    /// from `[-1, 1)`.
    pub fn random_action(&self, n_agents: usize) -> GroupActions {
        match &self.action_type {
            ActionType::Discrete(branches) => {
                GroupActions::Discrete(Array2::from_shape_fn(
                    (n_agents, branches.len()),
                    |(_, j)| fastrand::usize(..branches[j]) as i32,
                ))
            }
            ActionType::Continuous(size) => GroupActions::Continuous(Array2::from_shape_fn(
                (n_agents, *size),
                |_| fastrand::f32() * 2.0 - 1.0,
            )),
        }
    }
}

fn to_dims(values: &[i32], what: &str) -> Result<Vec<usize>, UnityEnvError> {
    values
        .iter()
        .map(|&v| match usize::try_from(v) {
            Ok(d) if d > 0 => Ok(d),
            _ => Err(UnityEnvError::InvalidSpec(format!(
                "{} must be positive, got {:?}",
                what, values
            ))),
        })
        .collect()
}

/// Resolves the specification of an agent group.
///
/// The action space is read from `brain`, the observation shapes from `sample`.
/// `brain.vector_action_space_type` is 0 for discrete and 1 for continuous actions;
/// a continuous action space must have exactly one entry in `vector_action_size`.
pub fn resolve_group_spec(
    brain: &BrainParameters,
    sample: &AgentInfo,
) -> Result<AgentGroupSpec, UnityEnvError> {
    let action_type = match brain.vector_action_space_type {
        0 => ActionType::Discrete(to_dims(&brain.vector_action_size, "branch sizes")?),
        1 => match brain.vector_action_size.as_slice() {
            [size] => {
                let dims = to_dims(&[*size], "continuous action size")?;
                ActionType::Continuous(dims[0])
            }
            sizes => {
                return Err(UnityEnvError::InvalidSpec(format!(
                    "continuous action space needs exactly one action size, got {:?}",
                    sizes
                )))
            }
        },
        t => {
            return Err(UnityEnvError::InvalidSpec(format!(
                "unknown action space type {}",
                t
            )))
        }
    };

    let observation_slots = sample
        .observations
        .iter()
        .map(|obs| {
            let shape = to_dims(&obs.shape, "observation dimensions")?;
            Ok(ObservationSlot {
                kind: ObservationKind::from_shape(&shape),
                shape,
                compression: obs.compression_type(),
            })
        })
        .collect::<Result<Vec<_>, UnityEnvError>>()?;

    let spec = AgentGroupSpec::from_slots(observation_slots, action_type)?;
    debug!("Resolved group spec of {:?}: {:?}", brain.brain_name, spec);
    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test::{generate_agent_infos, GenerateOptions};

    fn sample() -> AgentInfo {
        generate_agent_infos(1, &[vec![3], vec![4]], &GenerateOptions::default())
            .pop()
            .unwrap()
    }

    #[test]
    fn test_resolve_discrete() -> Result<(), UnityEnvError> {
        let spec = resolve_group_spec(&BrainParameters::discrete(vec![5, 4]), &sample())?;

        assert!(spec.is_action_discrete());
        assert!(!spec.is_action_continuous());
        assert_eq!(spec.observation_shapes(), vec![vec![3], vec![4]]);
        assert_eq!(spec.discrete_action_branches(), Some(&[5usize, 4][..]));
        assert_eq!(spec.action_size(), 2);
        Ok(())
    }

    #[test]
    fn test_resolve_continuous() -> Result<(), UnityEnvError> {
        let spec = resolve_group_spec(&BrainParameters::continuous(6), &sample())?;

        assert!(!spec.is_action_discrete());
        assert!(spec.is_action_continuous());
        assert_eq!(spec.action_size(), 6);
        assert_eq!(spec.discrete_action_branches(), None);
        Ok(())
    }

    #[test]
    fn test_resolve_slot_kinds() -> Result<(), UnityEnvError> {
        let info = generate_agent_infos(1, &[vec![8, 6, 3], vec![2]], &GenerateOptions::default())
            .pop()
            .unwrap();
        let spec = resolve_group_spec(&BrainParameters::continuous(2), &info)?;
        let kinds: Vec<_> = spec.observation_slots().iter().map(|s| s.kind).collect();

        assert_eq!(kinds, vec![ObservationKind::Visual, ObservationKind::Vector]);
        Ok(())
    }

    #[test]
    fn test_resolve_invalid() {
        let cases = vec![
            BrainParameters {
                vector_action_size: vec![3],
                vector_action_space_type: 2,
                ..BrainParameters::default()
            },
            BrainParameters {
                vector_action_size: vec![3, 2],
                vector_action_space_type: 1,
                ..BrainParameters::default()
            },
            BrainParameters {
                vector_action_size: vec![],
                vector_action_space_type: 1,
                ..BrainParameters::default()
            },
            BrainParameters::discrete(vec![]),
            BrainParameters::discrete(vec![3, 0]),
            BrainParameters::continuous(-1),
        ];

        for brain in cases.iter() {
            match resolve_group_spec(brain, &sample()) {
                Err(UnityEnvError::InvalidSpec(_)) => {}
                r => panic!("{:?} resolved to {:?}", brain, r),
            }
        }
    }

    #[test]
    fn test_resolve_invalid_observation_shape() {
        let brain = BrainParameters::discrete(vec![3]);

        for shape in vec![vec![3, 0], vec![-1], vec![]] {
            let mut info = sample();
            info.observations[1].shape = shape;
            match resolve_group_spec(&brain, &info) {
                Err(UnityEnvError::InvalidSpec(_)) => {}
                r => panic!("{:?} resolved to {:?}", info.observations[1].shape, r),
            }
        }

        let cases = vec![
            (vec![vec![]], ActionType::Continuous(2)),
            (vec![vec![4, 0, 3]], ActionType::Continuous(2)),
            (vec![vec![4]], ActionType::Continuous(0)),
            (vec![vec![4]], ActionType::Discrete(vec![])),
            (vec![vec![4]], ActionType::Discrete(vec![2, 0])),
        ];
        for (shapes, action_type) in cases {
            match AgentGroupSpec::new(shapes, action_type) {
                Err(UnityEnvError::InvalidSpec(_)) => {}
                r => panic!("unexpected result {:?}", r),
            }
        }
    }

    #[test]
    fn test_observation_slot() {
        let slot = ObservationSlot::new(vec![8, 6, 3]);

        assert_eq!(slot.kind, ObservationKind::Visual);
        assert_eq!(slot.compression, CompressionType::None);
        assert_eq!(slot.len(), 144);
        assert!(!slot.is_empty());
        assert_eq!(ObservationSlot::new(vec![5]).kind, ObservationKind::Vector);
    }

    #[test]
    fn test_random_action_in_range() -> Result<(), UnityEnvError> {
        fastrand::seed(42);
        let spec = AgentGroupSpec::new(vec![vec![3]], ActionType::Discrete(vec![2, 5]))?;

        match spec.random_action(100) {
            GroupActions::Discrete(a) => {
                assert_eq!(a.shape(), &[100, 2]);
                assert!(a.column(0).iter().all(|&v| (0..2).contains(&v)));
                assert!(a.column(1).iter().all(|&v| (0..5).contains(&v)));
            }
            a => panic!("unexpected actions {:?}", a),
        }
        assert_eq!(spec.random_action(3).n_agents(), 3);
        assert_eq!(spec.action_type(), &ActionType::Discrete(vec![2, 5]));
        match spec.empty_action(0) {
            GroupActions::Discrete(a) => assert_eq!(a.shape(), &[0, 2]),
            a => panic!("unexpected actions {:?}", a),
        }

        let spec = AgentGroupSpec::new(vec![vec![3]], ActionType::Continuous(4))?;
        match spec.random_action(10) {
            GroupActions::Continuous(a) => {
                assert_eq!(a.shape(), &[10, 4]);
                assert!(a.iter().all(|&v| (-1.0..1.0).contains(&v)));
            }
            a => panic!("unexpected actions {:?}", a),
        }
        assert_eq!(spec.empty_action(7), GroupActions::Continuous(Array2::zeros((7, 4))));
        assert_eq!(spec.empty_action(7).n_agents(), 7);
        Ok(())
    }
}
