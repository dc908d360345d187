//! Messages exchanged with the Unity process.
//!
//! The exact wire encoding is owned by the transport. These types are the logical content
//! of the messages once they have been parsed.
use serde::{Deserialize, Serialize};

/// Compression of an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionType {
    /// Raw float array.
    None,

    /// PNG image.
    Png,
}

impl CompressionType {
    /// Returns the code used on the wire.
    pub fn code(&self) -> i32 {
        match self {
            Self::None => 0,
            Self::Png => 1,
        }
    }

    /// Converts a wire code, returns `None` for unknown codes.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Png),
            _ => None,
        }
    }
}

/// Payload of an observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObservationData {
    /// Flattened float array in row-major order.
    FloatData(Vec<f32>),

    /// Compressed image bytes.
    CompressedData(Vec<u8>),
}

/// An observation of a single agent for a single slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationProto {
    /// Declared shape. Visual observations are `[height, width, channels]`.
    pub shape: Vec<i32>,

    /// Payload.
    pub data: ObservationData,
}

impl ObservationProto {
    /// Creates an observation from a flattened float array.
    pub fn uncompressed(shape: Vec<i32>, data: Vec<f32>) -> Self {
        Self {
            shape,
            data: ObservationData::FloatData(data),
        }
    }

    /// Creates an observation from PNG bytes.
    pub fn png(shape: Vec<i32>, bytes: Vec<u8>) -> Self {
        Self {
            shape,
            data: ObservationData::CompressedData(bytes),
        }
    }

    /// Compression of the payload.
    pub fn compression_type(&self) -> CompressionType {
        match self.data {
            ObservationData::FloatData(_) => CompressionType::None,
            ObservationData::CompressedData(_) => CompressionType::Png,
        }
    }
}

/// Telemetry of an agent at a simulation step.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AgentInfo {
    /// Reward.
    pub reward: f64,

    /// `true` if the episode of the agent terminated.
    pub done: bool,

    /// `true` if the episode was interrupted by the step limit.
    pub max_step_reached: bool,

    /// Agent id, unique in a batch.
    pub id: i32,

    /// Flat action mask, concatenated over discrete branches.
    /// Empty for continuous action spaces.
    #[serde(default)]
    pub action_mask: Vec<bool>,

    /// Observations, one per slot of the agent group.
    pub observations: Vec<ObservationProto>,
}

/// Specification of the action space of an agent group.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BrainParameters {
    /// Name of the behavior.
    #[serde(default)]
    pub brain_name: String,

    /// Branch sizes for discrete actions, or a single vector length for continuous actions.
    pub vector_action_size: Vec<i32>,

    /// Human readable descriptions of the actions.
    #[serde(default)]
    pub vector_action_descriptions: Vec<String>,

    /// 0 for discrete and 1 for continuous.
    pub vector_action_space_type: i32,
}

impl BrainParameters {
    /// Parameters of a discrete action space with the given branch sizes.
    pub fn discrete(branches: Vec<i32>) -> Self {
        Self {
            vector_action_size: branches,
            vector_action_space_type: 0,
            ..Self::default()
        }
    }

    /// Parameters of a continuous action space with the given vector length.
    pub fn continuous(size: i32) -> Self {
        Self {
            vector_action_size: vec![size],
            vector_action_space_type: 1,
            ..Self::default()
        }
    }
}

/// Action sent back to an agent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AgentAction {
    /// Action vector. Discrete actions are stored as floats, one per branch.
    pub vector_actions: Vec<f32>,
}

/// An [`AgentInfo`] paired with the action taken by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInfoActionPair {
    /// Telemetry.
    pub agent_info: AgentInfo,

    /// Action.
    pub action_info: AgentAction,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_type_follows_payload() {
        let obs = ObservationProto::uncompressed(vec![2], vec![0.0, 1.0]);
        assert_eq!(obs.compression_type(), CompressionType::None);

        let obs = ObservationProto::png(vec![1, 1, 3], vec![0u8; 4]);
        assert_eq!(obs.compression_type(), CompressionType::Png);
    }

    #[test]
    fn test_compression_code() {
        for c in [CompressionType::None, CompressionType::Png].iter() {
            assert_eq!(CompressionType::from_code(c.code()), Some(*c));
        }
        assert_eq!(CompressionType::from_code(7), None);
    }

    #[test]
    fn test_agent_info_from_json() -> anyhow::Result<()> {
        let json = r#"{
            "reward": 1.5,
            "done": true,
            "max_step_reached": false,
            "id": 3,
            "observations": [
                { "shape": [2], "data": { "FloatData": [0.25, 0.75] } }
            ]
        }"#;
        let info: AgentInfo = serde_json::from_str(json)?;

        assert_eq!(info.id, 3);
        assert!(info.done);
        assert!(info.action_mask.is_empty());
        assert_eq!(
            info.observations[0],
            ObservationProto::uncompressed(vec![2], vec![0.25, 0.75])
        );
        Ok(())
    }
}
