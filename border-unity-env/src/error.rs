//! Errors in the library.
use thiserror::Error;

/// Errors raised while resolving a group specification or decoding a batch.
///
/// Every variant is fatal for the batch being decoded; retrying is left to the caller.
#[derive(Error, Debug)]
pub enum UnityEnvError {
    /// The group specification message is malformed or ambiguous.
    #[error("Invalid group spec: {0}")]
    InvalidSpec(String),

    /// The declared and the actual shape of an observation disagree.
    #[error("Shape mismatch for agent {agent_id} in slot {slot}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Id of the agent.
        agent_id: i32,
        /// Index of the observation slot.
        slot: usize,
        /// Shape declared for the slot.
        expected: Vec<usize>,
        /// Shape found in the record.
        actual: Vec<usize>,
    },

    /// A record violates the structure required by the group specification.
    #[error("Malformed record of agent {agent_id}: {reason}")]
    MalformedRecord {
        /// Id of the agent.
        agent_id: i32,
        /// What is wrong with the record.
        reason: String,
    },

    /// NaN or infinity found in rewards (`slot` is `None`) or observations.
    #[error("Non-finite value {value} for agent {agent_id} in {}", describe_slot(.slot))]
    NumericSafety {
        /// Id of the agent.
        agent_id: i32,
        /// Index of the observation slot, `None` for rewards.
        slot: Option<usize>,
        /// The offending value.
        value: f64,
    },
}

fn describe_slot(slot: &Option<usize>) -> String {
    match slot {
        Some(ix) => format!("observation slot {}", ix),
        None => "rewards".to_string(),
    }
}

/// Errors of decoding a single observation.
///
/// They do not know which agent or slot the observation belongs to;
/// [`UnityEnvError`] adds that context.
#[derive(Error, Debug)]
pub enum ObservationError {
    /// The decoded shape differs from the expected one.
    #[error("Expected shape {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Expected shape.
        expected: Vec<usize>,
        /// Actual shape.
        actual: Vec<usize>,
    },

    /// The compressed bytes could not be decoded as an image.
    #[error("Failed to decode image: {0}")]
    Image(#[from] image::ImageError),
}

impl ObservationError {
    /// Attaches the agent id and slot index.
    pub fn into_env_error(self, agent_id: i32, slot: usize) -> UnityEnvError {
        match self {
            Self::ShapeMismatch { expected, actual } => UnityEnvError::ShapeMismatch {
                agent_id,
                slot,
                expected,
                actual,
            },
            Self::Image(e) => UnityEnvError::MalformedRecord {
                agent_id,
                reason: format!("observation in slot {} is not a valid image: {}", slot, e),
            },
        }
    }
}
