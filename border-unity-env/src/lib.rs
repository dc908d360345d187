#![warn(missing_docs)]
//! Decoding of [Unity ML-Agents](https://github.com/Unity-Technologies/ml-agents) telemetry
//! for [`Border`](https://crates.io/crates/border).
//!
//! A Unity simulation emits one [`AgentInfo`] record per agent at every step. Each record
//! carries a reward, termination flags, a flat action mask and a list of observations,
//! which are either raw float arrays or PNG-compressed images. This crate turns an ordered
//! list of such records into a [`BatchedStepResult`], a set of dense [`ndarray`] arrays with
//! the number of agents as their leading axis, ready to be consumed by a learning loop.
//!
//! The transport delivering the records is out of the scope of this crate. Records are
//! expected to be fully materialized in memory.
//!
//! ## Group specification
//!
//! The action space and observation shapes of an agent group are resolved once per session
//! from [`BrainParameters`] and a sample record with [`resolve_group_spec`]. The returned
//! [`AgentGroupSpec`] is immutable and reused for every subsequent batch.
//!
//! ## Decoding a batch
//!
//! [`decode_batch`] drives the whole pipeline:
//!
//! 1. agent ids, rewards and termination flags are extracted in record order,
//! 2. rewards are scanned for NaN and infinity,
//! 3. each observation slot is assembled into an array of shape `[n_agents, *slot_shape]`
//!    and scanned for NaN and infinity,
//! 4. for discrete action spaces, action masks are sliced into one boolean matrix per branch.
//!
//! Any failure aborts the whole batch with a [`UnityEnvError`]; no partial result is returned.
//!
//! ```
//! use border_unity_env::{
//!     decode_batch, resolve_group_spec, AgentInfo, BrainParameters, ObservationProto,
//! };
//!
//! # fn main() -> Result<(), border_unity_env::UnityEnvError> {
//! let records: Vec<AgentInfo> = (0..4)
//!     .map(|i| AgentInfo {
//!         reward: i as f64,
//!         id: i,
//!         action_mask: vec![true, false, true, true, false],
//!         observations: vec![ObservationProto::uncompressed(vec![3], vec![0.5; 3])],
//!         ..AgentInfo::default()
//!     })
//!     .collect();
//!
//! let brain = BrainParameters::discrete(vec![2, 3]);
//! let spec = resolve_group_spec(&brain, &records[0])?;
//! let batch = decode_batch(&records, &spec)?;
//!
//! assert_eq!(batch.obs[0].shape(), &[4, 3]);
//! assert_eq!(batch.action_mask.as_ref().map(|m| m.len()), Some(2));
//! # Ok(())
//! # }
//! ```
//!
//! [`ndarray`]: https://docs.rs/ndarray/0.15.1/ndarray/
mod batch;
mod config;
mod decoder;
pub mod error;
mod mask;
pub mod obs;
mod proto;
mod spec;
pub mod util;
pub use batch::{AgentStepResult, BatchedStepResult};
pub use config::BatchDecoderConfig;
pub use decoder::{decode_batch, BatchDecoder};
pub use error::{ObservationError, UnityEnvError};
pub use mask::{build_action_masks, split_indices};
pub use proto::{
    AgentAction, AgentInfo, AgentInfoActionPair, BrainParameters, CompressionType,
    ObservationData, ObservationProto,
};
pub use spec::{
    resolve_group_spec, ActionType, AgentGroupSpec, GroupActions, ObservationKind,
    ObservationSlot,
};
