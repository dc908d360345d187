//! Observation decoding and batching.
//!
//! [`decode_observation`] is the only place where raw payloads are interpreted.
//! [`process_visual_observation`] and [`process_vector_observation`] stack the observations
//! of a slot across agents into an array of shape `[n_agents, *slot_shape]`.
mod decoder;
mod vector;
mod visual;
pub use decoder::{decode_observation, process_pixels};
pub use vector::process_vector_observation;
pub use visual::process_visual_observation;
