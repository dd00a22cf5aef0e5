//! # Engine Module
//!
//! The topology inference search and the types that configure and observe it.
//!
//! ## Overview
//!
//! Given atoms with positions, a [`DistributionRegistry`](crate::core::distributions::registry::DistributionRegistry)
//! snapshot and [`ValenceRules`](crate::core::valence::ValenceRules),
//! [`inference::TopologyInference`] lists every bond-order assignment in which each atom
//! carries exactly its required valence and every bond length is plausible for its order.
//! Results are ranked by summed log-likelihood, and the whole ranked set is returned.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Distance cutoff, acceptance threshold and bond-order limits
//! - **Inference** ([`inference`]) - Candidate-edge construction and depth-first search with valence pruning
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events for long store operations
//! - **Error Handling** ([`error`]) - Engine-specific error types
//!
//! ## Usage
//!
//! ```ignore
//! use bondscan::core::fingerprint::GraphInvariantCanonicalizer;
//! use bondscan::core::valence::ValenceRules;
//! use bondscan::engine::config::InferenceConfig;
//! use bondscan::engine::inference::TopologyInference;
//!
//! let inference = TopologyInference::new(
//!     &registry,
//!     &ValenceRules::default(),
//!     &GraphInvariantCanonicalizer::new(),
//!     &InferenceConfig::default(),
//! );
//! for topology in inference.infer(&atoms)? {
//!     println!("{} {:.3}", topology.fingerprint, topology.score);
//! }
//! ```

pub mod config;
pub mod error;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod inference;
pub mod progress;
