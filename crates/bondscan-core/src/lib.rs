//! # bondscan
//!
//! Bond-topology inference from 3D molecular geometry, and a molecule store that can be
//! queried by topology.
//!
//! ## Architectural Philosophy
//!
//! The library has three layers:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Atom`, `BondTopology`,
//!   `Molecule`), the bond-length distribution model and its registry, valence rules,
//!   fingerprinting and geometry file I/O.
//!
//! - **[`engine`]: The Logic Core.** Topology inference: a depth-first search over
//!   bond-order assignments with valence pruning, configured by `InferenceConfig` and
//!   run against an immutable registry snapshot.
//!
//! - **[`store`]: The Public API.** An indexed molecule store with ingestion, indexed
//!   lookups by fingerprint, scanning lookups under overridden distributions, and
//!   snapshot persistence.

pub mod core;
pub mod engine;
pub mod store;
