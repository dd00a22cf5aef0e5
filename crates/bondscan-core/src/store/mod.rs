//! # Store Module
//!
//! Persistent, indexed molecule collection with indexed and scanning topology queries.
//!
//! ## Overview
//!
//! Molecules enter the store through [`ingest`](database::MoleculeStore::ingest), which runs
//! topology inference with the ingestion-time distributions and keeps one topology per
//! distinct fingerprint. Molecules with no valid topology are left out. Every stored
//! topology is indexed by fingerprint.
//!
//! Two query styles exist:
//!
//! - **Indexed** ([`find_by_smiles`](database::MoleculeStore::find_by_smiles)) - answers
//!   from the fingerprint index; cost depends on the number of matches, not store size.
//! - **Scanning** ([`find_by_topology`](database::MoleculeStore::find_by_topology)) -
//!   re-runs inference on every molecule under caller-supplied distributions and yields
//!   copies carrying the new topologies. Use it after overriding distributions.
//!
//! ## Key Components
//!
//! - [`database`] - `MoleculeStore`, its index and the direct lookups
//! - [`ingest`] - Single and batch ingestion
//! - [`query`] - The lazy and parallel scanning queries
//! - [`persist`] - CBOR snapshots
//! - [`error`] - Store error type
//!
//! ## Usage
//!
//! ```ignore
//! let relaxed = lengths.with_range_spec("N~N:1.0-2.0")?;
//! let inference = TopologyInference::new(&relaxed, &valence, &canonicalizer, &config);
//! for molecule in store.find_by_topology(&fingerprint, &inference) {
//!     let molecule = molecule?;
//!     println!("{} {}", molecule.id, molecule.bond_topologies.len());
//! }
//! ```

pub mod database;
pub mod error;
pub mod ingest;
pub mod persist;
pub mod query;
