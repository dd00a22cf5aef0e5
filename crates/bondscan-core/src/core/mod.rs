//! # Core Module
//!
//! Stateless building blocks for bond-topology inference: molecule data models, the
//! bond-length distribution model, valence rules, fingerprinting and geometry helpers.
//!
//! ## Overview
//!
//! Nothing in this module holds state across calls. Types here describe atoms, bonds and
//! topologies, say how plausible a distance is for a given bond order, and say how many
//! bonds an atom of a given type must carry. The [`engine`](crate::engine) combines them
//! into a search; the [`store`](crate::store) persists and queries the results.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Atoms, bonds, bond topologies and stored molecules
//! - **Distance Model** ([`distributions`]) - Empirical and interval bond-length distributions and their registry
//! - **Valence Rules** ([`valence`]) - Required total bond order per element and charge
//! - **Fingerprinting** ([`fingerprint`]) - Canonical strings for bond graphs
//! - **File I/O** ([`io`]) - Multi-frame XYZ geometry reading and writing
//! - **Geometry** ([`utils`]) - Pairwise distance helpers

pub mod distributions;
pub mod fingerprint;
pub mod io;
pub mod models;
pub mod utils;
pub mod valence;
