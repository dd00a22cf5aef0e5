//! # Distributions Module
//!
//! Bond-length plausibility model used by topology inference.
//!
//! ## Overview
//!
//! Every (element pair, bond order) key maps to a [`distribution::DistanceDistribution`].
//! Empirical distributions are histograms of observed bond lengths and answer with a
//! likelihood; interval distributions come from hand-written range specifications
//! (`N~N:1.0-2.0`) and answer accept or reject. The
//! [`registry::DistributionRegistry`] resolves lookups with overrides taking
//! precedence over empirical data.
//!
//! ## Key Components
//!
//! - [`distribution`] - Empirical and interval distributions
//! - [`registry`] - Keyed collection with precedence-ordered lookup
//! - [`spec`] - Range specification grammar
//! - [`tabular`] - Bond-length rows and CSV reading
//!
//! ## Usage
//!
//! ```ignore
//! use bondscan::core::distributions::registry::{
//!     DistributionRegistry, STANDARD_SIG_DIGITS, STANDARD_UNBONDED_RIGHT_TAIL_MASS,
//! };
//!
//! let mut lengths = DistributionRegistry::new();
//! lengths.add_from_csv_file(
//!     "bond_lengths.csv".as_ref(),
//!     STANDARD_UNBONDED_RIGHT_TAIL_MASS,
//!     STANDARD_SIG_DIGITS,
//! )?;
//! let relaxed = lengths.with_range_spec("N~N:1.0-2.0")?;
//! ```

pub mod distribution;
pub mod registry;
pub mod spec;
pub mod tabular;
