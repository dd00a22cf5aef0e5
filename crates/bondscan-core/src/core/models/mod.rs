//! # Core Models Module
//!
//! Data structures describing molecules as they flow through bondscan: atoms with
//! element, charge and position; bonds and complete bond topologies; and stored
//! molecules carrying their precomputed topologies.
//!
//! ## Key Components
//!
//! - [`atom`] - Elements, atom types (element + formal charge) and atoms
//! - [`topology`] - Bond orders, bonds and complete bond-order assignments
//! - [`molecule`] - Stored molecules with their ranked topology sets
//! - [`ids`] - Stable molecule identifiers
//!
//! ## Usage
//!
//! ```ignore
//! use bondscan::core::models::atom::{Atom, Element};
//! use nalgebra::Point3;
//!
//! let n = Atom::new(Element::N, Point3::new(0.0, 0.0, 0.0)).with_charge(1);
//! assert_eq!(n.type_label(), "N+");
//! ```

pub mod atom;
pub mod ids;
pub mod molecule;
pub mod topology;
