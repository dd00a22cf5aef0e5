//! Provides input/output for molecular geometry files.
//!
//! Geometries enter the system as multi-frame XYZ files whose comment lines may carry a
//! molecule id and the bond graph the geometry was generated from.

pub mod xyz;
