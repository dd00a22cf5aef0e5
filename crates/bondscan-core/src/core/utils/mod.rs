//! Geometric helpers shared by the inference engine.

pub mod geometry;
