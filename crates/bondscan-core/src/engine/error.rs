use crate::core::models::atom::Element;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("No valence rule for atom {index} ({element}, charge {charge})")]
    UnknownValence {
        index: usize,
        element: Element,
        charge: i8,
    },

    #[error("Atom {index} has a non-finite coordinate")]
    NonFiniteCoordinate { index: usize },
}
