use crate::core::models::ids::MoleculeId;
use crate::engine::error::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to encode store snapshot '{path}': {source}")]
    Encode {
        path: String,
        source: ciborium::ser::Error<std::io::Error>,
    },

    #[error("Failed to decode store snapshot '{path}': {source}")]
    Decode {
        path: String,
        source: ciborium::de::Error<std::io::Error>,
    },

    #[error("Unsupported store snapshot version {found} in '{path}' (expected {expected})")]
    UnsupportedVersion {
        path: String,
        found: u32,
        expected: u32,
    },

    #[error("Molecule {0} is already in the store")]
    DuplicateMolecule(MoleculeId),

    #[error("Molecule {0} has no bond topologies")]
    NoTopologies(MoleculeId),

    #[error("Starting topology of molecule {id} references atom {index}, but the molecule has {num_atoms} atoms")]
    InvalidStartingBond {
        id: MoleculeId,
        index: usize,
        num_atoms: usize,
    },

    #[error("Topology inference failed for molecule {id}: {source}")]
    Engine { id: MoleculeId, source: EngineError },
}
