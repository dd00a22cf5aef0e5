use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable numeric identifier of a molecule in the store.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MoleculeId(pub u64);

impl fmt::Display for MoleculeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for MoleculeId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
