use super::error::StoreError;
use crate::core::models::atom::Atom;
use crate::core::models::ids::MoleculeId;
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::BondTopology;
use crate::engine::error::EngineError;
use crate::engine::inference::TopologyInference;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, btree_map};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, instrument};

/// Which of a molecule's stored topologies an indexed lookup matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WhichTopologies {
    /// Any stored topology.
    #[default]
    All,
    /// Only the topology the geometry was generated from.
    Starting,
    /// Only the highest-scored topology.
    Best,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown topology selection '{0}' (expected all, starting or best)")]
pub struct ParseWhichTopologiesError(pub String);

impl FromStr for WhichTopologies {
    type Err = ParseWhichTopologiesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "starting" => Ok(Self::Starting),
            "best" => Ok(Self::Best),
            _ => Err(ParseWhichTopologiesError(s.to_string())),
        }
    }
}

impl fmt::Display for WhichTopologies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::All => "all",
            Self::Starting => "starting",
            Self::Best => "best",
        };
        f.write_str(name)
    }
}

/// Molecules keyed by id, plus an index from topology fingerprint to molecule ids.
///
/// The index always reflects every stored topology of every stored molecule. Queries
/// take `&self` and never modify the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoleculeStore {
    molecules: BTreeMap<MoleculeId, Molecule>,
    index: HashMap<String, BTreeSet<MoleculeId>>,
}

impl MoleculeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.molecules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.molecules.is_empty()
    }

    pub fn get(&self, id: MoleculeId) -> Option<&Molecule> {
        self.molecules.get(&id)
    }

    /// Stored molecules in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Molecule> {
        self.molecules.values()
    }

    pub(super) fn molecules_by_id(&self) -> btree_map::Values<'_, MoleculeId, Molecule> {
        self.molecules.values()
    }

    /// Number of distinct fingerprints in the index.
    pub fn num_fingerprints(&self) -> usize {
        self.index.len()
    }

    /// Adds a molecule with precomputed topologies and indexes them.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateMolecule`] if the id is taken and
    /// [`StoreError::NoTopologies`] if the molecule carries no topology.
    pub fn insert(&mut self, molecule: Molecule) -> Result<(), StoreError> {
        if molecule.bond_topologies.is_empty() {
            return Err(StoreError::NoTopologies(molecule.id));
        }
        if self.molecules.contains_key(&molecule.id) {
            return Err(StoreError::DuplicateMolecule(molecule.id));
        }
        for topology in &molecule.bond_topologies {
            self.index
                .entry(topology.fingerprint.clone())
                .or_default()
                .insert(molecule.id);
        }
        self.molecules.insert(molecule.id, molecule);
        Ok(())
    }

    /// Indexed lookup: molecules whose selected stored topologies include any of
    /// `fingerprints`, in ascending id order.
    ///
    /// Unknown fingerprints simply match nothing.
    #[instrument(skip_all, name = "find_by_smiles", fields(num_targets = fingerprints.len(), %which))]
    pub fn find_by_smiles<S: AsRef<str>>(
        &self,
        fingerprints: &[S],
        which: WhichTopologies,
    ) -> Vec<&Molecule> {
        let targets: HashSet<&str> = fingerprints.iter().map(|f| f.as_ref()).collect();
        let candidates: BTreeSet<MoleculeId> = targets
            .iter()
            .filter_map(|fp| self.index.get(*fp))
            .flatten()
            .copied()
            .collect();

        let matches: Vec<&Molecule> = candidates
            .into_iter()
            .filter_map(|id| self.molecules.get(&id))
            .filter(|molecule| {
                let selected = match which {
                    WhichTopologies::All => return true,
                    WhichTopologies::Starting => molecule.starting_topology(),
                    WhichTopologies::Best => molecule.best_topology(),
                };
                selected.is_some_and(|t| targets.contains(t.fingerprint.as_str()))
            })
            .collect();

        debug!(num_matches = matches.len(), "Indexed lookup complete.");
        matches
    }

    /// Molecules with the given ids, in the order requested. Missing ids are skipped.
    pub fn find_by_molecule_ids(&self, ids: &[MoleculeId]) -> Vec<&Molecule> {
        ids.iter().filter_map(|id| self.molecules.get(id)).collect()
    }

    /// Molecules whose Hill formula equals `formula`, in ascending id order.
    pub fn find_by_stoichiometry(&self, formula: &str) -> Vec<&Molecule> {
        let formula = formula.trim();
        self.molecules
            .values()
            .filter(|m| m.stoichiometry() == formula)
            .collect()
    }
}

/// Runs inference and keeps the best-scored topology for each distinct fingerprint.
pub(crate) fn distinct_topologies(
    inference: &TopologyInference<'_>,
    atoms: &[Atom],
) -> Result<Vec<BondTopology>, EngineError> {
    let mut seen = HashSet::new();
    let topologies = inference
        .infer(atoms)?
        .into_iter()
        .filter(|t| seen.insert(t.fingerprint.clone()))
        .collect();
    Ok(topologies)
}
