use super::atom::{Atom, Element};
use super::ids::MoleculeId;
use super::topology::BondTopology;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A stored molecule: a geometry plus the bond topologies the geometry supports.
///
/// `bond_topologies` is kept ordered by descending score, so the first entry is
/// the best-scoring topology. A starting topology that inference did not reproduce is
/// stored unscored and therefore always last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Molecule {
    pub id: MoleculeId,
    pub atoms: Vec<Atom>,
    pub bond_topologies: Vec<BondTopology>,
}

impl Molecule {
    pub fn new(id: MoleculeId, atoms: Vec<Atom>, bond_topologies: Vec<BondTopology>) -> Self {
        let mut molecule = Self {
            id,
            atoms,
            bond_topologies,
        };
        sort_by_score(&mut molecule.bond_topologies);
        molecule
    }

    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    /// The highest-scored topology, if the molecule has any.
    pub fn best_topology(&self) -> Option<&BondTopology> {
        self.bond_topologies.first()
    }

    /// The topology the geometry was generated from, if one was given at ingestion.
    pub fn starting_topology(&self) -> Option<&BondTopology> {
        self.bond_topologies.iter().find(|bt| bt.is_starting_topology)
    }

    /// Returns a copy of this molecule carrying `bond_topologies` instead of its own.
    pub fn with_topologies(&self, bond_topologies: Vec<BondTopology>) -> Self {
        Self::new(self.id, self.atoms.clone(), bond_topologies)
    }

    pub fn has_fingerprint(&self, fingerprint: &str) -> bool {
        self.bond_topologies
            .iter()
            .any(|bt| bt.fingerprint == fingerprint)
    }

    /// Hill-order molecular formula: C first, then H, then the rest alphabetically.
    /// Without carbon every element is alphabetical.
    pub fn stoichiometry(&self) -> String {
        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        for atom in &self.atoms {
            *counts.entry(atom.element.symbol()).or_default() += 1;
        }

        let mut formula = String::new();
        let mut push = |symbol: &str, count: usize| {
            formula.push_str(symbol);
            if count > 1 {
                formula.push_str(&count.to_string());
            }
        };

        if let Some(c) = counts.remove(Element::C.symbol()) {
            push(Element::C.symbol(), c);
            if let Some(h) = counts.remove(Element::H.symbol()) {
                push(Element::H.symbol(), h);
            }
        }
        for (symbol, count) in counts {
            push(symbol, count);
        }
        formula
    }
}

/// Orders topologies by descending score. Ties keep a deterministic order by fingerprint
/// and then by bond list.
pub fn sort_by_score(topologies: &mut [BondTopology]) {
    topologies.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.fingerprint.cmp(&b.fingerprint))
            .then_with(|| a.bonds().cmp(b.bonds()))
    });
}
