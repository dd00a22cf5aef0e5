use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Integer bond order between two atoms. `Unbonded` is order 0.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum BondOrder {
    #[default]
    Unbonded = 0,
    Single = 1,
    Double = 2,
    Triple = 3,
}

impl BondOrder {
    /// Bonded orders, lowest first.
    pub const BONDED: [BondOrder; 3] = [BondOrder::Single, BondOrder::Double, BondOrder::Triple];

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Unbonded),
            1 => Some(Self::Single),
            2 => Some(Self::Double),
            3 => Some(Self::Triple),
            _ => None,
        }
    }

    pub fn is_bonded(self) -> bool {
        self != BondOrder::Unbonded
    }

    /// The bond character used in range specifications and fingerprints.
    pub fn symbol(self) -> char {
        match self {
            BondOrder::Unbonded => '.',
            BondOrder::Single => '-',
            BondOrder::Double => '=',
            BondOrder::Triple => '#',
        }
    }
}

#[derive(Debug, Error)]
#[error("Invalid bond order string")]
pub struct ParseBondOrderError;

impl FromStr for BondOrder {
    type Err = ParseBondOrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "0" | "none" | "unbonded" => Ok(Self::Unbonded),
            "1" | "s" | "single" => Ok(Self::Single),
            "2" | "d" | "double" => Ok(Self::Double),
            "3" | "t" | "triple" => Ok(Self::Triple),
            _ => Err(ParseBondOrderError),
        }
    }
}

impl fmt::Display for BondOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Unbonded => "Unbonded",
                Self::Single => "Single",
                Self::Double => "Double",
                Self::Triple => "Triple",
            }
        )
    }
}

/// A bond between two atoms of one molecule, addressed by their index in the atom list.
///
/// Bonds are unordered pairs; [`Bond::new`] normalizes so that `atom_a < atom_b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Bond {
    pub atom_a: usize,
    pub atom_b: usize,
    pub order: BondOrder,
}

impl Bond {
    pub fn new(atom_a: usize, atom_b: usize, order: BondOrder) -> Self {
        let (atom_a, atom_b) = if atom_a <= atom_b {
            (atom_a, atom_b)
        } else {
            (atom_b, atom_a)
        };
        Self {
            atom_a,
            atom_b,
            order,
        }
    }

    pub fn contains(&self, atom: usize) -> bool {
        self.atom_a == atom || self.atom_b == atom
    }

    /// Returns the partner of `atom` in this bond, if `atom` takes part in it.
    pub fn other(&self, atom: usize) -> Option<usize> {
        if self.atom_a == atom {
            Some(self.atom_b)
        } else if self.atom_b == atom {
            Some(self.atom_a)
        } else {
            None
        }
    }
}

/// A complete bond-order assignment for a molecule.
///
/// Only bonded pairs are stored; every pair not listed has order zero. Bonds are kept
/// sorted by atom pair so two topologies with the same assignment compare equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondTopology {
    bonds: Vec<Bond>,
    /// Canonical string of the bond graph, used as the index key.
    pub fingerprint: String,
    /// Aggregate log-likelihood of the assignment against the geometry.
    pub score: f64,
    /// Set on the topology the geometry was originally generated from.
    #[serde(default)]
    pub is_starting_topology: bool,
}

impl BondTopology {
    pub fn new(bonds: Vec<Bond>, fingerprint: String, score: f64) -> Self {
        Self {
            bonds: normalize_bonds(bonds),
            fingerprint,
            score,
            is_starting_topology: false,
        }
    }

    /// A starting topology that inference did not reproduce. It carries no likelihood,
    /// so its score is negative infinity and it ranks after every inferred topology.
    pub fn unscored_starting(bonds: Vec<Bond>, fingerprint: String) -> Self {
        Self {
            is_starting_topology: true,
            ..Self::new(bonds, fingerprint, f64::NEG_INFINITY)
        }
    }

    /// Whether the score came from inference.
    pub fn is_scored(&self) -> bool {
        self.score.is_finite()
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    /// Returns the order between two atoms, `Unbonded` when they share no bond.
    pub fn order_between(&self, a: usize, b: usize) -> BondOrder {
        let key = Bond::new(a, b, BondOrder::Unbonded);
        self.bonds
            .binary_search_by(|bond| (bond.atom_a, bond.atom_b).cmp(&(key.atom_a, key.atom_b)))
            .map(|i| self.bonds[i].order)
            .unwrap_or(BondOrder::Unbonded)
    }

    /// Sum of incident bond orders for each of `num_atoms` atoms.
    pub fn valence_totals(&self, num_atoms: usize) -> Vec<u8> {
        bond_order_totals(&self.bonds, num_atoms)
    }

    pub fn same_bonds(&self, other: &BondTopology) -> bool {
        self.bonds == other.bonds
    }
}

/// Sorts bonds by atom pair and drops unbonded entries.
pub fn normalize_bonds(bonds: Vec<Bond>) -> Vec<Bond> {
    let mut bonds: Vec<Bond> = bonds
        .into_iter()
        .map(|b| Bond::new(b.atom_a, b.atom_b, b.order))
        .filter(|b| b.order.is_bonded())
        .collect();
    bonds.sort();
    bonds
}

pub fn bond_order_totals(bonds: &[Bond], num_atoms: usize) -> Vec<u8> {
    let mut totals = vec![0u8; num_atoms];
    for bond in bonds {
        if bond.atom_a < num_atoms && bond.atom_b < num_atoms {
            totals[bond.atom_a] += bond.order.value();
            totals[bond.atom_b] += bond.order.value();
        }
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bond_order_from_str_parses_valid_strings() {
        assert_eq!("0".parse::<BondOrder>().unwrap(), BondOrder::Unbonded);
        assert_eq!("1".parse::<BondOrder>().unwrap(), BondOrder::Single);
        assert_eq!("single".parse::<BondOrder>().unwrap(), BondOrder::Single);
        assert_eq!("D".parse::<BondOrder>().unwrap(), BondOrder::Double);
        assert_eq!("3".parse::<BondOrder>().unwrap(), BondOrder::Triple);
        assert_eq!("triple".parse::<BondOrder>().unwrap(), BondOrder::Triple);
    }

    #[test]
    fn bond_order_from_str_rejects_invalid_strings() {
        assert!("".parse::<BondOrder>().is_err());
        assert!("4".parse::<BondOrder>().is_err());
        assert!("aromatic".parse::<BondOrder>().is_err());
    }

    #[test]
    fn bond_order_values_match_integer_orders() {
        assert_eq!(BondOrder::Unbonded.value(), 0);
        assert_eq!(BondOrder::Triple.value(), 3);
        assert_eq!(BondOrder::from_value(2), Some(BondOrder::Double));
        assert_eq!(BondOrder::from_value(4), None);
        assert_eq!(BondOrder::default(), BondOrder::Unbonded);
    }

    #[test]
    fn bond_new_normalizes_atom_order() {
        let bond = Bond::new(5, 2, BondOrder::Double);
        assert_eq!(bond.atom_a, 2);
        assert_eq!(bond.atom_b, 5);
        assert!(bond.contains(5));
        assert!(!bond.contains(3));
        assert_eq!(bond.other(2), Some(5));
        assert_eq!(bond.other(7), None);
    }

    #[test]
    fn topology_sorts_bonds_and_drops_unbonded() {
        let topology = BondTopology::new(
            vec![
                Bond::new(2, 1, BondOrder::Single),
                Bond::new(0, 3, BondOrder::Unbonded),
                Bond::new(0, 1, BondOrder::Double),
            ],
            "x".to_string(),
            0.0,
        );
        assert_eq!(
            topology.bonds(),
            &[
                Bond::new(0, 1, BondOrder::Double),
                Bond::new(1, 2, BondOrder::Single)
            ]
        );
        assert_eq!(topology.order_between(1, 0), BondOrder::Double);
        assert_eq!(topology.order_between(0, 3), BondOrder::Unbonded);
        assert_eq!(topology.valence_totals(4), vec![2, 3, 1, 0]);
    }
}
