use crate::core::models::atom::Atom;
use crate::core::models::topology::{Bond, BondOrder};
use itertools::Itertools;
use std::collections::BTreeMap;

/// Maps a bond graph to a stable string used as index key and equality test.
///
/// Implementations must be deterministic and must give the same string for any two
/// atom orderings of the same graph. A canonical-SMILES generator fits this seam;
/// [`GraphInvariantCanonicalizer`] is the built-in implementation.
pub trait Canonicalizer: Send + Sync {
    fn canonicalize(&self, atoms: &[Atom], bonds: &[Bond]) -> String;

    /// Whether `fingerprint` could have been produced by this canonicalizer.
    fn is_valid(&self, fingerprint: &str) -> bool {
        !fingerprint.trim().is_empty()
    }
}

/// Canonical fingerprints built by individualization and refinement.
///
/// Atoms start out classed by type label (`N+`, `O-`, ...), incident bond-order sum
/// and degree. Each round, an atom's class is refined by the sorted multiset of
/// `(bond order, neighbour class)` pairs until the number of classes stops growing.
/// While some class still holds several atoms, each atom of the first such class is
/// in turn given a class of its own and refinement resumes. Every branch ends in one
/// class per atom, i.e. a numbering of the atoms, and the smallest rendering over all
/// branches is the fingerprint. Atoms that are interchangeable by swapping them alone
/// (the hydrogens of a methyl group, say) are only branched on once.
///
/// The fingerprint lists every atom as `label@position` and every bond as
/// `position<order symbol>position`, both sorted:
///
/// ```text
/// C@0.C@1.O@2|0-1.1-2
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphInvariantCanonicalizer;

impl GraphInvariantCanonicalizer {
    pub fn new() -> Self {
        Self
    }
}

/// Adjacency view of one bond graph during canonicalization.
struct Graph<'a> {
    atoms: &'a [Atom],
    bonds: &'a [Bond],
    neighbours: Vec<Vec<(BondOrder, usize)>>,
}

impl<'a> Graph<'a> {
    fn new(atoms: &'a [Atom], bonds: &'a [Bond]) -> Self {
        let n = atoms.len();
        let mut neighbours: Vec<Vec<(BondOrder, usize)>> = vec![Vec::new(); n];
        for bond in bonds.iter().filter(|b| b.order.is_bonded()) {
            if bond.atom_a >= n || bond.atom_b >= n {
                continue;
            }
            neighbours[bond.atom_a].push((bond.order, bond.atom_b));
            neighbours[bond.atom_b].push((bond.order, bond.atom_a));
        }
        Self {
            atoms,
            bonds,
            neighbours,
        }
    }

    fn initial_classes(&self) -> Vec<usize> {
        let invariants: Vec<(String, u32, usize)> = self
            .atoms
            .iter()
            .zip(&self.neighbours)
            .map(|(atom, env)| {
                let total = env.iter().map(|(order, _)| order.value() as u32).sum();
                (atom.type_label(), total, env.len())
            })
            .collect();
        rank(&invariants)
    }

    fn refine(&self, mut classes: Vec<usize>) -> Vec<usize> {
        let n = classes.len();
        for _ in 0..n {
            let signatures: Vec<(usize, Vec<(BondOrder, usize)>)> = (0..n)
                .map(|i| {
                    let env = self.neighbours[i]
                        .iter()
                        .map(|&(order, j)| (order, classes[j]))
                        .sorted()
                        .collect();
                    (classes[i], env)
                })
                .collect();
            let refined = rank(&signatures);
            let before = classes.iter().unique().count();
            let after = refined.iter().unique().count();
            classes = refined;
            if after == before {
                break;
            }
        }
        classes
    }

    /// Refines `classes`, then branches on the first class with more than one atom.
    fn search(&self, classes: Vec<usize>, best: &mut Option<String>) {
        let classes = self.refine(classes);
        let n = classes.len();
        let mut sizes = vec![0usize; n];
        for &class in &classes {
            sizes[class] += 1;
        }

        let Some(target) = sizes.iter().position(|&size| size > 1) else {
            let rendered = self.render(&classes);
            if best.as_ref().is_none_or(|current| rendered < *current) {
                *best = Some(rendered);
            }
            return;
        };

        let mut tried: Vec<usize> = Vec::new();
        for v in (0..n).filter(|&i| classes[i] == target) {
            if tried.iter().any(|&u| self.interchangeable(u, v)) {
                continue;
            }
            tried.push(v);
            let split: Vec<(usize, bool)> = (0..n).map(|i| (classes[i], i != v)).collect();
            self.search(rank(&split), best);
        }
    }

    /// Whether swapping `u` and `v` while fixing every other atom maps the graph onto
    /// itself. Both atoms must already share a class.
    fn interchangeable(&self, u: usize, v: usize) -> bool {
        let outside = |atom: usize| -> Vec<(BondOrder, usize)> {
            self.neighbours[atom]
                .iter()
                .filter(|&&(_, j)| j != u && j != v)
                .copied()
                .sorted()
                .collect()
        };
        outside(u) == outside(v)
    }

    fn render(&self, classes: &[usize]) -> String {
        let atom_part = self
            .atoms
            .iter()
            .enumerate()
            .map(|(i, atom)| (classes[i], atom.type_label()))
            .sorted()
            .map(|(class, label)| format!("{}@{}", label, class))
            .join(".");

        let n = self.atoms.len();
        let bond_part = self
            .bonds
            .iter()
            .filter(|b| b.order.is_bonded() && b.atom_a < n && b.atom_b < n)
            .map(|b| {
                let (x, y) = (classes[b.atom_a], classes[b.atom_b]);
                (x.min(y), x.max(y), b.order)
            })
            .sorted()
            .map(|(x, y, order)| format!("{}{}{}", x, order.symbol(), y))
            .join(".");

        format!("{}|{}", atom_part, bond_part)
    }
}

impl Canonicalizer for GraphInvariantCanonicalizer {
    fn canonicalize(&self, atoms: &[Atom], bonds: &[Bond]) -> String {
        let graph = Graph::new(atoms, bonds);
        let mut best = None;
        graph.search(graph.initial_classes(), &mut best);
        best.unwrap_or_else(|| "|".to_string())
    }

    fn is_valid(&self, fingerprint: &str) -> bool {
        fingerprint.split_once('|').is_some_and(|(atoms, _)| !atoms.is_empty())
    }
}

/// Dense ranks of `values`: equal values share a rank, ranks follow sort order.
fn rank<T: Ord>(values: &[T]) -> Vec<usize> {
    let distinct: BTreeMap<&T, usize> = values
        .iter()
        .sorted()
        .dedup()
        .enumerate()
        .map(|(r, v)| (v, r))
        .collect();
    values.iter().map(|v| distinct[v]).collect()
}
