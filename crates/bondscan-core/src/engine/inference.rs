use super::config::InferenceConfig;
use super::error::EngineError;
use crate::core::distributions::distribution::DistanceDistribution;
use crate::core::distributions::registry::DistributionRegistry;
use crate::core::fingerprint::Canonicalizer;
use crate::core::models::atom::Atom;
use crate::core::models::molecule::sort_by_score;
use crate::core::models::topology::{Bond, BondOrder, BondTopology};
use crate::core::utils::geometry::{self, AtomPair};
use crate::core::valence::ValenceRules;
use nalgebra::Point3;
use tracing::{debug, instrument, trace};

/// A candidate pair together with the orders the search may give it.
///
/// `choices` always starts with `Unbonded` and lists bonded orders in ascending order,
/// each with its contribution to the topology score.
#[derive(Debug)]
struct Edge {
    a: usize,
    b: usize,
    choices: Vec<(BondOrder, f64)>,
    max_order: u32,
}

/// Enumerates every valence-consistent bond-order assignment a geometry supports.
///
/// An inference pass borrows an immutable registry snapshot, so concurrent passes over
/// different molecules can share one registry.
pub struct TopologyInference<'a> {
    registry: &'a DistributionRegistry,
    valence: &'a ValenceRules,
    canonicalizer: &'a dyn Canonicalizer,
    config: &'a InferenceConfig,
}

impl<'a> TopologyInference<'a> {
    pub fn new(
        registry: &'a DistributionRegistry,
        valence: &'a ValenceRules,
        canonicalizer: &'a dyn Canonicalizer,
        config: &'a InferenceConfig,
    ) -> Self {
        Self {
            registry,
            valence,
            canonicalizer,
            config,
        }
    }

    pub fn registry(&self) -> &'a DistributionRegistry {
        self.registry
    }

    pub fn canonicalizer(&self) -> &'a dyn Canonicalizer {
        self.canonicalizer
    }

    /// Returns every valid topology for `atoms`, best score first.
    ///
    /// An empty result means the geometry supports no valence-consistent assignment and
    /// is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownValence`] for an atom type with no valence rule and
    /// [`EngineError::NonFiniteCoordinate`] for a position containing NaN or infinity.
    #[instrument(skip_all, name = "topology_inference", fields(num_atoms = atoms.len()))]
    pub fn infer(&self, atoms: &[Atom]) -> Result<Vec<BondTopology>, EngineError> {
        let valences = self.required_valences(atoms)?;

        let positions: Vec<Point3<f64>> = atoms.iter().map(|a| a.position).collect();
        let pairs = geometry::pairs_within(&positions, self.config.distance_cutoff);
        let (edges, fixed_score) = self.build_edges(atoms, &pairs);
        trace!(
            candidate_pairs = pairs.len(),
            searchable_edges = edges.len(),
            "Built edge list."
        );

        let mut remaining = vec![0u32; atoms.len()];
        for edge in &edges {
            remaining[edge.a] += edge.max_order;
            remaining[edge.b] += edge.max_order;
        }
        if let Some(index) = (0..atoms.len()).find(|&i| remaining[i] < valences[i]) {
            debug!(
                atom = index,
                "Atom cannot reach its valence with the admissible bonds; no topologies."
            );
            return Ok(Vec::new());
        }

        let mut search = Search {
            edges: &edges,
            valences: &valences,
            totals: vec![0; atoms.len()],
            remaining,
            chosen: Vec::with_capacity(edges.len()),
            found: Vec::new(),
        };
        search.descend(0);

        let mut topologies: Vec<BondTopology> = search
            .found
            .into_iter()
            .map(|chosen| self.to_topology(atoms, &edges, &chosen, fixed_score))
            .collect();
        sort_by_score(&mut topologies);

        debug!(count = topologies.len(), "Topology inference complete.");
        Ok(topologies)
    }

    fn required_valences(&self, atoms: &[Atom]) -> Result<Vec<u32>, EngineError> {
        atoms
            .iter()
            .enumerate()
            .map(|(index, atom)| {
                if !geometry::has_finite_coordinates(&atom.position) {
                    return Err(EngineError::NonFiniteCoordinate { index });
                }
                self.valence
                    .valence_of(atom)
                    .map(u32::from)
                    .ok_or(EngineError::UnknownValence {
                        index,
                        element: atom.element,
                        charge: atom.charge,
                    })
            })
            .collect()
    }

    /// Splits candidate pairs into searchable edges and pairs fixed at order zero.
    ///
    /// Returns the edges and the summed score contribution of the fixed pairs.
    fn build_edges(&self, atoms: &[Atom], pairs: &[AtomPair]) -> (Vec<Edge>, f64) {
        let mut edges = Vec::with_capacity(pairs.len());
        let mut fixed_score = 0.0;

        for pair in pairs {
            let (ea, eb) = (atoms[pair.a].element, atoms[pair.b].element);
            let bonded: Vec<(BondOrder, f64)> = BondOrder::BONDED
                .into_iter()
                .filter(|&order| order <= self.config.max_bond_order)
                .filter_map(|order| {
                    let distribution = self.registry.lookup(ea, eb, order);
                    distribution
                        .admits(pair.distance, self.config.acceptance_threshold)
                        .then(|| (order, score_term(distribution, pair.distance)))
                })
                .collect();

            let unbonded = if self.config.score_unbonded_pairs {
                score_term(
                    self.registry.lookup(ea, eb, BondOrder::Unbonded),
                    pair.distance,
                )
            } else {
                0.0
            };

            let Some(&(highest, _)) = bonded.last() else {
                fixed_score += unbonded;
                continue;
            };

            let mut choices = Vec::with_capacity(bonded.len() + 1);
            choices.push((BondOrder::Unbonded, unbonded));
            choices.extend(bonded);
            edges.push(Edge {
                a: pair.a,
                b: pair.b,
                choices,
                max_order: highest.value() as u32,
            });
        }

        (edges, fixed_score)
    }

    fn to_topology(
        &self,
        atoms: &[Atom],
        edges: &[Edge],
        chosen: &[usize],
        fixed_score: f64,
    ) -> BondTopology {
        let mut score = fixed_score;
        let mut bonds = Vec::new();
        for (edge, &slot) in edges.iter().zip(chosen) {
            let (order, term) = edge.choices[slot];
            score += term;
            if order.is_bonded() {
                bonds.push(Bond::new(edge.a, edge.b, order));
            }
        }
        let fingerprint = self.canonicalizer.canonicalize(atoms, &bonds);
        BondTopology::new(bonds, fingerprint, score)
    }
}

/// Score contribution of a pair at `distance` under `distribution`.
///
/// Interval distributions contribute nothing. Empirical likelihoods are floored at the
/// smallest positive float so an unbonded pair at zero likelihood stays finite.
fn score_term(distribution: &DistanceDistribution, distance: f64) -> f64 {
    if distribution.is_interval() {
        0.0
    } else {
        distribution
            .likelihood(distance)
            .max(f64::MIN_POSITIVE)
            .ln()
    }
}

/// Depth-first assignment of one choice per edge, in edge order.
struct Search<'e> {
    edges: &'e [Edge],
    valences: &'e [u32],
    totals: Vec<u32>,
    /// Sum of the highest admissible orders of each atom's undecided edges.
    remaining: Vec<u32>,
    chosen: Vec<usize>,
    found: Vec<Vec<usize>>,
}

impl Search<'_> {
    fn descend(&mut self, depth: usize) {
        let edges = self.edges;
        let Some(edge) = edges.get(depth) else {
            if self.totals == self.valences {
                self.found.push(self.chosen.clone());
            }
            return;
        };
        let (a, b) = (edge.a, edge.b);

        self.remaining[a] -= edge.max_order;
        self.remaining[b] -= edge.max_order;

        for (slot, &(order, _)) in edge.choices.iter().enumerate() {
            let value = order.value() as u32;
            if self.totals[a] + value > self.valences[a] || self.totals[b] + value > self.valences[b]
            {
                break;
            }
            self.totals[a] += value;
            self.totals[b] += value;

            if self.totals[a] + self.remaining[a] >= self.valences[a]
                && self.totals[b] + self.remaining[b] >= self.valences[b]
            {
                self.chosen.push(slot);
                self.descend(depth + 1);
                self.chosen.pop();
            }

            self.totals[a] -= value;
            self.totals[b] -= value;
        }

        self.remaining[a] += edge.max_order;
        self.remaining[b] += edge.max_order;
    }
}
