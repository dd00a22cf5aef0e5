use itertools::Itertools;
use nalgebra::Point3;

/// An unordered atom pair with `a < b` and the distance between them in angstroms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtomPair {
    pub a: usize,
    pub b: usize,
    pub distance: f64,
}

/// Every pair of positions whose separation is at most `cutoff`, in `(a, b)` order.
///
/// Each unordered pair appears once and self-pairs never appear. Pairs involving a
/// non-finite coordinate are never returned.
pub fn pairs_within(positions: &[Point3<f64>], cutoff: f64) -> Vec<AtomPair> {
    let cutoff_sq = cutoff * cutoff;
    (0..positions.len())
        .tuple_combinations()
        .filter_map(|(a, b)| {
            let distance_sq = nalgebra::distance_squared(&positions[a], &positions[b]);
            (distance_sq <= cutoff_sq).then(|| AtomPair {
                a,
                b,
                distance: distance_sq.sqrt(),
            })
        })
        .collect()
}

pub fn has_finite_coordinates(position: &Point3<f64>) -> bool {
    position.coords.iter().all(|c| c.is_finite())
}
