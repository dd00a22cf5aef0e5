//! Reference molecules and bond-length data shared by engine and store tests.

use crate::core::distributions::registry::{
    DistributionRegistry, STANDARD_SIG_DIGITS, STANDARD_UNBONDED_RIGHT_TAIL_MASS,
};
use crate::core::distributions::tabular::TabularRow;
use crate::core::fingerprint::GraphInvariantCanonicalizer;
use crate::core::models::atom::{Atom, Element};
use crate::core::models::ids::MoleculeId;
use crate::core::models::topology::{Bond, BondOrder};
use crate::core::valence::ValenceRules;
use crate::engine::config::InferenceConfig;
use crate::engine::inference::TopologyInference;
use crate::store::database::MoleculeStore;
use crate::store::ingest::IngestRecord;
use nalgebra::Point3;

fn row(a: &str, b: &str, order: &str, length: &str, count: &str) -> TabularRow {
    TabularRow {
        line: 0,
        atom_a: a.to_string(),
        atom_b: b.to_string(),
        bond_order: order.to_string(),
        length: length.to_string(),
        count: count.to_string(),
    }
}

/// Bond-length data covering the fixture molecules below.
pub fn reference_registry() -> DistributionRegistry {
    let rows = vec![
        row("N", "N", "1", "1.40", "5"),
        row("N", "N", "1", "1.45", "5"),
        row("N", "N", "2", "1.20", "5"),
        row("N", "N", "2", "1.25", "5"),
        row("N", "N", "0", "2.40", "3"),
        row("N", "N", "0", "2.60", "3"),
        row("N", "O", "1", "1.24", "4"),
        row("N", "O", "1", "1.32", "4"),
        row("N", "F", "1", "1.33", "2"),
        row("N", "F", "1", "1.38", "2"),
        row("H", "N", "1", "1.00", "6"),
        row("H", "N", "1", "1.04", "6"),
        row("H", "O", "1", "0.95", "5"),
        row("H", "O", "1", "0.98", "5"),
        row("C", "C", "1", "1.40", "5"),
        row("C", "C", "1", "1.55", "5"),
        row("C", "C", "2", "1.30", "1"),
        row("C", "C", "2", "1.50", "3"),
        row("C", "F", "1", "1.30", "2"),
        row("C", "F", "1", "1.40", "2"),
        row("C", "Cl", "1", "1.70", "2"),
        row("C", "Cl", "1", "1.80", "2"),
        row("C", "H", "1", "1.05", "4"),
        row("C", "H", "1", "1.10", "4"),
    ];
    let mut registry = DistributionRegistry::new();
    registry
        .add_from_tabular_data(rows, STANDARD_UNBONDED_RIGHT_TAIL_MASS, STANDARD_SIG_DIGITS)
        .unwrap();
    registry
}

fn step(from: &Point3<f64>, length: f64, degrees: f64) -> Point3<f64> {
    let angle = degrees.to_radians();
    Point3::new(
        from.x + length * angle.cos(),
        from.y + length * angle.sin(),
        from.z,
    )
}

/// Planar zigzag geometry of `[O-]N=N[NH+]=[N+]([O-])F`.
///
/// Atom order: O-, N, N, N+, N+, O-, F, H (on atom 3). `n3_n4` is the length of the
/// N+=N+ bond; 1.23 lies inside the reference N=N data, 1.50 lies outside all N-N data.
pub fn charged_azo_chain(n3_n4: f64) -> Vec<Atom> {
    let mut p = vec![Point3::origin(); 8];
    p[1] = step(&p[0], 1.30, 30.0);
    p[2] = step(&p[1], 1.22, -30.0);
    p[3] = step(&p[2], 1.42, 30.0);
    p[4] = step(&p[3], n3_n4, -30.0);
    p[7] = step(&p[3], 1.02, 90.0);
    p[5] = step(&p[4], 1.25, 30.0);
    p[6] = step(&p[4], 1.35, -90.0);

    vec![
        Atom::new(Element::O, p[0]).with_charge(-1),
        Atom::new(Element::N, p[1]),
        Atom::new(Element::N, p[2]),
        Atom::new(Element::N, p[3]).with_charge(1),
        Atom::new(Element::N, p[4]).with_charge(1),
        Atom::new(Element::O, p[5]).with_charge(-1),
        Atom::new(Element::F, p[6]),
        Atom::new(Element::H, p[7]),
    ]
}

/// The bond graph `charged_azo_chain` was built from.
pub fn charged_azo_chain_bonds() -> Vec<Bond> {
    vec![
        Bond::new(0, 1, BondOrder::Single),
        Bond::new(1, 2, BondOrder::Double),
        Bond::new(2, 3, BondOrder::Single),
        Bond::new(3, 4, BondOrder::Double),
        Bond::new(3, 7, BondOrder::Single),
        Bond::new(4, 5, BondOrder::Single),
        Bond::new(4, 6, BondOrder::Single),
    ]
}

/// 1-fluoro-2-chlorocyclobutadiene on a 1.42 x 1.48 rectangle.
///
/// Atom order: C0 (F), C1 (Cl), C2 (H), C3 (H), F, Cl, H, H. C0-C1 and C2-C3 are the
/// short edges.
pub fn halo_cyclobutadiene() -> Vec<Atom> {
    let c = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.42, 0.0, 0.0),
        Point3::new(1.42, 1.48, 0.0),
        Point3::new(0.0, 1.48, 0.0),
    ];
    vec![
        Atom::new(Element::C, c[0]),
        Atom::new(Element::C, c[1]),
        Atom::new(Element::C, c[2]),
        Atom::new(Element::C, c[3]),
        Atom::new(Element::F, step(&c[0], 1.35, 225.0)),
        Atom::new(Element::Cl, step(&c[1], 1.75, -45.0)),
        Atom::new(Element::H, step(&c[2], 1.08, 45.0)),
        Atom::new(Element::H, step(&c[3], 1.08, 135.0)),
    ]
}

/// Kekulé structure of `halo_cyclobutadiene` with double bonds on the long edges,
/// in normalized bond order.
pub fn halo_cyclobutadiene_long_doubles() -> Vec<Bond> {
    vec![
        Bond::new(0, 1, BondOrder::Single),
        Bond::new(0, 3, BondOrder::Double),
        Bond::new(0, 4, BondOrder::Single),
        Bond::new(1, 2, BondOrder::Double),
        Bond::new(1, 5, BondOrder::Single),
        Bond::new(2, 3, BondOrder::Single),
        Bond::new(2, 6, BondOrder::Single),
        Bond::new(3, 7, BondOrder::Single),
    ]
}

/// Cyclobutadiene on the same rectangle as `halo_cyclobutadiene`. Its two Kekulé
/// structures are the same graph.
pub fn cyclobutadiene() -> Vec<Atom> {
    let mut atoms = halo_cyclobutadiene();
    atoms[4] = Atom::new(Element::H, step(&atoms[0].position, 1.08, 225.0));
    atoms[5] = Atom::new(Element::H, step(&atoms[1].position, 1.08, -45.0));
    atoms
}

/// Linear H-C-N with the given C-H and C-N lengths, atoms in the order H, C, N.
pub fn hydrogen_cyanide(c_h: f64, c_n: f64) -> Vec<Atom> {
    vec![
        Atom::new(Element::H, Point3::new(-c_h, 0.0, 0.0)),
        Atom::new(Element::C, Point3::origin()),
        Atom::new(Element::N, Point3::new(c_n, 0.0, 0.0)),
    ]
}

pub fn water() -> Vec<Atom> {
    let o = Point3::origin();
    vec![
        Atom::new(Element::O, o),
        Atom::new(Element::H, step(&o, 0.96, 0.0)),
        Atom::new(Element::H, step(&o, 0.96, 104.5)),
    ]
}

/// Three atoms with every pair more than 2 angstroms apart.
pub fn scattered_atoms() -> Vec<Atom> {
    vec![
        Atom::new(Element::C, Point3::new(0.0, 0.0, 0.0)),
        Atom::new(Element::O, Point3::new(2.5, 0.0, 0.0)),
        Atom::new(Element::N, Point3::new(0.0, 3.0, 0.0)),
    ]
}

/// Store holding molecule 1 (`charged_azo_chain(1.23)` with its starting topology),
/// molecule 2 (`water`) and molecule 3 (`halo_cyclobutadiene`), ingested with
/// `reference_registry` and default settings.
pub fn reference_store() -> MoleculeStore {
    let registry = reference_registry();
    let valence = ValenceRules::default();
    let canonicalizer = GraphInvariantCanonicalizer::new();
    let config = InferenceConfig::default();
    let inference = TopologyInference::new(&registry, &valence, &canonicalizer, &config);

    let mut store = MoleculeStore::new();
    for record in [
        IngestRecord::new(MoleculeId(1), charged_azo_chain(1.23))
            .with_starting_bonds(charged_azo_chain_bonds()),
        IngestRecord::new(MoleculeId(2), water()),
        IngestRecord::new(MoleculeId(3), halo_cyclobutadiene()),
    ] {
        store.ingest(record, &inference).unwrap();
    }
    store
}
