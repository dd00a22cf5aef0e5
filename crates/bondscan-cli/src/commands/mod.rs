pub mod find_smiles;
pub mod find_topology;
pub mod infer;
pub mod ingest;

use crate::config::AppConfig;
use crate::error::{CliError, Result};
use bondscan::core::distributions::registry::DistributionRegistry;
use bondscan::core::fingerprint::GraphInvariantCanonicalizer;
use bondscan::core::io::xyz::{XyzFile, XyzFrame};
use bondscan::core::models::molecule::Molecule;
use bondscan::core::models::topology::BondTopology;
use bondscan::core::valence::ValenceRules;
use bondscan::engine::config::InferenceConfig;
use bondscan::engine::inference::TopologyInference;
use std::path::Path;
use tracing::info;

/// Everything a [`TopologyInference`] borrows, owned in one place for a command's lifetime.
pub struct InferenceResources {
    registry: DistributionRegistry,
    valence: ValenceRules,
    canonicalizer: GraphInvariantCanonicalizer,
    config: InferenceConfig,
}

impl InferenceResources {
    pub fn load(app: &AppConfig) -> Result<Self> {
        Ok(Self {
            registry: app.build_registry()?,
            valence: app.build_valence_rules()?,
            canonicalizer: GraphInvariantCanonicalizer::new(),
            config: app.inference.clone(),
        })
    }

    pub fn inference(&self) -> TopologyInference<'_> {
        TopologyInference::new(
            &self.registry,
            &self.valence,
            &self.canonicalizer,
            &self.config,
        )
    }
}

pub fn read_geometries(path: &Path) -> Result<Vec<XyzFrame>> {
    info!("Loading geometries from {:?}", path);
    let frames = XyzFile::read_from_path(path).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    info!("Read {} geometries.", frames.len());
    Ok(frames)
}

pub fn describe_topology(rank: usize, topology: &BondTopology) -> String {
    let marker = if topology.is_starting_topology {
        " (starting)"
    } else {
        ""
    };
    format!(
        "  [{}] score {:>10.4}  {}{}",
        rank, topology.score, topology.fingerprint, marker
    )
}

pub fn describe_molecule(molecule: &Molecule) -> String {
    let best = molecule
        .best_topology()
        .map_or("-", |t| t.fingerprint.as_str());
    format!(
        "{:>8}  {:<12} {:>3} topologies  best {}",
        molecule.id,
        molecule.stoichiometry(),
        molecule.bond_topologies.len(),
        best
    )
}
