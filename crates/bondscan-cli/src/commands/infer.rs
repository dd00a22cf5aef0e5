use super::{InferenceResources, describe_topology, read_geometries};
use crate::cli::InferArgs;
use crate::config::PartialAppConfig;
use crate::error::Result;
use bondscan::core::io::xyz::XyzFrame;
use bondscan::core::models::topology::BondTopology;
use bondscan::engine::inference::TopologyInference;
use tracing::{info, warn};

pub fn run(args: InferArgs) -> Result<()> {
    let app = PartialAppConfig::load(args.inference.config.as_deref())?
        .merge_with_cli(&args.inference)?;
    let resources = InferenceResources::load(&app)?;
    let inference = resources.inference();

    let frames = read_geometries(&args.input)?;
    for (i, frame) in frames.iter().enumerate() {
        let label = match frame.id {
            Some(id) => format!("Molecule {}", id),
            None => format!("Frame {}", i + 1),
        };
        let topologies = infer_frame(frame, &inference)?;

        if topologies.is_empty() {
            warn!("{}: no valid bond topology.", label);
            println!("{}: no valid bond topology", label);
            continue;
        }
        println!("{}: {} topologies", label, topologies.len());
        let shown = args.limit.unwrap_or(topologies.len());
        for (rank, topology) in topologies.iter().take(shown).enumerate() {
            println!("{}", describe_topology(rank + 1, topology));
        }
    }

    info!("Inferred topologies for {} geometries.", frames.len());
    Ok(())
}

/// Infers `frame` and flags the topology matching the frame's bond graph, if it has one.
fn infer_frame(frame: &XyzFrame, inference: &TopologyInference<'_>) -> Result<Vec<BondTopology>> {
    let mut topologies = inference.infer(&frame.atoms)?;
    if let Some(bonds) = &frame.bonds {
        let starting = inference
            .canonicalizer()
            .canonicalize(&frame.atoms, bonds);
        match topologies.iter_mut().find(|t| t.fingerprint == starting) {
            Some(topology) => topology.is_starting_topology = true,
            None => warn!("Starting bond graph was not among the inferred topologies."),
        }
    }
    Ok(topologies)
}
