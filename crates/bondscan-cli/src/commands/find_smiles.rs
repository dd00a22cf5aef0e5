use super::describe_molecule;
use crate::cli::{FindSmilesArgs, InferenceArgs};
use crate::config::PartialAppConfig;
use crate::error::Result;
use bondscan::core::fingerprint::{Canonicalizer, GraphInvariantCanonicalizer};
use bondscan::store::database::MoleculeStore;
use tracing::{info, warn};

pub fn run(args: FindSmilesArgs) -> Result<()> {
    let app = PartialAppConfig::load(args.config.as_deref())?
        .merge_with_cli(&InferenceArgs::default())?;
    let store_path = app.store_path(args.store.as_deref())?;

    let canonicalizer = GraphInvariantCanonicalizer::new();
    for fingerprint in args
        .fingerprints
        .iter()
        .filter(|fp| !canonicalizer.is_valid(fp))
    {
        warn!("'{}' is not a well-formed fingerprint; it cannot match.", fingerprint);
    }

    info!("Opening store {:?}", store_path);
    let store = MoleculeStore::open(&store_path)?;
    let matches = store.find_by_smiles(&args.fingerprints, args.which);

    println!(
        "{} of {} molecule(s) match ({} topologies).",
        matches.len(),
        store.len(),
        args.which
    );
    for molecule in matches {
        println!("{}", describe_molecule(molecule));
    }
    Ok(())
}
