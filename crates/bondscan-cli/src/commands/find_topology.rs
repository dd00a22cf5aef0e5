use super::{InferenceResources, describe_molecule};
use crate::cli::FindTopologyArgs;
use crate::config::PartialAppConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use bondscan::engine::progress::{Progress, ProgressReporter};
use bondscan::store::database::MoleculeStore;
use tracing::info;

pub fn run(args: FindTopologyArgs) -> Result<()> {
    let app = PartialAppConfig::load(args.inference.config.as_deref())?
        .merge_with_cli(&args.inference)?;
    let store_path = app.store_path(args.store.as_deref())?;
    let resources = InferenceResources::load(&app)?;
    let inference = resources.inference();

    if !inference.canonicalizer().is_valid(&args.fingerprint) {
        return Err(CliError::Argument(format!(
            "'{}' is not a well-formed fingerprint",
            args.fingerprint
        )));
    }

    info!("Opening store {:?}", store_path);
    let store = MoleculeStore::open(&store_path)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    reporter.report(Progress::PhaseStart { name: "Scan" });
    let matches = store.par_find_by_topology(&args.fingerprint, &inference, &reporter)?;
    reporter.report(Progress::PhaseFinish);

    println!(
        "{} of {} molecule(s) produce the topology under the current distributions.",
        matches.len(),
        store.len()
    );
    for molecule in &matches {
        println!("{}", describe_molecule(molecule));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{FindSmilesArgs, InferenceArgs, IngestArgs};
    use crate::commands::{find_smiles, ingest};
    use bondscan::store::database::WhichTopologies;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    const HYDRAZINE_LIKE: &str = "\
6
id=1
N   0.000  0.000  0.000
N   1.500  0.000  0.000
H  -0.400  0.950  0.000
H  -0.400 -0.950  0.000
H   1.900  0.950  0.000
H   1.900 -0.950  0.000
";

    fn inference_args(ranges: &[&str]) -> InferenceArgs {
        InferenceArgs {
            ranges: ranges.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn build_store(dir: &std::path::Path) -> PathBuf {
        let input = dir.join("in.xyz");
        let store = dir.join("store.cbor");
        fs::write(&input, HYDRAZINE_LIKE).unwrap();
        ingest::run(IngestArgs {
            input,
            store: Some(store.clone()),
            append: false,
            inference: inference_args(&["N-H:0.9-1.1", "N-N:1.3-1.55"]),
        })
        .unwrap();
        store
    }

    #[test]
    fn scan_and_indexed_lookup_run_against_snapshot() {
        let dir = tempdir().unwrap();
        let store_path = build_store(dir.path());
        let store = MoleculeStore::open(&store_path).unwrap();
        let fingerprint = store.iter().next().unwrap().bond_topologies[0]
            .fingerprint
            .clone();

        find_smiles::run(FindSmilesArgs {
            fingerprints: vec![fingerprint.clone()],
            store: Some(store_path.clone()),
            which: WhichTopologies::Best,
            config: None,
        })
        .unwrap();

        run(FindTopologyArgs {
            fingerprint,
            store: Some(store_path),
            inference: inference_args(&["N-H:0.9-1.1", "N-N:1.3-1.6"]),
        })
        .unwrap();
    }

    #[test]
    fn malformed_fingerprint_is_rejected() {
        let dir = tempdir().unwrap();
        let store_path = build_store(dir.path());
        let result = run(FindTopologyArgs {
            fingerprint: "   ".to_string(),
            store: Some(store_path),
            inference: InferenceArgs::default(),
        });
        assert!(matches!(result, Err(CliError::Argument(_))));
    }

    #[test]
    fn missing_store_is_reported() {
        let dir = tempdir().unwrap();
        let result = run(FindTopologyArgs {
            fingerprint: "N@0|0-1".to_string(),
            store: Some(dir.path().join("absent.cbor")),
            inference: InferenceArgs::default(),
        });
        assert!(matches!(result, Err(CliError::Store(_))));
    }
}
