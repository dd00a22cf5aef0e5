use super::{InferenceResources, read_geometries};
use crate::cli::IngestArgs;
use crate::config::PartialAppConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use bondscan::core::io::xyz::XyzFrame;
use bondscan::core::models::ids::MoleculeId;
use bondscan::engine::progress::ProgressReporter;
use bondscan::store::database::MoleculeStore;
use bondscan::store::ingest::IngestRecord;
use tracing::{info, warn};

pub fn run(args: IngestArgs) -> Result<()> {
    let app = PartialAppConfig::load(args.inference.config.as_deref())?
        .merge_with_cli(&args.inference)?;
    let store_path = app.store_path(args.store.as_deref())?;
    let resources = InferenceResources::load(&app)?;
    let inference = resources.inference();

    let mut store = if args.append && store_path.exists() {
        info!("Appending to existing store {:?}", store_path);
        MoleculeStore::open(&store_path)?
    } else {
        MoleculeStore::new()
    };

    let frames = read_geometries(&args.input)?;
    let records = to_records(frames, &store)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let summary = store.ingest_all(records, &inference, &reporter);

    for failure in &summary.failed {
        warn!("{}", failure);
    }
    println!(
        "Stored {} molecule(s), excluded {} with no valid topology, {} failed.",
        summary.stored,
        summary.excluded,
        summary.failed.len()
    );
    if summary.starting_not_reproduced > 0 {
        println!(
            "Warning: {} starting topologies were not reproduced by inference.",
            summary.starting_not_reproduced
        );
    }

    store.save(&store_path)?;
    println!(
        "Store with {} molecule(s) written to: {}",
        store.len(),
        store_path.display()
    );
    Ok(())
}

/// Turns frames into ingest records. Frames without an `id=` property are numbered
/// after the highest id already in the store or in the file.
fn to_records(frames: Vec<XyzFrame>, store: &MoleculeStore) -> Result<Vec<IngestRecord>> {
    let highest = store
        .iter()
        .map(|m| m.id.0)
        .chain(frames.iter().filter_map(|f| f.id.map(|id| id.0)))
        .max()
        .unwrap_or(0);
    let mut next_id = highest.checked_add(1);

    let mut records = Vec::with_capacity(frames.len());
    for frame in frames {
        let id = match frame.id {
            Some(id) => id,
            None => {
                let id = next_id.ok_or_else(|| {
                    CliError::Argument(format!(
                        "cannot number a frame without an id: ids already reach {}",
                        highest
                    ))
                })?;
                next_id = id.checked_add(1);
                MoleculeId(id)
            }
        };
        let record = IngestRecord::new(id, frame.atoms);
        records.push(match frame.bonds {
            Some(bonds) => record.with_starting_bonds(bonds),
            None => record,
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::InferenceArgs;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    const WATERS: &str = "\
3
id=5 bonds=0-1:1,0-2:1
O   0.000 0.000 0.000
H   0.960 0.000 0.000
H  -0.240 0.929 0.000
3

O   0.000 0.000 0.000
H   0.960 0.000 0.000
H  -0.240 0.929 0.000
";

    fn args(input: PathBuf, store: PathBuf, append: bool) -> IngestArgs {
        IngestArgs {
            input,
            store: Some(store),
            append,
            inference: InferenceArgs {
                ranges: vec!["O-H:0.9-1.0".to_string()],
                ..Default::default()
            },
        }
    }

    #[test]
    fn frames_without_ids_are_numbered_after_known_ids() {
        let frames = vec![
            XyzFrame::default(),
            XyzFrame {
                id: Some(MoleculeId(7)),
                ..Default::default()
            },
            XyzFrame::default(),
        ];
        let ids: Vec<u64> = to_records(frames, &MoleculeStore::new())
            .unwrap()
            .iter()
            .map(|r| r.id.0)
            .collect();
        assert_eq!(ids, vec![8, 7, 9]);
    }

    #[test]
    fn numbering_past_the_largest_id_is_an_argument_error() {
        let frames = vec![
            XyzFrame {
                id: Some(MoleculeId(u64::MAX)),
                ..Default::default()
            },
            XyzFrame::default(),
        ];
        let result = to_records(frames, &MoleculeStore::new());
        assert!(matches!(result, Err(CliError::Argument(_))));
    }

    #[test]
    fn largest_id_is_accepted_when_every_frame_has_one() {
        let frames = vec![XyzFrame {
            id: Some(MoleculeId(u64::MAX)),
            ..Default::default()
        }];
        let records = to_records(frames, &MoleculeStore::new()).unwrap();
        assert_eq!(records[0].id, MoleculeId(u64::MAX));
    }

    #[test]
    fn ingest_writes_and_appends_to_snapshot() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("waters.xyz");
        let store_path = dir.path().join("store.cbor");
        fs::write(&input, WATERS).unwrap();

        run(args(input.clone(), store_path.clone(), false)).unwrap();
        let store = MoleculeStore::open(&store_path).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.get(MoleculeId(5)).unwrap().starting_topology().is_some());
        assert!(store.get(MoleculeId(6)).is_some());

        // Molecule 5 is already stored; the unnumbered frame gets a fresh id.
        run(args(input, store_path.clone(), true)).unwrap();
        let store = MoleculeStore::open(&store_path).unwrap();
        assert_eq!(store.len(), 3);
        assert!(store.get(MoleculeId(7)).is_some());
    }
}
