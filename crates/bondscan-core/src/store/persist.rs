use super::database::MoleculeStore;
use super::error::StoreError;
use crate::core::models::molecule::Molecule;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{info, instrument};

/// Version written into every snapshot; `open` refuses any other.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    molecules: Vec<&'a Molecule>,
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    molecules: Vec<Molecule>,
}

impl MoleculeStore {
    /// Writes every stored molecule to a CBOR snapshot at `path`.
    ///
    /// The fingerprint index is not written; [`open`](Self::open) rebuilds it.
    #[instrument(skip_all, name = "store_save", fields(path = %path.display()))]
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let path_str = path.to_string_lossy().to_string();
        let file = File::create(path).map_err(|e| StoreError::Io {
            path: path_str.clone(),
            source: e,
        })?;
        let mut writer = BufWriter::new(file);

        let snapshot = SnapshotRef {
            version: SNAPSHOT_VERSION,
            molecules: self.iter().collect(),
        };
        ciborium::into_writer(&snapshot, &mut writer).map_err(|e| StoreError::Encode {
            path: path_str.clone(),
            source: e,
        })?;
        writer.flush().map_err(|e| StoreError::Io {
            path: path_str,
            source: e,
        })?;

        info!(num_molecules = self.len(), "Store snapshot written.");
        Ok(())
    }

    /// Reads a snapshot written by [`save`](Self::save) and rebuilds the index.
    #[instrument(skip_all, name = "store_open", fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let path_str = path.to_string_lossy().to_string();
        let file = File::open(path).map_err(|e| StoreError::Io {
            path: path_str.clone(),
            source: e,
        })?;

        let snapshot: Snapshot =
            ciborium::from_reader(BufReader::new(file)).map_err(|e| StoreError::Decode {
                path: path_str.clone(),
                source: e,
            })?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StoreError::UnsupportedVersion {
                path: path_str,
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }

        let mut store = Self::new();
        for molecule in snapshot.molecules {
            store.insert(molecule)?;
        }
        info!(
            num_molecules = store.len(),
            num_fingerprints = store.num_fingerprints(),
            "Store snapshot loaded."
        );
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ids::MoleculeId;
    use crate::core::models::topology::{Bond, BondOrder, BondTopology};
    use crate::engine::fixtures::reference_store;
    use crate::store::database::WhichTopologies;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn save_then_open_restores_molecules_and_index() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.cbor");
        let store = reference_store();

        store.save(&path).unwrap();
        let reopened = MoleculeStore::open(&path).unwrap();

        assert_eq!(reopened, store);
        let starting = store
            .get(MoleculeId(1))
            .unwrap()
            .starting_topology()
            .unwrap()
            .fingerprint
            .clone();
        let hits = reopened.find_by_smiles(&[&starting], WhichTopologies::Starting);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, MoleculeId(1));
    }

    #[test]
    fn unscored_starting_topology_survives_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.cbor");
        let water = reference_store().get(MoleculeId(2)).unwrap().clone();
        let start = BondTopology::unscored_starting(
            vec![Bond::new(0, 1, BondOrder::Single), Bond::new(1, 2, BondOrder::Single)],
            "H@0.O@1|0-1,1-2".to_string(),
        );
        let mut topologies = water.bond_topologies.clone();
        topologies.push(start);

        let mut store = MoleculeStore::new();
        store
            .insert(Molecule::new(MoleculeId(2), water.atoms, topologies))
            .unwrap();
        store.save(&path).unwrap();
        let reopened = MoleculeStore::open(&path).unwrap();

        assert_eq!(reopened, store);
        let starting = reopened.get(MoleculeId(2)).unwrap().starting_topology().unwrap();
        assert_eq!(starting.score, f64::NEG_INFINITY);
        assert_eq!(
            reopened
                .find_by_smiles(&["H@0.O@1|0-1,1-2"], WhichTopologies::Starting)
                .len(),
            1
        );
    }

    #[test]
    fn empty_store_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.cbor");
        MoleculeStore::new().save(&path).unwrap();
        assert!(MoleculeStore::open(&path).unwrap().is_empty());
    }

    #[test]
    fn open_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let result = MoleculeStore::open(&dir.path().join("absent.cbor"));
        assert!(matches!(result, Err(StoreError::Io { .. })));
    }

    #[test]
    fn open_garbage_is_decode_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.cbor");
        fs::write(&path, b"definitely not cbor").unwrap();
        assert!(matches!(
            MoleculeStore::open(&path),
            Err(StoreError::Decode { .. })
        ));
    }

    #[test]
    fn open_rejects_other_versions() {
        #[derive(Serialize)]
        struct Future {
            version: u32,
            molecules: Vec<Molecule>,
        }

        let dir = tempdir().unwrap();
        let path = dir.path().join("future.cbor");
        let file = File::create(&path).unwrap();
        ciborium::into_writer(
            &Future {
                version: SNAPSHOT_VERSION + 1,
                molecules: Vec::new(),
            },
            file,
        )
        .unwrap();

        assert!(matches!(
            MoleculeStore::open(&path),
            Err(StoreError::UnsupportedVersion { found: 2, .. })
        ));
    }
}
