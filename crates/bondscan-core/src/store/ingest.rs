use super::database::{MoleculeStore, distinct_topologies};
use super::error::StoreError;
use crate::core::models::atom::Atom;
use crate::core::models::ids::MoleculeId;
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::{Bond, BondTopology, normalize_bonds};
use crate::engine::error::EngineError;
use crate::engine::inference::TopologyInference;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A geometry waiting to be added to a store.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestRecord {
    pub id: MoleculeId,
    pub atoms: Vec<Atom>,
    /// Bond graph the geometry was generated from, if known.
    pub starting_bonds: Option<Vec<Bond>>,
}

impl IngestRecord {
    pub fn new(id: MoleculeId, atoms: Vec<Atom>) -> Self {
        Self {
            id,
            atoms,
            starting_bonds: None,
        }
    }

    pub fn with_starting_bonds(mut self, bonds: Vec<Bond>) -> Self {
        self.starting_bonds = Some(bonds);
        self
    }
}

/// What happened to one ingested record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Stored {
        /// Stored topologies, including an unscored starting topology.
        num_topologies: usize,
        /// `Some(true)` when a starting topology was given and inference reproduced it.
        starting_reproduced: Option<bool>,
    },
    /// Inference found no valid topology; the molecule was left out.
    Excluded,
}

/// Totals for a batch ingestion.
#[derive(Debug, Default)]
pub struct IngestSummary {
    pub stored: usize,
    pub excluded: usize,
    pub starting_not_reproduced: usize,
    /// Records that could not be ingested, with the reason.
    pub failed: Vec<StoreError>,
}

impl MoleculeStore {
    /// Infers the default topologies of one geometry and stores the molecule.
    ///
    /// A molecule for which inference finds nothing is excluded, which is reported as
    /// [`IngestOutcome::Excluded`] rather than an error. When the record carries a
    /// starting topology, the matching inferred topology is flagged as the starting one.
    /// If inference did not reproduce it, the starting bond graph is stored anyway as an
    /// unscored topology after the inferred ones.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateMolecule`] for an id already in the store,
    /// [`StoreError::InvalidStartingBond`] for a starting bond outside the atom list and
    /// [`StoreError::Engine`] when inference rejects the geometry.
    #[instrument(skip_all, name = "ingest", fields(id = %record.id))]
    pub fn ingest(
        &mut self,
        record: IngestRecord,
        inference: &TopologyInference<'_>,
    ) -> Result<IngestOutcome, StoreError> {
        if self.get(record.id).is_some() {
            return Err(StoreError::DuplicateMolecule(record.id));
        }
        let prepared = prepare(record, inference)?;
        self.store_prepared(prepared)
    }

    /// Ingests a batch of records, inferring topologies in parallel when the `parallel`
    /// feature is enabled. Records are stored in input order.
    ///
    /// Failing records are skipped with a warning and listed in the summary.
    #[instrument(skip_all, name = "ingest", fields(num_records = records.len()))]
    pub fn ingest_all(
        &mut self,
        records: Vec<IngestRecord>,
        inference: &TopologyInference<'_>,
        reporter: &ProgressReporter,
    ) -> IngestSummary {
        reporter.report(Progress::PhaseStart { name: "Ingest" });
        reporter.report(Progress::TaskStart {
            total_steps: records.len() as u64,
        });

        #[cfg(not(feature = "parallel"))]
        let iterator = records.into_iter();

        #[cfg(feature = "parallel")]
        let iterator = records.into_par_iter();

        let prepared: Vec<Result<Prepared, StoreError>> = iterator
            .map(|record| {
                let result = prepare(record, inference);
                reporter.report(Progress::TaskIncrement);
                result
            })
            .collect();

        reporter.report(Progress::TaskFinish);

        let mut summary = IngestSummary::default();
        for result in prepared {
            match result.and_then(|p| self.store_prepared(p)) {
                Ok(IngestOutcome::Stored {
                    starting_reproduced,
                    ..
                }) => {
                    summary.stored += 1;
                    if starting_reproduced == Some(false) {
                        summary.starting_not_reproduced += 1;
                    }
                }
                Ok(IngestOutcome::Excluded) => summary.excluded += 1,
                Err(e) => {
                    warn!("Skipping record: {}", e);
                    summary.failed.push(e);
                }
            }
        }

        reporter.report(Progress::PhaseFinish);
        info!(
            stored = summary.stored,
            excluded = summary.excluded,
            failed = summary.failed.len(),
            "Ingestion complete."
        );
        summary
    }

    fn store_prepared(&mut self, prepared: Prepared) -> Result<IngestOutcome, StoreError> {
        let Prepared {
            id,
            atoms,
            topologies,
            starting_reproduced,
        } = prepared;

        if topologies.is_empty() {
            warn!(%id, "No valid bond topology for geometry; molecule excluded.");
            return Ok(IngestOutcome::Excluded);
        }
        let num_topologies = topologies.len();
        self.insert(Molecule::new(id, atoms, topologies))?;
        Ok(IngestOutcome::Stored {
            num_topologies,
            starting_reproduced,
        })
    }
}

struct Prepared {
    id: MoleculeId,
    atoms: Vec<Atom>,
    topologies: Vec<BondTopology>,
    starting_reproduced: Option<bool>,
}

fn prepare(record: IngestRecord, inference: &TopologyInference<'_>) -> Result<Prepared, StoreError> {
    let IngestRecord {
        id,
        atoms,
        starting_bonds,
    } = record;

    let engine_error = |source: EngineError| StoreError::Engine { id, source };
    let mut topologies = distinct_topologies(inference, &atoms).map_err(engine_error)?;

    let starting_reproduced = match starting_bonds {
        None => None,
        Some(bonds) => {
            let num_atoms = atoms.len();
            if let Some(index) = bonds
                .iter()
                .flat_map(|b| [b.atom_a, b.atom_b])
                .find(|&i| i >= num_atoms)
            {
                return Err(StoreError::InvalidStartingBond {
                    id,
                    index,
                    num_atoms,
                });
            }

            let bonds = normalize_bonds(bonds);
            let fingerprint = inference.canonicalizer().canonicalize(&atoms, &bonds);
            match topologies.iter_mut().find(|t| t.fingerprint == fingerprint) {
                Some(topology) => {
                    topology.is_starting_topology = true;
                    Some(true)
                }
                None => {
                    if !topologies.is_empty() {
                        warn!(%id, "Starting topology not reproduced by inference; stored unscored.");
                        topologies.push(BondTopology::unscored_starting(bonds, fingerprint));
                    }
                    Some(false)
                }
            }
        }
    };

    Ok(Prepared {
        id,
        atoms,
        topologies,
        starting_reproduced,
    })
}
