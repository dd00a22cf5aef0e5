use super::database::{MoleculeStore, distinct_topologies};
use super::error::StoreError;
use crate::core::models::ids::MoleculeId;
use crate::core::models::molecule::Molecule;
use crate::engine::inference::TopologyInference;
use crate::engine::progress::{Progress, ProgressReporter};
use std::collections::btree_map;
use tracing::{debug, info, instrument, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Lazy scan that re-derives topologies for every stored molecule.
///
/// Each call to `next` runs inference on stored molecules until one produces the target
/// fingerprint, then yields a copy of that molecule carrying the freshly inferred
/// topologies. Dropping the scan early skips the remaining molecules.
pub struct TopologyScan<'s> {
    molecules: btree_map::Values<'s, MoleculeId, Molecule>,
    target: String,
    inference: &'s TopologyInference<'s>,
}

impl Iterator for TopologyScan<'_> {
    type Item = Result<Molecule, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        for molecule in self.molecules.by_ref() {
            match rescore(molecule, &self.target, self.inference) {
                Ok(Some(copy)) => return Some(Ok(copy)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.molecules.len()))
    }
}

impl MoleculeStore {
    /// Scanning lookup by fingerprint under the distributions held by `inference`.
    ///
    /// Yields molecules in ascending id order. The stored molecules are not modified;
    /// yielded copies carry the newly inferred topology set.
    pub fn find_by_topology<'s>(
        &'s self,
        target: &str,
        inference: &'s TopologyInference<'s>,
    ) -> TopologyScan<'s> {
        debug!(fingerprint = target, num_molecules = self.len(), "Starting topology scan.");
        TopologyScan {
            molecules: self.molecules_by_id(),
            target: target.to_string(),
            inference,
        }
    }

    /// Runs the same scan as [`find_by_topology`](Self::find_by_topology) to completion,
    /// spreading molecules over worker threads when the `parallel` feature is enabled.
    ///
    /// Matches are returned in ascending id order.
    ///
    /// # Errors
    ///
    /// Returns the first [`StoreError::Engine`] raised by inference, in id order.
    #[instrument(skip_all, name = "find_by_topology", fields(fingerprint = target))]
    pub fn par_find_by_topology(
        &self,
        target: &str,
        inference: &TopologyInference<'_>,
        reporter: &ProgressReporter,
    ) -> Result<Vec<Molecule>, StoreError> {
        let molecules: Vec<&Molecule> = self.iter().collect();
        reporter.report(Progress::TaskStart {
            total_steps: molecules.len() as u64,
        });

        #[cfg(not(feature = "parallel"))]
        let iterator = molecules.iter();

        #[cfg(feature = "parallel")]
        let iterator = molecules.par_iter();

        let results: Vec<Result<Option<Molecule>, StoreError>> = iterator
            .map(|molecule| {
                let result = rescore(molecule, target, inference);
                reporter.report(Progress::TaskIncrement);
                result
            })
            .collect();

        reporter.report(Progress::TaskFinish);

        let matches: Vec<Molecule> = results
            .into_iter()
            .filter_map(Result::transpose)
            .collect::<Result<_, _>>()?;

        info!(
            num_matches = matches.len(),
            scanned = molecules.len(),
            "Topology scan complete."
        );
        Ok(matches)
    }
}

/// Re-infers `molecule` and returns a copy with the new topologies if any of them has
/// the `target` fingerprint.
fn rescore(
    molecule: &Molecule,
    target: &str,
    inference: &TopologyInference<'_>,
) -> Result<Option<Molecule>, StoreError> {
    let topologies =
        distinct_topologies(inference, &molecule.atoms).map_err(|source| StoreError::Engine {
            id: molecule.id,
            source,
        })?;
    if topologies.iter().any(|t| t.fingerprint == target) {
        trace!(id = %molecule.id, "Scan match.");
        Ok(Some(molecule.with_topologies(topologies)))
    } else {
        Ok(None)
    }
}
