use super::distribution::{DistanceDistribution, EmpiricalDistribution, IntervalDistribution};
use super::spec::{RangeSpec, SpecParseError, parse_range_specs};
use super::tabular::{
    LengthObservation, MalformedRowError, TabularLoadError, TabularLoadReport, TabularRow,
    read_csv_rows,
};
use crate::core::models::atom::Element;
use crate::core::models::topology::BondOrder;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Tail mass placed past the longest observed unbonded distance by default.
pub const STANDARD_UNBONDED_RIGHT_TAIL_MASS: f64 = 0.9;

/// Default rounding resolution: digits after the decimal point, in angstroms.
pub const STANDARD_SIG_DIGITS: u32 = 3;

/// Lookup key of a distribution. `None` in any slot is a wildcard.
///
/// Keys are normalized so that the pair is unordered: two exact elements are sorted,
/// and a single wildcard always sits in the second slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DistributionKey {
    element_a: Option<Element>,
    element_b: Option<Element>,
    order: Option<BondOrder>,
}

impl DistributionKey {
    pub fn new(a: Option<Element>, b: Option<Element>, order: Option<BondOrder>) -> Self {
        let (element_a, element_b) = match (a, b) {
            (Some(x), Some(y)) if y < x => (Some(y), Some(x)),
            (None, Some(y)) => (Some(y), None),
            other => other,
        };
        Self {
            element_a,
            element_b,
            order,
        }
    }

    pub fn exact(a: Element, b: Element, order: BondOrder) -> Self {
        Self::new(Some(a), Some(b), Some(order))
    }

    pub fn elements(&self) -> (Option<Element>, Option<Element>) {
        (self.element_a, self.element_b)
    }

    pub fn order(&self) -> Option<BondOrder> {
        self.order
    }

    /// Keys that may answer a lookup for `(a, b, order)`, most specific first.
    ///
    /// The pair is sorted first, so when both elements have a single-wildcard entry
    /// the one for the lower element (by atomic number) is tried first whichever way
    /// round the pair was passed.
    fn candidates(a: Element, b: Element, order: BondOrder) -> Vec<Self> {
        let (a, b) = if b < a { (b, a) } else { (a, b) };
        let mut element_pairs = vec![(Some(a), Some(b)), (Some(a), None)];
        if a != b {
            element_pairs.push((Some(b), None));
        }
        element_pairs.push((None, None));

        let mut keys = Vec::with_capacity(element_pairs.len() * 2);
        for (x, y) in element_pairs {
            keys.push(Self::new(x, y, Some(order)));
            keys.push(Self::new(x, y, None));
        }
        keys
    }
}

/// Where a registry entry came from. Overrides always win over empirical entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntrySource {
    Empirical,
    Override,
}

#[derive(Debug, Clone)]
struct Entry {
    source: EntrySource,
    distribution: Arc<DistanceDistribution>,
}

/// Bond-length distributions for every atom pair and bond order.
///
/// Built from empirical tabular data and refined with range-specification overrides.
/// A registry is a value: cloning it is cheap (distributions are shared) and the
/// `with_*` methods return a new snapshot, leaving the receiver untouched, so a
/// snapshot handed to an inference pass never changes underneath it.
///
/// Lookups resolve in two passes. The first pass considers override entries only,
/// the second empirical entries only; each pass walks the candidate keys from most to
/// least specific: `(A, B, order)`, `(A, B, any)`, `(A, *, order)`, `(A, *, any)`,
/// `(B, *, ...)`, `(*, *, order)`, `(*, *, any)`, where `A` is the element with the
/// lower atomic number. When nothing matches, the global default answers.
#[derive(Debug, Clone)]
pub struct DistributionRegistry {
    entries: HashMap<DistributionKey, Entry>,
    default: Arc<DistanceDistribution>,
}

/// Name used by the bond-length tooling this registry descends from.
pub type AllAtomPairLengthDistributions = DistributionRegistry;

impl Default for DistributionRegistry {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            default: Arc::new(DistanceDistribution::Empirical(EmpiricalDistribution::empty())),
        }
    }
}

impl DistributionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replaces the distribution answering lookups that match no entry.
    pub fn set_default(&mut self, distribution: DistanceDistribution) {
        self.default = Arc::new(distribution);
    }

    /// Builds one empirical distribution per `(element pair, order)` key from `rows`.
    ///
    /// Rows that fail to parse are skipped with a warning and listed in the report.
    /// `tail_mass` is applied to unbonded (order 0) distributions, where it models
    /// the likelihood of "no bond" past the longest observed distance; bonded orders
    /// get no tail. Keys whose counts are all zero produce no entry, so lookups for
    /// them fall through to wildcard entries or the default.
    #[instrument(skip_all, name = "tabular_load")]
    pub fn add_from_tabular_data<I>(
        &mut self,
        rows: I,
        tail_mass: f64,
        sig_digits: u32,
    ) -> Result<TabularLoadReport, TabularLoadError>
    where
        I: IntoIterator<Item = TabularRow>,
    {
        if !(0.0..1.0).contains(&tail_mass) {
            return Err(TabularLoadError::InvalidTailMass(tail_mass));
        }

        let mut report = TabularLoadReport::default();
        let mut grouped: HashMap<DistributionKey, Vec<(f64, u64)>> = HashMap::new();

        for row in rows {
            report.rows_read += 1;
            match LengthObservation::try_from(&row) {
                Ok(obs) => {
                    grouped
                        .entry(DistributionKey::exact(obs.element_a, obs.element_b, obs.order))
                        .or_default()
                        .push((obs.length, obs.count));
                }
                Err(e) => {
                    warn!("Skipping malformed bond length row: {}", e);
                    report.skipped.push(e);
                }
            }
        }

        for (key, observations) in grouped {
            let key_tail = match key.order {
                Some(BondOrder::Unbonded) => tail_mass,
                _ => 0.0,
            };
            let Some(distribution) =
                EmpiricalDistribution::from_observations(observations, key_tail, sig_digits)
            else {
                debug!("No observations with non-zero count for {:?}; key left unset.", key);
                report.empty_keys += 1;
                continue;
            };
            self.install(
                key,
                EntrySource::Empirical,
                DistanceDistribution::Empirical(distribution),
            );
            report.distributions_built += 1;
        }

        info!(
            "Loaded {} bond length distributions from {} rows ({} skipped).",
            report.distributions_built,
            report.rows_read,
            report.skipped.len()
        );
        Ok(report)
    }

    /// Reads a bond-length CSV file and adds its distributions.
    ///
    /// # Errors
    ///
    /// Returns `TabularLoadError::Io` or `TabularLoadError::Csv` when the file cannot
    /// be opened or read at all. Individual malformed rows are not errors.
    pub fn add_from_csv_file(
        &mut self,
        path: &Path,
        tail_mass: f64,
        sig_digits: u32,
    ) -> Result<TabularLoadReport, TabularLoadError> {
        let (rows, unparsable) = read_csv_rows(path)?;
        for e in &unparsable {
            warn!("Skipping malformed bond length row: {}", e);
        }
        let mut report = self.add_from_tabular_data(rows, tail_mass, sig_digits)?;
        report.rows_read += unparsable.len();
        report.skipped.extend(unparsable);
        Ok(report)
    }

    /// Parses one or more comma-separated range specifications and installs them as
    /// interval overrides.
    ///
    /// Either every specification in `text` is installed or, on a parse error, none is.
    pub fn add_from_range_spec(&mut self, text: &str) -> Result<(), SpecParseError> {
        let specs = parse_range_specs(text)?;
        for spec in specs {
            self.add_range(&spec);
        }
        Ok(())
    }

    /// Installs one parsed range specification as an interval override.
    pub fn add_range(&mut self, spec: &RangeSpec) {
        let key = DistributionKey::new(spec.element_a, spec.element_b, spec.order);
        debug!("Installing length override {} as {:?}", spec, key);
        self.install(
            key,
            EntrySource::Override,
            DistanceDistribution::Interval(IntervalDistribution::new(spec.min, spec.max)),
        );
    }

    /// Returns a new snapshot with the range specification(s) in `text` installed.
    pub fn with_range_spec(&self, text: &str) -> Result<Self, SpecParseError> {
        let mut next = self.clone();
        next.add_from_range_spec(text)?;
        Ok(next)
    }

    /// Resolves the distribution for an unordered element pair and bond order.
    pub fn lookup(&self, a: Element, b: Element, order: BondOrder) -> &DistanceDistribution {
        self.resolve(a, b, order)
            .map(|(_, entry)| entry.distribution.as_ref())
            .unwrap_or(self.default.as_ref())
    }

    /// The key and source that answer a lookup, or `None` when the default answers.
    pub fn resolved_key(
        &self,
        a: Element,
        b: Element,
        order: BondOrder,
    ) -> Option<(DistributionKey, EntrySource)> {
        self.resolve(a, b, order)
            .map(|(key, entry)| (key, entry.source))
    }

    fn resolve(&self, a: Element, b: Element, order: BondOrder) -> Option<(DistributionKey, &Entry)> {
        let candidates = DistributionKey::candidates(a, b, order);
        [EntrySource::Override, EntrySource::Empirical]
            .into_iter()
            .find_map(|source| {
                candidates.iter().find_map(|key| {
                    self.entries
                        .get(key)
                        .filter(|entry| entry.source == source)
                        .map(|entry| (*key, entry))
                })
            })
    }

    fn install(&mut self, key: DistributionKey, source: EntrySource, distribution: DistanceDistribution) {
        if let Some(existing) = self.entries.get(&key) {
            if existing.source == EntrySource::Override && source == EntrySource::Empirical {
                debug!("Keeping override for {:?}; empirical data ignored.", key);
                return;
            }
        }
        self.entries.insert(
            key,
            Entry {
                source,
                distribution: Arc::new(distribution),
            },
        );
    }
}
