use std::collections::BTreeMap;

const INDEX_SNAP_TOLERANCE: f64 = 1e-6;

/// Bond-length model for one distribution key.
///
/// Two kinds exist. Empirical distributions come from observed bond lengths and give a
/// probability estimate for any distance. Interval distributions are installed by range
/// specifications and only answer accept or reject.
#[derive(Debug, Clone, PartialEq)]
pub enum DistanceDistribution {
    Empirical(EmpiricalDistribution),
    Interval(IntervalDistribution),
}

impl DistanceDistribution {
    /// Probability estimate for `distance`, in `[0, 1]`.
    ///
    /// Interval distributions report `1.0` inside their window and `0.0` outside.
    pub fn likelihood(&self, distance: f64) -> f64 {
        match self {
            Self::Empirical(d) => d.likelihood(distance),
            Self::Interval(d) => {
                if d.accepts(distance) {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Whether `distance` is plausible under this distribution.
    ///
    /// Empirical distributions admit a distance when its likelihood is strictly
    /// greater than `threshold`; interval distributions ignore the threshold.
    pub fn admits(&self, distance: f64, threshold: f64) -> bool {
        match self {
            Self::Empirical(d) => d.likelihood(distance) > threshold,
            Self::Interval(d) => d.accepts(distance),
        }
    }

    /// Contribution of a pair at `distance` to a topology score.
    ///
    /// Empirical distributions contribute the natural log of the likelihood, interval
    /// distributions contribute a constant zero.
    pub fn log_likelihood(&self, distance: f64) -> f64 {
        match self {
            Self::Empirical(d) => d.likelihood(distance).ln(),
            Self::Interval(_) => 0.0,
        }
    }

    pub fn is_interval(&self) -> bool {
        matches!(self, Self::Interval(_))
    }
}

/// Closed acceptance window `[min, max]` in angstroms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalDistribution {
    pub min: f64,
    pub max: f64,
}

impl IntervalDistribution {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn accepts(&self, distance: f64) -> bool {
        self.min <= distance && distance <= self.max
    }
}

/// Histogram of observed bond lengths, bucketed at a fixed resolution.
///
/// Buckets hold probabilities that sum to `1 - tail_mass`. Distances past the last
/// observed bucket receive `tail_mass`; distances before the first bucket receive zero.
/// Between observed buckets the probability is linearly interpolated.
#[derive(Debug, Clone, PartialEq)]
pub struct EmpiricalDistribution {
    bucket_width: f64,
    /// `(bucket index, probability)`, sorted by index. The bucket centre is
    /// `index * bucket_width`.
    buckets: Vec<(i64, f64)>,
    tail_mass: f64,
}

impl EmpiricalDistribution {
    /// Builds a distribution from `(length, count)` observations.
    ///
    /// Lengths are rounded to `sig_digits` digits after the decimal point to form
    /// buckets. Returns `None` when the observations carry no counts at all.
    pub fn from_observations<I>(observations: I, tail_mass: f64, sig_digits: u32) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, u64)>,
    {
        let bucket_width = bucket_width(sig_digits);
        let mut counts: BTreeMap<i64, u64> = BTreeMap::new();
        for (length, count) in observations {
            if count == 0 || !length.is_finite() {
                continue;
            }
            let index = (length / bucket_width).round() as i64;
            *counts.entry(index).or_default() += count;
        }

        let total: u64 = counts.values().sum();
        if total == 0 {
            return None;
        }

        let bonded_mass = 1.0 - tail_mass;
        let buckets = counts
            .into_iter()
            .map(|(index, count)| (index, bonded_mass * count as f64 / total as f64))
            .collect();

        Some(Self {
            bucket_width,
            buckets,
            tail_mass,
        })
    }

    /// A distribution that assigns zero likelihood everywhere.
    pub fn empty() -> Self {
        Self {
            bucket_width: 1.0,
            buckets: Vec::new(),
            tail_mass: 0.0,
        }
    }

    pub fn tail_mass(&self) -> f64 {
        self.tail_mass
    }

    pub fn bucket_width(&self) -> f64 {
        self.bucket_width
    }

    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Shortest and longest observed bucket centres.
    pub fn observed_range(&self) -> Option<(f64, f64)> {
        let first = self.buckets.first()?;
        let last = self.buckets.last()?;
        Some((
            first.0 as f64 * self.bucket_width,
            last.0 as f64 * self.bucket_width,
        ))
    }

    pub fn likelihood(&self, distance: f64) -> f64 {
        let (Some(&(first, _)), Some(&(last, last_p))) = (self.buckets.first(), self.buckets.last())
        else {
            return 0.0;
        };
        if !distance.is_finite() {
            return 0.0;
        }

        let mut x = distance / self.bucket_width;
        // Absorb representation error so a distance on a bucket centre hits it exactly.
        let nearest = x.round();
        if (x - nearest).abs() < INDEX_SNAP_TOLERANCE {
            x = nearest;
        }
        if x < first as f64 {
            return 0.0;
        }
        if x > last as f64 {
            return self.tail_mass;
        }
        if x == last as f64 {
            return last_p;
        }

        // First bucket strictly above x; the one before it is at or below x.
        let upper = self.buckets.partition_point(|&(index, _)| (index as f64) <= x);
        let (lo_index, lo_p) = self.buckets[upper - 1];
        let (hi_index, hi_p) = self.buckets[upper];

        let t = (x - lo_index as f64) / (hi_index - lo_index) as f64;
        lo_p + (hi_p - lo_p) * t
    }
}

/// Bucket width in angstroms for a given number of digits after the decimal point.
pub fn bucket_width(sig_digits: u32) -> f64 {
    10f64.powi(-(sig_digits as i32))
}
