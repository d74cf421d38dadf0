//! Data Pipeline Module
//! Cleaning and aggregation over loaded records. Every operation here
//! is a pure function over an ordered record slice; nothing mutates or
//! consumes its input.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use thiserror::Error;

use crate::data::FireRecord;

/// Raised when not a single record survives the coordinate filter. The
/// map sections degrade; the bar and pie charts stay available.
#[derive(Error, Debug)]
#[error("No records with usable coordinates out of {total} loaded")]
pub struct MissingDataError {
    pub total: usize,
}

/// Which column a tally runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupField {
    State,
    Cause,
}

impl GroupField {
    fn value<'a>(&self, record: &'a FireRecord) -> &'a str {
        match self {
            GroupField::State => &record.state,
            GroupField::Cause => &record.cause,
        }
    }
}

/// Occurrence counts per category label.
///
/// One tally feeds the bar chart, the pie chart and the choropleth fill
/// alike; there is no separate "group count" path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryCount {
    counts: HashMap<String, u64>,
}

impl CategoryCount {
    /// Count for a single label; absent labels count zero.
    pub fn get(&self, label: &str) -> u64 {
        self.counts.get(label).copied().unwrap_or(0)
    }

    /// Sum over every label. Equals the cleaned record count.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(label, &count)| (label.as_str(), count))
    }

    /// Largest single count, used to scale chart axes and fill ramps.
    pub fn max(&self) -> u64 {
        self.counts.values().copied().max().unwrap_or(0)
    }

    /// Labels ordered by descending count, label as tiebreak.
    pub fn ranked(&self) -> Vec<(String, u64)> {
        let mut ranked: Vec<(String, u64)> = self
            .counts
            .iter()
            .map(|(label, &count)| (label.clone(), count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }
}

/// Drop records with a missing or non-finite coordinate. Pure filter;
/// input order is preserved.
pub fn drop_missing_coordinates(records: &[FireRecord]) -> Vec<FireRecord> {
    records
        .iter()
        .filter(|r| r.has_coordinates())
        .cloned()
        .collect()
}

/// Tally occurrences of each distinct value of `field`.
pub fn count_by(records: &[FireRecord], field: GroupField) -> CategoryCount {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for record in records {
        *counts.entry(field.value(record).to_string()).or_insert(0) += 1;
    }
    CategoryCount { counts }
}

/// A bounded random subset of geo-located records, the marker map input.
/// Every record in here has finite coordinates.
#[derive(Debug, Clone)]
pub struct GeoSample {
    records: Vec<FireRecord>,
}

impl GeoSample {
    pub fn records(&self) -> &[FireRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Mean coordinate of the sample, the map centering point.
    /// Returns `(latitude, longitude)`.
    pub fn center(&self) -> Option<(f64, f64)> {
        if self.records.is_empty() {
            return None;
        }
        let n = self.records.len() as f64;
        let (lat_sum, lon_sum) = self.records.iter().fold((0.0, 0.0), |(lat, lon), r| {
            (
                lat + r.latitude.unwrap_or(0.0),
                lon + r.longitude.unwrap_or(0.0),
            )
        });
        Some((lat_sum / n, lon_sum / n))
    }
}

/// Uniform random sample of `min(n, |geo-located records|)` without
/// replacement. The same seed over the same input always yields the
/// same subset, and the source slice is left untouched. Records lacking
/// coordinates are never sampled, so the [`GeoSample`] invariant holds
/// by construction.
pub fn sample(records: &[FireRecord], n: usize, seed: u64) -> GeoSample {
    let geo: Vec<&FireRecord> = records.iter().filter(|r| r.has_coordinates()).collect();
    let amount = n.min(geo.len());
    let mut rng = StdRng::seed_from_u64(seed);
    let picked = rand::seq::index::sample(&mut rng, geo.len(), amount);
    let records = picked.iter().map(|i| geo[i].clone()).collect();
    GeoSample { records }
}
