//! Group-by reductions feeding the dashboard charts.
//!
//! Missing values (`None`) are skipped by every reducer; a group with
//! no value at all is left out of the resulting series.

use std::collections::BTreeMap;

use serde::Serialize;

/// Power readings at or above this are sensor artefacts.
pub const POWER_CEILING: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Reducer {
    Mean,
    Sum,
}

impl Reducer {
    pub fn reduce<I: IntoIterator<Item = f64>>(self, values: I) -> Option<f64> {
        match self {
            Reducer::Mean => mean(values),
            Reducer::Sum => sum(values),
        }
    }
}

pub fn mean<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    let (total, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(t, n), v| (t + v, n + 1));
    (n > 0).then(|| total / n as f64)
}

pub fn sum<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    values.into_iter().fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
}

pub fn max<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    values.into_iter().fold(None, |acc, v| match acc {
        Some(m) if m >= v => Some(m),
        _ => Some(v),
    })
}

/// Strictly positive values only; zero means "not recorded".
pub fn recorded(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v > 0.0)
}

/// Drops power readings at or above [`POWER_CEILING`].
pub fn plausible_power(value: Option<f64>) -> Option<f64> {
    value.filter(|p| *p < POWER_CEILING)
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Series – keyed output of a reduction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point<K> {
    pub key: K,
    pub value: f64,
}

/// Points ordered by key: chronological for dates, alphabetical for names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Series<K> {
    pub points: Vec<Point<K>>,
}

impl<K> Default for Series<K> {
    fn default() -> Self {
        Series { points: Vec::new() }
    }
}

impl<K: PartialEq> Series<K> {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<f64> {
        self.points.iter().find(|p| &p.key == key).map(|p| p.value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.points.iter().map(|p| &p.key)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.value)
    }
}

impl<K> FromIterator<(K, f64)> for Series<K> {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Series {
            points: iter.into_iter().map(|(key, value)| Point { key, value }).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Bucket rows by key, preserving row order inside each bucket.
pub fn group_rows<'a, R: 'a, K: Ord>(
    rows: impl IntoIterator<Item = &'a R>,
    key: impl Fn(&R) -> K,
) -> BTreeMap<K, Vec<&'a R>> {
    let mut groups: BTreeMap<K, Vec<&'a R>> = BTreeMap::new();
    for row in rows {
        groups.entry(key(row)).or_default().push(row);
    }
    groups
}

/// `rows.groupby(key)[value].mean()` / `.sum()`.
pub fn group_reduce<'a, R: 'a, K: Ord>(
    rows: impl IntoIterator<Item = &'a R>,
    key: impl Fn(&R) -> K,
    value: impl Fn(&R) -> Option<f64>,
    reducer: Reducer,
) -> Series<K> {
    group_rows(rows, key)
        .into_iter()
        .filter_map(|(k, group)| {
            reducer
                .reduce(group.into_iter().filter_map(&value))
                .map(|v| (k, v))
        })
        .collect()
}

/// Sum per (entity, period), then average those sums per period.
///
/// An athlete logged twice on one date counts once, with the two values
/// added together, before the squad average for that date is taken.
pub fn per_entity_then_per_period<'a, R: 'a, E: Ord, P: Ord>(
    rows: impl IntoIterator<Item = &'a R>,
    entity: impl Fn(&R) -> E,
    period: impl Fn(&R) -> P,
    value: impl Fn(&R) -> Option<f64>,
) -> Series<P> {
    let per_entity = group_reduce(rows, |r| (period(r), entity(r)), value, Reducer::Sum);

    let mut per_period: BTreeMap<P, Vec<f64>> = BTreeMap::new();
    for Point { key: (p, _), value } in per_entity.points {
        per_period.entry(p).or_default().push(value);
    }
    per_period
        .into_iter()
        .filter_map(|(p, sums)| mean(sums).map(|m| (p, m)))
        .collect()
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Equal-width bins over `[min, max]`; the last bin is closed on the right.
pub fn histogram(values: &[f64], bins: usize) -> Vec<Bin> {
    let (Some(lo), Some(hi)) = (
        values.iter().copied().reduce(f64::min),
        values.iter().copied().reduce(f64::max),
    ) else {
        return Vec::new();
    };
    if bins == 0 {
        return Vec::new();
    }
    let width = if hi > lo { (hi - lo) / bins as f64 } else { 1.0 };

    let mut out: Vec<Bin> = (0..bins)
        .map(|i| Bin {
            lower: lo + width * i as f64,
            upper: lo + width * (i + 1) as f64,
            count: 0,
        })
        .collect();
    for v in values {
        let i = (((v - lo) / width) as usize).min(bins - 1);
        out[i].count += 1;
    }
    out
}
