//! Core data types: item identifiers, popularity tables and dense matrices.

use crate::error::{MetricError, MetricResult};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

// ============================================================================
// ItemId
// ============================================================================

/// Identifier of a recommendable item.
///
/// Hosts use either integer tokens or raw string ids. The derived ordering
/// (all integers before all strings, then natural order) is the tie-break
/// used when popularity counts are equal.
///
/// Strings that are the canonical decimal form of a `u64` deserialize as
/// [`ItemId::Int`], so JSON object keys like `"42"` match the integer `42`
/// in a recommendation list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemId {
    /// Integer item token
    Int(u64),
    /// Free-form item identifier
    Str(String),
}

impl ItemId {
    /// Parses a string, preferring the integer form when it round-trips.
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<u64>() {
            Ok(id) if id.to_string() == raw => ItemId::Int(id),
            _ => ItemId::Str(raw.to_string()),
        }
    }
}

impl From<u64> for ItemId {
    fn from(id: u64) -> Self {
        ItemId::Int(id)
    }
}

impl From<&str> for ItemId {
    fn from(raw: &str) -> Self {
        ItemId::parse(raw)
    }
}

impl From<String> for ItemId {
    fn from(raw: String) -> Self {
        ItemId::parse(&raw)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Int(id) => write!(f, "{}", id),
            ItemId::Str(id) => f.write_str(id),
        }
    }
}

impl Serialize for ItemId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ItemId::Int(id) => serializer.serialize_u64(*id),
            ItemId::Str(id) => serializer.serialize_str(id),
        }
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ItemIdVisitor;

        impl Visitor<'_> for ItemIdVisitor {
            type Value = ItemId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer or a string item id")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<ItemId, E> {
                Ok(ItemId::Int(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<ItemId, E> {
                u64::try_from(v)
                    .map(ItemId::Int)
                    .map_err(|_| E::custom(format!("negative item id: {}", v)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<ItemId, E> {
                Ok(ItemId::parse(v))
            }
        }

        deserializer.deserialize_any(ItemIdVisitor)
    }
}

// ============================================================================
// PopularityTable
// ============================================================================

/// Interaction count per item, built once per evaluation dataset.
///
/// Counts are non-negative and finite. Items iterate in ascending id order,
/// which keeps hashing and tie-breaking reproducible.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PopularityTable {
    counts: BTreeMap<ItemId, f64>,
}

impl PopularityTable {
    /// Builds a table from `(item, count)` pairs.
    ///
    /// Fails on duplicate items and on negative or non-finite counts.
    pub fn from_counts<I, K>(counts: I) -> MetricResult<Self>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<ItemId>,
    {
        let mut table = BTreeMap::new();
        for (item, count) in counts {
            let item = item.into();
            check_count(&item, count)?;
            if table.insert(item.clone(), count).is_some() {
                return Err(MetricError::InvalidInput(format!(
                    "duplicate item {} in popularity table",
                    item
                )));
            }
        }
        Ok(Self { counts: table })
    }

    /// Number of distinct items.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns true if the table holds no items.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Interaction count of one item.
    pub fn get(&self, item: &ItemId) -> Option<f64> {
        self.counts.get(item).copied()
    }

    /// Iterates `(item, count)` in ascending item order.
    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, f64)> + '_ {
        self.counts.iter().map(|(item, &count)| (item, count))
    }

    /// Sum of all interaction counts.
    pub fn total(&self) -> f64 {
        self.counts.values().sum()
    }

    /// Largest single interaction count, or 0.0 for an empty table.
    pub fn max_count(&self) -> f64 {
        self.counts.values().copied().fold(0.0, f64::max)
    }

    /// Content hash used to key cached classifications.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.counts.len().hash(&mut hasher);
        for (item, count) in &self.counts {
            item.hash(&mut hasher);
            count.to_bits().hash(&mut hasher);
        }
        hasher.finish()
    }
}

fn check_count(item: &ItemId, count: f64) -> MetricResult<()> {
    if count.is_finite() && count >= 0.0 {
        Ok(())
    } else {
        Err(MetricError::InvalidInput(format!(
            "item {} has invalid interaction count {}",
            item, count
        )))
    }
}

impl Serialize for PopularityTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.counts.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PopularityTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let counts = BTreeMap::<ItemId, f64>::deserialize(deserializer)?;
        for (item, &count) in &counts {
            check_count(item, count).map_err(de::Error::custom)?;
        }
        Ok(Self { counts })
    }
}

// ============================================================================
// Matrix
// ============================================================================

/// Dense row-major matrix.
///
/// Rows are users in evaluation order, columns are rank positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
}

/// Ranked recommendations: cell `(u, r)` is the item at rank `r + 1` for user `u`.
pub type RecommendationMatrix = Matrix<ItemId>;

/// Numeric matrix with the shape of a [`RecommendationMatrix`].
pub type ScoreMatrix = Matrix<f64>;

impl<T> Matrix<T> {
    /// Builds a matrix from equally sized rows.
    pub fn from_rows(rows: Vec<Vec<T>>) -> MetricResult<Self> {
        let num_rows = rows.len();
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(num_rows * cols);
        for (idx, row) in rows.into_iter().enumerate() {
            if row.len() != cols {
                return Err(MetricError::InvalidInput(format!(
                    "row {} has {} columns, expected {}",
                    idx,
                    row.len(),
                    cols
                )));
            }
            data.extend(row);
        }
        Ok(Self {
            data,
            rows: num_rows,
            cols,
        })
    }

    /// Builds a matrix from row-major data.
    pub fn from_raw(rows: usize, cols: usize, data: Vec<T>) -> MetricResult<Self> {
        if data.len() != rows * cols {
            return Err(MetricError::InvalidInput(format!(
                "{} cells cannot form a {}x{} matrix",
                data.len(),
                rows,
                cols
            )));
        }
        Ok(Self { data, rows, cols })
    }

    /// Number of rows (users).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (rank positions).
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Cell at `(row, col)`, if in bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row < self.rows && col < self.cols {
            self.data.get(row * self.cols + col)
        } else {
            None
        }
    }

    /// One row as a slice.
    pub fn row(&self, row: usize) -> Option<&[T]> {
        if row < self.rows {
            Some(&self.data[row * self.cols..(row + 1) * self.cols])
        } else {
            None
        }
    }

    /// Iterates rows in order.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[T]> + '_ {
        (0..self.rows).map(move |r| &self.data[r * self.cols..(r + 1) * self.cols])
    }

    /// Iterates rows mutably in order.
    pub fn iter_rows_mut(&mut self) -> impl Iterator<Item = &mut [T]> + '_ {
        // chunks_mut rejects a zero width; a zero-width matrix has no cells.
        self.data.chunks_mut(self.cols.max(1))
    }

    /// Row-major cell storage.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Applies `f` to every cell, keeping the shape.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Matrix<U> {
        Matrix {
            data: self.data.iter().map(f).collect(),
            rows: self.rows,
            cols: self.cols,
        }
    }
}

impl<T: Serialize> Serialize for Matrix<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter_rows())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Matrix<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let rows = Vec::<Vec<T>>::deserialize(deserializer)?;
        Matrix::from_rows(rows).map_err(de::Error::custom)
    }
}
