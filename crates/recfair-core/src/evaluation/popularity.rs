//! Popularity classification: splitting the item universe into tail and head.
//!
//! Items are ordered by interaction count and accumulated until their
//! cumulative count reaches a share (`ratio`) of the total interaction mass.
//! The item whose count crosses the threshold is included, so a classified
//! set always holds at least `ratio * total` of the mass and overshoots by
//! less than one item's count.
//!
//! # Tail policies
//!
//! | Policy | Order | Tail |
//! |--------|-------|------|
//! | [`TailPolicy::BottomUp`] (default) | ascending `(count, id)` | accumulated set |
//! | [`TailPolicy::ComplementOfHead`] | descending `(count, id)` | universe minus head |
//!
//! The two policies are not equivalent: near ties the boundary lands on
//! different items, and the complement policy uses its own head ratio.

use crate::error::{MetricError, MetricResult};
use crate::evaluation::items::{ItemId, PopularityTable};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Set of classified item ids, used as a membership predicate.
pub type ItemSet = HashSet<ItemId>;

/// How the tail set is derived from a popularity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TailPolicy {
    /// Accumulate from the least popular item upward
    #[default]
    BottomUp,
    /// Build the head from the most popular item downward, tail is the rest
    ComplementOfHead,
}

/// A fully specified classification request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Classifier {
    /// Tail items under the given policy
    Tail {
        /// Share of mass held by the tail (bottom-up policy)
        ratio: f64,
        /// Which tail definition to apply
        policy: TailPolicy,
        /// Share of mass held by the head (complement policy)
        head_ratio: f64,
    },
    /// Head items: most popular items holding `ratio` of the mass
    Head {
        /// Share of mass held by the head
        ratio: f64,
    },
}

impl Classifier {
    /// Computes the classified item set for `table`.
    pub fn classify(&self, table: &PopularityTable) -> MetricResult<ItemSet> {
        match *self {
            Classifier::Tail {
                ratio,
                policy,
                head_ratio,
            } => classify_tail(table, ratio, policy, head_ratio),
            Classifier::Head { ratio } => head_items(table, ratio),
        }
    }
}

/// Classifies the tail under `policy`.
///
/// `ratio` drives [`TailPolicy::BottomUp`]; `head_ratio` drives
/// [`TailPolicy::ComplementOfHead`].
pub fn classify_tail(
    table: &PopularityTable,
    ratio: f64,
    policy: TailPolicy,
    head_ratio: f64,
) -> MetricResult<ItemSet> {
    match policy {
        TailPolicy::BottomUp => tail_items(table, ratio),
        TailPolicy::ComplementOfHead => {
            let head = head_items(table, head_ratio)?;
            Ok(table
                .iter()
                .map(|(item, _)| item)
                .filter(|item| !head.contains(*item))
                .cloned()
                .collect())
        }
    }
}

/// Least popular items holding at least `ratio` of the interaction mass.
///
/// Items are visited in ascending `(count, id)` order.
///
/// # Example
///
/// ```
/// use recfair_core::evaluation::{tail_items, ItemId, PopularityTable};
///
/// let table = PopularityTable::from_counts([("A", 10.0), ("B", 5.0), ("C", 3.0), ("D", 2.0)]).unwrap();
/// let tail = tail_items(&table, 0.2).unwrap();
/// assert_eq!(tail.len(), 2);
/// assert!(tail.contains(&ItemId::from("C")) && tail.contains(&ItemId::from("D")));
/// ```
pub fn tail_items(table: &PopularityTable, ratio: f64) -> MetricResult<ItemSet> {
    let mut ordered = sorted_by_popularity(table, "tail")?;
    ordered.sort_by(|a, b| ascending(a, b));
    Ok(accumulate(&ordered, table.total(), ratio, "tail"))
}

/// Most popular items holding at least `ratio` of the interaction mass.
///
/// Items are visited in descending `(count, id)` order, the exact reverse
/// of [`tail_items`].
pub fn head_items(table: &PopularityTable, ratio: f64) -> MetricResult<ItemSet> {
    let mut ordered = sorted_by_popularity(table, "head")?;
    ordered.sort_by(|a, b| ascending(b, a));
    Ok(accumulate(&ordered, table.total(), ratio, "head"))
}

fn sorted_by_popularity<'a>(
    table: &'a PopularityTable,
    label: &str,
) -> MetricResult<Vec<(&'a ItemId, f64)>> {
    if table.is_empty() {
        return Err(MetricError::InvalidInput(format!(
            "cannot classify {} items of an empty popularity table",
            label
        )));
    }
    Ok(table.iter().collect())
}

fn ascending(a: &(&ItemId, f64), b: &(&ItemId, f64)) -> Ordering {
    a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0))
}

/// First-crossing accumulation over an already ordered item list.
fn accumulate(ordered: &[(&ItemId, f64)], total: f64, ratio: f64, label: &str) -> ItemSet {
    if ratio <= 0.0 {
        warn!("{} ratio {} selects no items", label, ratio);
        return ItemSet::new();
    }
    if ratio >= 1.0 {
        return ordered.iter().map(|(item, _)| (*item).clone()).collect();
    }
    if total == 0.0 {
        warn!("popularity table has zero total interactions");
    }

    let threshold = ratio * total;
    let mut cumulative = 0.0;
    let mut selected = ItemSet::new();
    for (item, count) in ordered {
        cumulative += count;
        selected.insert((*item).clone());
        if cumulative >= threshold {
            break;
        }
    }

    debug!("Total interactions: {}", total);
    debug!("{} ratio threshold: {}", label, threshold);
    debug!("{} item count: {}", label, selected.len());
    selected
}

// ============================================================================
// ClassificationCache
// ============================================================================

/// Memoized classification for one metric instance.
///
/// The cache holds a single entry keyed by the [`Classifier`] and the
/// popularity table's fingerprint, so a changed ratio, policy or table
/// recomputes instead of serving a stale set.
///
/// Lookups take `&mut self`: an instance serves one evaluation thread at a
/// time. Give each thread its own metric instance.
#[derive(Debug, Default)]
pub struct ClassificationCache {
    entry: Option<CacheEntry>,
}

#[derive(Debug)]
struct CacheEntry {
    classifier: Classifier,
    fingerprint: u64,
    items: Arc<ItemSet>,
}

impl ClassificationCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached set for `(classifier, table)` or computes it.
    pub fn get_or_classify(
        &mut self,
        classifier: Classifier,
        table: &PopularityTable,
    ) -> MetricResult<Arc<ItemSet>> {
        let fingerprint = table.fingerprint();
        if let Some(entry) = &self.entry {
            if entry.classifier == classifier && entry.fingerprint == fingerprint {
                return Ok(Arc::clone(&entry.items));
            }
        }

        let items = Arc::new(classifier.classify(table)?);
        self.entry = Some(CacheEntry {
            classifier,
            fingerprint,
            items: Arc::clone(&items),
        });
        Ok(items)
    }

    /// Drops the cached entry.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abcd() -> PopularityTable {
        PopularityTable::from_counts([("A", 10.0), ("B", 5.0), ("C", 3.0), ("D", 2.0)]).unwrap()
    }

    fn ids(names: &[&str]) -> ItemSet {
        names.iter().map(|n| ItemId::from(*n)).collect()
    }

    fn mass(table: &PopularityTable, set: &ItemSet) -> f64 {
        set.iter().filter_map(|item| table.get(item)).sum()
    }

    #[test]
    fn test_bottom_up_includes_crossing_item() {
        // threshold 4.0: D=2 (<4), D+C=5 (>=4)
        let tail = tail_items(&abcd(), 0.2).unwrap();
        assert_eq!(tail, ids(&["C", "D"]));
    }

    #[test]
    fn test_bottom_up_mass_bounds() {
        let table = PopularityTable::from_counts(
            (1..=40u64).map(|i| (i, ((i * 7919) % 97) as f64 + 1.0)),
        )
        .unwrap();
        let total = table.total();
        for ratio in [0.05, 0.2, 0.33, 0.5, 0.8, 0.99] {
            let tail = tail_items(&table, ratio).unwrap();
            let m = mass(&table, &tail);
            assert!(m >= ratio * total, "ratio {}: mass {} below threshold", ratio, m);
            assert!(m < ratio * total + table.max_count(), "ratio {}: overshoot", ratio);
            assert!(tail.iter().all(|item| table.get(item).is_some()));
        }
    }

    #[test]
    fn test_ratio_one_is_full_universe() {
        let table = PopularityTable::from_counts([("A", 3.0), ("B", 0.0), ("C", 1.0)]).unwrap();
        assert_eq!(tail_items(&table, 1.0).unwrap().len(), 3);
        assert_eq!(head_items(&table, 1.0).unwrap().len(), 3);
    }

    #[test]
    fn test_ratio_zero_is_empty() {
        assert!(head_items(&abcd(), 0.0).unwrap().is_empty());
        assert!(tail_items(&abcd(), 0.0).unwrap().is_empty());
    }

    #[test]
    fn test_tiny_ratio_selects_least_popular() {
        let tail = tail_items(&abcd(), 1e-9).unwrap();
        assert_eq!(tail, ids(&["D"]));
    }

    #[test]
    fn test_single_item_table() {
        let table = PopularityTable::from_counts([("only", 7.0)]).unwrap();
        assert_eq!(tail_items(&table, 0.01).unwrap(), ids(&["only"]));
        assert_eq!(head_items(&table, 0.5).unwrap(), ids(&["only"]));
    }

    #[test]
    fn test_empty_table_is_invalid_input() {
        let table = PopularityTable::default();
        assert!(matches!(
            tail_items(&table, 0.2),
            Err(MetricError::InvalidInput(_))
        ));
        assert!(head_items(&table, 0.2).is_err());
    }

    #[test]
    fn test_ties_break_by_item_id() {
        // All counts equal: ascending id order decides the tail.
        let table = PopularityTable::from_counts([("x", 1.0), ("a", 1.0), ("m", 1.0), ("b", 1.0)])
            .unwrap();
        let tail = tail_items(&table, 0.5).unwrap();
        assert_eq!(tail, ids(&["a", "b"]));

        // Head walks the reverse order.
        let head = head_items(&table, 0.5).unwrap();
        assert_eq!(head, ids(&["m", "x"]));
    }

    #[test]
    fn test_classification_is_deterministic() {
        let table = PopularityTable::from_counts((0..200u64).map(|i| (i, (i % 5) as f64))).unwrap();
        let first = tail_items(&table, 0.3).unwrap();
        for _ in 0..5 {
            assert_eq!(tail_items(&table, 0.3).unwrap(), first);
        }
    }

    #[test]
    fn test_head_accumulates_from_most_popular() {
        // threshold 0.5 * 20 = 10: A alone reaches it
        assert_eq!(head_items(&abcd(), 0.5).unwrap(), ids(&["A"]));
        // threshold 0.8 * 20 = 16: A=10, A+B=15, A+B+C=18
        assert_eq!(head_items(&abcd(), 0.8).unwrap(), ids(&["A", "B", "C"]));
    }

    #[test]
    fn test_complement_of_head_differs_from_bottom_up() {
        let table = abcd();
        // head at 0.8 = {A, B, C}, tail = {D}
        let complement = classify_tail(&table, 0.2, TailPolicy::ComplementOfHead, 0.8).unwrap();
        assert_eq!(complement, ids(&["D"]));

        let bottom_up = classify_tail(&table, 0.2, TailPolicy::BottomUp, 0.8).unwrap();
        assert_eq!(bottom_up, ids(&["C", "D"]));
    }

    #[test]
    fn test_cache_reuses_and_invalidates() {
        let table = abcd();
        let mut cache = ClassificationCache::new();
        let classifier = Classifier::Tail {
            ratio: 0.2,
            policy: TailPolicy::BottomUp,
            head_ratio: 0.8,
        };

        let first = cache.get_or_classify(classifier, &table).unwrap();
        let second = cache.get_or_classify(classifier, &table).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        // A different ratio is a different key.
        let wider = Classifier::Tail {
            ratio: 0.5,
            policy: TailPolicy::BottomUp,
            head_ratio: 0.5,
        };
        let third = cache.get_or_classify(wider, &table).unwrap();
        assert_eq!(*third, ids(&["B", "C", "D"]));

        // A different table is a different key.
        let other = PopularityTable::from_counts([("A", 1.0), ("B", 9.0)]).unwrap();
        let fourth = cache.get_or_classify(wider, &other).unwrap();
        assert_eq!(*fourth, ids(&["A", "B"]));

        cache.invalidate();
        let fifth = cache.get_or_classify(wider, &other).unwrap();
        assert!(!Arc::ptr_eq(&fourth, &fifth));
        assert_eq!(*fifth, *fourth);
    }
}
