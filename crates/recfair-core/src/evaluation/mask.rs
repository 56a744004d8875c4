//! Relevance masks: which ranked positions hold a classified item.

use crate::evaluation::items::{RecommendationMatrix, ScoreMatrix};
use crate::evaluation::popularity::ItemSet;

/// Marks every cell whose item belongs to `members` with 1.0, else 0.0.
///
/// The output has the shape of `matrix`. Membership uses the hash set, so
/// the cost is one O(1) lookup per cell regardless of how large the
/// classified set is.
pub fn build_mask(matrix: &RecommendationMatrix, members: &ItemSet) -> ScoreMatrix {
    matrix.map(|item| if members.contains(item) { 1.0 } else { 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::items::{ItemId, Matrix};

    fn rec(rows: &[&[&str]]) -> RecommendationMatrix {
        Matrix::from_rows(
            rows.iter()
                .map(|row| row.iter().map(|id| ItemId::from(*id)).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_mask_marks_members() {
        let matrix = rec(&[&["A", "D", "B", "C", "A"]]);
        let tail: ItemSet = ["C", "D"].iter().map(|id| ItemId::from(*id)).collect();

        let mask = build_mask(&matrix, &tail);
        assert_eq!(mask.as_slice(), &[0.0, 1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_mask_preserves_shape_and_values() {
        let matrix = rec(&[&["A", "B", "C"], &["C", "C", "Z"], &["Z", "A", "B"]]);
        let members: ItemSet = ["C", "Z"].iter().map(|id| ItemId::from(*id)).collect();

        let mask = build_mask(&matrix, &members);
        assert_eq!(mask.shape(), matrix.shape());
        for (items, flags) in matrix.iter_rows().zip(mask.iter_rows()) {
            for (item, &flag) in items.iter().zip(flags) {
                assert!(flag == 0.0 || flag == 1.0);
                assert_eq!(flag == 1.0, members.contains(item));
            }
        }
    }

    #[test]
    fn test_mask_with_empty_set_is_all_zero() {
        let matrix = rec(&[&["A", "B"], &["C", "D"]]);
        let mask = build_mask(&matrix, &ItemSet::new());
        assert!(mask.as_slice().iter().all(|&v| v == 0.0));
    }
}
