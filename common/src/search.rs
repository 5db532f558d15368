//! 比較結果の全文検索
//!
//! ロケーション・判定結果・実バーコード・期待バーコードの4項目に対して
//! 大文字小文字を区別しない部分一致で絞り込む

use crate::types::ComparisonRow;

/// 検索クエリで行を絞り込む
///
/// 元の順序を保持した部分列を返す。空クエリは全行をそのまま返す。
///
/// # Examples
/// ```
/// use inventory_report_common::{filter_rows, ComparisonRow};
///
/// let rows = vec![ComparisonRow {
///     location: "A1".to_string(),
///     actual_barcodes: vec!["X1".to_string()],
///     ..Default::default()
/// }];
/// assert_eq!(filter_rows(&rows, "x1").len(), 1);
/// assert!(filter_rows(&rows, "zz").is_empty());
/// ```
pub fn filter_rows(rows: &[ComparisonRow], query: &str) -> Vec<ComparisonRow> {
    if query.is_empty() {
        return rows.to_vec();
    }

    let needle = query.to_lowercase();
    rows.iter()
        .filter(|row| row_matches(row, &needle))
        .cloned()
        .collect()
}

/// 小文字化済みのクエリに行が一致するか
pub fn row_matches(row: &ComparisonRow, needle: &str) -> bool {
    contains_ci(&row.location, needle)
        || contains_ci(&row.result, needle)
        || row.actual_barcodes.iter().any(|b| contains_ci(b, needle))
        || row.expected_barcodes.iter().any(|b| contains_ci(b, needle))
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}
