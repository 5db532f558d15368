//! 判定結果ラベル別の集計

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::types::{ComparisonRow, ResultLabel};

/// 6分類の件数（全キーが常に存在し、未該当は0）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    counts: [usize; 6],
}

impl Summary {
    pub fn get(&self, label: ResultLabel) -> usize {
        self.counts[label.index()]
    }

    /// ラベル文字列で件数を取得（未知のラベルはNone）
    pub fn get_by_label(&self, label: &str) -> Option<usize> {
        ResultLabel::from_label(label).map(|l| self.get(l))
    }

    /// 表示順に(ラベル, 件数)を返す
    pub fn iter(&self) -> impl Iterator<Item = (ResultLabel, usize)> + '_ {
        ResultLabel::ALL.iter().map(move |l| (*l, self.get(*l)))
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

impl Serialize for Summary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(ResultLabel::ALL.len()))?;
        for (label, count) in self.iter() {
            map.serialize_entry(label.as_str(), &count)?;
        }
        map.end()
    }
}

/// 行の判定結果をラベル別に集計する
///
/// 6分類以外の判定結果は集計から除外する（サーバー側で追加された新分類など）。
pub fn summarize(rows: &[ComparisonRow]) -> Summary {
    let mut summary = Summary::default();
    for row in rows {
        if let Some(label) = ResultLabel::from_label(&row.result) {
            summary.counts[label.index()] += 1;
        }
    }
    summary
}
