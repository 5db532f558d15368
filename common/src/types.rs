//! レポート関連の型定義
//!
//! CLIとビューモデルで共有される型:
//! - Report: 比較レポートのメタデータ
//! - ComparisonRow: ロケーション単位の比較結果（スキャン vs 期待値）
//! - ExportRecord: サーバー側で生成されるエクスポートファイルの管理レコード
//!
//! JSONはバックエンドに合わせてcamelCase

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

pub type ReportId = u64;
pub type ExportRecordId = u64;

/// レポート/エクスポートの処理ステータス
///
/// 未知の値（例: "processing"）は`Other`として保持する
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Pending,
    Completed,
    Failed,
    Other(String),
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Status::Pending => "pending",
            Status::Completed => "completed",
            Status::Failed => "failed",
            Status::Other(s) => s.as_str(),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Status::Completed)
    }
}

impl From<&str> for Status {
    fn from(s: &str) -> Self {
        match s {
            "pending" => Status::Pending,
            "completed" => Status::Completed,
            "failed" => Status::Failed,
            other => Status::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Status::from(s.as_str()))
    }
}

/// 在庫比較レポート
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: ReportId,

    pub status: Status,

    /// バルクスキャン元ファイル名
    #[serde(default)]
    pub bulk_scan_file_name: String,

    /// 参照（期待レイアウト）CSVファイル名
    #[serde(default)]
    pub reference_file_name: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// ロケーション単位の比較結果
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub location: String,

    #[serde(default)]
    pub scanned: bool,

    #[serde(default)]
    pub occupied: bool,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub actual_barcodes: Vec<String>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub expected_barcodes: Vec<String>,

    /// 判定結果ラベル（通常は[`ResultLabel`]のいずれか）
    #[serde(default)]
    pub result: String,
}

/// エクスポートレコード
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecord {
    pub id: ExportRecordId,

    /// 作成直後のレスポンスは`id`のみの場合がある
    #[serde(default)]
    pub file_name: String,

    #[serde(default)]
    pub status: Status,

    /// レスポンスには含まれないため、ゲートウェイがリクエスト時のIDを設定する
    #[serde(default)]
    pub report_id: ReportId,
}

/// バルクスキャンレコード（レポート作成時の選択肢）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkScanRecord {
    pub id: u64,

    pub file_name: String,

    #[serde(default)]
    pub status: Status,
}

/// エクスポート形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            _ => Err(Error::InvalidArgument(format!(
                "unsupported export format: {}. Use json or csv",
                s
            ))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 比較結果の分類ラベル（表示順）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultLabel {
    EmptyAsExpected,
    EmptyButExpectedOccupied,
    OccupiedByExpectedItems,
    OccupiedByWrongItems,
    OccupiedBarcodeNotIdentified,
    OccupiedButExpectedEmpty,
}

impl ResultLabel {
    pub const ALL: [ResultLabel; 6] = [
        ResultLabel::EmptyAsExpected,
        ResultLabel::EmptyButExpectedOccupied,
        ResultLabel::OccupiedByExpectedItems,
        ResultLabel::OccupiedByWrongItems,
        ResultLabel::OccupiedBarcodeNotIdentified,
        ResultLabel::OccupiedButExpectedEmpty,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResultLabel::EmptyAsExpected => "The location was empty, as expected",
            ResultLabel::EmptyButExpectedOccupied => {
                "The location was empty, but it should have been occupied"
            }
            ResultLabel::OccupiedByExpectedItems => "The location was occupied by the expected items",
            ResultLabel::OccupiedByWrongItems => "The location was occupied by the wrong items",
            ResultLabel::OccupiedBarcodeNotIdentified => {
                "The location was occupied, but no barcode could be identified"
            }
            ResultLabel::OccupiedButExpectedEmpty => {
                "The location was occupied by an item, but should have been empty"
            }
        }
    }

    /// 完全一致でラベルを判定（未知のラベルはNone）
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|l| l.as_str() == label)
    }

    /// [`ResultLabel::ALL`]内の位置
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for ResultLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
