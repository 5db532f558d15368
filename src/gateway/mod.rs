//! バックエンドAPIへのデータゲートウェイ
//!
//! ビューモデルが必要とする5操作をトレイトとして定義する。
//! リトライは行わない（呼び出し側の責務）。

mod http;

pub use self::http::HttpGateway;

use async_trait::async_trait;
use inventory_report_common::{
    ComparisonRow, ExportFormat, ExportRecord, ExportRecordId, Report, ReportId,
};

use crate::error::{NetworkError, Result};

/// ダウンロードしたエクスポートファイル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    /// Content-Dispositionから復元したファイル名（空にはならない）
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait DataGateway: Send + Sync {
    async fn fetch_report(&self, report_id: ReportId) -> std::result::Result<Report, NetworkError>;

    async fn fetch_comparison_rows(
        &self,
        report_id: ReportId,
    ) -> std::result::Result<Vec<ComparisonRow>, NetworkError>;

    /// 返されるレコードの`report_id`には`report_id`が設定される
    async fn fetch_export_records(
        &self,
        report_id: ReportId,
    ) -> std::result::Result<Vec<ExportRecord>, NetworkError>;

    async fn request_export(
        &self,
        report_id: ReportId,
        format: ExportFormat,
    ) -> std::result::Result<ExportRecord, NetworkError>;

    /// ファイル名が取得できない場合は`ClientError::MissingFilename`
    async fn download_export_file(&self, export_record_id: ExportRecordId) -> Result<DownloadedFile>;
}
