//! reqwestによるDataGateway実装
//!
//! エンドポイント:
//! - GET  /inventory-comparison-reports[/{id}[/data|/exports]]
//! - POST /inventory-comparison-reports（multipart）
//! - GET  /bulk-scan-records
//! - POST /export-report-records
//! - GET  /export-report-records/{id}/download

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use inventory_report_common::{
    filename_from_disposition, BulkScanRecord, ComparisonRow, ExportFormat, ExportRecord,
    ExportRecordId, Report, ReportId,
};
use reqwest::header::CONTENT_DISPOSITION;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::{DataGateway, DownloadedFile};
use crate::config::Config;
use crate::error::{ClientError, NetworkError, Result};

/// レポート作成APIのレスポンス（`{"id": ...}`）
#[derive(Debug, Deserialize)]
struct CreatedReport {
    id: ReportId,
}

/// バックエンドのHTTPクライアント
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// 設定からクライアントを構築（タイムアウト未指定時はreqwestの既定値）
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::Config(format!("HTTPクライアントの初期化に失敗: {}", e)))?;
        Ok(Self::with_client(client, config.base_url.clone()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// レポート一覧
    pub async fn list_reports(&self) -> std::result::Result<Vec<Report>, NetworkError> {
        self.get_json("/inventory-comparison-reports").await
    }

    /// バルクスキャンレコード一覧
    pub async fn list_bulk_scan_records(
        &self,
    ) -> std::result::Result<Vec<BulkScanRecord>, NetworkError> {
        self.get_json("/bulk-scan-records").await
    }

    /// 参照CSVをアップロードしてレポートを作成
    pub async fn create_report(&self, bulk_scan_file_name: &str, csv_path: &Path) -> Result<Report> {
        let bytes = tokio::fs::read(csv_path).await?;
        let file_name = csv_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "reference.csv".to_string());

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("text/csv")
            .map_err(NetworkError::from)?;
        let form = reqwest::multipart::Form::new()
            .text("bulkScanFileName", bulk_scan_file_name.to_string())
            .part("csvFile", part);

        debug!(bulk_scan_file_name, csv = %csv_path.display(), "creating report");
        let response = self
            .client
            .post(self.url("/inventory-comparison-reports"))
            .multipart(form)
            .send()
            .await
            .map_err(NetworkError::from)?;

        // 作成APIはIDだけを返すので詳細は取り直す
        let created: CreatedReport = parse_json(response).await?;
        debug!(report_id = created.id, "report created");
        Ok(self.fetch_report(created.id).await?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> std::result::Result<T, NetworkError> {
        debug!(path, "GET");
        let response = self.client.get(self.url(path)).send().await?;
        parse_json(response).await
    }
}

#[async_trait]
impl DataGateway for HttpGateway {
    async fn fetch_report(&self, report_id: ReportId) -> std::result::Result<Report, NetworkError> {
        self.get_json(&format!("/inventory-comparison-reports/{}", report_id))
            .await
    }

    async fn fetch_comparison_rows(
        &self,
        report_id: ReportId,
    ) -> std::result::Result<Vec<ComparisonRow>, NetworkError> {
        self.get_json(&format!("/inventory-comparison-reports/{}/data", report_id))
            .await
    }

    async fn fetch_export_records(
        &self,
        report_id: ReportId,
    ) -> std::result::Result<Vec<ExportRecord>, NetworkError> {
        let mut records: Vec<ExportRecord> = self
            .get_json(&format!("/inventory-comparison-reports/{}/exports", report_id))
            .await?;
        for record in &mut records {
            record.report_id = report_id;
        }
        Ok(records)
    }

    async fn request_export(
        &self,
        report_id: ReportId,
        format: ExportFormat,
    ) -> std::result::Result<ExportRecord, NetworkError> {
        let body = serde_json::json!({
            "reportRecordId": report_id,
            "reportType": format,
        });

        debug!(report_id, %format, "POST /export-report-records");
        let response = self
            .client
            .post(self.url("/export-report-records"))
            .json(&body)
            .send()
            .await?;

        let mut record: ExportRecord = parse_json(response).await?;
        record.report_id = report_id;
        Ok(record)
    }

    async fn download_export_file(&self, export_record_id: ExportRecordId) -> Result<DownloadedFile> {
        let path = format!("/export-report-records/{}/download", export_record_id);
        debug!(path = %path, "GET");
        let response = self
            .client
            .get(self.url(&path))
            .send()
            .await
            .map_err(NetworkError::from)?;

        read_download(response).await
    }
}

/// 2xx以外をNetworkError::Statusに変換
async fn ensure_success(
    response: reqwest::Response,
) -> std::result::Result<reqwest::Response, NetworkError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.ok().filter(|b| !b.is_empty());
        return Err(NetworkError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

async fn parse_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> std::result::Result<T, NetworkError> {
    let response = ensure_success(response).await?;
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| NetworkError::Decode(e.to_string()))
}

/// ダウンロードレスポンスからファイル名と本文を取り出す
async fn read_download(response: reqwest::Response) -> Result<DownloadedFile> {
    let response = ensure_success(response).await?;

    let filename = response
        .headers()
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(filename_from_disposition)
        .ok_or(ClientError::MissingFilename)?;

    let bytes = response.bytes().await.map_err(NetworkError::from)?;
    Ok(DownloadedFile {
        filename,
        bytes: bytes.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_response(status: u16, body: &'static str) -> reqwest::Response {
        reqwest::Response::from(::http::Response::builder().status(status).body(body).unwrap())
    }

    fn mock_download(disposition: Option<&str>, body: &'static str) -> reqwest::Response {
        let mut builder = ::http::Response::builder().status(200);
        if let Some(value) = disposition {
            builder = builder.header("Content-Disposition", value);
        }
        reqwest::Response::from(builder.body(body).unwrap())
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        let gateway = HttpGateway::new("http://localhost:8080/");
        assert_eq!(
            gateway.url("/inventory-comparison-reports/1"),
            "http://localhost:8080/inventory-comparison-reports/1"
        );
    }

    #[tokio::test]
    async fn test_ensure_success_status_with_body() {
        let err = ensure_success(mock_response(500, r#"{"error":"boom"}"#))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            NetworkError::Status {
                status: 500,
                body: Some(r#"{"error":"boom"}"#.to_string())
            }
        );
    }

    #[tokio::test]
    async fn test_ensure_success_status_without_body() {
        let err = ensure_success(mock_response(404, "")).await.unwrap_err();
        assert_eq!(err, NetworkError::Status { status: 404, body: None });
    }

    #[tokio::test]
    async fn test_parse_json_rows() {
        let body = r#"[{"location":"A1","scanned":true,"occupied":true,
            "actualBarcodes":["X1"],"expectedBarcodes":["X1"],
            "result":"The location was occupied by the expected items"}]"#;
        let rows: Vec<ComparisonRow> = parse_json(mock_response(200, body)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].location, "A1");
    }

    #[tokio::test]
    async fn test_parse_json_created_report_id_only() {
        let created: CreatedReport = parse_json(mock_response(200, r#"{"id":5}"#)).await.unwrap();
        assert_eq!(created.id, 5);

        // IDだけのレスポンスはReportとしては読めない
        let err = parse_json::<Report>(mock_response(200, r#"{"id":5}"#))
            .await
            .unwrap_err();
        assert!(matches!(err, NetworkError::Decode(_)));
    }

    #[tokio::test]
    async fn test_parse_json_malformed_is_decode_error() {
        let err = parse_json::<Vec<ComparisonRow>>(mock_response(200, r#"{"not":"a list"}"#))
            .await
            .unwrap_err();
        assert!(matches!(err, NetworkError::Decode(_)));
    }

    #[tokio::test]
    async fn test_read_download_with_filename() {
        let response = mock_download(Some("attachment; filename=report_1.json"), "{}");
        let file = read_download(response).await.unwrap();
        assert_eq!(file.filename, "report_1.json");
        assert_eq!(file.bytes, b"{}".to_vec());
    }

    #[tokio::test]
    async fn test_read_download_missing_filename() {
        let err = read_download(mock_download(None, "{}")).await.unwrap_err();
        assert!(matches!(err, ClientError::MissingFilename));

        let err = read_download(mock_download(Some("attachment"), "{}"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::MissingFilename));
    }

    #[tokio::test]
    async fn test_read_download_error_status() {
        let err = read_download(mock_response(500, "")).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Network(NetworkError::Status { status: 500, .. })
        ));
    }
}
