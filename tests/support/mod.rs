//! テスト用のゲートウェイ・保存先
//!
//! ゲートウェイは操作ごとに成功/失敗/応答なしを切り替えられ、呼び出し回数を記録する。

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Notify;
use chrono::{TimeZone, Utc};
use inventory_report::error::{ClientError, NetworkError, Result};
use inventory_report::{DataGateway, DownloadSink, DownloadedFile};
use inventory_report_common::{
    ComparisonRow, ExportFormat, ExportRecord, ExportRecordId, Report, ReportId, ResultLabel,
    Status,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Report,
    Rows,
    Exports,
    RequestExport,
    Download,
}

#[derive(Default)]
pub struct ScriptedGateway {
    rows: Mutex<HashMap<ReportId, Vec<ComparisonRow>>>,
    exports: Mutex<HashMap<ReportId, Vec<ExportRecord>>>,
    failing: Mutex<HashSet<Op>>,
    hanging: Mutex<HashSet<Op>>,
    download: Mutex<Option<DownloadedFile>>,
    calls: Mutex<HashMap<Op, usize>>,
    held: Mutex<HashSet<(Op, usize)>>,
    release: Notify,
    next_export_id: Mutex<ExportRecordId>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            next_export_id: Mutex::new(100),
            ..Default::default()
        }
    }

    pub fn with_rows(self, report_id: ReportId, rows: Vec<ComparisonRow>) -> Self {
        self.rows.lock().unwrap().insert(report_id, rows);
        self
    }

    pub fn with_exports(self, report_id: ReportId, records: Vec<ExportRecord>) -> Self {
        self.exports.lock().unwrap().insert(report_id, records);
        self
    }

    /// ダウンロード応答（Noneならファイル名なし）
    pub fn with_download(self, filename: &str, bytes: &[u8]) -> Self {
        *self.download.lock().unwrap() = Some(DownloadedFile {
            filename: filename.to_string(),
            bytes: bytes.to_vec(),
        });
        self
    }

    pub fn failing(self, op: Op) -> Self {
        self.failing.lock().unwrap().insert(op);
        self
    }

    pub fn hanging(self, op: Op) -> Self {
        self.hanging.lock().unwrap().insert(op);
        self
    }

    /// `op`の`call`回目（1始まり）を`release`まで保留する
    pub fn holding_call(self, op: Op, call: usize) -> Self {
        self.held.lock().unwrap().insert((op, call));
        self
    }

    /// 保留中の呼び出しを1件再開する
    pub fn release(&self) {
        self.release.notify_one();
    }

    pub fn set_exports(&self, report_id: ReportId, records: Vec<ExportRecord>) {
        self.exports.lock().unwrap().insert(report_id, records);
    }

    pub fn calls(&self, op: Op) -> usize {
        self.calls.lock().unwrap().get(&op).copied().unwrap_or(0)
    }

    async fn enter(&self, op: Op) -> std::result::Result<(), NetworkError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(op).or_insert(0);
            *count += 1;
            *count
        };

        let held = self.held.lock().unwrap().contains(&(op, call));
        if held {
            self.release.notified().await;
        }

        let hang = self.hanging.lock().unwrap().contains(&op);
        if hang {
            std::future::pending::<()>().await;
        }

        if self.failing.lock().unwrap().contains(&op) {
            return Err(NetworkError::Status {
                status: 500,
                body: Some("internal error".to_string()),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DataGateway for ScriptedGateway {
    async fn fetch_report(&self, report_id: ReportId) -> std::result::Result<Report, NetworkError> {
        self.enter(Op::Report).await?;
        Ok(report(report_id))
    }

    async fn fetch_comparison_rows(
        &self,
        report_id: ReportId,
    ) -> std::result::Result<Vec<ComparisonRow>, NetworkError> {
        self.enter(Op::Rows).await?;
        Ok(self.rows.lock().unwrap().get(&report_id).cloned().unwrap_or_default())
    }

    async fn fetch_export_records(
        &self,
        report_id: ReportId,
    ) -> std::result::Result<Vec<ExportRecord>, NetworkError> {
        // 保留された呼び出しは呼び出し時点の一覧を返す
        let snapshot = self.exports.lock().unwrap().get(&report_id).cloned();
        self.enter(Op::Exports).await?;
        Ok(snapshot.unwrap_or_default())
    }

    async fn request_export(
        &self,
        report_id: ReportId,
        format: ExportFormat,
    ) -> std::result::Result<ExportRecord, NetworkError> {
        self.enter(Op::RequestExport).await?;

        let id = {
            let mut next = self.next_export_id.lock().unwrap();
            *next += 1;
            *next
        };
        let record = ExportRecord {
            id,
            file_name: format!("report_{}.{}", report_id, format),
            status: Status::Pending,
            report_id,
        };
        self.exports
            .lock()
            .unwrap()
            .entry(report_id)
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn download_export_file(&self, _export_record_id: ExportRecordId) -> Result<DownloadedFile> {
        self.enter(Op::Download).await?;
        self.download
            .lock()
            .unwrap()
            .clone()
            .ok_or(ClientError::MissingFilename)
    }
}

/// 保存内容を記録するだけの保存先
#[derive(Default)]
pub struct RecordingSink {
    saved: Mutex<Vec<(String, Vec<u8>)>>,
}

impl RecordingSink {
    pub fn saved(&self) -> Vec<(String, Vec<u8>)> {
        self.saved.lock().unwrap().clone()
    }
}

impl DownloadSink for RecordingSink {
    fn save(&self, filename: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
        self.saved
            .lock()
            .unwrap()
            .push((filename.to_string(), bytes.to_vec()));
        Ok(PathBuf::from("/downloads").join(filename))
    }
}

pub fn report(id: ReportId) -> Report {
    let created = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
    Report {
        id,
        status: Status::Completed,
        bulk_scan_file_name: format!("scan_{}.json", id),
        reference_file_name: format!("layout_{}.csv", id),
        created_at: created,
        updated_at: created,
    }
}

pub fn row(location: &str, actual: &[&str], expected: &[&str], result: ResultLabel) -> ComparisonRow {
    ComparisonRow {
        location: location.to_string(),
        scanned: true,
        occupied: !actual.is_empty(),
        actual_barcodes: actual.iter().map(|s| s.to_string()).collect(),
        expected_barcodes: expected.iter().map(|s| s.to_string()).collect(),
        result: result.as_str().to_string(),
    }
}

pub fn record(id: ExportRecordId, report_id: ReportId, status: Status) -> ExportRecord {
    ExportRecord {
        id,
        file_name: format!("report_{}.json", report_id),
        status,
        report_id,
    }
}

/// 指定操作の呼び出し回数に達するまで他タスクに実行を譲る
pub async fn wait_for_calls(gateway: &ScriptedGateway, op: Op, count: usize) {
    for _ in 0..1000 {
        if gateway.calls(op) >= count {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("{:?} was not called {} times", op, count);
}
