//! エクスポート作成・ダウンロードの状態管理
//!
//! 状態遷移:
//! - Idle → Requesting: エクスポート要求（既存レコードがあれば拒否）
//! - Requesting → Listed: 作成成功 / 失敗時はIdleに戻しエラーを記録
//! - Listed → Downloading: completedのレコードのみ
//! - Downloading → Listed: 保存成功・失敗どちらでも
//!
//! 1レポートにつきエクスポートは1件まで。

use std::path::PathBuf;

use inventory_report_common::{ExportFormat, ExportRecord, ExportRecordId, ReportId};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ClientError, Result};
use crate::gateway::DataGateway;
use crate::sink::DownloadSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportPhase {
    #[default]
    Idle,
    Requesting,
    Listed,
    Downloading,
}

impl ExportPhase {
    fn is_busy(&self) -> bool {
        matches!(self, ExportPhase::Requesting | ExportPhase::Downloading)
    }
}

#[derive(Debug, Default)]
pub struct ExportWorkflow {
    phase: ExportPhase,
    last_error: Option<String>,
}

impl ExportWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ExportPhase {
        self.phase
    }

    /// 直近のコマンド失敗メッセージ
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// エクスポートを開始できるか（レコードが1件もなく、操作中でない）
    pub fn can_initiate(&self, records: &[ExportRecord]) -> bool {
        records.is_empty() && self.phase == ExportPhase::Idle
    }

    /// 再取得したレコード一覧を反映する
    pub fn sync_records(&mut self, records: &[ExportRecord]) {
        if self.phase.is_busy() {
            return;
        }
        self.phase = if records.is_empty() {
            ExportPhase::Idle
        } else {
            ExportPhase::Listed
        };
    }

    pub fn reset(&mut self) {
        self.phase = ExportPhase::Idle;
        self.last_error = None;
    }

    /// 出力形式を検証する（失敗はlast_errorに記録）
    pub fn validate_format(&mut self, format: &str) -> Result<ExportFormat> {
        format.parse().map_err(|e: inventory_report_common::Error| self.fail(e.into()))
    }

    /// 他の前提条件で拒否したことを記録する
    pub fn reject(&mut self, reason: impl Into<String>) -> ClientError {
        self.fail(ClientError::PreconditionFailed(reason.into()))
    }

    /// エクスポートを要求する
    ///
    /// 形式の検証と1件制約の確認はゲートウェイ呼び出しの前に行う。
    pub async fn request<G>(
        &mut self,
        gateway: &G,
        report_id: ReportId,
        format: &str,
        records: &[ExportRecord],
    ) -> Result<ExportRecord>
    where
        G: DataGateway + ?Sized,
    {
        let format = self.validate_format(format)?;

        if let Some(existing) = records.first() {
            return Err(self.fail(ClientError::PreconditionFailed(format!(
                "レポート{}には既にエクスポート（id={}, {}）があります",
                report_id, existing.id, existing.status
            ))));
        }
        if self.phase.is_busy() {
            return Err(self.fail(ClientError::PreconditionFailed(
                "別のエクスポート操作が進行中です".into(),
            )));
        }

        self.phase = ExportPhase::Requesting;
        self.last_error = None;
        info!(report_id, %format, "requesting export");

        match gateway.request_export(report_id, format).await {
            Ok(record) => {
                self.phase = ExportPhase::Listed;
                Ok(record)
            }
            Err(e) => {
                warn!(report_id, error = %e, "export request failed");
                self.phase = ExportPhase::Idle;
                Err(self.fail(e.into()))
            }
        }
    }

    /// completedのレコードをダウンロードして保存する
    ///
    /// 受信したバイト列は保存後すぐに破棄する。
    pub async fn download<G, S>(
        &mut self,
        gateway: &G,
        sink: &S,
        records: &[ExportRecord],
        export_record_id: ExportRecordId,
    ) -> Result<PathBuf>
    where
        G: DataGateway + ?Sized,
        S: DownloadSink + ?Sized,
    {
        let Some(record) = records.iter().find(|r| r.id == export_record_id) else {
            return Err(self.fail(ClientError::PreconditionFailed(format!(
                "エクスポート{}が見つかりません",
                export_record_id
            ))));
        };
        if !record.status.is_completed() {
            return Err(self.fail(ClientError::PreconditionFailed(format!(
                "エクスポート{}はまだダウンロードできません（{}）",
                export_record_id, record.status
            ))));
        }
        if self.phase.is_busy() {
            return Err(self.fail(ClientError::PreconditionFailed(
                "別のエクスポート操作が進行中です".into(),
            )));
        }

        self.phase = ExportPhase::Downloading;
        self.last_error = None;
        info!(export_record_id, "downloading export");

        let result = match gateway.download_export_file(export_record_id).await {
            Ok(file) => sink.save(&file.filename, &file.bytes).map_err(ClientError::from),
            Err(e) => Err(e),
        };

        self.phase = ExportPhase::Listed;
        result.map_err(|e| {
            warn!(export_record_id, error = %e, "export download failed");
            self.fail(e)
        })
    }

    fn fail(&mut self, err: ClientError) -> ClientError {
        self.last_error = Some(err.to_string());
        err
    }
}
