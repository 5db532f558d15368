//! レポート詳細ビューモデル
//!
//! レポートIDを受け取り、以下の3つを並行・独立に取得する:
//! - レポートのメタデータ
//! - ロケーション別の比較結果
//! - エクスポートレコード一覧
//!
//! 取得結果はタスクからチャネル経由で届き、スライス単位でまとめて反映する。
//! 絞り込み結果と集計は比較結果（と検索クエリ）が変わるたびに再計算する。
//!
//! 各メッセージには発行時の世代・レポートID・チケットを付け、
//! 再アクティベート後に届いた古い応答は捨てる。

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use inventory_report_common::{
    filter_rows, summarize, ComparisonRow, ExportRecord, ExportRecordId, Report, ReportId,
    ResultLabel, Summary,
};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{ClientError, NetworkError, Result};
use crate::export_workflow::{ExportPhase, ExportWorkflow};
use crate::gateway::DataGateway;
use crate::sink::DownloadSink;

/// 取得対象のスライス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slice {
    Report,
    Rows,
    Exports,
}

impl Slice {
    fn index(&self) -> usize {
        *self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LoadingFlags {
    pub report: bool,
    pub rows: bool,
    pub exports: bool,
}

/// スライスごとのエラー（取得失敗）と直近のエクスポート操作エラー
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ErrorFlags {
    pub report: Option<String>,
    pub rows: Option<String>,
    pub exports: Option<String>,
    pub export_command: Option<String>,
}

/// 表示層に公開する読み取りモデル
#[derive(Debug, Clone, Serialize)]
pub struct ReadModel {
    pub report_id: Option<ReportId>,
    pub report: Option<Report>,
    pub search_query: String,
    pub filtered_rows: Vec<ComparisonRow>,
    pub total_rows: usize,
    pub summary: Summary,
    pub export_records: Vec<ExportRecord>,
    pub export_phase: ExportPhase,
    /// エクスポートボタンの有効状態
    pub export_enabled: bool,
    pub loading: LoadingFlags,
    pub errors: ErrorFlags,
}

enum SliceUpdate {
    Report(std::result::Result<Report, NetworkError>),
    Rows(std::result::Result<Vec<ComparisonRow>, NetworkError>),
    Exports(std::result::Result<Vec<ExportRecord>, NetworkError>),
}

impl SliceUpdate {
    fn slice(&self) -> Slice {
        match self {
            SliceUpdate::Report(_) => Slice::Report,
            SliceUpdate::Rows(_) => Slice::Rows,
            SliceUpdate::Exports(_) => Slice::Exports,
        }
    }
}

struct Tagged {
    generation: u64,
    report_id: ReportId,
    ticket: u64,
    update: SliceUpdate,
}

/// 1回のアクティベーションが所有する状態
#[derive(Default)]
struct Session {
    report: Option<Report>,
    rows: Vec<ComparisonRow>,
    exports: Vec<ExportRecord>,
    loading: LoadingFlags,
    errors: ErrorFlags,
    /// スライスごとの最新チケット（古い取得結果を上書きしないため）
    latest_ticket: [u64; 3],
    in_flight: usize,
}

pub struct ReportDetailViewModel<G: DataGateway + 'static> {
    gateway: Arc<G>,
    sink: Arc<dyn DownloadSink>,
    report_id: Option<ReportId>,
    generation: u64,
    next_ticket: u64,
    session: Session,
    search_query: String,
    filtered_rows: Vec<ComparisonRow>,
    summary: Summary,
    workflow: ExportWorkflow,
    tx: mpsc::UnboundedSender<Tagged>,
    rx: mpsc::UnboundedReceiver<Tagged>,
    tasks: Vec<JoinHandle<()>>,
}

impl<G: DataGateway + 'static> ReportDetailViewModel<G> {
    pub fn new(gateway: Arc<G>, sink: Arc<dyn DownloadSink>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            gateway,
            sink,
            report_id: None,
            generation: 0,
            next_ticket: 0,
            session: Session::default(),
            search_query: String::new(),
            filtered_rows: Vec::new(),
            summary: Summary::default(),
            workflow: ExportWorkflow::new(),
            tx,
            rx,
            tasks: Vec::new(),
        }
    }

    /// レポートを表示対象にし、3つの取得を並行に開始する
    ///
    /// 前回のアクティベーションの取得は中断し、その応答は反映しない。
    /// tokioランタイム上で呼び出すこと。
    pub fn activate(&mut self, report_id: ReportId) {
        self.abort_tasks();
        self.generation += 1;
        self.report_id = Some(report_id);
        self.session = Session::default();
        self.search_query.clear();
        self.workflow.reset();
        self.recompute_all();

        info!(report_id, generation = self.generation, "activating report detail");

        let gateway = Arc::clone(&self.gateway);
        self.spawn_fetch(Slice::Report, async move {
            SliceUpdate::Report(gateway.fetch_report(report_id).await)
        });

        let gateway = Arc::clone(&self.gateway);
        self.spawn_fetch(Slice::Rows, async move {
            SliceUpdate::Rows(gateway.fetch_comparison_rows(report_id).await)
        });

        self.spawn_exports_fetch(report_id);
    }

    /// 表示対象を外し、取得中のタスクを中断する
    pub fn deactivate(&mut self) {
        self.abort_tasks();
        self.generation += 1;
        self.report_id = None;
        self.session = Session::default();
        self.search_query.clear();
        self.workflow.reset();
        self.recompute_all();
    }

    pub fn report_id(&self) -> Option<ReportId> {
        self.report_id
    }

    pub fn report(&self) -> Option<&Report> {
        self.session.report.as_ref()
    }

    pub fn filtered_rows(&self) -> &[ComparisonRow] {
        &self.filtered_rows
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn export_records(&self) -> &[ExportRecord] {
        &self.session.exports
    }

    /// 取得中のリクエスト数（現在の世代のみ）
    pub fn in_flight(&self) -> usize {
        self.session.in_flight
    }

    pub fn read_model(&self) -> ReadModel {
        let mut errors = self.session.errors.clone();
        errors.export_command = self.workflow.last_error().map(str::to_string);

        ReadModel {
            report_id: self.report_id,
            report: self.session.report.clone(),
            search_query: self.search_query.clone(),
            filtered_rows: self.filtered_rows.clone(),
            total_rows: self.session.rows.len(),
            summary: self.summary,
            export_records: self.session.exports.clone(),
            export_phase: self.workflow.phase(),
            export_enabled: self.export_enabled(),
            loading: self.session.loading,
            errors,
        }
    }

    pub fn export_enabled(&self) -> bool {
        self.report_id.is_some()
            && !self.session.loading.exports
            && self.session.errors.exports.is_none()
            && self.workflow.can_initiate(&self.session.exports)
    }

    // ---- コマンド ----

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
        self.recompute_filtered();
    }

    /// 集計の件数クリック: そのラベルで絞り込む
    pub fn select_summary_category(&mut self, label: ResultLabel) {
        self.set_search_query(label.as_str());
    }

    /// エクスポートを要求する
    ///
    /// ゲートウェイまで到達した場合は成否に関わらず一覧を再取得する。
    pub async fn initiate_export(&mut self, format: &str) -> Result<ExportRecord> {
        let report_id = self.require_report()?;
        self.apply_pending();

        // 形式エラーは一覧の状態より先に報告する
        self.workflow.validate_format(format)?;

        if self.session.loading.exports {
            return Err(self.workflow.reject("エクスポート一覧の取得中です"));
        }
        if let Some(err) = &self.session.errors.exports {
            // 既存レコードの有無が不明なので作成しない
            let reason = format!("エクスポート一覧を取得できていません: {}", err);
            return Err(self.workflow.reject(reason));
        }

        let result = self
            .workflow
            .request(self.gateway.as_ref(), report_id, format, &self.session.exports)
            .await;

        match &result {
            Ok(record) => {
                if !self.session.exports.iter().any(|r| r.id == record.id) {
                    self.session.exports.push(record.clone());
                }
                self.refresh_exports();
            }
            Err(ClientError::Network(_)) => self.refresh_exports(),
            Err(_) => {}
        }

        result
    }

    /// エクスポートファイルをダウンロードし保存先パスを返す
    pub async fn download_export(&mut self, export_record_id: ExportRecordId) -> Result<PathBuf> {
        self.require_report()?;
        self.apply_pending();

        self.workflow
            .download(
                self.gateway.as_ref(),
                self.sink.as_ref(),
                &self.session.exports,
                export_record_id,
            )
            .await
    }

    /// エクスポートレコード一覧を再取得する（ポーリングはしない）
    pub fn refresh_exports(&mut self) {
        if let Some(report_id) = self.report_id {
            self.spawn_exports_fetch(report_id);
        }
    }

    /// エクスポートダイアログを閉じた時も一覧を再取得する
    pub fn close_export_dialog(&mut self) {
        self.refresh_exports();
    }

    // ---- 取得結果の反映 ----

    /// 届いている取得結果をすべて反映し、反映した件数を返す（待機しない）
    pub fn apply_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(msg) = self.rx.try_recv() {
            if self.apply(msg).is_some() {
                applied += 1;
            }
        }
        applied
    }

    /// 次の取得結果を待って反映する
    ///
    /// 取得中のリクエストがなければNone。
    pub async fn next_update(&mut self) -> Option<Slice> {
        while self.session.in_flight > 0 {
            let msg = self.rx.recv().await?;
            if let Some(slice) = self.apply(msg) {
                return Some(slice);
            }
        }
        None
    }

    /// 取得中のリクエストがすべて完了するまで待つ
    pub async fn settle(&mut self) {
        while self.next_update().await.is_some() {}
    }

    fn apply(&mut self, msg: Tagged) -> Option<Slice> {
        if msg.generation != self.generation || Some(msg.report_id) != self.report_id {
            debug!(
                report_id = msg.report_id,
                generation = msg.generation,
                "discarding stale response"
            );
            return None;
        }

        self.session.in_flight = self.session.in_flight.saturating_sub(1);

        let slice = msg.update.slice();
        if msg.ticket != self.session.latest_ticket[slice.index()] {
            debug!(?slice, ticket = msg.ticket, "discarding superseded response");
            return None;
        }

        match msg.update {
            SliceUpdate::Report(result) => {
                self.session.loading.report = false;
                match result {
                    Ok(report) => {
                        self.session.report = Some(report);
                        self.session.errors.report = None;
                    }
                    Err(e) => {
                        warn!(report_id = msg.report_id, error = %e, "failed to fetch report");
                        self.session.errors.report = Some(e.to_string());
                    }
                }
            }
            SliceUpdate::Rows(result) => {
                self.session.loading.rows = false;
                match result {
                    Ok(rows) => {
                        debug!(report_id = msg.report_id, rows = rows.len(), "comparison rows loaded");
                        self.session.rows = rows;
                        self.session.errors.rows = None;
                        self.recompute_all();
                    }
                    Err(e) => {
                        warn!(report_id = msg.report_id, error = %e, "failed to fetch comparison rows");
                        self.session.errors.rows = Some(e.to_string());
                    }
                }
            }
            SliceUpdate::Exports(result) => {
                self.session.loading.exports = false;
                match result {
                    Ok(records) => {
                        self.session.exports = records;
                        self.session.errors.exports = None;
                        self.workflow.sync_records(&self.session.exports);
                    }
                    Err(e) => {
                        warn!(report_id = msg.report_id, error = %e, "failed to fetch export records");
                        self.session.errors.exports = Some(e.to_string());
                    }
                }
            }
        }

        Some(slice)
    }

    // ---- 内部処理 ----

    fn require_report(&self) -> Result<ReportId> {
        self.report_id
            .ok_or_else(|| ClientError::PreconditionFailed("レポートが選択されていません".into()))
    }

    fn spawn_exports_fetch(&mut self, report_id: ReportId) {
        let gateway = Arc::clone(&self.gateway);
        self.spawn_fetch(Slice::Exports, async move {
            SliceUpdate::Exports(gateway.fetch_export_records(report_id).await)
        });
    }

    fn spawn_fetch<F>(&mut self, slice: Slice, fetch: F)
    where
        F: Future<Output = SliceUpdate> + Send + 'static,
    {
        let Some(report_id) = self.report_id else {
            return;
        };

        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.session.latest_ticket[slice.index()] = ticket;
        self.session.in_flight += 1;
        match slice {
            Slice::Report => self.session.loading.report = true,
            Slice::Rows => self.session.loading.rows = true,
            Slice::Exports => self.session.loading.exports = true,
        }

        let tx = self.tx.clone();
        let generation = self.generation;
        let handle = tokio::spawn(async move {
            let update = fetch.await;
            // 受信側が破棄済みなら結果も不要
            let _ = tx.send(Tagged {
                generation,
                report_id,
                ticket,
                update,
            });
        });

        self.tasks.retain(|t| !t.is_finished());
        self.tasks.push(handle);
    }

    fn abort_tasks(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    fn recompute_all(&mut self) {
        self.summary = summarize(&self.session.rows);
        self.recompute_filtered();
    }

    fn recompute_filtered(&mut self) {
        self.filtered_rows = filter_rows(&self.session.rows, &self.search_query);
    }
}

impl<G: DataGateway + 'static> Drop for ReportDetailViewModel<G> {
    fn drop(&mut self) {
        self.abort_tasks();
    }
}
