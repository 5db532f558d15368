//! 在庫比較レポートクライアント
//!
//! - gateway: バックエンドAPI
//! - export_workflow: エクスポート作成・ダウンロードの状態管理
//! - view_model: レポート詳細ビューモデル

pub mod cli;
pub mod config;
pub mod error;
pub mod export_workflow;
pub mod gateway;
pub mod logging;
pub mod render;
pub mod sink;
pub mod view_model;

pub use export_workflow::{ExportPhase, ExportWorkflow};
pub use gateway::{DataGateway, DownloadedFile, HttpGateway};
pub use sink::{DirectorySink, DownloadSink};
pub use view_model::{ReadModel, ReportDetailViewModel};
