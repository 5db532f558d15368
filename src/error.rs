use thiserror::Error;

/// ゲートウェイ層の通信エラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// 接続失敗・タイムアウトなどのトランスポートエラー
    #[error("通信エラー: {0}")]
    Transport(String),

    /// 2xx以外のレスポンス
    #[error("HTTPエラー ({status}): {}", .body.as_deref().unwrap_or("-"))]
    Status { status: u16, body: Option<String> },

    /// レスポンスが想定した型に変換できない
    #[error("レスポンスの解析に失敗: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            NetworkError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            NetworkError::Status {
                status: status.as_u16(),
                body: None,
            }
        } else {
            NetworkError::Transport(err.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("不正な引数: {0}")]
    InvalidArgument(String),

    #[error("前提条件エラー: {0}")]
    PreconditionFailed(String),

    #[error("ダウンロードレスポンスにファイル名が含まれていません")]
    MissingFilename,

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("設定エラー: {0}")]
    Config(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl From<inventory_report_common::Error> for ClientError {
    fn from(err: inventory_report_common::Error) -> Self {
        match err {
            inventory_report_common::Error::InvalidArgument(msg) => ClientError::InvalidArgument(msg),
            inventory_report_common::Error::Json(e) => ClientError::JsonParse(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
