//! ダウンロードファイルの保存先
//!
//! ブラウザの「名前を付けて保存」に相当する境界。同じファイルを何度保存しても
//! 上書きされるだけで、呼び出し側の状態には影響しない。

use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

pub trait DownloadSink: Send + Sync {
    /// `filename`で`bytes`を保存し、保存先パスを返す
    fn save(&self, filename: &str, bytes: &[u8]) -> io::Result<PathBuf>;
}

/// 指定ディレクトリにファイルとして書き出す
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectorySink {
    fn save(&self, filename: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        // サーバー由来の名前なのでディレクトリ成分は捨てる
        let name = Path::new(filename).file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("保存できないファイル名: {}", filename),
            )
        })?;

        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        std::fs::write(&path, bytes)?;
        info!(path = %path.display(), size = bytes.len(), "export file saved");
        Ok(path)
    }
}
