//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    /// 有効な行が1つも取り出せなかった
    #[error("Parse error: no valid entries in {0}")]
    Parse(String),

    #[error("Unknown book: {0}")]
    UnknownBook(String),

    /// 既知の内蔵単語帳だが、まだ取得していない
    #[error("Book not loaded yet: {0}")]
    BookNotLoaded(String),

    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Image decode error: {0}")]
    ImageDecode(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
