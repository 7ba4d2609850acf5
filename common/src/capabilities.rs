//! 外部機能のインターフェース
//!
//! HTTP取得と画像サンプリングは実行環境側（CLI / ブラウザ）で実装する。

use crate::color::Rgba;
use crate::error::Result;

/// HTTP取得
#[allow(async_fn_in_trait)]
pub trait Fetcher {
    /// URLの内容をバイト列で取得（HTTPエラーは `Error::SourceUnavailable`）
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;

    /// URLが取得可能か確認する（失敗は false）
    async fn exists(&self, url: &str) -> bool;
}

/// 画像のデコードと縮小サンプリング
pub trait ImageSampler {
    /// 画像を `size`×`size` に縮小したRGBAピクセル列を返す
    fn sample(&self, bytes: &[u8], size: u32) -> Result<Vec<Rgba>>;
}
