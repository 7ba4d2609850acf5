//! 単語帳とテーマ色の型定義
//!
//! - WordEntry: 単語と意味の1組
//! - BookKind / BookInfo: 単語帳の種類と一覧表示用の情報
//! - ThemeColor: 壁紙から導出したテーマ色

use serde::{Deserialize, Serialize};

/// 単語1件
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    pub word: String,
    /// 複数行の意味は改行文字を含んだまま保持する
    #[serde(default)]
    pub meaning: String,
}

impl WordEntry {
    pub fn new(word: impl Into<String>, meaning: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            meaning: meaning.into(),
        }
    }
}

/// 単語帳の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BookKind {
    /// ビルド時に決まっているファイル名（ネットワークから取得）
    Predefined,
    /// ユーザーがアップロードしたファイル（内容はストレージに保持）
    Imported,
}

impl std::fmt::Display for BookKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookKind::Predefined => write!(f, "predefined"),
            BookKind::Imported => write!(f, "imported"),
        }
    }
}

/// 単語帳一覧の1行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookInfo {
    pub name: String,
    pub kind: BookKind,
}

/// 単語帳の読み込み元
#[derive(Debug, Clone)]
pub enum BookSource {
    /// 内蔵単語帳（またはURL）から取得したバイト列
    Predefined { name: String, bytes: Vec<u8> },
    /// アップロードされたファイル
    Upload { name: String, bytes: Vec<u8> },
}

impl BookSource {
    pub fn name(&self) -> &str {
        match self {
            BookSource::Predefined { name, .. } | BookSource::Upload { name, .. } => name,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            BookSource::Predefined { bytes, .. } | BookSource::Upload { bytes, .. } => bytes,
        }
    }

    pub fn kind(&self) -> BookKind {
        match self {
            BookSource::Predefined { .. } => BookKind::Predefined,
            BookSource::Upload { .. } => BookKind::Imported,
        }
    }
}

/// テーマ色（各チャンネル 0-255）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ThemeColor {
    /// 既定のテーマ色
    pub const DEFAULT: ThemeColor = ThemeColor { r: 0, g: 174, b: 239 };

    pub const WHITE: ThemeColor = ThemeColor { r: 255, g: 255, b: 255 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `rgb(r, g, b)` 形式
    pub fn to_css(&self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }

    /// `rgba(r, g, b, a)` 形式
    pub fn to_css_alpha(&self, alpha: f64) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, alpha)
    }
}

impl Default for ThemeColor {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::fmt::Display for ThemeColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RGB({}, {}, {})", self.r, self.g, self.b)
    }
}
