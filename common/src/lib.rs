//! Wordcard Common Library
//!
//! 単語カード表示の中核ロジック:
//! - 文字コード判定とCSV単語帳のパース
//! - 単語帳ストアとランダム出題（キーバリューストアで永続化）
//! - 壁紙の平均色からテーマ色を導出

pub mod capabilities;
pub mod color;
pub mod encoding;
pub mod error;
pub mod parser;
pub mod settings;
pub mod storage;
pub mod types;
pub mod vocabulary;
pub mod wallpaper;

pub use capabilities::{Fetcher, ImageSampler};
pub use color::{ensure_contrast_with_white, text_tone_for_background, TextTone, ThemePalette};
pub use error::{Error, Result};
pub use parser::{parse_csv, to_csv};
pub use settings::{Settings, SettingsManager};
pub use storage::{KeyValueStore, MemoryStore};
pub use types::{BookInfo, BookKind, BookSource, ThemeColor, WordEntry};
pub use vocabulary::VocabularyStore;
pub use wallpaper::{WallpaperManager, YearMonth};
