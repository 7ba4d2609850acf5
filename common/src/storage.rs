//! キーバリュー永続化インターフェース
//!
//! ブラウザの localStorage 相当。値は JSON テキストとして保存する。
//! 読み込み時に欠落・破損していれば呼び出し側の既定値を返し、エラーにはしない。

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// ストレージのキー
pub mod keys {
    pub const WORD_ENTRIES: &str = "wordcard_word_entries";
    pub const CURRENT_INDEX: &str = "wordcard_current_index";
    pub const CURRENT_BOOK: &str = "wordcard_current_book";
    pub const CLICK_COUNT: &str = "wordcard_click_count";
    pub const SETTINGS: &str = "wordcard_settings";
    pub const IMPORTED_BOOKS: &str = "wordcard_imported_books";
    pub const IMPORTED_BOOK_CONTENTS: &str = "wordcard_imported_book_contents";
}

/// キーバリューストア
///
/// 書き込みは呼び出しごとに即時反映する（バッチしない）。
/// 実装は内部で書き込みを直列化すること。
pub trait KeyValueStore {
    fn get_raw(&self, key: &str) -> Option<String>;

    fn set_raw(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// 全キーを削除
    fn clear(&self) -> Result<()>;

    /// 複数のキーをまとめて書き込む
    ///
    /// 実装は可能なら1回の書き込みで反映すること（途中で失敗しても
    /// 一部のキーだけ新しい状態にならないように）。
    fn set_raw_many(&self, pairs: &[(&str, String)]) -> Result<()> {
        for (key, value) in pairs {
            self.set_raw(key, value)?;
        }
        Ok(())
    }

    /// JSONとして読み込む（欠落・破損時は既定値）
    fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T
    where
        Self: Sized,
    {
        let Some(raw) = self.get_raw(key) else {
            return default;
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "ストレージの読み込みに失敗、既定値を使用");
                default
            }
        }
    }

    /// JSONとして書き込む
    fn set_value<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()>
    where
        Self: Sized,
    {
        let raw = serde_json::to_string(value)?;
        self.set_raw(key, &raw)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get_raw(&self, key: &str) -> Option<String> {
        (**self).get_raw(key)
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        (**self).set_raw(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }

    fn set_raw_many(&self, pairs: &[(&str, String)]) -> Result<()> {
        (**self).set_raw_many(pairs)
    }
}

/// メモリ上のストア（テスト・一時利用向け）
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.lock().clear();
        Ok(())
    }

    fn set_raw_many(&self, pairs: &[(&str, String)]) -> Result<()> {
        let mut entries = self.lock();
        for (key, value) in pairs {
            entries.insert(key.to_string(), value.clone());
        }
        Ok(())
    }
}
