//! 単語帳ストアとランダム出題
//!
//! 現在の単語リスト・選択位置・単語帳カタログ（内蔵 + インポート）を保持し、
//! 変更のたびにキーバリューストアへ書き戻す。

use crate::encoding;
use crate::error::{Error, Result};
use crate::parser::parse_csv;
use crate::storage::{keys, KeyValueStore};
use crate::types::{BookInfo, BookKind, BookSource, WordEntry};
use rand::Rng;
use std::collections::HashMap;

/// 単語が無いときに返す表示用エントリ
pub const EMPTY_WORD: &str = "no words";
pub const EMPTY_MEANING: &str = "import a word list";

/// 永続化される単語帳の状態
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VocabularyState {
    pub entries: Vec<WordEntry>,
    /// 最後に表示した単語の位置（未選択は None、保存時は -1）
    pub current_index: Option<usize>,
    pub current_book_name: String,
    /// インポート順（新しいものを先頭に移動しない）
    pub imported_book_names: Vec<String>,
    pub imported_book_contents: HashMap<String, Vec<WordEntry>>,
}

impl VocabularyState {
    /// ストアから復元（欠落・破損した項目は既定値）
    pub fn restore<S: KeyValueStore>(storage: &S) -> Self {
        let entries: Vec<WordEntry> = storage.get_or(keys::WORD_ENTRIES, Vec::new());
        let raw_index: i64 = storage.get_or(keys::CURRENT_INDEX, -1);
        let current_index = usize::try_from(raw_index)
            .ok()
            .filter(|&i| i < entries.len());

        Self {
            current_index,
            current_book_name: storage.get_or(keys::CURRENT_BOOK, String::new()),
            imported_book_names: storage.get_or(keys::IMPORTED_BOOKS, Vec::new()),
            imported_book_contents: storage.get_or(keys::IMPORTED_BOOK_CONTENTS, HashMap::new()),
            entries,
        }
    }

    /// 保存用の位置（未選択は -1）
    pub fn stored_index(&self) -> i64 {
        self.current_index.map(|i| i as i64).unwrap_or(-1)
    }
}

/// 単語帳ストア
pub struct VocabularyStore<S: KeyValueStore> {
    storage: S,
    predefined: Vec<String>,
    /// 取得済みの内蔵単語帳（再取得せずに切り替えるため）
    predefined_cache: HashMap<String, Vec<WordEntry>>,
    state: VocabularyState,
}

impl<S: KeyValueStore> VocabularyStore<S> {
    /// ストアから状態を復元して生成
    ///
    /// `predefined` は内蔵単語帳のファイル名（一覧の表示順）
    pub fn open(storage: S, predefined: Vec<String>) -> Self {
        let state = VocabularyState::restore(&storage);
        tracing::debug!(
            entries = state.entries.len(),
            book = %state.current_book_name,
            imported = state.imported_book_names.len(),
            "単語帳の状態を復元"
        );

        Self {
            storage,
            predefined,
            predefined_cache: HashMap::new(),
            state,
        }
    }

    pub fn state(&self) -> &VocabularyState {
        &self.state
    }

    pub fn entries(&self) -> &[WordEntry] {
        &self.state.entries
    }

    pub fn is_empty(&self) -> bool {
        self.state.entries.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.state.current_index
    }

    pub fn current_book(&self) -> &str {
        &self.state.current_book_name
    }

    pub fn current_entry(&self) -> Option<&WordEntry> {
        self.state
            .current_index
            .and_then(|i| self.state.entries.get(i))
    }

    pub fn predefined_books(&self) -> &[String] {
        &self.predefined
    }

    pub fn is_predefined(&self, name: &str) -> bool {
        self.predefined.iter().any(|p| p == name)
    }

    pub fn is_imported(&self, name: &str) -> bool {
        self.state.imported_book_contents.contains_key(name)
    }

    /// バイト列から単語帳を読み込み、現在の単語帳にする
    ///
    /// 有効な行が無ければ状態を変えずに `Error::Parse` を返す。
    /// 成功時は読み込んだ単語数を返す。
    pub fn load_book_from_source(&mut self, source: BookSource) -> Result<usize> {
        let text = encoding::detect(source.bytes());
        let entries = parse_csv(&text);

        if entries.is_empty() {
            tracing::error!(book = source.name(), "CSVの形式が正しくありません。有効な単語が見つかりません");
            return Err(Error::Parse(source.name().to_string()));
        }

        let count = entries.len();
        let kind = source.kind();
        match source {
            BookSource::Upload { name, .. } => {
                if !self.state.imported_book_names.contains(&name) {
                    self.state.imported_book_names.push(name.clone());
                }
                self.state
                    .imported_book_contents
                    .insert(name.clone(), entries.clone());
                self.replace_entries(name, entries);
            }
            BookSource::Predefined { name, .. } => {
                self.predefined_cache.insert(name.clone(), entries.clone());
                self.replace_entries(name, entries);
            }
        }

        self.persist();
        tracing::info!(book = %self.state.current_book_name, kind = %kind, count, "単語帳を読み込みました");
        Ok(count)
    }

    /// 単語帳一覧（内蔵 → インポートの順）
    pub fn list_books(&self) -> Vec<BookInfo> {
        let predefined = self.predefined.iter().map(|name| BookInfo {
            name: name.clone(),
            kind: BookKind::Predefined,
        });
        let imported = self.state.imported_book_names.iter().map(|name| BookInfo {
            name: name.clone(),
            kind: BookKind::Imported,
        });

        predefined.chain(imported).collect()
    }

    /// 読み込み済みの単語帳に切り替える
    ///
    /// 名前の一意性は種類ごとなので、種類を指定して探す。
    /// 内蔵単語帳が未取得なら `Error::BookNotLoaded`、
    /// 指定した種類のカタログに無ければ `Error::UnknownBook`。
    pub fn select_book(&mut self, name: &str, kind: BookKind) -> Result<usize> {
        let entries = match kind {
            BookKind::Predefined if self.is_predefined(name) => self
                .predefined_cache
                .get(name)
                .cloned()
                .ok_or_else(|| Error::BookNotLoaded(name.to_string()))?,
            BookKind::Imported if self.is_imported(name) => self
                .state
                .imported_book_contents
                .get(name)
                .cloned()
                .unwrap_or_default(),
            _ => {
                tracing::error!(book = name, kind = %kind, "単語帳が見つかりません");
                return Err(Error::UnknownBook(name.to_string()));
            }
        };

        let count = entries.len();
        self.replace_entries(name.to_string(), entries);
        self.persist();
        tracing::info!(book = name, count, "単語帳を切り替えました");
        Ok(count)
    }

    /// 次の単語をランダムに選ぶ
    pub fn pick_next(&mut self) -> WordEntry {
        self.pick_next_with(&mut rand::thread_rng())
    }

    /// 乱数生成器を指定して次の単語を選ぶ
    ///
    /// 単語が無ければ表示用のエントリを返し、位置は変更しない。
    /// 直前と同じ単語が続くこともある（独立抽出）。
    pub fn pick_next_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> WordEntry {
        if self.state.entries.is_empty() {
            return WordEntry::new(EMPTY_WORD, EMPTY_MEANING);
        }

        let index = rng.gen_range(0..self.state.entries.len());
        self.state.current_index = Some(index);
        self.write(keys::CURRENT_INDEX, &self.state.stored_index());

        let entry = self.state.entries[index].clone();
        tracing::info!(target: "word", "{} - {}", entry.word, log_meaning(&entry.meaning));
        entry
    }

    /// 現在の単語リストを空にする（インポート済み単語帳は残す）
    pub fn clear_words(&mut self) {
        self.state.entries.clear();
        self.state.current_index = None;
        self.state.current_book_name.clear();
        self.persist();
    }

    /// 保存データを全て消去する
    pub fn reset(&mut self) -> Result<()> {
        self.storage.clear()?;
        self.state = VocabularyState::default();
        self.predefined_cache.clear();
        tracing::info!("全ての保存データを消去しました");
        Ok(())
    }

    /// 状態全体をストアに書き戻す（1回の書き込みにまとめる）
    pub fn persist(&self) {
        let pairs = match self.serialized_state() {
            Ok(pairs) => pairs,
            Err(e) => {
                tracing::warn!(error = %e, "単語帳の状態をシリアライズできません");
                return;
            }
        };

        if let Err(e) = self.storage.set_raw_many(&pairs) {
            tracing::warn!(error = %e, "ストレージへの保存に失敗");
        }
    }

    fn serialized_state(&self) -> Result<Vec<(&'static str, String)>> {
        Ok(vec![
            (keys::WORD_ENTRIES, serde_json::to_string(&self.state.entries)?),
            (keys::CURRENT_INDEX, serde_json::to_string(&self.state.stored_index())?),
            (keys::CURRENT_BOOK, serde_json::to_string(&self.state.current_book_name)?),
            (keys::IMPORTED_BOOKS, serde_json::to_string(&self.state.imported_book_names)?),
            (
                keys::IMPORTED_BOOK_CONTENTS,
                serde_json::to_string(&self.state.imported_book_contents)?,
            ),
        ])
    }

    /// 単語の差し替えと位置のリセットは必ず一緒に行う
    fn replace_entries(&mut self, name: String, entries: Vec<WordEntry>) {
        self.state.entries = entries;
        self.state.current_index = None;
        self.state.current_book_name = name;
    }

    fn write<T: serde::Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(e) = self.storage.set_value(key, value) {
            tracing::warn!(key, error = %e, "ストレージへの保存に失敗");
        }
    }
}

fn log_meaning(meaning: &str) -> String {
    if meaning.is_empty() {
        "（无释义）".to_string()
    } else {
        meaning.replace('\n', " ")
    }
}
