//! 単語カードアプリ本体
//!
//! 単語帳ストア・設定・壁紙を束ね、CLIの各コマンドから呼ばれる。

use crate::config::Config;
use crate::error::{Result, WordcardError};
use crate::http::HttpFetcher;
use crate::sampler::PixelSampler;
use crate::storage::FileStore;
use chrono::{Datelike, Local};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use wordcard_common::color::{average_color, SAMPLE_SIZE};
use wordcard_common::{
    to_csv, BookInfo, BookKind, BookSource, Error, Fetcher, ImageSampler, KeyValueStore, Settings,
    SettingsManager, ThemePalette, VocabularyStore, WallpaperManager, WordEntry, YearMonth,
};

/// CLIで使う構成
pub type CliApp = VocabularyApp<Arc<FileStore>, HttpFetcher, PixelSampler>;

/// 次のカード
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextCard {
    pub entry: WordEntry,
    /// 壁紙を切り替えるタイミングか
    pub wallpaper_due: bool,
}

pub struct VocabularyApp<S, F, I>
where
    S: KeyValueStore + Clone,
    F: Fetcher,
    I: ImageSampler,
{
    config: Config,
    storage: S,
    vocabulary: VocabularyStore<S>,
    settings: SettingsManager<S>,
    wallpaper: WallpaperManager,
    fetcher: F,
    sampler: I,
}

impl CliApp {
    /// 設定ファイルに従って構築する
    pub fn from_config(config: Config) -> Result<Self> {
        let path = config.storage_path()?;
        let storage = Arc::new(FileStore::open(path));
        let fetcher = HttpFetcher::new(config.timeout_seconds)?;
        Ok(Self::new(config, storage, fetcher, PixelSampler))
    }
}

impl<S, F, I> VocabularyApp<S, F, I>
where
    S: KeyValueStore + Clone,
    F: Fetcher,
    I: ImageSampler,
{
    pub fn new(config: Config, storage: S, fetcher: F, sampler: I) -> Self {
        let vocabulary = VocabularyStore::open(storage.clone(), config.predefined_books.clone());
        let settings = SettingsManager::open(storage.clone());
        let wallpaper = WallpaperManager::new(settings.settings());

        Self {
            config,
            storage,
            vocabulary,
            settings,
            wallpaper,
            fetcher,
            sampler,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn vocabulary(&self) -> &VocabularyStore<S> {
        &self.vocabulary
    }

    pub fn settings(&self) -> &Settings {
        self.settings.settings()
    }

    pub fn click_count(&self) -> u64 {
        self.settings.click_count()
    }

    pub fn wallpaper(&self) -> &WallpaperManager {
        &self.wallpaper
    }

    pub fn books(&self) -> Vec<BookInfo> {
        self.vocabulary.list_books()
    }

    // ============================================
    // 単語帳
    // ============================================

    /// 起動時の自動読み込み
    ///
    /// 取得できる内蔵単語帳があれば最初の1つを読み込む。
    /// 無ければ保存済みの単語を使う。単語があれば true。
    pub async fn try_auto_load(&mut self) -> bool {
        let mut available = None;
        for name in self.vocabulary.predefined_books() {
            let Some(url) = self.config.book_url(name) else {
                continue;
            };
            if self.fetcher.exists(&url).await {
                available = Some((name.clone(), url));
                break;
            }
        }

        if let Some((name, url)) = available {
            match self.fetch_book(&name, &url).await {
                Ok(_) => return true,
                Err(e) => tracing::warn!(book = %name, error = %e, "内蔵単語帳の自動読み込みに失敗"),
            }
        }

        if !self.vocabulary.is_empty() {
            tracing::info!(
                count = self.vocabulary.entries().len(),
                "保存済みの単語帳を読み込みました"
            );
            return true;
        }
        false
    }

    /// 単語帳を開く
    ///
    /// `kind` を省略した場合、同名があればインポート済みを優先する。
    /// 内蔵単語帳は未取得なら取得し、`http` で始まる名前はURLとして取得する。
    /// 失敗時は現在の単語帳のまま。
    pub async fn open_book(&mut self, name: &str, kind: Option<BookKind>) -> Result<usize> {
        let kind = match kind {
            Some(kind) => kind,
            None if self.vocabulary.is_imported(name) => BookKind::Imported,
            None if self.vocabulary.is_predefined(name) => BookKind::Predefined,
            None if name.starts_with("http") => return self.fetch_book(name, name).await,
            None => return Err(Error::UnknownBook(name.to_string()).into()),
        };

        match kind {
            BookKind::Imported => Ok(self.vocabulary.select_book(name, BookKind::Imported)?),
            BookKind::Predefined => {
                match self.vocabulary.select_book(name, BookKind::Predefined) {
                    Err(Error::BookNotLoaded(_)) => {}
                    other => return Ok(other?),
                }
                let url = self.config.book_url(name).ok_or_else(|| {
                    WordcardError::Config(
                        "book_base_url が未設定です。`wordcard config --book-base-url URL` で設定してください"
                            .into(),
                    )
                })?;
                self.fetch_book(name, &url).await
            }
        }
    }

    async fn fetch_book(&mut self, name: &str, url: &str) -> Result<usize> {
        tracing::info!(book = name, url, "単語帳を取得しています...");
        let bytes = self.fetcher.fetch(url).await?;
        let count = self.vocabulary.load_book_from_source(BookSource::Predefined {
            name: name.to_string(),
            bytes,
        })?;
        Ok(count)
    }

    /// CSVファイルをインポートする（表示名の省略時はファイル名）
    pub fn import_file(&mut self, path: &Path, display_name: Option<String>) -> Result<usize> {
        if !path.exists() {
            return Err(WordcardError::FileNotFound(path.display().to_string()));
        }

        let bytes = std::fs::read(path)?;
        let name = display_name.unwrap_or_else(|| {
            path.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string())
        });
        Ok(self.vocabulary.load_book_from_source(BookSource::Upload { name, bytes })?)
    }

    /// 現在の単語リストをCSVで書き出す
    pub fn export_csv(&self, path: &Path) -> Result<usize> {
        let entries = self.vocabulary.entries();
        std::fs::write(path, to_csv(entries))?;
        Ok(entries.len())
    }

    /// 次の単語を選ぶ
    pub fn next_card(&mut self) -> NextCard {
        let entry = self.vocabulary.pick_next();
        let wallpaper_due = !self.vocabulary.is_empty() && self.settings.increment_click_count();
        NextCard {
            entry,
            wallpaper_due,
        }
    }

    // ============================================
    // 設定
    // ============================================

    pub fn set_setting(&mut self, key: &str, value: &str) -> Result<()> {
        self.settings.set(key, value)?;
        let settings = self.settings.settings();
        self.wallpaper
            .update_sources(settings.international_wallpaper, settings.domestic_wallpaper);
        Ok(())
    }

    /// 保存データを全て消去し、既定の状態に戻す
    pub fn reset(&mut self) -> Result<()> {
        self.vocabulary.reset()?;
        self.settings = SettingsManager::open(self.storage.clone());
        self.wallpaper = WallpaperManager::new(self.settings.settings());
        Ok(())
    }

    // ============================================
    // 壁紙・テーマ
    // ============================================

    /// ランダムな壁紙に切り替える（取得中なら `Ok(None)`）
    pub async fn change_wallpaper(&mut self) -> Result<Option<ThemePalette>> {
        let now = Local::now();
        let today = YearMonth::new(now.year(), now.month());
        let palette = self
            .wallpaper
            .change(
                &self.fetcher,
                &self.sampler,
                &mut rand::thread_rng(),
                today,
                now.timestamp_millis(),
            )
            .await?;
        Ok(palette)
    }

    /// 今日の壁紙に切り替える
    pub async fn change_daily_wallpaper(&mut self) -> Result<Option<ThemePalette>> {
        Ok(self.wallpaper.change_daily(&self.fetcher, &self.sampler).await?)
    }

    /// 現在の壁紙を `dir` に保存する
    pub async fn download_wallpaper(&self, dir: &Path) -> Result<PathBuf> {
        let bytes = self.wallpaper.download_current(&self.fetcher).await?;
        std::fs::create_dir_all(dir)?;
        let path = dir.join(wallpaper_file_name(Local::now().date_naive()));
        std::fs::write(&path, bytes)?;
        Ok(path)
    }

    /// 画像ファイルからテーマ色を求める
    pub fn theme_from_image(&self, path: &Path) -> Result<ThemePalette> {
        if !path.exists() {
            return Err(WordcardError::FileNotFound(path.display().to_string()));
        }

        let bytes = std::fs::read(path)?;
        let pixels = self.sampler.sample(&bytes, SAMPLE_SIZE)?;
        let average = average_color(&pixels)
            .ok_or_else(|| Error::ImageDecode(format!("画素がありません: {}", path.display())))?;
        Ok(ThemePalette::from_average(average))
    }
}

/// 壁紙の保存ファイル名
pub fn wallpaper_file_name(date: chrono::NaiveDate) -> String {
    format!("bing-wallpaper-{}.jpg", date.format("%Y-%m-%d"))
}
