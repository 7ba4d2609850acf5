use crate::error::{Result, WordcardError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 内蔵単語帳の取得元（未設定なら内蔵単語帳は使わない）
    pub book_base_url: Option<String>,
    /// 内蔵単語帳のファイル名（一覧の表示順）
    pub predefined_books: Vec<String>,
    /// 永続化ファイル（未設定ならデータディレクトリ）
    pub storage_path: Option<PathBuf>,
    pub timeout_seconds: u64,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default_config())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| WordcardError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("wordcard").join("config.json"))
    }

    /// 永続化ファイルのパス
    pub fn storage_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.storage_path {
            return Ok(path.clone());
        }
        let data = dirs::data_dir()
            .ok_or_else(|| WordcardError::Config("データディレクトリが見つかりません".into()))?;
        Ok(data.join("wordcard").join("storage.json"))
    }

    /// 内蔵単語帳のURL
    pub fn book_url(&self, name: &str) -> Option<String> {
        let base = self.book_base_url.as_deref()?;
        Some(format!("{}/{}", base.trim_end_matches('/'), name))
    }

    pub fn set_book_base_url(&mut self, url: String) -> Result<()> {
        if !url.starts_with("http") {
            return Err(WordcardError::Config(format!("URLが不正です: {}", url)));
        }
        self.book_base_url = Some(url);
        self.save()
    }

    fn default_config() -> Self {
        Self {
            book_base_url: None,
            predefined_books: vec!["高中.csv".into(), "四级.csv".into()],
            storage_path: None,
            timeout_seconds: 30,
            log_level: "info".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.predefined_books, vec!["高中.csv", "四级.csv"]);
        assert!(config.book_base_url.is_none());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"timeout_seconds": 5}"#).unwrap();
        assert_eq!(config.timeout_seconds, 5);
        assert_eq!(config.predefined_books.len(), 2);
    }

    #[test]
    fn test_book_url() {
        let mut config = Config::default();
        assert_eq!(config.book_url("高中.csv"), None);

        config.book_base_url = Some("https://example.com/books/".into());
        assert_eq!(
            config.book_url("高中.csv").as_deref(),
            Some("https://example.com/books/高中.csv")
        );
    }

    #[test]
    fn test_explicit_storage_path() {
        let config = Config {
            storage_path: Some(PathBuf::from("/tmp/wordcard.json")),
            ..Config::default()
        };
        assert_eq!(config.storage_path().unwrap(), PathBuf::from("/tmp/wordcard.json"));
    }
}
