//! 表示設定
//!
//! 保存済みのJSONオブジェクトを既定値の上にフィールド単位で重ねて読み込む。
//! 未知のキーは無視し、型の合わないキーは既定値のままにする。

use crate::error::{Error, Result};
use crate::storage::{keys, KeyValueStore};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const AUTO_INTERVAL_RANGE: (u32, u32) = (1, 300);
pub const BG_INTERVAL_RANGE: (u32, u32) = (1, 100);

pub const DEFAULT_AUTO_INTERVAL: u32 = 20;
pub const DEFAULT_BG_INTERVAL: u32 = 10;

/// 旧形式のキー名 → 現在のキー名
const LEGACY_KEYS: &[(&str, &str)] = &[("chineseWallpaper", "domesticWallpaper")];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub show_word: bool,
    pub show_meaning: bool,
    pub card_animation: bool,
    pub auto_mode: bool,
    /// 自動モードの切り替え間隔（秒）
    pub auto_interval: u32,
    /// 壁紙を切り替える単語数
    pub bg_interval: u32,
    pub international_wallpaper: bool,
    pub domestic_wallpaper: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_word: true,
            show_meaning: true,
            card_animation: false,
            auto_mode: true,
            auto_interval: DEFAULT_AUTO_INTERVAL,
            bg_interval: DEFAULT_BG_INTERVAL,
            international_wallpaper: true,
            domestic_wallpaper: true,
        }
    }
}

impl Settings {
    /// 保存値を既定値に重ねる
    pub fn merged_over_defaults(stored: &Value) -> Self {
        let defaults = Self::default();
        let Ok(Value::Object(mut merged)) = serde_json::to_value(&defaults) else {
            return defaults;
        };

        if let Value::Object(stored) = stored {
            for (key, value) in stored {
                let key = LEGACY_KEYS
                    .iter()
                    .find(|(legacy, _)| legacy == key)
                    .map(|(_, current)| current.to_string())
                    .unwrap_or_else(|| key.clone());

                if !merged.contains_key(&key) {
                    continue;
                }
                if accepts(&merged, &key, value) {
                    merged.insert(key, value.clone());
                } else {
                    tracing::warn!(key = %key, "設定値の型が不正なため既定値を使用");
                }
            }
        }

        serde_json::from_value::<Settings>(Value::Object(merged))
            .unwrap_or(defaults)
            .normalized()
    }

    /// 範囲外の値を丸め、壁紙ソースを最低1つ有効にする
    pub fn normalized(mut self) -> Self {
        self.auto_interval = self
            .auto_interval
            .clamp(AUTO_INTERVAL_RANGE.0, AUTO_INTERVAL_RANGE.1);
        self.bg_interval = self
            .bg_interval
            .clamp(BG_INTERVAL_RANGE.0, BG_INTERVAL_RANGE.1);

        if !self.international_wallpaper && !self.domestic_wallpaper {
            tracing::info!("壁紙ソースは最低1つ必要です。国内ソースを有効にします");
            self.domestic_wallpaper = true;
        }
        self
    }

    /// `key=value` 形式の更新を適用（キーは camelCase / snake_case どちらでも可）
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = || Error::Config(format!("{} の値が不正です: {}", key, value));
        let parse_bool = |v: &str| v.parse::<bool>().map_err(|_| invalid());
        let parse_u32 = |v: &str| v.parse::<u32>().map_err(|_| invalid());

        match normalize_key(key).as_str() {
            "showword" => self.show_word = parse_bool(value)?,
            "showmeaning" => self.show_meaning = parse_bool(value)?,
            "cardanimation" => self.card_animation = parse_bool(value)?,
            "automode" => self.auto_mode = parse_bool(value)?,
            "autointerval" => self.auto_interval = parse_u32(value)?,
            "bginterval" => self.bg_interval = parse_u32(value)?,
            "internationalwallpaper" => self.international_wallpaper = parse_bool(value)?,
            "domesticwallpaper" | "chinesewallpaper" => self.domestic_wallpaper = parse_bool(value)?,
            _ => return Err(Error::Config(format!("不明な設定キー: {}", key))),
        }

        *self = self.clone().normalized();
        Ok(())
    }
}

fn accepts(defaults: &Map<String, Value>, key: &str, value: &Value) -> bool {
    let mut candidate = defaults.clone();
    candidate.insert(key.to_string(), value.clone());
    serde_json::from_value::<Settings>(Value::Object(candidate)).is_ok()
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// 設定とクリック数の管理
pub struct SettingsManager<S: KeyValueStore> {
    storage: S,
    settings: Settings,
    click_count: u64,
}

impl<S: KeyValueStore> SettingsManager<S> {
    pub fn open(storage: S) -> Self {
        let stored: Value = storage.get_or(keys::SETTINGS, Value::Null);
        let settings = Settings::merged_over_defaults(&stored);
        let click_count = storage.get_or(keys::CLICK_COUNT, 0u64);

        Self {
            storage,
            settings,
            click_count,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn click_count(&self) -> u64 {
        self.click_count
    }

    /// 設定を更新して保存
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.settings.set(key, value)?;
        tracing::info!(key, value, "設定を更新しました");
        self.save();
        Ok(())
    }

    /// 単語を1つ進めたことを記録する
    ///
    /// 壁紙を切り替えるタイミングなら true
    pub fn increment_click_count(&mut self) -> bool {
        self.click_count += 1;
        self.save();
        self.click_count % self.settings.bg_interval as u64 == 0
    }

    pub fn save(&self) {
        if let Err(e) = self.storage.set_value(keys::SETTINGS, &self.settings) {
            tracing::warn!(error = %e, "設定の保存に失敗");
        }
        if let Err(e) = self.storage.set_value(keys::CLICK_COUNT, &self.click_count) {
            tracing::warn!(error = %e, "クリック数の保存に失敗");
        }
    }
}
