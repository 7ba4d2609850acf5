//! 壁紙の選択とテーマ色の適用
//!
//! 壁紙の取得は `Idle → Fetching → Applying → Idle` の状態遷移で管理する。
//! 取得中に来た要求は破棄する（キューしない）。
//! 要求ごとに世代番号を振り、古い世代の完了結果は捨てる。

use crate::capabilities::{Fetcher, ImageSampler};
use crate::color::{average_color, ThemePalette, SAMPLE_SIZE};
use crate::error::{Error, Result};
use crate::settings::Settings;
use crate::types::ThemeColor;
use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;

/// Bing壁紙アーカイブ（月別のREADME）
pub const INTERNATIONAL_INDEX_BASE: &str =
    "https://raw.githubusercontent.com/niumoo/bing-wallpaper/refs/heads/main/picture";

/// 国内ミラーのランダム壁紙
pub const DOMESTIC_RANDOM_URL: &str = "https://bing.img.run/rand_uhd.php";

/// 国内ミラーの今日の壁紙
pub const DAILY_URL: &str = "https://bing.img.run/uhd.php";

/// アーカイブの最初の月
pub const INTERNATIONAL_START: YearMonth = YearMonth { year: 2021, month: 2 };

/// ログに出すURLの最大文字数
const LOG_URL_MAX_CHARS: usize = 50;

lazy_static! {
    static ref WALLPAPER_ENTRY: Regex =
        Regex::new(r"!\[.*?\]\((.*?)\)(\d{4}-\d{2}-\d{2}) \[download 4k\]\((.*?)\)")
            .expect("壁紙エントリの正規表現が不正");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    /// 1-12
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// 2つの月の間の月数（両端を含む、逆順なら0以下）
    fn months_through(&self, end: YearMonth) -> i64 {
        (end.year as i64 - self.year as i64) * 12 + (end.month as i64 - self.month as i64) + 1
    }

    fn plus_months(&self, offset: i64) -> YearMonth {
        let index = (self.month as i64 - 1) + offset;
        YearMonth {
            year: self.year + index.div_euclid(12) as i32,
            month: index.rem_euclid(12) as u32 + 1,
        }
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// `start` から `today` までの月を一様に選ぶ
///
/// `today` が `start` より前なら `start` を返す。
pub fn random_month<R: Rng + ?Sized>(rng: &mut R, start: YearMonth, today: YearMonth) -> YearMonth {
    let total_months = start.months_through(today);
    if total_months <= 1 {
        return start;
    }

    let random_offset = rng.gen_range(0..total_months);
    start.plus_months(random_offset)
}

/// 月別アーカイブのURL
pub fn index_url(month: YearMonth) -> String {
    format!("{}/{}/README.md", INTERNATIONAL_INDEX_BASE, month)
}

/// アーカイブのMarkdownから4K画像のURLを取り出す
pub fn parse_wallpaper_index(markdown: &str) -> Vec<String> {
    WALLPAPER_ENTRY
        .captures_iter(markdown)
        .filter_map(|caps| caps.get(3))
        .map(|m| m.as_str())
        .filter(|url| url.starts_with("http"))
        .map(str::to_string)
        .collect()
}

/// ログ用にURLを短縮
pub fn shorten_url(url: &str) -> String {
    if url.chars().count() > LOG_URL_MAX_CHARS {
        let head: String = url.chars().take(LOG_URL_MAX_CHARS - 3).collect();
        format!("{}...", head)
    } else {
        url.to_string()
    }
}

/// 壁紙の取得元
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// GitHub上のBing壁紙アーカイブ
    International,
    /// 国内ミラー
    Domestic,
}

/// 取得方法
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPlan {
    /// 月別インデックスを取得し、その中から1枚選ぶ
    Index { index_url: String },
    /// 画像URLを直接取得
    Direct {
        image_url: String,
        download_url: String,
    },
}

impl SourceKind {
    /// この取得元から1枚取得する方法を決める
    pub fn plan<R: Rng + ?Sized>(&self, rng: &mut R, today: YearMonth, now_millis: i64) -> RequestPlan {
        match self {
            SourceKind::International => {
                let month = random_month(rng, INTERNATIONAL_START, today);
                RequestPlan::Index {
                    index_url: index_url(month),
                }
            }
            SourceKind::Domestic => RequestPlan::Direct {
                image_url: format!("{}?t={}", DOMESTIC_RANDOM_URL, now_millis),
                download_url: DOMESTIC_RANDOM_URL.to_string(),
            },
        }
    }
}

/// 壁紙取得の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallpaperPhase {
    Idle,
    Fetching { generation: u64 },
    Applying { generation: u64 },
}

/// 受け付けた取得要求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WallpaperRequest {
    pub generation: u64,
    pub plan: RequestPlan,
}

/// 取得済みの壁紙
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedWallpaper {
    pub generation: u64,
    pub image_url: String,
    pub download_url: String,
    /// 平均色が求められなかった場合は None（テーマ色は変えない）
    pub average: Option<ThemeColor>,
}

/// 壁紙とテーマ色の管理
#[derive(Debug, Clone)]
pub struct WallpaperManager {
    international_enabled: bool,
    domestic_enabled: bool,
    phase: WallpaperPhase,
    generation: u64,
    palette: ThemePalette,
    /// ダウンロード用URL
    current_url: String,
    /// 実際に取得した画像URL
    current_image_url: String,
}

impl WallpaperManager {
    pub fn new(settings: &Settings) -> Self {
        Self {
            international_enabled: settings.international_wallpaper,
            domestic_enabled: settings.domestic_wallpaper,
            phase: WallpaperPhase::Idle,
            generation: 0,
            palette: ThemePalette::default(),
            current_url: String::new(),
            current_image_url: String::new(),
        }
    }

    pub fn phase(&self) -> WallpaperPhase {
        self.phase
    }

    pub fn palette(&self) -> &ThemePalette {
        &self.palette
    }

    pub fn current_url(&self) -> &str {
        &self.current_url
    }

    pub fn current_image_url(&self) -> &str {
        &self.current_image_url
    }

    pub fn enabled_sources(&self) -> Vec<SourceKind> {
        let mut sources = Vec::new();
        if self.international_enabled {
            sources.push(SourceKind::International);
        }
        if self.domestic_enabled {
            sources.push(SourceKind::Domestic);
        }
        sources
    }

    /// 取得元の有効/無効を切り替える
    ///
    /// 両方無効にされた場合は国内ソースを有効に戻し true を返す
    pub fn update_sources(&mut self, international: bool, domestic: bool) -> bool {
        self.international_enabled = international;
        self.domestic_enabled = domestic;

        if !international && !domestic {
            self.domestic_enabled = true;
            tracing::info!("壁紙ソースは最低1つ選択してください");
            return true;
        }
        false
    }

    /// ランダムな壁紙の取得を開始する
    ///
    /// 取得中なら要求を破棄して None
    pub fn begin<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        today: YearMonth,
        now_millis: i64,
    ) -> Option<WallpaperRequest> {
        if self.phase != WallpaperPhase::Idle {
            tracing::debug!(phase = ?self.phase, "壁紙を取得中のため要求を破棄");
            return None;
        }

        let sources = self.enabled_sources();
        if sources.is_empty() {
            tracing::error!("壁紙ソースが選択されていません");
            return None;
        }

        let source = sources[rng.gen_range(0..sources.len())];
        let plan = source.plan(rng, today, now_millis);
        Some(self.start(plan))
    }

    /// 今日の壁紙の取得を開始する
    pub fn begin_daily(&mut self) -> Option<WallpaperRequest> {
        if self.phase != WallpaperPhase::Idle {
            tracing::debug!(phase = ?self.phase, "壁紙を取得中のため要求を破棄");
            return None;
        }

        Some(self.start(RequestPlan::Direct {
            image_url: DAILY_URL.to_string(),
            download_url: DAILY_URL.to_string(),
        }))
    }

    fn start(&mut self, plan: RequestPlan) -> WallpaperRequest {
        self.generation += 1;
        self.phase = WallpaperPhase::Fetching {
            generation: self.generation,
        };
        tracing::info!(generation = self.generation, "壁紙を取得しています...");

        WallpaperRequest {
            generation: self.generation,
            plan,
        }
    }

    /// 取得結果を適用する
    ///
    /// 古い世代の結果なら何もせず None
    pub fn apply(&mut self, fetched: FetchedWallpaper) -> Option<&ThemePalette> {
        if fetched.generation != self.generation || self.phase == WallpaperPhase::Idle {
            tracing::debug!(
                generation = fetched.generation,
                current = self.generation,
                "古い壁紙の取得結果を破棄"
            );
            return None;
        }

        self.phase = WallpaperPhase::Applying {
            generation: fetched.generation,
        };

        match fetched.average {
            Some(average) => {
                tracing::info!(average = %average, "平均色");
                self.palette = ThemePalette::from_average(average);
                tracing::info!(
                    color = %self.palette.color,
                    contrast = %format!("{:.2}", self.palette.contrast_with_white),
                    "テーマ色"
                );
            }
            None => tracing::error!("平均色を取得できないため現在のテーマ色を維持"),
        }

        self.current_url = fetched.download_url;
        self.current_image_url = fetched.image_url;
        tracing::info!(target: "wallpaper", "{}", shorten_url(&self.current_url));

        self.phase = WallpaperPhase::Idle;
        Some(&self.palette)
    }

    /// 取得失敗: 現在の壁紙とテーマ色を維持して待機状態に戻す
    pub fn fail(&mut self, generation: u64, error: &Error) {
        tracing::error!(error = %error, "壁紙の取得に失敗、現在の背景とテーマを維持");
        if generation == self.generation {
            self.phase = WallpaperPhase::Idle;
        }
    }

    /// ランダムな壁紙を取得して適用する
    ///
    /// 取得中で要求が破棄された場合は `Ok(None)`
    pub async fn change<F, I, R>(
        &mut self,
        fetcher: &F,
        sampler: &I,
        rng: &mut R,
        today: YearMonth,
        now_millis: i64,
    ) -> Result<Option<ThemePalette>>
    where
        F: Fetcher,
        I: ImageSampler,
        R: Rng + ?Sized,
    {
        let Some(request) = self.begin(rng, today, now_millis) else {
            return Ok(None);
        };
        self.complete(fetcher, sampler, rng, request).await
    }

    /// 今日の壁紙を取得して適用する
    pub async fn change_daily<F, I>(&mut self, fetcher: &F, sampler: &I) -> Result<Option<ThemePalette>>
    where
        F: Fetcher,
        I: ImageSampler,
    {
        let Some(request) = self.begin_daily() else {
            return Ok(None);
        };
        self.complete(fetcher, sampler, &mut rand::thread_rng(), request).await
    }

    async fn complete<F, I, R>(
        &mut self,
        fetcher: &F,
        sampler: &I,
        rng: &mut R,
        request: WallpaperRequest,
    ) -> Result<Option<ThemePalette>>
    where
        F: Fetcher,
        I: ImageSampler,
        R: Rng + ?Sized,
    {
        let generation = request.generation;
        match fetch_wallpaper(fetcher, sampler, rng, request).await {
            Ok(fetched) => Ok(self.apply(fetched).cloned()),
            Err(e) => {
                self.fail(generation, &e);
                Err(e)
            }
        }
    }

    /// 現在の壁紙をダウンロードする
    pub async fn download_current<F: Fetcher>(&self, fetcher: &F) -> Result<Vec<u8>> {
        if self.current_url.is_empty() {
            return Err(Error::SourceUnavailable("ダウンロードできる壁紙がありません".into()));
        }

        tracing::info!("壁紙をダウンロードしています...");
        let bytes = fetcher.fetch(&self.current_url).await?;
        tracing::info!(bytes = bytes.len(), "壁紙のダウンロードが完了しました");
        Ok(bytes)
    }
}

/// 要求に従って壁紙を取得し、平均色を求める
pub async fn fetch_wallpaper<F, I, R>(
    fetcher: &F,
    sampler: &I,
    rng: &mut R,
    request: WallpaperRequest,
) -> Result<FetchedWallpaper>
where
    F: Fetcher,
    I: ImageSampler,
    R: Rng + ?Sized,
{
    let (image_url, download_url) = match request.plan {
        RequestPlan::Direct {
            image_url,
            download_url,
        } => (image_url, download_url),
        RequestPlan::Index { index_url } => {
            tracing::info!(url = %index_url, "壁紙データを要求");
            let markdown = fetcher.fetch(&index_url).await?;
            let wallpapers = parse_wallpaper_index(&String::from_utf8_lossy(&markdown));
            if wallpapers.is_empty() {
                return Err(Error::SourceUnavailable(format!(
                    "壁紙データが見つかりません: {}",
                    index_url
                )));
            }
            let picked = wallpapers[rng.gen_range(0..wallpapers.len())].clone();
            (picked.clone(), picked)
        }
    };

    let bytes = fetcher.fetch(&image_url).await?;
    let pixels = sampler.sample(&bytes, SAMPLE_SIZE)?;

    Ok(FetchedWallpaper {
        generation: request.generation,
        image_url,
        download_url,
        average: average_color(&pixels),
    })
}
