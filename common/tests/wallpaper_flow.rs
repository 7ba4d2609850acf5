//! 壁紙取得フローのテスト
//!
//! HTTP取得と画像サンプリングをメモリ上の偽実装に置き換えて検証

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::RefCell;
use wordcard_common::color::{Rgba, SAMPLE_SIZE};
use wordcard_common::settings::Settings;
use wordcard_common::wallpaper::{WallpaperPhase, DAILY_URL};
use wordcard_common::{Error, Fetcher, ImageSampler, Result, ThemeColor, WallpaperManager, YearMonth};

const IMAGE_URL: &str = "https://cn.bing.com/th?id=OHR.Test_UHD.jpg";

/// URLの末尾で応答を切り替える偽の取得器
#[derive(Default)]
struct FakeFetcher {
    fail: bool,
    requested: RefCell<Vec<String>>,
}

impl Fetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.requested.borrow_mut().push(url.to_string());
        if self.fail {
            return Err(Error::SourceUnavailable(format!("HTTP 404: {}", url)));
        }
        if url.ends_with("README.md") {
            let markdown = format!("![](https://cn.bing.com/th?id=t)2024-05-01 [download 4k]({})\n", IMAGE_URL);
            Ok(markdown.into_bytes())
        } else {
            Ok(b"fake-jpeg".to_vec())
        }
    }

    async fn exists(&self, _url: &str) -> bool {
        !self.fail
    }
}

/// 一色で塗りつぶした画像を返す偽のサンプラー
struct SolidSampler(Rgba);

impl ImageSampler for SolidSampler {
    fn sample(&self, _bytes: &[u8], size: u32) -> Result<Vec<Rgba>> {
        Ok(vec![self.0; (size * size) as usize])
    }
}

struct BrokenSampler;

impl ImageSampler for BrokenSampler {
    fn sample(&self, _bytes: &[u8], _size: u32) -> Result<Vec<Rgba>> {
        Err(Error::ImageDecode("not an image".into()))
    }
}

fn international_only() -> WallpaperManager {
    let settings = Settings {
        domestic_wallpaper: false,
        ..Settings::default()
    };
    WallpaperManager::new(&settings)
}

#[tokio::test]
async fn test_change_from_archive_applies_theme() {
    let mut manager = international_only();
    let fetcher = FakeFetcher::default();
    let sampler = SolidSampler([0, 174, 239, 255]);
    let mut rng = StdRng::seed_from_u64(11);

    let palette = manager
        .change(&fetcher, &sampler, &mut rng, YearMonth::new(2024, 6), 0)
        .await
        .expect("壁紙の取得に失敗")
        .expect("要求が破棄された");

    assert_eq!(palette.color, ThemeColor::new(0, 114, 179));
    assert_eq!(manager.current_url(), IMAGE_URL);
    assert_eq!(manager.phase(), WallpaperPhase::Idle);

    let requested = fetcher.requested.borrow();
    assert_eq!(requested.len(), 2);
    assert!(requested[0].ends_with("README.md"));
    assert_eq!(requested[1], IMAGE_URL);
}

#[tokio::test]
async fn test_change_failure_keeps_previous_theme() {
    let mut manager = international_only();
    let before = manager.palette().clone();
    let fetcher = FakeFetcher {
        fail: true,
        ..Default::default()
    };
    let sampler = SolidSampler([255, 255, 255, 255]);
    let mut rng = StdRng::seed_from_u64(2);

    let result = manager
        .change(&fetcher, &sampler, &mut rng, YearMonth::new(2024, 6), 0)
        .await;

    assert!(matches!(result, Err(Error::SourceUnavailable(_))));
    assert_eq!(manager.palette(), &before);
    assert_eq!(manager.phase(), WallpaperPhase::Idle);
    assert_eq!(manager.current_url(), "");
}

#[tokio::test]
async fn test_decode_failure_releases_guard() {
    let mut manager = WallpaperManager::new(&Settings::default());
    let fetcher = FakeFetcher::default();

    let result = manager.change_daily(&fetcher, &BrokenSampler).await;
    assert!(matches!(result, Err(Error::ImageDecode(_))));
    assert_eq!(manager.phase(), WallpaperPhase::Idle);

    // 次の要求は受け付けられる
    let sampler = SolidSampler([10, 20, 30, 255]);
    let palette = manager.change_daily(&fetcher, &sampler).await.unwrap().unwrap();
    assert_eq!(palette.color, ThemeColor::new(10, 20, 30));
    assert_eq!(manager.current_url(), DAILY_URL);
}

#[tokio::test]
async fn test_download_current() {
    let mut manager = WallpaperManager::new(&Settings::default());
    let fetcher = FakeFetcher::default();

    assert!(manager.download_current(&fetcher).await.is_err());

    let sampler = SolidSampler([0, 0, 0, 255]);
    manager.change_daily(&fetcher, &sampler).await.unwrap();
    let bytes = manager.download_current(&fetcher).await.unwrap();
    assert_eq!(bytes, b"fake-jpeg");
    assert_eq!(SAMPLE_SIZE, 50);
}
