//! 壁紙の平均色とコントラスト調整
//!
//! - 縮小サンプル（既定 50×50）の平均色を求める
//! - 白文字とのWCAG 2.1コントラスト比が基準を満たすまで色を暗くする
//! - 背景の明るさから文字色（明/暗）を選ぶ

use crate::types::ThemeColor;
use serde::{Deserialize, Serialize};

/// 平均色を求めるサンプルの一辺のピクセル数
pub const SAMPLE_SIZE: u32 = 50;

/// 白との最小コントラスト比
pub const MIN_CONTRAST_RATIO: f64 = 5.0;

/// 1回あたりの減算量
pub const DARKEN_STEP: u8 = 20;

/// 暗くする反復の上限
pub const MAX_DARKEN_ITERATIONS: u32 = 20;

/// これより明るい背景には暗い文字を使う
const BRIGHTNESS_THRESHOLD: f64 = 180.0;

/// RGBAピクセル
pub type Rgba = [u8; 4];

/// 平均色（アルファは無視、各チャンネル切り捨て）
///
/// ピクセルが無ければ None
pub fn average_color(pixels: &[Rgba]) -> Option<ThemeColor> {
    if pixels.is_empty() {
        return None;
    }

    let (r, g, b) = pixels.iter().fold((0u64, 0u64, 0u64), |(r, g, b), p| {
        (r + p[0] as u64, g + p[1] as u64, b + p[2] as u64)
    });
    let n = pixels.len() as u64;

    Some(ThemeColor::new((r / n) as u8, (g / n) as u8, (b / n) as u8))
}

/// 相対輝度（WCAG 2.1）
pub fn relative_luminance(color: ThemeColor) -> f64 {
    0.2126 * linearize(color.r) + 0.7152 * linearize(color.g) + 0.0722 * linearize(color.b)
}

fn linearize(channel: u8) -> f64 {
    let c = channel as f64 / 255.0;
    if c <= 0.03928 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// 2色間のコントラスト比（1.0〜21.0）
pub fn contrast_ratio(a: ThemeColor, b: ThemeColor) -> f64 {
    let la = relative_luminance(a);
    let lb = relative_luminance(b);
    (la.max(lb) + 0.05) / (la.min(lb) + 0.05)
}

/// 白とのコントラスト比が基準を満たすまで暗くする
///
/// 上限回数に達した場合もその時点の色を返す。
pub fn ensure_contrast_with_white(color: ThemeColor) -> ThemeColor {
    let mut current = color;
    let mut contrast = contrast_ratio(current, ThemeColor::WHITE);
    let mut iterations = 0;

    while contrast < MIN_CONTRAST_RATIO && iterations < MAX_DARKEN_ITERATIONS {
        current = ThemeColor::new(
            current.r.saturating_sub(DARKEN_STEP),
            current.g.saturating_sub(DARKEN_STEP),
            current.b.saturating_sub(DARKEN_STEP),
        );
        contrast = contrast_ratio(current, ThemeColor::WHITE);
        iterations += 1;

        tracing::trace!(iterations, color = %current, contrast, "色を暗くする");
    }

    if iterations > 0 {
        tracing::debug!(iterations, contrast = %format!("{:.2}", contrast), "色を暗くしました");
    }

    current
}

/// 背景上の文字色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextTone {
    /// 明るい背景向けの暗い文字
    Dark,
    /// 暗い背景向けの白文字
    Light,
}

impl TextTone {
    pub fn css(&self) -> &'static str {
        match self {
            TextTone::Dark => "#333333",
            TextTone::Light => "#ffffff",
        }
    }
}

/// 知覚的な明るさ `(299r + 587g + 114b) / 1000` から文字色を選ぶ
pub fn text_tone_for_background(color: ThemeColor) -> TextTone {
    let brightness =
        (299.0 * color.r as f64 + 587.0 * color.g as f64 + 114.0 * color.b as f64) / 1000.0;

    if brightness > BRIGHTNESS_THRESHOLD {
        TextTone::Dark
    } else {
        TextTone::Light
    }
}

/// UIに適用するテーマ色一式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemePalette {
    pub color: ThemeColor,
    pub primary: String,
    pub secondary: String,
    pub third: String,
    pub text: TextTone,
    pub contrast_with_white: f64,
}

impl ThemePalette {
    /// 平均色からパレットを作る（コントラスト調整込み）
    pub fn from_average(average: ThemeColor) -> Self {
        let color = ensure_contrast_with_white(average);
        let contrast_with_white = contrast_ratio(color, ThemeColor::WHITE);

        Self {
            color,
            primary: color.to_css(),
            secondary: color.to_css_alpha(0.8),
            third: color.to_css_alpha(0.4),
            text: text_tone_for_background(average),
            contrast_with_white,
        }
    }
}

impl Default for ThemePalette {
    fn default() -> Self {
        Self::from_average(ThemeColor::DEFAULT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_color() {
        let pixels = vec![[10, 20, 30, 255], [20, 41, 60, 0], [30, 60, 91, 128]];
        // (60/3, 121/3, 181/3) → 切り捨て
        assert_eq!(average_color(&pixels), Some(ThemeColor::new(20, 40, 60)));
    }

    #[test]
    fn test_average_color_full_grid() {
        let size = (SAMPLE_SIZE * SAMPLE_SIZE) as usize;
        let pixels = vec![[255, 0, 128, 255]; size];
        assert_eq!(average_color(&pixels), Some(ThemeColor::new(255, 0, 128)));
    }

    #[test]
    fn test_average_color_empty() {
        assert_eq!(average_color(&[]), None);
    }

    #[test]
    fn test_relative_luminance_bounds() {
        assert!(relative_luminance(ThemeColor::new(0, 0, 0)).abs() < 1e-9);
        assert!((relative_luminance(ThemeColor::WHITE) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_contrast_ratio_black_white() {
        let ratio = contrast_ratio(ThemeColor::new(0, 0, 0), ThemeColor::WHITE);
        assert!((ratio - 21.0).abs() < 1e-9);
        // 順序に依存しない
        let reversed = contrast_ratio(ThemeColor::WHITE, ThemeColor::new(0, 0, 0));
        assert!((ratio - reversed).abs() < 1e-12);
    }

    #[test]
    fn test_ensure_contrast_default_theme_color() {
        let adjusted = ensure_contrast_with_white(ThemeColor::DEFAULT);
        assert!(contrast_ratio(adjusted, ThemeColor::WHITE) >= MIN_CONTRAST_RATIO);
        // 3回減算して基準を満たす
        assert_eq!(adjusted, ThemeColor::new(0, 114, 179));
    }

    #[test]
    fn test_ensure_contrast_already_dark_unchanged() {
        let dark = ThemeColor::new(20, 30, 40);
        assert_eq!(ensure_contrast_with_white(dark), dark);
    }

    #[test]
    fn test_ensure_contrast_white_terminates() {
        let adjusted = ensure_contrast_with_white(ThemeColor::WHITE);
        assert!(contrast_ratio(adjusted, ThemeColor::WHITE) >= MIN_CONTRAST_RATIO);
        // 上限回数 × 減算量 より暗くはならない
        let floor = 255u32.saturating_sub(MAX_DARKEN_ITERATIONS * DARKEN_STEP as u32) as u8;
        assert!(adjusted.r >= floor);
        assert_eq!(adjusted.r, adjusted.g);
        assert_eq!(adjusted.g, adjusted.b);
    }

    #[test]
    fn test_text_tone() {
        assert_eq!(text_tone_for_background(ThemeColor::WHITE), TextTone::Dark);
        assert_eq!(text_tone_for_background(ThemeColor::new(0, 0, 0)), TextTone::Light);
        // 明るさ 180 ちょうどは暗い文字にしない
        assert_eq!(text_tone_for_background(ThemeColor::new(180, 180, 180)), TextTone::Light);
        assert_eq!(TextTone::Dark.css(), "#333333");
    }

    #[test]
    fn test_palette_from_average() {
        let palette = ThemePalette::from_average(ThemeColor::DEFAULT);
        assert_eq!(palette.primary, "rgb(0, 114, 179)");
        assert_eq!(palette.secondary, "rgba(0, 114, 179, 0.8)");
        assert_eq!(palette.third, "rgba(0, 114, 179, 0.4)");
        assert!(palette.contrast_with_white >= MIN_CONTRAST_RATIO);
    }
}
