//! 端末向けの単語カード表示

use wordcard_common::{Settings, WordEntry};

/// 意味が空のときの表示
pub const NO_MEANING: &str = "（无释义）";

/// 意味を表示用に整形する
///
/// 文字列 `\n` を改行に置き換え、連続する空行を詰める。
pub fn render_meaning(meaning: &str) -> String {
    if meaning.is_empty() {
        return NO_MEANING.to_string();
    }
    meaning.replace("\\n", "\n").replace("\n\n", "\n")
}

/// 設定に従ってカードを組み立てる（表示しない項目は省く）
pub fn render_card(entry: &WordEntry, settings: &Settings) -> String {
    let mut lines = Vec::new();
    if settings.show_word {
        lines.push(entry.word.clone());
    }
    if settings.show_meaning {
        lines.push(render_meaning(&entry.meaning));
    }
    lines.join("\n")
}
