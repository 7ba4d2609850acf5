//! 単語帳CSVパーサー
//!
//! バックスラッシュエスケープを許す緩いCSV方言を読む。
//! 2段階で処理する:
//! 1. 物理行を論理行に組み直す（引用符内の改行を含むフィールド対応）
//! 2. 論理行をフィールドに分割し、単語として妥当な行だけを残す
//!
//! 不正な行は黙って読み飛ばす。パース全体が失敗することはない。

use crate::types::WordEntry;

/// 単語の最大文字数
pub const MAX_WORD_CHARS: usize = 60;

/// 教科書エクスポート形式の見出し行の接頭辞
const HEADER_PREFIXES: &[&str] = &["必修", "选修"];

/// CSVテキストを単語リストに変換
///
/// # Examples
/// ```
/// use wordcard_common::parse_csv;
///
/// let entries = parse_csv("apple,n.苹果\nUnit 1\nbanana,n.香蕉");
/// assert_eq!(entries.len(), 2);
/// assert_eq!(entries[1].word, "banana");
/// ```
pub fn parse_csv(text: &str) -> Vec<WordEntry> {
    let mut out = Vec::new();

    for line in reassemble_lines(text) {
        if let Some(entry) = parse_record(&line) {
            out.push(entry);
        }
    }

    tracing::debug!(entries = out.len(), "CSVを解析");
    out
}

/// 物理行を論理行に組み直す
///
/// 引用符の数が奇数の行、または引用符の内側にいる間の行は継続行として
/// 保留中の行に `\n` で連結する。引用符を開く行も保留中の行に連結される。
pub fn reassemble_lines(text: &str) -> Vec<String> {
    let mut logical = Vec::new();
    let mut pending = String::new();
    let mut in_quotes = false;

    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let odd_quotes = line.matches('"').count() % 2 == 1;

        if in_quotes || odd_quotes {
            if !pending.is_empty() {
                pending.push('\n');
            }
            pending.push_str(line);
            if odd_quotes {
                in_quotes = !in_quotes;
            }
        } else {
            if !pending.is_empty() {
                logical.push(std::mem::take(&mut pending));
            }
            pending = line.to_string();
        }
    }

    if !pending.is_empty() {
        logical.push(pending);
    }

    logical
}

/// 論理行1行を単語に変換（不正な行は None）
pub fn parse_record(line: &str) -> Option<WordEntry> {
    let line = line.trim();
    if line.is_empty() || is_header_row(line) {
        return None;
    }

    let fields = split_fields(line);
    if fields.len() < 2 {
        return None;
    }

    let word = fields[0].trim();
    if !is_valid_word(word) {
        return None;
    }

    let meaning = unwrap_quoted(fields[1].trim());

    Some(WordEntry::new(word, meaning))
}

/// フィールド分割
///
/// 1文字ずつ走査し、優先順に:
/// エスケープ中 → バックスラッシュ → 引用符（`""` は引用符1つ）→ 区切りのカンマ → その他
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape_next = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if escape_next {
            current.push(c);
            escape_next = false;
        } else if c == '\\' {
            escape_next = true;
        } else if c == '"' {
            if in_quotes && chars.peek() == Some(&'"') {
                current.push('"');
                chars.next();
            } else {
                in_quotes = !in_quotes;
            }
        } else if c == ',' && !in_quotes {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }

    fields.push(current);
    fields
}

/// 単語1件をCSVの1行に書き出す（`parse_csv` で読み戻せる形式）
pub fn to_csv_row(entry: &WordEntry) -> String {
    format!("{},{}", quote_field(&entry.word), quote_field(&entry.meaning))
}

/// 単語リストをCSVテキストに書き出す
pub fn to_csv(entries: &[WordEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&to_csv_row(entry));
        out.push('\n');
    }
    out
}

fn quote_field(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\"\"");
    format!("\"{}\"", escaped)
}

fn is_header_row(line: &str) -> bool {
    let starts_with_unit = line
        .get(..4)
        .map(|head| head.eq_ignore_ascii_case("unit"))
        .unwrap_or(false);

    starts_with_unit || HEADER_PREFIXES.iter().any(|p| line.starts_with(p))
}

fn is_valid_word(word: &str) -> bool {
    !word.is_empty() && !contains_cjk(word) && word.chars().count() <= MAX_WORD_CHARS
}

/// CJK統合漢字（U+4E00..=U+9FFF）を含むか
fn contains_cjk(text: &str) -> bool {
    text.chars().any(|c| ('\u{4e00}'..='\u{9fff}').contains(&c))
}

/// 意味が引用符で囲まれていれば外し、`""` を `"` に戻す
fn unwrap_quoted(meaning: &str) -> String {
    if meaning.starts_with('"') && meaning.ends_with('"') {
        let inner = if meaning.len() >= 2 {
            &meaning[1..meaning.len() - 1]
        } else {
            ""
        };
        inner.replace("\"\"", "\"")
    } else {
        meaning.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =============================================
    // parse_csv テスト
    // =============================================

    #[test]
    fn test_parse_simple_rows() {
        let entries = parse_csv("abandon,v.放弃\nability,n.能力\r\nable,adj.能够的");
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], WordEntry::new("abandon", "v.放弃"));
        assert_eq!(entries[1], WordEntry::new("ability", "n.能力"));
        assert_eq!(entries[2], WordEntry::new("able", "adj.能够的"));
    }

    #[test]
    fn test_parse_doubled_quote() {
        let entries = parse_csv("A,\"B\"\"C\"");
        assert_eq!(entries, vec![WordEntry::new("A", "B\"C")]);
    }

    #[test]
    fn test_parse_multiline_quoted_field() {
        let entries = parse_csv("A,\"line1\nline2\"");
        assert_eq!(entries, vec![WordEntry::new("A", "line1\nline2")]);
    }

    #[test]
    fn test_parse_multiline_after_blank_line() {
        let entries = parse_csv("x,y\n\nA,\"line1\nline2\"\nz,w");
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], WordEntry::new("x", "y"));
        assert_eq!(entries[1], WordEntry::new("A", "line1\nline2"));
        assert_eq!(entries[2], WordEntry::new("z", "w"));
    }

    #[test]
    fn test_multiline_field_opening_line_joins_pending_record() {
        // 引用符を開く行は直前の保留行に連結される（現行の判定どおり）
        let entries = parse_csv("x,y\nA,\"line1\nline2\"");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].word, "x");
        assert_eq!(entries[0].meaning, "y\nA");
    }

    #[test]
    fn test_parse_rejects_invalid_rows() {
        let long_word = "a".repeat(61);
        let text = format!(
            "苹果,apple\n{},too long\n\nUnit 1\nunit 2,abc\n必修一\n选修二,x\n,empty word\nsingle\nok,fine",
            long_word
        );
        let entries = parse_csv(&text);
        assert_eq!(entries, vec![WordEntry::new("ok", "fine")]);
    }

    #[test]
    fn test_parse_accepts_sixty_char_word() {
        let word = "b".repeat(60);
        let entries = parse_csv(&format!("{},x", word));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].word, word);
    }

    #[test]
    fn test_parse_empty_meaning_allowed() {
        let entries = parse_csv("word,\nother");
        assert_eq!(entries, vec![WordEntry::new("word", "")]);
    }

    #[test]
    fn test_parse_extra_fields_ignored() {
        let entries = parse_csv("run,v.跑,extra,columns");
        assert_eq!(entries, vec![WordEntry::new("run", "v.跑")]);
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(parse_csv("").is_empty());
        assert!(parse_csv("\n\n\r\n").is_empty());
    }

    #[test]
    fn test_parse_backslash_escape() {
        let entries = parse_csv(r#"a\,b,c\"d"#);
        assert_eq!(entries, vec![WordEntry::new("a,b", "c\"d")]);
    }

    #[test]
    fn test_parse_trims_fields() {
        let entries = parse_csv("  hello  ,  int.你好  ");
        assert_eq!(entries, vec![WordEntry::new("hello", "int.你好")]);
    }

    // =============================================
    // split_fields テスト
    // =============================================

    #[test]
    fn test_split_fields_quoted_comma() {
        assert_eq!(split_fields("a,\"b,c\",d"), vec!["a", "b,c", "d"]);
    }

    #[test]
    fn test_split_fields_trailing_comma() {
        assert_eq!(split_fields("a,"), vec!["a", ""]);
    }

    #[test]
    fn test_split_fields_trailing_backslash() {
        assert_eq!(split_fields("a,b\\"), vec!["a", "b"]);
    }

    // =============================================
    // 補助関数テスト
    // =============================================

    #[test]
    fn test_unwrap_quoted() {
        assert_eq!(unwrap_quoted("\"say \"\"hi\"\"\""), "say \"hi\"");
        assert_eq!(unwrap_quoted("\""), "");
        assert_eq!(unwrap_quoted("plain"), "plain");
    }

    #[test]
    fn test_is_header_row() {
        assert!(is_header_row("Unit 1"));
        assert!(is_header_row("UNIT3,abc"));
        assert!(is_header_row("必修第一册"));
        // 接頭辞一致なので "unit" で始まる単語も見出し扱い
        assert!(is_header_row("unity,n.团结"));
        assert!(!is_header_row("uni"));
        assert!(!is_header_row("中"));
    }

    #[test]
    fn test_reassemble_lines() {
        let lines = reassemble_lines("a,b\nc,\"d\ne\"\n");
        assert_eq!(lines, vec!["a,b\nc,\"d\ne\""]);
    }

    #[test]
    fn test_to_csv_row_escapes() {
        let row = to_csv_row(&WordEntry::new("a\\b", "say \"hi\""));
        assert_eq!(row, r#""a\\b","say ""hi""""#);
        assert_eq!(parse_csv(&row), vec![WordEntry::new("a\\b", "say \"hi\"")]);
    }
}
