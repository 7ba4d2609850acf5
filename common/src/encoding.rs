//! 文字コード判定
//!
//! 候補（UTF-8 → GB2312 → GBK）を順に厳密デコードし、
//! CSVらしい文字（ASCII英字またはカンマ）を含む最初の結果を採用する。
//! どれも該当しない場合は UTF-8 の置換デコードに落とす。

use encoding_rs::{Encoding, UTF_8};

/// 試行する文字コードのラベル（この順で試す）
pub const CANDIDATE_LABELS: &[&str] = &["utf-8", "gb2312", "gbk"];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// バイト列をテキストに変換する
///
/// 失敗しない関数。最悪でも置換文字入りの文字列か空文字列を返す。
///
/// # Examples
/// ```
/// use wordcard_common::encoding::detect;
///
/// assert_eq!(detect(b"apple,pomme"), "apple,pomme");
/// ```
pub fn detect(bytes: &[u8]) -> String {
    for label in CANDIDATE_LABELS {
        let Some(encoding) = Encoding::for_label(label.as_bytes()) else {
            continue;
        };

        match decode_strict(encoding, bytes) {
            Some(text) if looks_like_csv(&text) => {
                tracing::debug!(encoding = label, "文字コードを判定");
                return text;
            }
            Some(_) => {
                tracing::debug!(encoding = label, "デコード結果がCSVらしくないため次の候補へ");
            }
            None => {
                tracing::debug!(encoding = label, "不正なバイト列のため次の候補へ");
            }
        }
    }

    tracing::warn!("全ての候補でデコードに失敗、UTF-8（置換あり）で読み込みます");
    let (text, _, _) = UTF_8.decode(bytes);
    text.into_owned()
}

/// 不正なバイト列があれば None を返すデコード
fn decode_strict(encoding: &'static Encoding, bytes: &[u8]) -> Option<String> {
    let body = if encoding == UTF_8 {
        bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
    } else {
        bytes
    };

    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .map(|text| text.into_owned())
}

/// CSVらしさの簡易判定: ASCII英字かカンマを1文字以上含む
fn looks_like_csv(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_alphabetic() || c == ',')
}
