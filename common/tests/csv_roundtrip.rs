//! CSV書き出し → 読み込みの往復テスト
//!
//! 漢字を含まない60文字以下の単語なら、書き出した行を読み戻すと元に戻る

use proptest::prelude::*;
use wordcard_common::parser::to_csv_row;
use wordcard_common::{parse_csv, to_csv, WordEntry};

fn arb_word() -> impl Strategy<Value = String> {
    r#"[A-Za-z][A-Za-z ,.'"\\-]{0,58}[A-Za-z]|[A-Za-z]"#
}

fn arb_meaning() -> impl Strategy<Value = String> {
    r#"[a-z0-9 ,.;:'"\\\n一-龥（）]{0,40}"#.prop_filter("前後の空白・引用符は正規化されるため除外", |m| {
        m.trim() == m.as_str() && !(m.starts_with('"') && m.ends_with('"'))
    })
}

fn arb_entry() -> impl Strategy<Value = WordEntry> {
    (arb_word(), arb_meaning()).prop_map(|(word, meaning)| WordEntry { word, meaning })
}

proptest! {
    #[test]
    fn prop_single_row_roundtrip(entry in arb_entry()) {
        let row = to_csv_row(&entry);
        let parsed = parse_csv(&row);
        prop_assert_eq!(parsed, vec![entry]);
    }

    #[test]
    fn prop_many_rows_preserve_order(
        entries in prop::collection::vec(
            (arb_word(), "[a-z0-9 ,.;'\"一-龥]{0,20}")
                .prop_filter("前後の空白・引用符は正規化されるため除外", |(_, m)| {
                    m.trim() == m.as_str() && !(m.starts_with('"') && m.ends_with('"'))
                })
                .prop_map(|(word, meaning)| WordEntry { word, meaning }),
            0..20,
        )
    ) {
        let parsed = parse_csv(&to_csv(&entries));
        prop_assert_eq!(parsed, entries);
    }

    #[test]
    fn prop_parse_never_panics(text in "\\PC{0,200}") {
        let entries = parse_csv(&text);
        for entry in entries {
            prop_assert!(!entry.word.is_empty());
            prop_assert!(entry.word.chars().count() <= 60);
        }
    }
}

#[test]
fn test_multiline_meaning_roundtrip() {
    let entry = WordEntry::new("bank", "n.银行\nn.河岸");
    let row = to_csv_row(&entry);
    assert!(row.contains('\n'));
    assert_eq!(parse_csv(&row), vec![entry]);
}
