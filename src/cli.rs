use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "wordcard")]
#[command(about = "単語カード表示・壁紙テーマツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 次の単語をランダムに表示
    Next {
        /// 表示する枚数
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,
    },

    /// 一定間隔で単語を表示し続ける（Ctrl-Cで終了）
    Auto {
        /// 表示間隔（秒、省略時は設定値）
        #[arg(short, long)]
        interval: Option<u32>,

        /// 表示する枚数の上限
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// CSV単語帳をインポート
    Import {
        /// CSVファイル
        #[arg(required = true)]
        file: PathBuf,

        /// 一覧に表示する名前（デフォルト: ファイル名）
        #[arg(long)]
        name: Option<String>,
    },

    /// 単語帳を切り替える（内蔵・インポート済み・URL）
    Use {
        #[arg(required = true)]
        book: String,

        /// 同名のインポート済み単語帳があっても内蔵単語帳を開く
        #[arg(long, conflicts_with = "imported")]
        predefined: bool,

        /// インポート済み単語帳として開く
        #[arg(long)]
        imported: bool,
    },

    /// 単語帳の一覧
    Books,

    /// 壁紙を切り替えてテーマ色を表示
    Wallpaper {
        /// 今日の壁紙を使う
        #[arg(long)]
        daily: bool,

        /// 壁紙を保存するディレクトリ
        #[arg(short, long)]
        download: Option<PathBuf>,
    },

    /// 画像ファイルからテーマ色を求める
    Theme {
        #[arg(required = true)]
        image: PathBuf,
    },

    /// 表示設定
    Settings {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// 設定を変更（key=value、複数指定可）
        #[arg(long, value_parser = parse_key_value)]
        set: Vec<(String, String)>,
    },

    /// 設定ファイル
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// 内蔵単語帳の取得元URL
        #[arg(long)]
        book_base_url: Option<String>,
    },

    /// 現在の単語リストをCSVで書き出す
    Export {
        /// 出力CSVファイル
        #[arg(required = true)]
        file: PathBuf,
    },

    /// 保存データを全て消去
    Reset {
        /// 確認せずに消去
        #[arg(short, long)]
        yes: bool,
    },
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("key=value の形式で指定してください: {}", s))?;
    Ok((key.trim().to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("bgInterval=5").unwrap(),
            ("bgInterval".to_string(), "5".to_string())
        );
        assert!(parse_key_value("bgInterval").is_err());
    }

    #[test]
    fn test_parse_settings_command() {
        let cli = Cli::try_parse_from([
            "wordcard", "settings", "--set", "showWord=false", "--set", "auto_interval=30",
        ])
        .unwrap();

        match cli.command {
            Commands::Settings { show, set } => {
                assert!(!show);
                assert_eq!(set.len(), 2);
                assert_eq!(set[1].0, "auto_interval");
            }
            _ => panic!("settings コマンドとして解析されていない"),
        }
    }

    #[test]
    fn test_parse_use_kind_flags() {
        let cli = Cli::try_parse_from(["wordcard", "use", "四级.csv", "--predefined"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Use { predefined: true, imported: false, .. }
        ));

        let both = Cli::try_parse_from(["wordcard", "use", "四级.csv", "--predefined", "--imported"]);
        assert!(both.is_err());
    }

    #[test]
    fn test_parse_next_default_count() {
        let cli = Cli::try_parse_from(["wordcard", "next"]).unwrap();
        assert!(matches!(cli.command, Commands::Next { count: 1 }));
    }
}
