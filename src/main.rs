use anyhow::Context;
use clap::Parser;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use wordcard::app::CliApp;
use wordcard::{cli, config, display, logging};
use cli::{Cli, Commands};
use config::Config;
use wordcard_common::{BookKind, ThemePalette};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load().context("設定ファイルの読み込みに失敗")?;

    let level = if cli.verbose { "debug" } else { config.log_level.as_str() };
    logging::init_tracing(level);

    if let Commands::Config { show, book_base_url } = &cli.command {
        return run_config(config, *show, book_base_url.clone());
    }

    let mut app = CliApp::from_config(config)?;

    match cli.command {
        Commands::Next { count } => {
            ensure_words(&mut app).await;
            for _ in 0..count {
                show_next(&mut app).await;
            }
        }

        Commands::Auto { interval, limit } => {
            ensure_words(&mut app).await;
            let seconds = interval.unwrap_or(app.settings().auto_interval).max(1);
            println!("⏱ {}秒ごとに表示します（Ctrl-Cで終了）\n", seconds);

            let mut ticker = tokio::time::interval(Duration::from_secs(seconds as u64));
            let mut shown = 0usize;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        show_next(&mut app).await;
                        shown += 1;
                        if limit.is_some_and(|limit| shown >= limit) {
                            break;
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        println!("\n自動モードを終了しました");
                        break;
                    }
                }
            }
        }

        Commands::Import { file, name } => {
            let count = app.import_file(&file, name)?;
            println!("✔ {}個の単語を読み込みました（{}）", count, app.vocabulary().current_book());
        }

        Commands::Use { book, predefined, imported } => {
            let kind = if predefined {
                Some(BookKind::Predefined)
            } else if imported {
                Some(BookKind::Imported)
            } else {
                None
            };
            let spinner = spinner("単語帳を読み込んでいます...");
            let result = app.open_book(&book, kind).await;
            spinner.finish_and_clear();
            let count = result?;
            println!("✔ {}: {}個の単語", book, count);
        }

        Commands::Books => {
            let current = app.vocabulary().current_book().to_string();
            println!("単語帳:");
            for book in app.books() {
                let marker = if book.name == current { "*" } else { " " };
                println!(" {} {} ({})", marker, book.name, book.kind);
            }
        }

        Commands::Wallpaper { daily, download } => {
            let spinner = spinner("壁紙を取得しています...");
            let result = if daily {
                app.change_daily_wallpaper().await
            } else {
                app.change_wallpaper().await
            };
            spinner.finish_and_clear();

            if let Some(palette) = result? {
                println!("壁紙: {}", app.wallpaper().current_url());
                print_palette(&palette);
            }

            if let Some(dir) = download {
                let path = app.download_wallpaper(&dir).await?;
                println!("✔ 壁紙を保存しました: {}", path.display());
            }
        }

        Commands::Theme { image } => {
            let palette = app.theme_from_image(&image)?;
            print_palette(&palette);
        }

        Commands::Settings { show, set } => {
            for (key, value) in &set {
                app.set_setting(key, value)?;
                println!("✔ {} = {}", key, value);
            }

            if show || set.is_empty() {
                let settings = app.settings();
                println!("表示設定:");
                println!("  単語を表示: {}", settings.show_word);
                println!("  意味を表示: {}", settings.show_meaning);
                println!("  カードアニメーション: {}", settings.card_animation);
                println!("  自動モード: {}", settings.auto_mode);
                println!("  自動表示の間隔: {}秒", settings.auto_interval);
                println!("  壁紙切り替えの間隔: {}語ごと", settings.bg_interval);
                println!("  国際壁紙: {}", settings.international_wallpaper);
                println!("  国内壁紙: {}", settings.domestic_wallpaper);
                println!("  表示した単語数: {}", app.click_count());
            }
        }

        Commands::Export { file } => {
            let count = app.export_csv(&file)?;
            println!("✔ {}個の単語を書き出しました: {}", count, file.display());
        }

        Commands::Reset { yes } => {
            let confirmed = yes
                || Confirm::new()
                    .with_prompt("全ての単語帳と設定を消去します。よろしいですか？")
                    .default(false)
                    .interact()?;

            if confirmed {
                app.reset()?;
                println!("✔ 保存データを消去しました");
            } else {
                println!("キャンセルしました");
            }
        }

        Commands::Config { .. } => {}
    }

    Ok(())
}

fn run_config(mut config: Config, show: bool, book_base_url: Option<String>) -> anyhow::Result<()> {
    if let Some(url) = book_base_url {
        config.set_book_base_url(url)?;
        println!("✔ 単語帳の取得元を設定しました");
    }

    if show {
        println!("設定ファイル: {}", Config::config_path()?.display());
        println!("  単語帳の取得元: {}", config.book_base_url.as_deref().unwrap_or("未設定"));
        println!("  内蔵単語帳: {}", config.predefined_books.join(", "));
        println!("  保存先: {}", config.storage_path()?.display());
        println!("  タイムアウト: {}秒", config.timeout_seconds);
        println!("  ログレベル: {}", config.log_level);
    }
    Ok(())
}

/// 単語が無ければ内蔵単語帳の自動読み込みを試す
async fn ensure_words(app: &mut CliApp) {
    if !app.vocabulary().is_empty() {
        return;
    }
    if !app.try_auto_load().await {
        println!("単語帳がありません。`wordcard import <FILE>` でCSVを読み込んでください\n");
    }
}

async fn show_next(app: &mut CliApp) {
    let card = app.next_card();
    println!("{}\n", display::render_card(&card.entry, app.settings()));

    if card.wallpaper_due {
        match app.change_wallpaper().await {
            Ok(Some(palette)) => print_palette(&palette),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "壁紙を切り替えられませんでした"),
        }
    }
}

fn print_palette(palette: &ThemePalette) {
    println!("テーマ色: {}", palette.color);
    println!("  primary: {}", palette.primary);
    println!("  secondary: {}", palette.secondary);
    println!("  third: {}", palette.third);
    println!("  文字色: {}", palette.text.css());
    println!("  白とのコントラスト比: {:.2}", palette.contrast_with_white);
}

fn spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
