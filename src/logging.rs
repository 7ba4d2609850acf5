use tracing_subscriber::EnvFilter;

/// ログ出力を初期化する
///
/// `RUST_LOG` があればそれを優先し、無ければ `default_level` を使う。
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
