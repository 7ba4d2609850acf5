//! wordcard: 単語カードCLI
//!
//! 中核ロジックは `wordcard-common`、ここではファイル永続化・HTTP取得・
//! 画像デコードとコマンドラインを提供する。

pub mod app;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod http;
pub mod logging;
pub mod sampler;
pub mod storage;
