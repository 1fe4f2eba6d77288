//! # Sleep Service ライブラリ
//!
//! ルーター構築、ハンドラ、ユースケースを公開する。
//! 結合テストから同じルーターを組み立てられるようにするためのもの。

pub mod app_builder;
pub mod config;
pub mod error;
pub mod extract;
pub mod handler;
pub mod middleware;
pub mod usecase;
