//! # ミドルウェア
//!
//! ルーター全体に適用する axum ミドルウェアを定義する。
//!
//! - `cors`: クロスオリジン用ヘッダーの付与とプリフライト応答

pub mod cors;

pub use cors::cors;
