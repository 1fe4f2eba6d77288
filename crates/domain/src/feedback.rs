//! # 睡眠フィードバック
//!
//! 睡眠セッションに対して生成される助言テキスト。1セッションに複数件付き得るが、
//! 利用者に提示するのは最新セッションの最新フィードバックのみ。

use chrono::{DateTime, Utc};

use crate::sleep::SleepId;

/// 睡眠フィードバック
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SleepFeedback {
    pub sleep_id:   SleepId,
    pub content:    String,
    pub created_at: DateTime<Utc>,
}
