//! # 推奨寝室環境
//!
//! ユーザーごとに算出された寝室の目標温湿度。更新のたびに行が追加され、
//! 直近の数件を新しい順に提示する。

use chrono::{DateTime, Utc};

use crate::user::UserId;

/// 一度に提示する推奨環境の件数
pub const RECENT_CONDITION_LIMIT: i64 = 3;

/// 推奨寝室環境
#[derive(Debug, Clone, PartialEq)]
pub struct OptimalCondition {
    pub user_id:            UserId,
    pub updated_at:         DateTime<Utc>,
    /// 目標室温（℃）
    pub target_temperature: f64,
    /// 目標湿度（%）
    pub target_humidity:    f64,
    pub description:        Option<String>,
}
