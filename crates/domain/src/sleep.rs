//! # 睡眠セッション
//!
//! 1ユーザー・1暦日につき1件の睡眠記録と、そのステージ別集計・ステージ推移を定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 備考 |
//! |---|------------|------|
//! | [`SleepSession`] | 睡眠セッション | `(user_id, sleep_date)` で一意 |
//! | [`SleepLevel`] | 睡眠ステージ | stages 形式（deep/light/rem/wake）と classic 形式（asleep/restless/awake） |
//! | [`SleepLevelSummary`] | ステージ集計 | ステージごとの回数・分数 |
//! | [`SleepLevelDetail`] | ステージ推移 | 開始時刻順の時系列 |
//! | [`CalendarMonth`] | 対象年月 | カレンダー表示の検索条件 |

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::{DomainError, user::UserId};

/// 直近セッション一覧で返す最大件数
pub const RECENT_SESSION_LIMIT: i64 = 3;

/// 睡眠セッション ID（データベースの identity 列）
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[serde(transparent)]
#[display("{_0}")]
pub struct SleepId(i64);

impl SleepId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

/// 睡眠ステージ
///
/// 保存値と JSON 表現はどちらも小文字。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SleepLevel {
    Deep,
    Light,
    Rem,
    Wake,
    Asleep,
    Restless,
    Awake,
}

/// 睡眠セッション
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SleepSession {
    pub id:                  SleepId,
    pub user_id:             UserId,
    pub sleep_date:          NaiveDate,
    pub total_sleep_minutes: i32,
    pub sleep_score:         i32,
}

/// ステージ別の集計
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SleepLevelSummary {
    pub level:   SleepLevel,
    pub count:   i32,
    pub minutes: i32,
}

/// ステージ推移の1区間
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SleepLevelDetail {
    pub start_time:   DateTime<Utc>,
    pub level:        SleepLevel,
    pub duration_sec: i32,
}

/// 1日分の睡眠詳細
///
/// 集計・推移が0件でもセッションが存在すれば組み立てられる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySleepDetails {
    pub session: SleepSession,
    pub summary: Vec<SleepLevelSummary>,
    pub detail:  Vec<SleepLevelDetail>,
}

/// 受け付ける年の範囲
const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

/// カレンダー表示の対象年月
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarMonth {
    year:  i32,
    month: u32,
}

impl CalendarMonth {
    /// 年月を検証して作成する
    ///
    /// 年は 1〜9999、月は 1〜12。
    pub fn new(year: i64, month: i64) -> Result<Self, DomainError> {
        let year = validate_year(year)?;
        let month = u32::try_from(month)
            .ok()
            .filter(|m| (1..=12).contains(m))
            .ok_or_else(|| {
                DomainError::Validation("月は 1 から 12 の範囲で指定してください".to_string())
            })?;
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// 月初日
    pub fn first_day(&self) -> NaiveDate {
        // new() で範囲を検証済みのため月初日は必ず存在する
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// 翌月の月初日（検索範囲の排他的上限）
    pub fn next_month_first_day(&self) -> NaiveDate {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MAX)
    }

    /// 日付がこの年月に含まれるか
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

/// 年月日を検証して暦日を作る
///
/// 2月30日のように存在しない日付は `Validation` エラー。
pub fn calendar_date(year: i64, month: i64, day: i64) -> Result<NaiveDate, DomainError> {
    let calendar_month = CalendarMonth::new(year, month)?;
    u32::try_from(day)
        .ok()
        .and_then(|d| NaiveDate::from_ymd_opt(calendar_month.year, calendar_month.month, d))
        .ok_or_else(|| {
            DomainError::Validation(format!(
                "存在しない日付です: {year}-{month:02}-{day:02}"
            ))
        })
}

fn validate_year(year: i64) -> Result<i32, DomainError> {
    i32::try_from(year)
        .ok()
        .filter(|y| (MIN_YEAR..=MAX_YEAR).contains(y))
        .ok_or_else(|| {
            DomainError::Validation(format!(
                "年は {MIN_YEAR} から {MAX_YEAR} の範囲で指定してください"
            ))
        })
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("deep", SleepLevel::Deep)]
    #[case("light", SleepLevel::Light)]
    #[case("rem", SleepLevel::Rem)]
    #[case("wake", SleepLevel::Wake)]
    #[case("asleep", SleepLevel::Asleep)]
    #[case("restless", SleepLevel::Restless)]
    #[case("awake", SleepLevel::Awake)]
    fn test_sleep_level_保存値との相互変換(#[case] stored: &str, #[case] level: SleepLevel) {
        assert_eq!(SleepLevel::from_str(stored).unwrap(), level);
        assert_eq!(level.to_string(), stored);
        assert_eq!(serde_json::to_value(level).unwrap(), stored);
    }

    #[test]
    fn test_sleep_level_未知の値はエラー() {
        assert!(SleepLevel::from_str("nap").is_err());
    }

    #[test]
    fn test_sleep_id_はjsonで数値になる() {
        assert_eq!(serde_json::to_value(SleepId::new(42)).unwrap(), 42);
    }

    #[rstest]
    #[case(2024, 1, "2024-01-01", "2024-02-01")]
    #[case(2024, 12, "2024-12-01", "2025-01-01")]
    #[case(2023, 2, "2023-02-01", "2023-03-01")]
    fn test_calendar_month_検索範囲(
        #[case] year: i64,
        #[case] month: i64,
        #[case] first: &str,
        #[case] next: &str,
    ) {
        let sut = CalendarMonth::new(year, month).unwrap();

        assert_eq!(sut.first_day().to_string(), first);
        assert_eq!(sut.next_month_first_day().to_string(), next);
    }

    #[rstest]
    #[case(2024, 0)]
    #[case(2024, 13)]
    #[case(2024, -1)]
    #[case(0, 5)]
    #[case(10_000, 5)]
    fn test_calendar_month_範囲外を拒否する(#[case] year: i64, #[case] month: i64) {
        assert!(matches!(
            CalendarMonth::new(year, month),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_calendar_month_contains() {
        let sut = CalendarMonth::new(2024, 2).unwrap();

        assert!(sut.contains(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()));
        assert!(!sut.contains(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
        assert!(!sut.contains(NaiveDate::from_ymd_opt(2023, 2, 1).unwrap()));
    }

    #[test]
    fn test_calendar_date_うるう日を受け付ける() {
        let date = calendar_date(2024, 2, 29).unwrap();
        assert_eq!(date.to_string(), "2024-02-29");
    }

    #[rstest]
    #[case(2023, 2, 29)]
    #[case(2024, 4, 31)]
    #[case(2024, 5, 0)]
    #[case(2024, 5, -3)]
    fn test_calendar_date_存在しない日付を拒否する(
        #[case] year: i64,
        #[case] month: i64,
        #[case] day: i64,
    ) {
        assert!(matches!(
            calendar_date(year, month, day),
            Err(DomainError::Validation(_))
        ));
    }
}
