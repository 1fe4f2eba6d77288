//! # テスト用モックリポジトリ
//!
//! ユースケーステストとルーターテストで使うインメモリ実装。
//! `test-utils` feature を有効にすると他クレートからも利用できる。
//!
//! ```toml
//! [dev-dependencies]
//! nemuri-infra = { workspace = true, features = ["test-utils"] }
//! ```
//!
//! 並び順・件数制限・一意制約は PostgreSQL 実装のクエリと同じ振る舞いにそろえている。
//! 各モックは呼び出し回数を数えるので、「データベースに触れずに失敗する」ことも検証できる。

use std::sync::{
    Arc,
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use nemuri_domain::{
    feedback::SleepFeedback,
    optimal_condition::OptimalCondition,
    sleep::{CalendarMonth, SleepId, SleepLevelDetail, SleepLevelSummary, SleepSession},
    token::AccessToken,
    user::{Email, NewUser, PasswordHash, User, UserId},
};

use crate::{
    error::InfraError,
    repository::{
        FeedbackRepository,
        OptimalConditionRepository,
        SleepRepository,
        StoredToken,
        UserRepository,
    },
};

// ===== MockUserRepository =====

#[derive(Debug, Clone)]
struct UserRecord {
    user:      User,
    password:  PasswordHash,
    jwt_token: Option<AccessToken>,
}

#[derive(Clone, Default)]
pub struct MockUserRepository {
    records: Arc<Mutex<Vec<UserRecord>>>,
    calls:   Arc<AtomicUsize>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// トークン未発行のユーザーを追加する
    pub fn add_user(&self, user: User, password: PasswordHash) {
        self.records.lock().unwrap().push(UserRecord {
            user,
            password,
            jwt_token: None,
        });
    }

    /// 保存済みトークンを直接書き換える
    pub fn set_token(&self, email: &Email, token: Option<AccessToken>) {
        let mut records = self.records.lock().unwrap();
        if let Some(record) = records.iter_mut().find(|r| r.user.email() == email) {
            record.jwt_token = token;
        }
    }

    /// 保存済みトークンを取得する
    pub fn stored_token(&self, email: &Email) -> Option<AccessToken> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.user.email() == email)
            .and_then(|r| r.jwt_token.clone())
    }

    /// メールアドレスでユーザーを取得する（呼び出し回数に含めない）
    pub fn user(&self, email: &Email) -> Option<User> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.user.email() == email)
            .map(|r| r.user.clone())
    }

    pub fn user_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// トレイトメソッドが呼ばれた回数
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, InfraError> {
        self.record_call();
        Ok(self.user(email))
    }

    async fn find_by_credentials(
        &self,
        email: &Email,
        password: &PasswordHash,
    ) -> Result<Option<User>, InfraError> {
        self.record_call();
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.user.email() == email && &r.password == password)
            .map(|r| r.user.clone()))
    }

    async fn insert(&self, user: &NewUser) -> Result<User, InfraError> {
        self.record_call();
        let mut records = self.records.lock().unwrap();
        if records.iter().any(|r| r.user.email() == &user.email) {
            return Err(InfraError::conflict("User", user.email.as_str()));
        }
        let created = User::new(
            user.id.clone(),
            user.name.clone(),
            user.email.clone(),
            Utc::now(),
        );
        records.push(UserRecord {
            user:      created.clone(),
            password:  user.password.clone(),
            jwt_token: None,
        });
        Ok(created)
    }

    async fn update_token(&self, id: &UserId, token: &AccessToken) -> Result<(), InfraError> {
        self.record_call();
        let mut records = self.records.lock().unwrap();
        let Some(record) = records.iter_mut().find(|r| r.user.id() == id) else {
            return Err(InfraError::unexpected(format!(
                "トークン更新対象のユーザーが存在しません: {id}"
            )));
        };
        record.jwt_token = Some(token.clone());
        Ok(())
    }

    async fn find_token_by_email(&self, email: &Email) -> Result<Option<StoredToken>, InfraError> {
        self.record_call();
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.user.email() == email)
            .map(|r| StoredToken {
                user_id:   r.user.id().clone(),
                jwt_token: r.jwt_token.clone(),
            }))
    }
}

// ===== MockSleepRepository =====

#[derive(Clone, Default)]
pub struct MockSleepRepository {
    sessions:  Arc<Mutex<Vec<SleepSession>>>,
    summaries: Arc<Mutex<Vec<(SleepId, SleepLevelSummary)>>>,
    details:   Arc<Mutex<Vec<(SleepId, SleepLevelDetail)>>>,
    calls:     Arc<AtomicUsize>,
}

impl MockSleepRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_session(&self, session: SleepSession) {
        self.sessions.lock().unwrap().push(session);
    }

    pub fn add_summary(&self, sleep_id: SleepId, summary: SleepLevelSummary) {
        self.summaries.lock().unwrap().push((sleep_id, summary));
    }

    pub fn add_detail(&self, sleep_id: SleepId, detail: SleepLevelDetail) {
        self.details.lock().unwrap().push((sleep_id, detail));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn sessions_of(&self, user_id: &UserId) -> Vec<SleepSession> {
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| &s.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SleepRepository for MockSleepRepository {
    async fn find_by_month(
        &self,
        user_id: &UserId,
        month: CalendarMonth,
    ) -> Result<Vec<SleepSession>, InfraError> {
        self.record_call();
        let mut sessions: Vec<_> = self
            .sessions_of(user_id)
            .into_iter()
            .filter(|s| month.contains(s.sleep_date))
            .collect();
        sessions.sort_by_key(|s| s.sleep_date);
        Ok(sessions)
    }

    async fn find_by_date(
        &self,
        user_id: &UserId,
        date: NaiveDate,
    ) -> Result<Option<SleepSession>, InfraError> {
        self.record_call();
        Ok(self
            .sessions_of(user_id)
            .into_iter()
            .find(|s| s.sleep_date == date))
    }

    async fn find_recent(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<SleepSession>, InfraError> {
        self.record_call();
        let mut sessions = self.sessions_of(user_id);
        sessions.sort_by(|a, b| b.sleep_date.cmp(&a.sleep_date));
        sessions.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(sessions)
    }

    async fn find_level_summary(
        &self,
        sleep_id: SleepId,
    ) -> Result<Vec<SleepLevelSummary>, InfraError> {
        self.record_call();
        Ok(self
            .summaries
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == sleep_id)
            .map(|(_, s)| s.clone())
            .collect())
    }

    async fn find_level_detail(
        &self,
        sleep_id: SleepId,
    ) -> Result<Vec<SleepLevelDetail>, InfraError> {
        self.record_call();
        let mut details: Vec<_> = self
            .details
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == sleep_id)
            .map(|(_, d)| d.clone())
            .collect();
        details.sort_by_key(|d| d.start_time);
        Ok(details)
    }
}

// ===== MockFeedbackRepository =====

#[derive(Clone, Default)]
pub struct MockFeedbackRepository {
    feedback: Arc<Mutex<Vec<SleepFeedback>>>,
}

impl MockFeedbackRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_feedback(&self, feedback: SleepFeedback) {
        self.feedback.lock().unwrap().push(feedback);
    }
}

#[async_trait]
impl FeedbackRepository for MockFeedbackRepository {
    async fn find_latest_by_sleep_id(
        &self,
        sleep_id: SleepId,
    ) -> Result<Option<SleepFeedback>, InfraError> {
        Ok(self
            .feedback
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.sleep_id == sleep_id)
            .max_by_key(|f| f.created_at)
            .cloned())
    }
}

// ===== MockOptimalConditionRepository =====

#[derive(Clone, Default)]
pub struct MockOptimalConditionRepository {
    conditions: Arc<Mutex<Vec<OptimalCondition>>>,
}

impl MockOptimalConditionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_condition(&self, condition: OptimalCondition) {
        self.conditions.lock().unwrap().push(condition);
    }
}

#[async_trait]
impl OptimalConditionRepository for MockOptimalConditionRepository {
    async fn find_recent(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<OptimalCondition>, InfraError> {
        let mut conditions: Vec<_> = self
            .conditions
            .lock()
            .unwrap()
            .iter()
            .filter(|c| &c.user_id == user_id)
            .cloned()
            .collect();
        conditions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        conditions.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(conditions)
    }
}
