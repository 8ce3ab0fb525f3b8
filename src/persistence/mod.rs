//! Score persistence
//!
//! The record store is an external collaborator reached through insert,
//! select and update calls. Reporting is best-effort:
//! - Each write runs as a detached task, never awaited by the game loop
//! - Failures are logged and swallowed
//! - Nothing is retried
//!
//! Anonymous players (no current user) are never reported.

mod memory;

pub use memory::MemoryStore;

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::consts::{SCORE_PER_WAVE, XP_DIVISOR};
use crate::platform::spawn_detached;
use crate::settings::GameMode;

pub const SCORES_TABLE: &str = "quant_scores";
pub const USERS_TABLE: &str = "users";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),
    #[error("no row `{id}` in `{table}`")]
    NotFound { table: &'static str, id: String },
    #[error("malformed row: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Opaque row store (e.g. a hosted backend-as-a-service)
pub trait RecordStore: Send + Sync + 'static {
    fn insert(
        &self,
        table: &'static str,
        record: Value,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Row whose `id` column equals `id`
    fn select_one(
        &self,
        table: &'static str,
        id: &str,
    ) -> impl Future<Output = Result<Option<Value>, StoreError>> + Send;

    /// Merge `patch` into the row whose `id` column equals `id`
    fn update(
        &self,
        table: &'static str,
        id: &str,
        patch: Value,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Who is playing
pub trait AuthProvider: Send + Sync {
    fn current_user(&self) -> Option<String>;
}

/// Nobody signed in
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl AuthProvider for Anonymous {
    fn current_user(&self) -> Option<String> {
        None
    }
}

/// A fixed signed-in user
#[derive(Debug, Clone)]
pub struct SignedIn(pub String);

impl AuthProvider for SignedIn {
    fn current_user(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Final result of a scored session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub user_id: String,
    pub game_mode: GameMode,
    pub score: u64,
    pub wave_reached: u64,
    pub xp_gain: u64,
}

impl ScoreReport {
    pub fn new(user_id: String, game_mode: GameMode, score: u64) -> Self {
        Self {
            user_id,
            game_mode,
            score,
            wave_reached: score / SCORE_PER_WAVE + 1,
            xp_gain: score / XP_DIVISOR,
        }
    }
}

/// Receives the report when a scored session ends
pub trait ReportSink: Send {
    fn submit(&self, report: ScoreReport);
}

impl<F> ReportSink for F
where
    F: Fn(ScoreReport) + Send,
{
    fn submit(&self, report: ScoreReport) {
        self(report)
    }
}

/// Insert the session into the scores table
pub async fn record_score<S: RecordStore + ?Sized>(
    store: &S,
    report: &ScoreReport,
) -> Result<(), StoreError> {
    let row = json!({
        "user_id": report.user_id,
        "game_mode": report.game_mode.as_str(),
        "score": report.score,
        "wave_reached": report.wave_reached,
    });
    store.insert(SCORES_TABLE, row).await
}

#[derive(Debug, Deserialize)]
struct UserXp {
    #[serde(default)]
    xp: u64,
}

/// Read the user's xp and write back `xp + xp_gain`. Not atomic.
pub async fn award_xp<S: RecordStore + ?Sized>(
    store: &S,
    report: &ScoreReport,
) -> Result<u64, StoreError> {
    let row = store
        .select_one(USERS_TABLE, &report.user_id)
        .await?
        .ok_or_else(|| StoreError::NotFound {
            table: USERS_TABLE,
            id: report.user_id.clone(),
        })?;
    let current: UserXp = serde_json::from_value(row)?;
    let xp = current.xp + report.xp_gain;
    store
        .update(USERS_TABLE, &report.user_id, json!({ "xp": xp }))
        .await?;
    Ok(xp)
}

/// Fire-and-forget reporter backed by a [`RecordStore`]
pub struct ScoreReporter<S> {
    store: Arc<S>,
}

impl<S: RecordStore> ScoreReporter<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S> Clone for ScoreReporter<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: RecordStore> ReportSink for ScoreReporter<S> {
    fn submit(&self, report: ScoreReport) {
        let store = self.store.clone();
        let score_report = report.clone();
        spawn_detached(async move {
            match record_score(store.as_ref(), &score_report).await {
                Ok(()) => log::info!(
                    "Recorded score {} for {}",
                    score_report.score,
                    score_report.user_id
                ),
                Err(e) => log::warn!("Failed to record score (not retried): {e}"),
            }
        });

        let store = self.store.clone();
        spawn_detached(async move {
            match award_xp(store.as_ref(), &report).await {
                Ok(xp) => log::info!("{} now has {xp} xp", report.user_id),
                Err(e) => log::warn!("Failed to award xp (not retried): {e}"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn report(score: u64) -> ScoreReport {
        ScoreReport::new("u1".into(), GameMode::Add, score)
    }

    #[test]
    fn test_report_derives_wave_and_xp() {
        let r = report(175);
        assert_eq!(r.wave_reached, 4);
        assert_eq!(r.xp_gain, 87);
        assert_eq!(report(49).wave_reached, 1);
        assert_eq!(report(50).wave_reached, 2);
    }

    #[tokio::test]
    async fn test_record_score_row_shape() {
        let store = MemoryStore::new();
        record_score(&store, &report(120)).await.unwrap();
        let rows = store.rows(SCORES_TABLE);
        assert_eq!(
            rows,
            vec![json!({
                "user_id": "u1",
                "game_mode": "add",
                "score": 120,
                "wave_reached": 3
            })]
        );
    }

    #[tokio::test]
    async fn test_award_xp_adds_to_existing() {
        let store = MemoryStore::new();
        store.add_user("u1", 40);
        assert_eq!(award_xp(&store, &report(31)).await.unwrap(), 55);
        assert_eq!(store.xp("u1"), Some(55));
    }

    #[tokio::test]
    async fn test_award_xp_missing_user() {
        let store = MemoryStore::new();
        let err = award_xp(&store, &report(10)).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::NotFound {
                table: USERS_TABLE,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reporter_writes_in_background() {
        let store = Arc::new(MemoryStore::new());
        store.add_user("u1", 0);
        let reporter = ScoreReporter::new(store.clone());

        reporter.submit(report(100));
        // Nothing has run yet: submit never waits on the store
        assert!(store.rows(SCORES_TABLE).is_empty());

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(store.rows(SCORES_TABLE).len(), 1);
        assert_eq!(store.xp("u1"), Some(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reporter_swallows_failures() {
        let store = Arc::new(MemoryStore::unavailable());
        let reporter = ScoreReporter::new(store.clone());
        reporter.submit(report(100));
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(store.rows(SCORES_TABLE).is_empty());
    }

    #[test]
    fn test_closure_sink() {
        let seen = std::sync::Mutex::new(Vec::new());
        let sink = |r: ScoreReport| seen.lock().unwrap().push(r.score);
        sink.submit(report(7));
        assert_eq!(*seen.lock().unwrap(), vec![7]);
    }
}
