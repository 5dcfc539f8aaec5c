// src/services/sweeper.rs

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::services::session_store::{ExamSessionStore, SessionStore};

/// Shortest period `spawn` accepts; shorter periods are raised to it.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Entries removed by one sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub sessions_removed: usize,
    pub exams_removed: usize,
}

/// Periodically reclaims idle login sessions and old exams.
///
/// Runs independently of request traffic. A sweep racing with a request on
/// the same token may delete the entry first; the request then sees it absent.
pub struct ExpirySweeper {
    sessions: Arc<SessionStore>,
    exams: Arc<ExamSessionStore>,
    ttl: chrono::Duration,
}

impl ExpirySweeper {
    pub fn new(sessions: Arc<SessionStore>, exams: Arc<ExamSessionStore>, ttl: chrono::Duration) -> Self {
        Self { sessions, exams, ttl }
    }

    /// One pass over both stores.
    pub fn sweep(&self, now: DateTime<Utc>) -> SweepReport {
        SweepReport {
            sessions_removed: self.sessions.remove_idle(now, self.ttl),
            exams_removed: self.exams.remove_started_before(now, self.ttl),
        }
    }

    /// Spawns the sweep loop. The first sweep runs one `period` after start.
    /// The loop lives until the handle is aborted or the runtime shuts down.
    pub fn spawn(self, period: Duration) -> JoinHandle<()> {
        let period = period.max(MIN_SWEEP_INTERVAL);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                // A panicking sweep must not end the loop.
                match std::panic::catch_unwind(AssertUnwindSafe(|| self.sweep(Utc::now()))) {
                    Ok(report) => tracing::info!(
                        sessions_removed = report.sessions_removed,
                        exams_removed = report.exams_removed,
                        "Expiry sweep finished"
                    ),
                    Err(_) => tracing::error!("Expiry sweep panicked, retrying next period"),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exam::{ExamInProgress, ExamMode};
    use crate::models::session::LoginSession;
    use chrono::Duration as ChronoDuration;
    use std::collections::HashMap;

    fn exam(token: &str, started_at: DateTime<Utc>, completed: bool) -> ExamInProgress {
        ExamInProgress {
            token: token.to_string(),
            user_id: 1,
            mode: ExamMode::MockExam,
            record_id: 1,
            question_ids: vec![],
            answers: HashMap::new(),
            started_at,
            duration_minutes: 180,
            completed,
        }
    }

    fn sweeper() -> (Arc<SessionStore>, Arc<ExamSessionStore>, ExpirySweeper) {
        let sessions = Arc::new(SessionStore::new());
        let exams = Arc::new(ExamSessionStore::new());
        let sweeper = ExpirySweeper::new(
            Arc::clone(&sessions),
            Arc::clone(&exams),
            ChronoDuration::hours(24),
        );
        (sessions, exams, sweeper)
    }

    #[test]
    fn test_removes_entries_older_than_ttl() {
        let (sessions, exams, sweeper) = sweeper();
        let now = Utc::now();
        let old = now - ChronoDuration::hours(25);

        sessions.create("idle", LoginSession::new(1, "a", old));
        exams.create(exam("exam_abandoned", old, false));
        exams.create(exam("exam_finished", old, true));

        let report = sweeper.sweep(now);
        assert_eq!(report, SweepReport { sessions_removed: 1, exams_removed: 2 });
        assert!(sessions.is_empty());
        assert!(exams.is_empty());
    }

    #[test]
    fn test_young_entries_survive_repeated_sweeps() {
        let (sessions, exams, sweeper) = sweeper();
        let now = Utc::now();
        let recent = now - ChronoDuration::hours(23);

        sessions.create("active", LoginSession::new(1, "a", recent));
        exams.create(exam("exam_running", recent, false));

        for _ in 0..5 {
            assert_eq!(sweeper.sweep(now), SweepReport::default());
        }
        assert_eq!(sessions.len(), 1);
        assert!(exams.contains("exam_running"));
    }

    #[test]
    fn test_session_age_is_measured_from_last_activity() {
        let (sessions, _exams, sweeper) = sweeper();
        let now = Utc::now();
        sessions.create("refreshed", LoginSession::new(1, "a", now - ChronoDuration::hours(30)));
        sessions.get_at("refreshed", now - ChronoDuration::hours(1));

        assert_eq!(sweeper.sweep(now).sessions_removed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_loop_sweeps_each_period() {
        let (sessions, _exams, sweeper) = sweeper();
        sessions.create("idle", LoginSession::new(1, "a", Utc::now() - ChronoDuration::hours(48)));

        let handle = sweeper.spawn(Duration::from_secs(3600));
        tokio::time::sleep(Duration::from_secs(3601)).await;
        tokio::task::yield_now().await;

        assert!(sessions.is_empty());
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_period_is_raised_to_minimum() {
        let (sessions, _exams, sweeper) = sweeper();
        sessions.create("idle", LoginSession::new(1, "a", Utc::now() - ChronoDuration::hours(48)));

        let handle = sweeper.spawn(Duration::ZERO);
        tokio::time::sleep(MIN_SWEEP_INTERVAL * 2).await;
        tokio::task::yield_now().await;

        assert!(!handle.is_finished());
        assert!(sessions.is_empty());
        handle.abort();
    }
}
