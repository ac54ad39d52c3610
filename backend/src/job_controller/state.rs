//! Tracks long-running background jobs.
//!
//! Work that should not hold up a request, such as re-analysing a media item
//! with the AI service or importing files found in the media bucket, runs as
//! a job. The handler registers the job, answers `202` with its id right away
//! and the client polls `GET /api/jobs/{job_id}`.
//!
//! The main components are:
//! - `JobsState`: a clonable, thread-safe registry of job statuses, shared with
//!   the handlers as `web::Data`.
//! - `JobUpdate`: a status change sent by a running job.
//! - `start_job_updater`: the task that applies `JobUpdate`s to the registry.
//!
//! Finished jobs stay readable for `retention` after they finish and are
//! dropped on the next registration or update after that.

use common::jobs::JobStatus;
use std::time::{Duration, Instant};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

pub const FINISHED_JOB_RETENTION: Duration = Duration::from_secs(15 * 60);

/// The latest status of a job and when it reached a final one.
#[derive(Debug, Clone)]
pub struct JobEntry {
    pub status: JobStatus,
    finished_at: Option<Instant>,
}

impl JobEntry {
    fn new(status: JobStatus, now: Instant) -> Self {
        let finished_at = status.is_finished().then_some(now);
        Self { status, finished_at }
    }
}

/// A thread-safe, shareable container for the state of all background jobs.
#[derive(Clone)]
pub struct JobsState {
    /// Job id to its latest status. Handlers read it; only the updater writes
    /// after registration.
    pub jobs: Arc<RwLock<HashMap<String, JobEntry>>>,

    /// Running jobs report through this sender so they never need the write
    /// lock themselves.
    pub tx: mpsc::Sender<JobUpdate>,

    retention: Duration,
}

/// Drops finished jobs older than `retention`.
fn evict_finished(jobs: &mut HashMap<String, JobEntry>, retention: Duration, now: Instant) {
    jobs.retain(|_, entry| {
        entry
            .finished_at
            .is_none_or(|finished| now.duration_since(finished) < retention)
    });
}

/// A status update for one background job.
#[derive(Debug)]
pub struct JobUpdate {
    pub(crate) job_id: String,
    pub(crate) status: JobStatus,
}

impl JobsState {
    /// Creates the registry and the receiving end for `start_job_updater`.
    pub fn new() -> (Self, mpsc::Receiver<JobUpdate>) {
        Self::with_retention(FINISHED_JOB_RETENTION)
    }

    pub fn with_retention(retention: Duration) -> (Self, mpsc::Receiver<JobUpdate>) {
        let (tx, rx) = mpsc::channel(100);
        let state = JobsState {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            tx,
            retention,
        };
        (state, rx)
    }

    /// Registers a new job as `Pending` and returns its id.
    pub async fn register(&self) -> String {
        let job_id = Uuid::new_v4().to_string();
        let now = Instant::now();
        let mut jobs = self.jobs.write().await;
        evict_finished(&mut jobs, self.retention, now);
        jobs.insert(job_id.clone(), JobEntry::new(JobStatus::Pending, now));
        job_id
    }

    pub async fn report(&self, job_id: &str, status: JobStatus) {
        let update = JobUpdate {
            job_id: job_id.to_string(),
            status,
        };
        if let Err(e) = self.tx.send(update).await {
            log::warn!("Job updater is gone, dropping update for {}", e.0.job_id);
        }
    }

    /// `report` for jobs running on the blocking pool.
    pub fn report_blocking(&self, job_id: &str, status: JobStatus) {
        let update = JobUpdate {
            job_id: job_id.to_string(),
            status,
        };
        if let Err(e) = self.tx.blocking_send(update) {
            log::warn!("Job updater is gone, dropping update for {}", e.0.job_id);
        }
    }

    pub async fn status(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs.read().await.get(job_id).map(|entry| entry.status.clone())
    }
}

/// Applies every `JobUpdate` received on `rx` to the shared registry until all
/// senders are dropped.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        let now = Instant::now();
        let mut jobs = state.jobs.write().await;
        evict_finished(&mut jobs, state.retention, now);
        jobs.insert(update.job_id, JobEntry::new(update.status, now));
    }
}
