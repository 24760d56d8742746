// crates/leadgen-workers/src/pool.rs
// ============================================================================
// Module: Worker Pool
// Description: The process-wide claim loop, per-job heartbeat, and stale-job
// reaper.
// Purpose: N workers independently claim pending jobs,
// dispatch them to the matching phase handler, and reconcile the outcome
// (continuation, completion, retry, or fatal failure) back into the store.
// Dependencies: leadgen-core, leadgen-config, tokio, tokio-util, rand
// ============================================================================

//! ## Overview
//! Unlike a central scheduler dispatching onto a [`tokio::task::JoinSet`] of
//! per-job tasks, each worker here is an independent long-lived loop: claim,
//! process, reconcile, repeat. [`CampaignStore`] is a synchronous trait over
//! fast local storage, so there is no benefit to spawning a task per claim —
//! the loop body just calls it inline. A single reaper task and, per claimed
//! job, a short-lived heartbeat task round out the pool.

use std::sync::Arc;
use std::time::Duration;

use leadgen_core::CampaignJob;
use leadgen_core::JobId;
use leadgen_core::PhaseStatus;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::collaborators::WorkerCollaborators;
use crate::handlers;
use crate::locks::CampaignLocks;

/// Number of shards behind the per-campaign serialization lock (in-process
/// stand-in for an advisory lock — see DESIGN.md).
const CAMPAIGN_LOCK_SHARDS: usize = 64;

/// Runs the claim loop across `worker_count` tasks plus one reaper task,
/// draining cleanly when `cancel` fires.
pub struct WorkerPool {
    collaborators: WorkerCollaborators,
    locks: Arc<CampaignLocks>,
}

impl WorkerPool {
    /// Builds a pool over the given collaborators; worker tuning comes from
    /// `collaborators.config`.
    #[must_use]
    pub fn new(collaborators: WorkerCollaborators) -> Self {
        Self {
            collaborators,
            locks: Arc::new(CampaignLocks::new(CAMPAIGN_LOCK_SHARDS)),
        }
    }

    /// Spawns every worker and the reaper, then blocks until `cancel` fires
    /// and all in-flight batches have drained.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut tasks: JoinSet<()> = JoinSet::new();
        let worker_count = self.collaborators.config.worker_count.max(1);

        for index in 0..worker_count {
            let collaborators = self.collaborators.clone();
            let locks = Arc::clone(&self.locks);
            let cancel = cancel.clone();
            let worker_id = format!("worker-{index}");
            tasks.spawn(async move {
                worker_loop(worker_id, collaborators, locks, cancel).await;
            });
        }

        let collaborators = self.collaborators.clone();
        let reaper_cancel = cancel.clone();
        tasks.spawn(async move {
            reaper_loop(collaborators, reaper_cancel).await;
        });

        while tasks.join_next().await.is_some() {}
    }
}

async fn worker_loop(worker_id: String, collaborators: WorkerCollaborators, locks: Arc<CampaignLocks>, cancel: CancellationToken) {
    let poll_interval = Duration::from_millis(collaborators.config.poll_interval_ms);
    loop {
        if cancel.is_cancelled() {
            return;
        }

        let claimed = collaborators.store.claim_job(&worker_id).ok().flatten();

        let Some(job) = claimed else {
            tokio::select! {
                () = tokio::time::sleep(poll_interval) => {}
                () = cancel.cancelled() => return,
            }
            continue;
        };

        let _guard = locks.guard(job.campaign_id).await;
        let heartbeat_cancel = CancellationToken::new();
        let heartbeat_handle = spawn_heartbeat(&collaborators, job.id, worker_id.clone(), heartbeat_cancel.clone());

        let outcome = handlers::dispatch(
            &collaborators,
            &worker_id,
            job.phase_type,
            job.campaign_id,
            collaborators.config.batch_size,
        );

        heartbeat_cancel.cancel();
        let _ = heartbeat_handle.await;

        reconcile(&collaborators, &job, outcome);
    }
}

fn spawn_heartbeat(
    collaborators: &WorkerCollaborators,
    job_id: JobId,
    worker_id: String,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let store = Arc::clone(&collaborators.store);
    let interval = Duration::from_millis(collaborators.config.heartbeat_interval_ms);
    tokio::spawn(async move {
        loop {
            tokio::select! {
                () = tokio::time::sleep(interval) => {
                    let _ = store.heartbeat_job(job_id, &worker_id);
                }
                () = cancel.cancelled() => return,
            }
        }
    })
}

fn reconcile(collaborators: &WorkerCollaborators, job: &CampaignJob, outcome: Result<handlers::BatchOutcome, crate::collaborators::HandlerError>) {
    match outcome {
        Ok(result) if result.batch_done => {
            let _ = collaborators.store.complete_job(job.id);
        }
        Ok(_) => {
            let _ = collaborators.store.requeue_continuation(job.id);
        }
        Err(err) if err.is_retryable() => {
            let backoff = exponential_backoff(collaborators.config.base_backoff_ms, job.attempts);
            let _ = collaborators
                .store
                .fail_job_attempt(job.id, &err.to_string(), backoff, collaborators.config.max_attempts);
        }
        Err(err) => {
            let _ = collaborators
                .store
                .fail_job_attempt(job.id, &err.to_string(), Duration::ZERO, 0);
            let _ = collaborators.store.update_phase_status(job.campaign_id, job.phase_type, PhaseStatus::Failed);
            collaborators.emit(
                job.campaign_id,
                leadgen_core::EventType::CampaignError,
                Some(job.phase_type),
                serde_json::json!({ "error": err.to_string() }),
            );
        }
    }
}

async fn reaper_loop(collaborators: WorkerCollaborators, cancel: CancellationToken) {
    let stale_after = Duration::from_millis(collaborators.config.stale_after_ms);
    let interval = (stale_after / 3).max(Duration::from_millis(100));
    loop {
        tokio::select! {
            () = tokio::time::sleep(interval) => {
                let _ = collaborators.store.reap_stale_jobs(stale_after);
            }
            () = cancel.cancelled() => return,
        }
    }
}

/// Full jitter exponential backoff: `base * 2^attempts`, capped to avoid
/// overflow, plus up to `base` of jitter.
fn exponential_backoff(base_ms: u64, attempts: u32) -> Duration {
    let exponent = attempts.min(16);
    let scaled = base_ms.saturating_mul(1u64 << exponent);
    let jitter = if base_ms == 0 { 0 } else { rand::random::<u64>() % base_ms };
    Duration::from_millis(scaled.saturating_add(jitter))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "Unit tests use expect for setup clarity.")]
mod tests {
    use super::*;

    #[test]
    fn exponential_backoff_grows_and_stays_bounded() {
        let small = exponential_backoff(100, 0);
        let large = exponential_backoff(100, 10);
        assert!(small.as_millis() < large.as_millis());
        assert!(large.as_millis() < Duration::from_secs(3600).as_millis());
    }

    #[test]
    fn exponential_backoff_handles_zero_base() {
        let backoff = exponential_backoff(0, 5);
        assert_eq!(backoff, Duration::ZERO);
    }
}
