//! Job processor (C5): drains `queue:worldgen` by spawn-proximity, dispatches
//! to the right generator, updates audit records, retries with backoff,
//! enqueues follow-ups (§4.3). Outer loop shape follows the teacher's
//! `run_worker`/`process_next` + idle-sleep pattern from `queue_workers.rs`,
//! adapted from an in-process `Notify` to a polling sleep since the queue
//! lives in Redis, shared across processes (SPEC_FULL §4.3).

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::application::{archiver, building, hub, track, village};
use crate::domain::{JobEnvelope, JobPayload};
use crate::error::InfraError;
use crate::state::AppState;

const MAX_ATTEMPTS: i32 = 3;
const IDLE_SLEEP: Duration = Duration::from_millis(500);

pub async fn run_processor(state: Arc<AppState>, shutdown: tokio_util::sync::CancellationToken) {
    tracing::info!("job processor starting");

    if let Err(e) = reconcile_dangling_jobs(&state).await {
        tracing::error!(error = %e, "startup reconciliation of dangling jobs failed");
    }
    if let Err(e) = hub::ensure_hub_job_enqueued(&state).await {
        tracing::error!(error = %e, "failed to ensure hub initializer job is enqueued");
    }

    loop {
        if shutdown.is_cancelled() {
            tracing::info!("job processor received shutdown signal");
            return;
        }

        let envelope = match state.bus.take_closest().await {
            Ok(Some(env)) => env,
            Ok(None) => {
                tokio::select! {
                    _ = tokio::time::sleep(IDLE_SLEEP) => continue,
                    _ = shutdown.cancelled() => return,
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to read queue:worldgen, retrying after idle sleep");
                tokio::time::sleep(IDLE_SLEEP).await;
                continue;
            }
        };

        process_envelope(&state, envelope).await;
    }
}

async fn reconcile_dangling_jobs(state: &AppState) -> Result<(), InfraError> {
    let reset = state.store.reset_dangling_in_progress().await?;
    if reset.is_empty() {
        return Ok(());
    }
    tracing::warn!(count = reset.len(), "reset dangling InProgress jobs to Pending at startup, re-enqueueing");
    for (job_id, payload) in reset {
        let envelope = JobEnvelope::new(job_id, payload);
        state.bus.push_job(&envelope).await?;
    }
    Ok(())
}

async fn process_envelope(state: &AppState, envelope: JobEnvelope) {
    if let Err(e) = state.store.mark_in_progress(envelope.job_id).await {
        tracing::error!(job_id = %envelope.job_id, error = %e, "failed to mark job InProgress, skipping");
        return;
    }

    match dispatch(state, &envelope.payload).await {
        Ok(()) => {
            if let Err(e) = state.store.mark_completed(envelope.job_id, Utc::now()).await {
                tracing::error!(job_id = %envelope.job_id, error = %e, "failed to mark job Completed");
            }
            run_post_hooks(state, &envelope).await;
        }
        Err(e) if e.is_retryable() => {
            handle_retryable_failure(state, &envelope, &e).await;
        }
        Err(e) => {
            tracing::error!(job_id = %envelope.job_id, error = %e, "job failed terminally, not retrying");
            if let Err(store_err) = state.store.mark_failed(envelope.job_id, &e.to_string()).await {
                tracing::error!(job_id = %envelope.job_id, error = %store_err, "failed to mark job Failed");
            }
        }
    }
}

async fn handle_retryable_failure(state: &AppState, envelope: &JobEnvelope, error: &InfraError) {
    // attempts was incremented by mark_in_progress; re-derive it from the
    // audit row would require a round trip, so the processor tracks it via
    // the queue-level retry count carried alongside the envelope instead —
    // simplest correct approach: read it back.
    let attempts = match state.store.get_job_attempts(envelope.job_id).await {
        Ok(Some(a)) => a,
        _ => MAX_ATTEMPTS,
    };

    if attempts < MAX_ATTEMPTS {
        let backoff = Duration::from_secs(2 * 2u64.pow((attempts - 1).max(0) as u32));
        tracing::warn!(
            job_id = %envelope.job_id, attempts, backoff_secs = backoff.as_secs(), error = %error,
            "job failed transiently, retrying after backoff"
        );
        if let Err(e) = state.store.mark_pending_with_error(envelope.job_id, &error.to_string()).await {
            tracing::error!(job_id = %envelope.job_id, error = %e, "failed to mark job Pending for retry");
        }
        tokio::time::sleep(backoff).await;
        if let Err(e) = state.bus.push_job(envelope).await {
            tracing::error!(job_id = %envelope.job_id, error = %e, "failed to re-push job for retry");
        }
    } else {
        tracing::error!(job_id = %envelope.job_id, error = %error, "job exhausted retries, marking Failed");
        if let Err(e) = state.store.mark_failed(envelope.job_id, &error.to_string()).await {
            tracing::error!(job_id = %envelope.job_id, error = %e, "failed to mark job Failed");
        }
    }
}

async fn dispatch(state: &AppState, payload: &JobPayload) -> Result<(), InfraError> {
    match payload {
        JobPayload::CreateCrossroads(p) => hub::create_hub(state, p).await,
        JobPayload::CreateVillage(p) => village::create_village(state, p).await,
        JobPayload::CreateBuilding(p) => building::create_building(state, p).await,
        JobPayload::UpdateBuilding(p) => building::update_building(state, p).await,
        JobPayload::ArchiveBuilding(p) => archiver::archive_building(state, p).await,
        JobPayload::ArchiveVillage(p) => archiver::archive_village(state, p).await,
        JobPayload::CreateTrack(p) => track::create_track(state, p).await,
    }
}

/// Post-success side effects (§4.3 "On success"): marker upserts, a
/// best-effort broadcast, and — for `CreateVillage` only — the follow-up
/// `CreateTrack` job to the hub (hub-and-spoke, §4.9).
async fn run_post_hooks(state: &AppState, envelope: &JobEnvelope) {
    match &envelope.payload {
        JobPayload::CreateVillage(p) => {
            state.plugin.upsert_village_marker(&p.group_id.to_string(), "Village", p.center_x, p.center_z).await;
            broadcast_activity(state, "Village construction complete").await;
            if let Err(e) = village::enqueue_track_to_hub(state, p).await {
                tracing::error!(error = %e, "failed to enqueue follow-up CreateTrack job");
            }
        }
        JobPayload::CreateBuilding(p) => {
            let (bx, bz) = crate::domain::building_place((p.group_center_x, p.group_center_z), p.building_index);
            state.plugin.upsert_building_marker(&p.channel_id.to_string(), &p.channel_name, bx, bz).await;
            broadcast_activity(state, &format!("Building '{}' complete", p.channel_name)).await;
        }
        JobPayload::CreateCrossroads(_) => {
            broadcast_activity(state, "The Crossroads is open").await;
        }
        _ => {}
    }
}

async fn broadcast_activity(state: &AppState, summary: &str) {
    use villagemc_shared::events::{WorldActivityKind, WorldActivityRecord};
    let record = WorldActivityRecord {
        kind: WorldActivityKind::BuildCompleted,
        summary: summary.to_string(),
        timestamp: Utc::now(),
    };
    if let Ok(json) = serde_json::to_string(&record) {
        let _ = state.bus.publish(crate::infrastructure::bus::TOPIC_WORLD_ACTIVITY, &json).await;
    }

    // §4.3 "On success": best-effort tellraw broadcast to the game console,
    // never blocking the job on the command channel being reachable.
    if let Ok(text_component) = serde_json::to_string(&serde_json::json!({ "text": summary })) {
        let cmd = crate::infrastructure::command_channel::commands::tellraw_broadcast(&text_component);
        if let Err(e) = state.command_channel.send(&cmd).await {
            tracing::warn!(error = %e, "tellraw broadcast failed, continuing");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CreateCrossroadsPayload, CreateVillagePayload, GroupId};

    #[test]
    fn backoff_durations_follow_2_4_8_seconds() {
        let backoffs: Vec<u64> = (1..=3i32).map(|attempts| 2 * 2u64.pow((attempts - 1) as u32)).collect();
        assert_eq!(backoffs, vec![2, 4, 8]);
    }

    #[test]
    fn dispatch_routes_crossroads_and_village_payloads_to_distinct_handlers() {
        let crossroads = JobPayload::CreateCrossroads(CreateCrossroadsPayload);
        let village = JobPayload::CreateVillage(CreateVillagePayload {
            group_id: GroupId::new(1),
            center_x: 175,
            center_z: 0,
        });
        assert_ne!(crossroads.job_type(), village.job_type());
    }
}
