//! Event consumer (C4): turns chat events into catalogue mutations and job
//! enqueues (§4.2). The subscribe loop is thin; `handle_event` is the pure
//! per-message operation so it can be unit-tested without a live Redis
//! subscription (teacher's use-case-driven-by-ports layering).

use std::sync::Arc;

use futures_util::StreamExt;

use crate::domain::{
    ArchiveBuildingPayload, ArchiveVillagePayload, CreateBuildingPayload, CreateVillagePayload,
    DomainError, GenerationJob, JobEnvelope, JobPayload, UpdateBuildingPayload,
};
use crate::error::InfraError;
use crate::infrastructure::bus::TOPIC_CHAT;
use crate::state::AppState;
use villagemc_shared::events::{ChatEventRecord, ChatEventType};

/// One inbound chat-event record, fully processed: catalogue upsert(s) plus
/// any job envelopes pushed to `queue:worldgen`. Failure semantics (§4.2):
/// caught and logged by the caller, never propagated past one message.
pub async fn handle_event(state: &AppState, record: ChatEventRecord) -> Result<(), InfraError> {
    match record.event_type {
        ChatEventType::GroupCreated => handle_group_created(state, &record).await,
        ChatEventType::GroupDeleted => handle_group_deleted(state, &record).await,
        ChatEventType::ChannelCreated => handle_channel_created(state, &record).await,
        ChatEventType::ChannelDeleted => handle_channel_deleted(state, &record).await,
        ChatEventType::ChannelUpdated => handle_channel_updated(state, &record).await,
    }
}

async fn enqueue(state: &AppState, payload: JobPayload) -> Result<(), InfraError> {
    let job = GenerationJob::new(payload);
    state.store.insert_job(&job).await?;
    let envelope = JobEnvelope::new(job.id, job.payload.clone());
    state.bus.push_job(&envelope).await?;
    Ok(())
}

async fn handle_group_created(state: &AppState, record: &ChatEventRecord) -> Result<(), InfraError> {
    let name = record.group_name.clone().unwrap_or_else(|| record.group_external_id.clone());
    let position = record.position.unwrap_or(0);
    let (group, created) = state
        .store
        .upsert_group(&record.group_external_id, &record.guild_id, &name, position)
        .await?;
    if created {
        enqueue(
            state,
            JobPayload::CreateVillage(CreateVillagePayload {
                group_id: group.id,
                center_x: group.center_x,
                center_z: group.center_z,
            }),
        )
        .await?;
    }
    Ok(())
}

async fn handle_group_deleted(state: &AppState, record: &ChatEventRecord) -> Result<(), InfraError> {
    let Some((group, archived_channels, newly_archived)) = state.store.archive_group(&record.group_external_id).await? else {
        return Ok(());
    };
    if !newly_archived {
        // Redelivered GroupDeleted for an already-archived group — not a
        // materially-changing event, so no new job (§8 idempotence).
        return Ok(());
    }
    enqueue(
        state,
        JobPayload::ArchiveVillage(ArchiveVillagePayload {
            group_id: group.id,
            center_x: group.center_x,
            center_z: group.center_z,
        }),
    )
    .await?;
    for channel in archived_channels {
        enqueue(
            state,
            JobPayload::ArchiveBuilding(ArchiveBuildingPayload {
                channel_id: channel.id,
                group_center_x: group.center_x,
                group_center_z: group.center_z,
                building_index: channel.building_index,
            }),
        )
        .await?;
    }
    Ok(())
}

async fn handle_channel_created(state: &AppState, record: &ChatEventRecord) -> Result<(), InfraError> {
    let Some(channel_external_id) = &record.channel_external_id else {
        return Err(InfraError::Domain(DomainError::validation(
            "ChannelCreated missing channelExternalId",
        )));
    };
    let channel_name = record.channel_name.clone().unwrap_or_else(|| channel_external_id.clone());

    // Auto-create a minimal group to absorb out-of-order delivery (§4.2, §7).
    let group = match state.store.get_group_by_external_id(&record.group_external_id).await? {
        Some(g) => g,
        None => {
            let (g, created) = state
                .store
                .upsert_group(
                    &record.group_external_id,
                    &record.guild_id,
                    record.group_name.as_deref().unwrap_or(&record.group_external_id),
                    record.position.unwrap_or(0),
                )
                .await?;
            if created {
                enqueue(
                    state,
                    JobPayload::CreateVillage(CreateVillagePayload {
                        group_id: g.id,
                        center_x: g.center_x,
                        center_z: g.center_z,
                    }),
                )
                .await?;
            }
            g
        }
    };

    let (channel, created) = state
        .store
        .upsert_channel(
            channel_external_id,
            group.id,
            &channel_name,
            record.position.unwrap_or(0),
            record.topic.as_deref(),
            record.member_count,
        )
        .await?;

    if created {
        enqueue(
            state,
            JobPayload::CreateBuilding(CreateBuildingPayload {
                channel_id: channel.id,
                group_center_x: group.center_x,
                group_center_z: group.center_z,
                building_index: channel.building_index,
                channel_name: channel.name.clone(),
                channel_external_id: channel.external_id.clone(),
                topic: channel.topic.clone(),
                member_count: Some(channel.member_count),
            }),
        )
        .await?;
    }
    Ok(())
}

async fn handle_channel_deleted(state: &AppState, record: &ChatEventRecord) -> Result<(), InfraError> {
    let Some(channel_external_id) = &record.channel_external_id else {
        return Ok(());
    };
    let Some((channel, newly_archived)) = state.store.archive_channel(channel_external_id).await? else {
        return Ok(());
    };
    if !newly_archived {
        // Redelivered ChannelDeleted for an already-archived channel — not a
        // materially-changing event, so no new job (§8 idempotence).
        return Ok(());
    }
    let Some(group) = state.store.get_group_by_id(channel.group_id).await? else {
        return Ok(());
    };
    enqueue(
        state,
        JobPayload::ArchiveBuilding(ArchiveBuildingPayload {
            channel_id: channel.id,
            group_center_x: group.center_x,
            group_center_z: group.center_z,
            building_index: channel.building_index,
        }),
    )
    .await
}

/// Only `name` and `topic` propagate to live state; `position` changes never
/// trigger re-indexing (§4.2, an explicit non-automatic behavior).
async fn handle_channel_updated(state: &AppState, record: &ChatEventRecord) -> Result<(), InfraError> {
    let Some(channel_external_id) = &record.channel_external_id else {
        return Ok(());
    };
    let Some(channel) = state.store.get_channel_by_external_id(channel_external_id).await? else {
        return Ok(());
    };

    let mut changed = false;
    if let Some(new_name) = &record.channel_name {
        if new_name != &channel.name {
            state.store.update_channel_name(channel.id, new_name).await?;
            changed = true;
        }
    }
    if let Some(new_topic) = &record.topic {
        if Some(new_topic.as_str()) != channel.topic.as_deref() {
            state.store.update_channel_topic(channel.id, Some(new_topic)).await?;
            changed = true;
        }
    }
    if !changed {
        return Ok(());
    }

    let Some(group) = state.store.get_group_by_id(channel.group_id).await? else {
        return Ok(());
    };
    enqueue(
        state,
        JobPayload::UpdateBuilding(UpdateBuildingPayload {
            channel_id: channel.id,
            group_center_x: group.center_x,
            group_center_z: group.center_z,
            building_index: channel.building_index,
            channel_external_id: channel.external_id.clone(),
            reason: match (&record.channel_name, &record.topic) {
                (Some(new_name), _) if new_name != &channel.name => {
                    crate::domain::BuildingUpdateReason::Renamed { new_name: new_name.clone() }
                }
                _ => crate::domain::BuildingUpdateReason::TopicChanged {
                    new_topic: record.topic.clone(),
                },
            },
        }),
    )
    .await
}

/// Subscribes to `events:discord:channel` and drives `handle_event` per
/// message, with a shutdown `CancellationToken` observed between messages
/// (§9 "Async/background loops"). Exceptions from a single message are
/// caught and logged; the loop never dies from a bad message (§4.2, §7).
pub async fn run_consumer(
    state: Arc<AppState>,
    bus_url: String,
    shutdown: tokio_util::sync::CancellationToken,
) -> Result<(), InfraError> {
    let client = redis::Client::open(bus_url).map_err(InfraError::Bus)?;
    let conn = client.get_async_pubsub().await.map_err(InfraError::Bus)?;
    let mut pubsub = conn;
    pubsub.subscribe(TOPIC_CHAT).await.map_err(InfraError::Bus)?;
    let mut stream = pubsub.on_message();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("event consumer received shutdown signal");
                return Ok(());
            }
            maybe_msg = stream.next() => {
                let Some(msg) = maybe_msg else {
                    tracing::warn!("event consumer pub/sub stream ended");
                    return Ok(());
                };
                let payload: String = match msg.get_payload() {
                    Ok(p) => p,
                    Err(e) => {
                        tracing::error!(error = %e, "failed to decode pub/sub payload");
                        continue;
                    }
                };
                let record: ChatEventRecord = match serde_json::from_str(&payload) {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!(error = %e, "dropping unparseable or unknown-eventType chat event");
                        continue;
                    }
                };
                if let Err(e) = handle_event(&state, record).await {
                    tracing::error!(error = %e, "error handling chat event, continuing");
                }
            }
        }
    }
}
