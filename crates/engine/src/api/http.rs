//! Query API routes (C11, §4.11). Read-mostly surface over the catalogue
//! store, plus the three write endpoints (sync, link, pin) that enqueue
//! work rather than touching the game server directly.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use rand::Rng;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::domain::{
    CreateBuildingPayload, CreateVillagePayload, GenerationJob, JobEnvelope, JobPayload,
    UpdateBuildingPayload,
};
use crate::error::InfraError;
use crate::state::AppState;
use villagemc_shared::api::{
    BuildingSummary, CrossroadsResponse, LinkRequest, LinkResponse, NavigateResponse, PinRequest,
    SearchResult, SpawnResponse, StatusResponse, SyncRequest, SyncResponse, VillageSummary,
};

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/status", get(status))
        .route("/api/villages", get(list_villages))
        .route("/api/villages/{id}/buildings", get(list_village_buildings))
        .route("/api/navigate/{channel_external_id}", get(navigate))
        .route("/api/buildings/search", get(search_buildings))
        .route("/api/buildings/{id}/spawn", get(building_spawn))
        .route("/api/crossroads", get(crossroads))
        .route("/api/mappings/sync", post(sync_mappings))
        .route("/api/players/link", post(link_player))
        .route("/api/buildings/{id}/pin", post(pin_building))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn status(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, ApiError> {
    let (village_count, building_count) = state.store.status().await?;
    Ok(Json(StatusResponse { village_count, building_count }))
}

async fn list_villages(State(state): State<Arc<AppState>>) -> Result<Json<Vec<VillageSummary>>, ApiError> {
    let groups = state.store.list_groups().await?;
    Ok(Json(
        groups
            .into_iter()
            .map(|(g, count)| VillageSummary {
                id: g.id.value(),
                external_id: g.external_id,
                name: g.name,
                center_x: g.center_x,
                center_z: g.center_z,
                building_count: count,
            })
            .collect(),
    ))
}

async fn list_village_buildings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<BuildingSummary>>, ApiError> {
    let group = state
        .store
        .get_group_by_id(crate::domain::GroupId::new(id))
        .await?
        .ok_or(ApiError::NotFound)?;
    let channels = state.store.list_channels_for_group(group.id).await?;
    Ok(Json(
        channels
            .into_iter()
            .map(|c| BuildingSummary {
                id: c.id.value(),
                external_id: c.external_id,
                name: c.name,
                topic: c.topic,
                member_count: c.member_count,
                building_index: c.building_index,
                building_x: c.building_x,
                building_z: c.building_z,
                is_archived: c.is_archived,
            })
            .collect(),
    ))
}

async fn navigate(
    State(state): State<Arc<AppState>>,
    Path(channel_external_id): Path<String>,
) -> Result<Json<NavigateResponse>, ApiError> {
    let channel = state
        .store
        .get_channel_by_external_id(&channel_external_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    let group = state.store.get_group_by_id(channel.group_id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(NavigateResponse {
        channel_external_id: channel.external_id,
        channel_name: channel.name,
        is_archived: channel.is_archived,
        building_x: channel.building_x,
        building_z: channel.building_z,
        village_external_id: group.external_id,
        village_center_x: group.center_x,
        village_center_z: group.center_z,
    }))
}

#[derive(serde::Deserialize)]
struct SearchParams {
    q: String,
}

async fn search_buildings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SearchResult>>, ApiError> {
    let channels = state.store.search_channels(&params.q).await?;
    let mut results = Vec::with_capacity(channels.len());
    for c in channels {
        let village_name = state
            .store
            .get_group_by_id(c.group_id)
            .await?
            .map(|g| g.name)
            .unwrap_or_default();
        results.push(SearchResult { id: c.id.value(), external_id: c.external_id, name: c.name, village_name });
    }
    Ok(Json(results))
}

async fn building_spawn(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SpawnResponse>, ApiError> {
    let channel = state
        .store
        .get_channel_by_id(crate::domain::ChannelId::new(id))
        .await?
        .ok_or(ApiError::NotFound)?;
    let (bx, bz) = match (channel.building_x, channel.building_z) {
        (Some(x), Some(z)) => (x, z),
        _ => return Err(ApiError::NotFound),
    };
    let half = crate::domain::SizeTier::from_member_count(Some(channel.member_count)).half_footprint();
    Ok(Json(SpawnResponse { x: bx, y: state.world.base_y + 1, z: bz + half + 1 }))
}

async fn crossroads(State(state): State<Arc<AppState>>) -> Result<Json<CrossroadsResponse>, ApiError> {
    Ok(Json(CrossroadsResponse {
        center_x: 0,
        center_z: 0,
        deep_link_url: format!("{}/#/crossroads", state.bluemap_web_url),
    }))
}

async fn sync_mappings(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SyncRequest>,
) -> Result<Json<SyncResponse>, ApiError> {
    let mut resp = SyncResponse { groups_created: 0, groups_updated: 0, channels_created: 0, channels_updated: 0, jobs_enqueued: 0 };

    for g in &req.groups {
        let (group, created) = state.store.upsert_group(&g.external_id, &req.guild_id, &g.name, g.position).await?;
        if created {
            resp.groups_created += 1;
            enqueue(&state, JobPayload::CreateVillage(CreateVillagePayload {
                group_id: group.id,
                center_x: group.center_x,
                center_z: group.center_z,
            }))
            .await?;
            resp.jobs_enqueued += 1;
        } else {
            resp.groups_updated += 1;
        }

        for c in &g.channels {
            let (channel, created) = state
                .store
                .upsert_channel(&c.external_id, group.id, &c.name, c.position, c.topic.as_deref(), c.member_count)
                .await?;
            if created {
                resp.channels_created += 1;
                enqueue(&state, JobPayload::CreateBuilding(CreateBuildingPayload {
                    channel_id: channel.id,
                    group_center_x: group.center_x,
                    group_center_z: group.center_z,
                    building_index: channel.building_index,
                    channel_name: channel.name.clone(),
                    channel_external_id: channel.external_id.clone(),
                    topic: channel.topic.clone(),
                    member_count: Some(channel.member_count),
                }))
                .await?;
                resp.jobs_enqueued += 1;
            } else {
                resp.channels_updated += 1;
            }
        }
    }

    Ok(Json(resp))
}

async fn enqueue(state: &AppState, payload: JobPayload) -> Result<(), InfraError> {
    let job = GenerationJob::new(payload);
    state.store.insert_job(&job).await?;
    let envelope = JobEnvelope::new(job.id, job.payload.clone());
    state.bus.push_job(&envelope).await?;
    Ok(())
}

const LINK_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const LINK_CODE_TTL_SECONDS: u64 = 300;

async fn link_player(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LinkRequest>,
) -> Result<Json<LinkResponse>, ApiError> {
    let mut rng = rand::thread_rng();
    let code: String = (0..6).map(|_| LINK_CODE_ALPHABET[rng.gen_range(0..LINK_CODE_ALPHABET.len())] as char).collect();
    state.bus.store_link_code(&code, &req.external_user_id, LINK_CODE_TTL_SECONDS).await?;
    Ok(Json(LinkResponse { code }))
}

async fn pin_building(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<PinRequest>,
) -> Result<StatusCode, ApiError> {
    let channel = state
        .store
        .get_channel_by_id(crate::domain::ChannelId::new(id))
        .await?
        .ok_or(ApiError::NotFound)?;
    let group = state.store.get_group_by_id(channel.group_id).await?.ok_or(ApiError::NotFound)?;
    let payload = UpdateBuildingPayload {
        channel_id: channel.id,
        group_center_x: group.center_x,
        group_center_z: group.center_z,
        building_index: channel.building_index,
        channel_external_id: channel.external_id.clone(),
        reason: crate::domain::BuildingUpdateReason::Pinned {
            author: req.author,
            content: req.content,
            timestamp: req.timestamp,
        },
    };
    enqueue(&state, JobPayload::UpdateBuilding(payload)).await?;
    Ok(StatusCode::ACCEPTED)
}

#[derive(Debug)]
pub enum ApiError {
    NotFound,
    Internal(String),
}

impl From<InfraError> for ApiError {
    fn from(e: InfraError) -> Self {
        tracing::error!(error = %e, "query API request failed");
        ApiError::Internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not found").into_response(),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_codes_use_the_unambiguous_alphabet() {
        let mut rng = rand::thread_rng();
        let code: String = (0..6).map(|_| LINK_CODE_ALPHABET[rng.gen_range(0..LINK_CODE_ALPHABET.len())] as char).collect();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(!code.contains(['0', 'O', '1', 'I']));
    }
}
