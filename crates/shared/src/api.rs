//! Query API (C11) request/response bodies — camelCase JSON throughout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub village_count: i64,
    pub building_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VillageSummary {
    pub id: i64,
    pub external_id: String,
    pub name: String,
    pub center_x: i32,
    pub center_z: i32,
    pub building_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingSummary {
    pub id: i64,
    pub external_id: String,
    pub name: String,
    pub topic: Option<String>,
    pub member_count: i32,
    pub building_index: i64,
    pub building_x: Option<i32>,
    pub building_z: Option<i32>,
    pub is_archived: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateResponse {
    pub channel_external_id: String,
    pub channel_name: String,
    pub is_archived: bool,
    pub building_x: Option<i32>,
    pub building_z: Option<i32>,
    pub village_external_id: String,
    pub village_center_x: i32,
    pub village_center_z: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: i64,
    pub external_id: String,
    pub name: String,
    pub village_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnResponse {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossroadsResponse {
    pub center_x: i32,
    pub center_z: i32,
    pub deep_link_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncGroupPayload {
    pub external_id: String,
    pub name: String,
    pub position: i32,
    #[serde(default)]
    pub channels: Vec<SyncChannelPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncChannelPayload {
    pub external_id: String,
    pub name: String,
    pub position: i32,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub member_count: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub guild_id: String,
    pub groups: Vec<SyncGroupPayload>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub groups_created: i64,
    pub groups_updated: i64,
    pub channels_created: i64,
    pub channels_updated: i64,
    pub jobs_enqueued: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRequest {
    pub external_user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkResponse {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinRequest {
    pub author: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}
