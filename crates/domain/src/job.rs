//! The world-generation job audit trail and in-flight queue envelope.
//!
//! `GenerationJob` is the durable audit row (§3); `JobEnvelope` is the
//! in-flight object carried on `queue:worldgen` (§4.1) — it references a
//! `GenerationJob` by id but is not itself a row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::JobId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum JobType {
    CreateVillage,
    CreateBuilding,
    UpdateBuilding,
    ArchiveBuilding,
    ArchiveVillage,
    CreateTrack,
    CreateCrossroads,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// Type-specific payload carried by a job envelope. Serialized as the
/// envelope's `payload` field (a JSON object tagged by `JobType`); the
/// `GenerationJob` audit row stores the same payload, serialized to a
/// string, for later inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JobPayload {
    CreateVillage(CreateVillagePayload),
    CreateBuilding(CreateBuildingPayload),
    UpdateBuilding(UpdateBuildingPayload),
    ArchiveBuilding(ArchiveBuildingPayload),
    ArchiveVillage(ArchiveVillagePayload),
    CreateTrack(CreateTrackPayload),
    CreateCrossroads(CreateCrossroadsPayload),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CreateVillagePayload {
    pub group_id: crate::ids::GroupId,
    pub center_x: i32,
    pub center_z: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBuildingPayload {
    pub channel_id: crate::ids::ChannelId,
    pub group_center_x: i32,
    pub group_center_z: i32,
    pub building_index: i64,
    pub channel_name: String,
    pub channel_external_id: String,
    pub topic: Option<String>,
    pub member_count: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateBuildingPayload {
    pub channel_id: crate::ids::ChannelId,
    pub group_center_x: i32,
    pub group_center_z: i32,
    pub building_index: i64,
    pub channel_external_id: String,
    /// Free-form update reason: a renamed channel, an edited topic, or a
    /// pinned note (`/api/buildings/{id}/pin`).
    pub reason: BuildingUpdateReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum BuildingUpdateReason {
    Renamed { new_name: String },
    TopicChanged { new_topic: Option<String> },
    Pinned { author: String, content: String, timestamp: DateTime<Utc> },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArchiveBuildingPayload {
    pub channel_id: crate::ids::ChannelId,
    pub group_center_x: i32,
    pub group_center_z: i32,
    pub building_index: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArchiveVillagePayload {
    pub group_id: crate::ids::GroupId,
    pub center_x: i32,
    pub center_z: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTrackPayload {
    pub group_id: crate::ids::GroupId,
    pub src_center_x: i32,
    pub src_center_z: i32,
    pub dest_center_x: i32,
    pub dest_center_z: i32,
    pub dest_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCrossroadsPayload;

impl JobPayload {
    /// The point this job scores its spawn-proximity distance from (§4.3).
    pub fn distance_anchor(&self) -> (i32, i32) {
        match self {
            JobPayload::CreateVillage(p) => (p.center_x, p.center_z),
            JobPayload::ArchiveVillage(p) => (p.center_x, p.center_z),
            JobPayload::CreateBuilding(p) => crate::placement::building_place(
                (p.group_center_x, p.group_center_z),
                p.building_index,
            ),
            JobPayload::UpdateBuilding(p) => crate::placement::building_place(
                (p.group_center_x, p.group_center_z),
                p.building_index,
            ),
            JobPayload::ArchiveBuilding(p) => crate::placement::building_place(
                (p.group_center_x, p.group_center_z),
                p.building_index,
            ),
            JobPayload::CreateTrack(p) => (
                (p.src_center_x + p.dest_center_x) / 2,
                (p.src_center_z + p.dest_center_z) / 2,
            ),
            JobPayload::CreateCrossroads(_) => (0, 0),
        }
    }

    pub fn job_type(&self) -> JobType {
        match self {
            JobPayload::CreateVillage(_) => JobType::CreateVillage,
            JobPayload::CreateBuilding(_) => JobType::CreateBuilding,
            JobPayload::UpdateBuilding(_) => JobType::UpdateBuilding,
            JobPayload::ArchiveBuilding(_) => JobType::ArchiveBuilding,
            JobPayload::ArchiveVillage(_) => JobType::ArchiveVillage,
            JobPayload::CreateTrack(_) => JobType::CreateTrack,
            JobPayload::CreateCrossroads(_) => JobType::CreateCrossroads,
        }
    }
}

/// The durable audit row for a dispatched world-gen operation (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationJob {
    pub id: JobId,
    pub job_type: JobType,
    pub payload: JobPayload,
    pub status: JobStatus,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl GenerationJob {
    pub fn new(payload: JobPayload) -> Self {
        Self {
            id: JobId::new(),
            job_type: payload.job_type(),
            payload,
            status: JobStatus::Pending,
            attempts: 0,
            last_error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// The in-flight object on `queue:worldgen`. References a `GenerationJob`
/// by id; carries its own copy of the payload so the processor doesn't need
/// a store round-trip just to compute a distance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEnvelope {
    pub job_id: JobId,
    pub job_type: JobType,
    pub payload: JobPayload,
}

impl JobEnvelope {
    pub fn new(job_id: JobId, payload: JobPayload) -> Self {
        Self {
            job_id,
            job_type: payload.job_type(),
            payload,
        }
    }

    pub fn distance_from_hub(&self) -> f64 {
        let (x, z) = self.payload.distance_anchor();
        ((x as f64).powi(2) + (z as f64).powi(2)).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::GroupId;

    #[test]
    fn crossroads_job_has_zero_distance() {
        let env = JobEnvelope::new(JobId::new(), JobPayload::CreateCrossroads(CreateCrossroadsPayload));
        assert_eq!(env.distance_from_hub(), 0.0);
    }

    #[test]
    fn village_job_distance_matches_center() {
        let env = JobEnvelope::new(
            JobId::new(),
            JobPayload::CreateVillage(CreateVillagePayload {
                group_id: GroupId::new(1),
                center_x: 175,
                center_z: 0,
            }),
        );
        assert_eq!(env.distance_from_hub(), 175.0);
    }

    #[test]
    fn envelope_round_trips_through_json() {
        let env = JobEnvelope::new(
            JobId::new(),
            JobPayload::CreateTrack(CreateTrackPayload {
                group_id: GroupId::new(1),
                src_center_x: 175,
                src_center_z: 0,
                dest_center_x: 0,
                dest_center_z: 0,
                dest_name: "Crossroads".into(),
            }),
        );
        let json = serde_json::to_string(&env).unwrap();
        let back: JobEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(env, back);
    }

    #[test]
    fn spawn_priority_orders_by_distance() {
        let building = JobEnvelope::new(
            JobId::new(),
            JobPayload::CreateBuilding(CreateBuildingPayload {
                channel_id: crate::ids::ChannelId::new(1),
                group_center_x: 3000,
                group_center_z: 0,
                building_index: 0,
                channel_name: "general".into(),
                channel_external_id: "c1".into(),
                topic: None,
                member_count: None,
            }),
        );
        let crossroads =
            JobEnvelope::new(JobId::new(), JobPayload::CreateCrossroads(CreateCrossroadsPayload));
        let village = JobEnvelope::new(
            JobId::new(),
            JobPayload::CreateVillage(CreateVillagePayload {
                group_id: GroupId::new(1),
                center_x: 175,
                center_z: 0,
            }),
        );
        let mut envs = vec![building, crossroads.clone(), village.clone()];
        envs.sort_by(|a, b| a.distance_from_hub().partial_cmp(&b.distance_from_hub()).unwrap());
        assert_eq!(envs[0].job_id, crossroads.job_id);
        assert_eq!(envs[1].job_id, village.job_id);
    }
}
