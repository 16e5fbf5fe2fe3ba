//! Thin re-export of the pure domain types at the service boundary, so
//! application/infrastructure modules can `use crate::domain::*` without
//! reaching into `villagemc_domain` directly (teacher convention — see
//! the player crate's old `domain` facade).

pub use villagemc_domain::{
    building_place, building_style, crossroads_station_slot, grid_assign, ArchiveBuildingPayload,
    ArchiveVillagePayload, BuildingStyle, BuildingUpdateReason, Channel, ChannelId,
    CreateBuildingPayload, CreateCrossroadsPayload, CreateTrackPayload, CreateVillagePayload,
    DomainError, GenerationJob, Group, GroupId, JobEnvelope, JobId, JobPayload, JobStatus, JobType,
    SizeTier, UpdateBuildingPayload,
};
