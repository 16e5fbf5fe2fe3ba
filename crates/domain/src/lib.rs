extern crate self as villagemc_domain;

pub mod error;
pub mod ids;
pub mod job;
pub mod placement;

mod channel;
mod group;

pub use channel::Channel;
pub use error::DomainError;
pub use group::Group;
pub use ids::{ChannelId, GroupId, JobId};
pub use job::{
    ArchiveBuildingPayload, ArchiveVillagePayload, BuildingUpdateReason, CreateBuildingPayload,
    CreateCrossroadsPayload, CreateTrackPayload, CreateVillagePayload, GenerationJob, JobEnvelope,
    JobPayload, JobStatus, JobType, UpdateBuildingPayload,
};
pub use placement::{
    building_place, building_style, crossroads_station_slot, grid_assign, BuildingStyle,
    SizeTier, BASE_Y, BUILDING_FOOTPRINT, BUILDING_SPACING, CROSSROADS_STATION_RADIUS,
    CROSSROADS_STATION_SLOTS, FENCE_RADIUS, GRID_COLUMNS, VILLAGE_SPACING, VILLAGE_STATION_OFFSET,
};
