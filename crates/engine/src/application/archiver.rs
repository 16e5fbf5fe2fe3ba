//! Archiver (C10, §4.10). Channel/group deletions archive rather than
//! destroy: signs get a red `[Archived]` line, the south doorway is
//! bricked up, and the plugin marker is relabeled — all best-effort, never
//! blocking the audit trail on plugin availability.

use crate::domain::{building_place, ArchiveBuildingPayload, ArchiveVillagePayload, SizeTier};
use crate::error::InfraError;
use crate::infrastructure::command_channel::commands;
use crate::infrastructure::signs::{archived_sign_lines, wall_sign_block_state, Facing};
use crate::state::AppState;

pub async fn archive_building(state: &AppState, payload: &ArchiveBuildingPayload) -> Result<(), InfraError> {
    let channel = state.store.get_channel_by_id(payload.channel_id).await?;
    let Some(channel) = channel else {
        return Ok(());
    };
    // Never generated (e.g. archived while its CreateBuilding job was still
    // queued) -> nothing to deface.
    let (Some(bx), Some(bz)) = (channel.building_x, channel.building_z) else {
        return Ok(());
    };
    debug_assert_eq!((bx, bz), building_place((payload.group_center_x, payload.group_center_z), payload.building_index));

    let base_y = state.world.base_y;
    let half = SizeTier::from_member_count(Some(channel.member_count)).half_footprint();
    let mut cmds = Vec::new();

    let name_lines = archived_sign_lines([&channel.name, "", "", ""]);
    cmds.push(commands::setblock(
        bx,
        base_y + 5,
        bz + half,
        &wall_sign_block_state(Facing::South, [&name_lines[0], &name_lines[1], &name_lines[2], &name_lines[3]]),
    ));

    cmds.push(commands::fill(bx - 1, base_y + 1, bz + half, bx + 1, base_y + 3, bz + half, "barrier"));

    state.command_channel.send_batch(&cmds).await?;
    state.plugin.archive_building_marker(&channel.external_id).await;
    Ok(())
}

/// Per-building defacement is handled by the `ArchiveBuilding` jobs
/// `handle_group_deleted` enqueues alongside this one — by the time this
/// job runs, `archive_group` has already flipped every child channel's
/// `is_archived` row, so this job's own scope is just the village-level
/// plugin marker.
pub async fn archive_village(state: &AppState, payload: &ArchiveVillagePayload) -> Result<(), InfraError> {
    let group = state.store.get_group_by_id(payload.group_id).await?;
    if let Some(group) = group {
        state.plugin.archive_village_marker(&group.external_id).await;
    }
    Ok(())
}
