//! Village generator (C7, §4.6). Builds a village's plaza, walls, fountain,
//! station area, and welcome paths, in the strict order the spec mandates
//! since downstream steps depend on upstream surfaces.

use crate::domain::{CreateTrackPayload, CreateVillagePayload, GenerationJob, JobEnvelope, JobPayload};
use crate::error::InfraError;
use crate::infrastructure::command_channel::commands;
use crate::infrastructure::signs::{wall_sign_block_state, Facing};
use crate::state::AppState;

pub async fn create_village(state: &AppState, payload: &CreateVillagePayload) -> Result<(), InfraError> {
    let w = &state.world;
    let (cx, cz) = (payload.center_x, payload.center_z);
    let group = state.store.get_group_by_id(payload.group_id).await?;
    let name = group.map(|g| g.name).unwrap_or_else(|| "Village".to_string());
    let building_count = state
        .store
        .list_channels_for_group(payload.group_id)
        .await
        .map(|cs| cs.iter().filter(|c| !c.is_archived).count())
        .unwrap_or(0);

    let mut cmds = Vec::new();

    // 1. 31x31 stone-brick plaza.
    cmds.push(commands::fill(cx - 15, w.base_y, cz - 15, cx + 15, w.base_y, cz + 15, "stone_bricks"));

    // 2. Perimeter wall, 3 blocks high, 3-wide cardinal gaps.
    build_perimeter_wall(&mut cmds, w.base_y, cx, cz, 16);

    // 3. Central fountain — small by default, multi-tier if >= 4 buildings.
    if building_count >= 4 {
        build_large_fountain(&mut cmds, w.base_y, cx, cz);
    } else {
        build_small_fountain(&mut cmds, w.base_y, cx, cz);
    }

    // 4. Cobblestone walkway ring at FenceRadius - 5.
    build_walkway_ring(&mut cmds, w.base_y, cx, cz, w.fence_radius - 5);

    // 5. Glow-block lighting at wall corners and every 4 blocks on cardinal paths.
    build_lighting(&mut cmds, w.base_y, cx, cz, 16, w.fence_radius);

    // 6. Village name signs on the four fountain-basin faces.
    build_name_signs(&mut cmds, w.base_y, cx, cz, &name);

    // 7. Four welcome paths from the cardinal wall openings outward.
    build_welcome_paths(&mut cmds, w.base_y, cx, cz, 16, w.fence_radius);

    // 8. Oak fence at FenceRadius with 3-wide cardinal gates.
    build_fence(&mut cmds, w.base_y, cx, cz, w.fence_radius);

    // 9. 9x5 station pad at the south plaza edge.
    build_station_pad(&mut cmds, w.base_y, cx, cz, w.village_station_offset);

    state.command_channel.send_batch(&cmds).await?;
    Ok(())
}

fn build_perimeter_wall(cmds: &mut Vec<String>, base_y: i32, cx: i32, cz: i32, radius: i32) {
    cmds.push(commands::fill(cx - radius, base_y + 1, cz - radius, cx + radius, base_y + 3, cz - radius, "cobblestone_wall"));
    cmds.push(commands::fill(cx - radius, base_y + 1, cz + radius, cx + radius, base_y + 3, cz + radius, "cobblestone_wall"));
    cmds.push(commands::fill(cx - radius, base_y + 1, cz - radius, cx - radius, base_y + 3, cz + radius, "cobblestone_wall"));
    cmds.push(commands::fill(cx + radius, base_y + 1, cz - radius, cx + radius, base_y + 3, cz + radius, "cobblestone_wall"));
    for (gx, gz, len_axis_x) in [(cx, cz - radius, true), (cx, cz + radius, true), (cx - radius, cz, false), (cx + radius, cz, false)] {
        if len_axis_x {
            cmds.push(commands::fill(gx - 1, base_y + 1, gz, gx + 1, base_y + 3, gz, "air"));
        } else {
            cmds.push(commands::fill(gx, base_y + 1, gz - 1, gx, base_y + 3, gz + 1, "air"));
        }
    }
}

fn build_small_fountain(cmds: &mut Vec<String>, base_y: i32, cx: i32, cz: i32) {
    cmds.push(commands::fill(cx - 1, base_y + 1, cz - 1, cx + 1, base_y + 1, cz + 1, "quartz_block"));
    cmds.push(commands::setblock(cx, base_y + 2, cz, "water"));
}

fn build_large_fountain(cmds: &mut Vec<String>, base_y: i32, cx: i32, cz: i32) {
    cmds.push(commands::fill(cx - 3, base_y + 1, cz - 3, cx + 3, base_y + 1, cz + 3, "quartz_block"));
    cmds.push(commands::fill(cx - 2, base_y + 2, cz - 2, cx + 2, base_y + 2, cz + 2, "water"));
    cmds.push(commands::fill(cx - 1, base_y + 3, cz - 1, cx + 1, base_y + 3, cz + 1, "quartz_block"));
    cmds.push(commands::setblock(cx, base_y + 4, cz, "sea_lantern"));
}

fn build_walkway_ring(cmds: &mut Vec<String>, base_y: i32, cx: i32, cz: i32, radius: i32) {
    cmds.push(commands::fill(cx - radius, base_y, cz - radius, cx + radius, base_y, cz - radius + 1, "cobblestone"));
    cmds.push(commands::fill(cx - radius, base_y, cz + radius - 1, cx + radius, base_y, cz + radius, "cobblestone"));
    cmds.push(commands::fill(cx - radius, base_y, cz - radius, cx - radius + 1, base_y, cz + radius, "cobblestone"));
    cmds.push(commands::fill(cx + radius - 1, base_y, cz - radius, cx + radius, base_y, cz + radius, "cobblestone"));
}

fn build_lighting(cmds: &mut Vec<String>, base_y: i32, cx: i32, cz: i32, wall_radius: i32, fence_radius: i32) {
    for (dx, dz) in [(-1, -1), (-1, 1), (1, -1), (1, 1)] {
        cmds.push(commands::setblock(cx + dx * wall_radius, base_y + 4, cz + dz * wall_radius, "glowstone"));
    }
    let mut d = wall_radius;
    while d < fence_radius {
        for (dx, dz) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            cmds.push(commands::setblock(cx + dx * d, base_y + 1, cz + dz * d, "glowstone"));
        }
        d += 4;
    }
}

fn build_name_signs(cmds: &mut Vec<String>, base_y: i32, cx: i32, cz: i32, name: &str) {
    for (dx, dz, facing) in [(0, -2, Facing::South), (0, 2, Facing::North), (-2, 0, Facing::East), (2, 0, Facing::West)] {
        cmds.push(commands::setblock(cx + dx, base_y + 2, cz + dz, &wall_sign_block_state(facing, [name, "", "", ""])));
    }
}

fn build_welcome_paths(cmds: &mut Vec<String>, base_y: i32, cx: i32, cz: i32, wall_radius: i32, fence_radius: i32) {
    for (dx, dz) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
        let (x1, z1, x2, z2) = if dx != 0 {
            (cx + dx * wall_radius, cz - 1, cx + dx * fence_radius, cz + 1)
        } else {
            (cx - 1, cz + dz * wall_radius, cx + 1, cz + dz * fence_radius)
        };
        cmds.push(commands::fill(x1, base_y, z1, x2, base_y, z2, "gravel"));
    }
}

fn build_fence(cmds: &mut Vec<String>, base_y: i32, cx: i32, cz: i32, radius: i32) {
    cmds.push(commands::fill(cx - radius, base_y + 1, cz - radius, cx + radius, base_y + 1, cz - radius, "oak_fence"));
    cmds.push(commands::fill(cx - radius, base_y + 1, cz + radius, cx + radius, base_y + 1, cz + radius, "oak_fence"));
    cmds.push(commands::fill(cx - radius, base_y + 1, cz - radius, cx - radius, base_y + 1, cz + radius, "oak_fence"));
    cmds.push(commands::fill(cx + radius, base_y + 1, cz - radius, cx + radius, base_y + 1, cz + radius, "oak_fence"));
    for (gx, gz, len_axis_x) in [(cx, cz - radius, true), (cx, cz + radius, true), (cx - radius, cz, false), (cx + radius, cz, false)] {
        if len_axis_x {
            cmds.push(commands::fill(gx - 1, base_y + 1, gz, gx + 1, base_y + 1, gz, "air"));
        } else {
            cmds.push(commands::fill(gx, base_y + 1, gz - 1, gx, base_y + 1, gz + 1, "air"));
        }
    }
}

fn build_station_pad(cmds: &mut Vec<String>, base_y: i32, cx: i32, cz: i32, station_offset: i32) {
    let sz = cz + station_offset;
    cmds.push(commands::fill(cx - 2, base_y, sz - 4, cx + 2, base_y, sz + 4, "andesite"));
}

/// After a village completes, enqueue exactly one `CreateTrack` job to the
/// hub (§4.3 "On success", §4.9). Not the consumer's job — a processor
/// follow-up, so an archived group (no completed `CreateVillage`) never
/// produces a track (§8 boundary behavior).
pub async fn enqueue_track_to_hub(state: &AppState, payload: &CreateVillagePayload) -> Result<(), InfraError> {
    let job = GenerationJob::new(JobPayload::CreateTrack(CreateTrackPayload {
        group_id: payload.group_id,
        src_center_x: payload.center_x,
        src_center_z: payload.center_z,
        dest_center_x: 0,
        dest_center_z: 0,
        dest_name: "Crossroads".to_string(),
    }));
    state.store.insert_job(&job).await?;
    let envelope = JobEnvelope::new(job.id, job.payload.clone());
    state.bus.push_job(&envelope).await?;
    Ok(())
}
