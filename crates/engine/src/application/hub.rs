//! Hub initializer (C6, §4.8). One-shot: on worker startup, if no completed
//! `CreateCrossroads` audit row exists yet, enqueue one. Scoring (§4.3)
//! guarantees it dispatches before anything else regardless of queue
//! position, since its distance anchor is always `(0, 0)`.

use crate::domain::{CreateCrossroadsPayload, GenerationJob, JobEnvelope, JobPayload};
use crate::error::InfraError;
use crate::infrastructure::command_channel::commands;
use crate::infrastructure::signs::{wall_sign_block_state, BookPage, Facing};
use crate::state::AppState;

pub async fn ensure_hub_job_enqueued(state: &AppState) -> Result<(), InfraError> {
    if state.store.crossroads_completed().await? {
        return Ok(());
    }
    let job = GenerationJob::new(JobPayload::CreateCrossroads(CreateCrossroadsPayload));
    state.store.insert_job(&job).await?;
    let envelope = JobEnvelope::new(job.id, job.payload.clone());
    state.bus.push_job(&envelope).await?;
    tracing::info!("enqueued CreateCrossroads hub initializer job");
    Ok(())
}

pub async fn create_hub(state: &AppState, _payload: &CreateCrossroadsPayload) -> Result<(), InfraError> {
    let w = &state.world;
    let avenue_length = 30;
    let forceload_radius = w.crossroads_plaza_radius + avenue_length + 5;
    let mut cmds = Vec::new();

    cmds.push(commands::forceload_add(-forceload_radius, -forceload_radius, forceload_radius, forceload_radius));

    lay_plaza(&mut cmds, w.base_y, w.crossroads_plaza_radius);
    build_fountain(&mut cmds, w.base_y);
    build_avenues(&mut cmds, w.base_y, avenue_length, w.crossroads_plaza_radius);
    build_station_slots(&mut cmds, w.base_y, w.crossroads_station_slots, w.crossroads_station_radius);
    build_welcome_signs(&mut cmds, w.base_y, avenue_length, w.crossroads_plaza_radius);

    cmds.push(commands::setblock(0, w.base_y + 1, 8, "gold_block"));
    cmds.push(commands::setblock(0, w.base_y + 2, 8, "light_weighted_pressure_plate"));
    cmds.push(commands::setblock(8, w.base_y + 1, 0, "lectern[facing=west]"));

    state.command_channel.send_batch(&cmds).await?;

    let pages = vec![
        BookPage::heading("Welcome to the Crossroads"),
        BookPage::plain("Every village you see connects here by rail."),
        BookPage::plain("Ride the minecart at any of the 16 platforms, or use /goto <channel> to teleport directly to a building."),
    ];
    state
        .plugin
        .place_lectern_book(8, w.base_y + 1, 0, "Crossroads Guide", "The Crossroads", pages.iter().map(|p| p.text.clone()).collect())
        .await;
    let book_cmd = crate::infrastructure::signs::lectern_book_data_merge(
        8,
        w.base_y + 1,
        0,
        "Crossroads Guide",
        "The Crossroads",
        &pages,
    );
    state.command_channel.send(&book_cmd).await?;

    state.command_channel.send(&commands::setworldspawn(0, w.base_y + 1, 0)).await?;
    state
        .command_channel
        .send(&commands::forceload_remove(-forceload_radius, -forceload_radius, forceload_radius, forceload_radius))
        .await?;

    Ok(())
}

/// 61x61 plaza with alternating stone-brick / polished-andesite stripes,
/// laid as row-aligned fills rather than per-block (§4.8 step 2, an
/// explicitly-called-out implementation pitfall to avoid).
fn lay_plaza(cmds: &mut Vec<String>, base_y: i32, radius: i32) {
    let half = radius;
    for row in -half..=half {
        let block = if row.rem_euclid(2) == 0 { "stone_bricks" } else { "polished_andesite" };
        cmds.push(commands::fill(-half, base_y, row, half, base_y, row, block));
    }
}

/// 15x15 three-tier fountain centered at the origin (§4.8 step 3).
fn build_fountain(cmds: &mut Vec<String>, base_y: i32) {
    cmds.push(commands::fill(-5, base_y + 1, -5, 5, base_y + 1, 5, "quartz_block"));
    cmds.push(commands::fill(-4, base_y + 2, -4, 4, base_y + 2, 4, "water"));
    cmds.push(commands::fill(-3, base_y + 3, -3, 3, base_y + 3, 3, "quartz_block"));
    cmds.push(commands::fill(-2, base_y + 4, -2, 2, base_y + 4, 2, "water"));
    cmds.push(commands::fill(-1, base_y + 5, -1, 1, base_y + 5, 1, "quartz_block"));
    cmds.push(commands::setblock(0, base_y + 6, 0, "sea_lantern"));
}

/// Four cardinal avenues with tree canopies, lanterns, benches, flower beds
/// (§4.8 step 4).
fn build_avenues(cmds: &mut Vec<String>, base_y: i32, length: i32, plaza_radius: i32) {
    let directions: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
    for (dx, dz) in directions {
        let start = plaza_radius;
        for step in 0..length {
            let x = dx * (start + step);
            let z = dz * (start + step);
            let (x1, z1, x2, z2) = if dx != 0 {
                (x, z - 2, x, z + 2)
            } else {
                (x - 2, z, x + 2, z)
            };
            cmds.push(commands::fill(x1, base_y, z1, x2, base_y, z2, "grass_path"));
            if step % 8 == 0 {
                plant_avenue_tree(cmds, base_y, x, z);
            }
            if step % 8 == 4 {
                let (lx, lz) = if dx != 0 { (x, z + 3) } else { (x + 3, z) };
                cmds.push(commands::setblock(lx, base_y + 1, lz, "oak_fence"));
                cmds.push(commands::setblock(lx, base_y + 2, lz, "lantern"));
                cmds.push(commands::setblock(x, base_y + 1, if dx != 0 { z - 3 } else { z }, "stone_stairs"));
            }
        }
    }
}

fn plant_avenue_tree(cmds: &mut Vec<String>, base_y: i32, x: i32, z: i32) {
    cmds.push(commands::fill(x, base_y + 1, z, x, base_y + 4, z, "oak_log"));
    cmds.push(commands::fill(x - 1, base_y + 4, z - 1, x + 1, base_y + 5, z + 1, "oak_leaves"));
    cmds.push(commands::setblock(x, base_y + 6, z, "oak_leaves"));
    cmds.push(commands::fill(x - 1, base_y + 1, z + 2, x + 1, base_y + 1, z + 2, "poppy"));
}

/// 16 radial station slots (§4.8 step 5), matching
/// [`crate::domain::crossroads_station_slot`]'s angle-to-slot mapping.
fn build_station_slots(cmds: &mut Vec<String>, base_y: i32, slots: u32, radius: i32) {
    for slot in 0..slots {
        let angle = (slot as f64) * std::f64::consts::TAU / slots as f64;
        let x = (radius as f64 * angle.cos()).round() as i32;
        let z = (radius as f64 * angle.sin()).round() as i32;
        cmds.push(commands::fill(x - 2, base_y, z - 1, x + 2, base_y, z + 1, "andesite"));
        cmds.push(commands::setblock(
            x,
            base_y + 2,
            z,
            &wall_sign_block_state(Facing::South, [&format!("Platform {}", slot + 1), "", "", ""]),
        ));
    }
}

fn build_welcome_signs(cmds: &mut Vec<String>, base_y: i32, length: i32, plaza_radius: i32) {
    let directions: [(i32, i32, Facing); 4] = [
        (1, 0, Facing::West),
        (-1, 0, Facing::East),
        (0, 1, Facing::North),
        (0, -1, Facing::South),
    ];
    for (dx, dz, facing) in directions {
        let x = dx * (plaza_radius + length);
        let z = dz * (plaza_radius + length);
        cmds.push(commands::setblock(x, base_y + 1, z, "oak_fence"));
        cmds.push(commands::setblock(x, base_y + 2, z, &wall_sign_block_state(facing, ["Welcome to", "the Crossroads", "", ""])));
    }
}
