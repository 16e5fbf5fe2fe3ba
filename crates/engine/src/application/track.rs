//! Track generator (C9, §4.9). One `CreateTrack` job per village, enqueued
//! by the processor right after its `CreateVillage` completes. Lays an
//! X-first-then-Z rail corridor from the village's station pad to either a
//! radial Crossroads slot or a destination village's south approach.

use crate::domain::{crossroads_station_slot, CreateTrackPayload};
use crate::error::InfraError;
use crate::infrastructure::command_channel::commands;
use crate::infrastructure::signs::{wall_sign_block_state, Facing};
use crate::state::AppState;

const TRACK_Y: i32 = -59;
const TRACKBED_Y: i32 = -60;
const POWERED_RAIL_INTERVAL: i32 = 8;

pub async fn create_track(state: &AppState, payload: &CreateTrackPayload) -> Result<(), InfraError> {
    let w = &state.world;
    let src = (payload.src_center_x, payload.src_center_z + w.village_station_offset);

    let is_hub = payload.dest_center_x == 0 && payload.dest_center_z == 0;
    let dst = if is_hub {
        crossroads_station_slot((payload.src_center_x, payload.src_center_z))
    } else {
        (payload.dest_center_x, payload.dest_center_z - w.village_station_offset)
    };

    let corner = (dst.0, src.1);

    let min_x = src.0.min(dst.0) - 3;
    let max_x = src.0.max(dst.0) + 3;
    let min_z = src.1.min(dst.1) - 3;
    let max_z = src.1.max(dst.1) + 3;

    let mut cmds = Vec::new();
    cmds.push(commands::forceload_add(min_x, min_z, max_x, max_z));

    // X-leg: src -> corner.
    lay_segment(&mut cmds, src, corner, Axis::X);
    // Z-leg: corner -> dst.
    lay_segment(&mut cmds, corner, dst, Axis::Z);
    // Corner rail last, so the engine auto-curves between the two legs.
    cmds.push(commands::setblock(corner.0, TRACKBED_Y, corner.1, "stone_bricks"));
    cmds.push(commands::setblock(corner.0, TRACK_Y, corner.1, "rail"));

    build_station_pad(&mut cmds, src, Direction::from_legs(src, corner), &payload.dest_name, true);
    build_station_pad(&mut cmds, dst, Direction::from_legs(dst, corner), &payload.dest_name, false);

    state.command_channel.send_batch(&cmds).await?;
    Ok(())
}

#[derive(Clone, Copy, PartialEq)]
enum Axis {
    X,
    Z,
}

enum Direction {
    North,
    South,
}

impl Direction {
    fn from_legs(station: (i32, i32), towards: (i32, i32)) -> Self {
        if towards.1 >= station.1 {
            Direction::South
        } else {
            Direction::North
        }
    }
}

fn lay_segment(cmds: &mut Vec<String>, from: (i32, i32), to: (i32, i32), axis: Axis) {
    match axis {
        Axis::X => {
            let (x1, x2) = (from.0.min(to.0), from.0.max(to.0));
            let z = from.1;
            cmds.push(commands::fill(x1, TRACKBED_Y, z, x2, TRACKBED_Y, z, "stone_bricks"));
            cmds.push(commands::fill(x1, TRACK_Y, z, x2, TRACK_Y + 1, z, "air"));
            let mut x = x1;
            while x <= x2 {
                let block = if (x - x1) % POWERED_RAIL_INTERVAL == 0 {
                    cmds.push(commands::setblock(x, TRACKBED_Y, z, "redstone_block"));
                    "powered_rail[shape=east_west,powered=true]"
                } else {
                    "rail"
                };
                if x != from.0 && x != to.0 {
                    cmds.push(commands::setblock(x, TRACK_Y, z, block));
                }
                x += 1;
            }
        }
        Axis::Z => {
            let (z1, z2) = (from.1.min(to.1), from.1.max(to.1));
            let x = from.0;
            cmds.push(commands::fill(x, TRACKBED_Y, z1, x, TRACKBED_Y, z2, "stone_bricks"));
            cmds.push(commands::fill(x, TRACK_Y, z1, x, TRACK_Y + 1, z2, "air"));
            let mut z = z1;
            while z <= z2 {
                let block = if (z - z1) % POWERED_RAIL_INTERVAL == 0 {
                    cmds.push(commands::setblock(x, TRACKBED_Y, z, "redstone_block"));
                    "powered_rail[shape=north_south,powered=true]"
                } else {
                    "rail"
                };
                if z != from.1 && z != to.1 {
                    cmds.push(commands::setblock(x, TRACK_Y, z, block));
                }
                z += 1;
            }
        }
    }
}

/// 9x5 pad oriented along Z with the rail down the center; dispenser,
/// button, and 64 preloaded minecarts at the south end; signs at both ends.
fn build_station_pad(cmds: &mut Vec<String>, center: (i32, i32), facing: Direction, label: &str, is_source: bool) {
    let (cx, cz) = center;
    cmds.push(commands::fill(cx - 2, TRACKBED_Y, cz - 4, cx + 2, TRACKBED_Y, cz + 4, "andesite"));
    let south_end = match facing {
        Direction::South => cz + 4,
        Direction::North => cz - 4,
    };
    let north_end = match facing {
        Direction::South => cz - 4,
        Direction::North => cz + 4,
    };
    cmds.push(commands::setblock(cx - 2, TRACK_Y, south_end, "dispenser[facing=up]"));
    cmds.push(
        commands::data_merge_block(
            cx - 2,
            TRACK_Y,
            south_end,
            "{Items:[{Slot:0b,id:\"minecraft:minecart\",Count:64b}]}",
        ),
    );
    cmds.push(commands::setblock(cx - 2, TRACK_Y + 1, south_end, "oak_button[facing=up]"));
    let sign_label = if is_source { "Crossroads ->" } else { label };
    cmds.push(commands::setblock(
        cx,
        TRACK_Y + 1,
        south_end,
        &wall_sign_block_state(Facing::North, [sign_label, "", "", ""]),
    ));
    cmds.push(commands::setblock(
        cx,
        TRACK_Y + 1,
        north_end,
        &wall_sign_block_state(Facing::South, ["Arrived", "", "", ""]),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_is_x_first_then_z() {
        let src = (175, 17);
        let dst = crossroads_station_slot((175, 0));
        let corner = (dst.0, src.1);
        // Corner shares the destination's X and the source's Z, matching
        // the spec's "X-first then Z" L-shape.
        assert_eq!(corner.0, dst.0);
        assert_eq!(corner.1, src.1);
    }
}
