//! Deterministic world-coordinate placement math.
//!
//! Every function here is a pure integer computation — no I/O, no floating
//! point in persisted state (angles are computed in float and rounded back
//! to `i32` at the boundary, per the numeric-semantics design note).

/// Village spacing in blocks. Chosen so two 150-block fences cannot overlap.
pub const VILLAGE_SPACING: i32 = 175;
/// Columns in the village grid before wrapping to the next row.
pub const GRID_COLUMNS: i32 = 10;
/// Superflat surface level.
pub const BASE_Y: i32 = -60;
/// Footprint (side length) + gap between adjacent buildings on a row.
pub const BUILDING_SPACING: i32 = 24;
/// Village perimeter fence radius.
pub const FENCE_RADIUS: i32 = 150;
/// Default (Medium tier) building footprint.
pub const BUILDING_FOOTPRINT: i32 = 21;
/// South offset of a village's station pad from its center.
pub const VILLAGE_STATION_OFFSET: i32 = 17;
/// Radius of the 16 radial station slots around the Crossroads plaza.
pub const CROSSROADS_STATION_RADIUS: i32 = 35;
/// Number of radial station slots around the Crossroads.
pub const CROSSROADS_STATION_SLOTS: i32 = 16;

/// Maps a dense `villageIndex` (starting at 1 — index 0 is reserved for the
/// Crossroads hub and is never assigned to a village) onto the world grid.
///
/// `villageIndex = 0` would resolve to `(0, 0)`, the hub cell; callers must
/// never pass it. This is the policy this implementation commits to for the
/// "index starts at 0 or 1" open question in the spec.
pub fn grid_assign(village_index: i64) -> (i32, i32) {
    debug_assert!(village_index != 0, "village_index 0 is reserved for the hub");
    let col = (village_index % GRID_COLUMNS as i64) as i32;
    let row = (village_index / GRID_COLUMNS as i64) as i32;
    (col * VILLAGE_SPACING, row * VILLAGE_SPACING)
}

/// Main-street layout: two rows of buildings facing a central street,
/// centered on the village plaza.
pub fn building_place(group_center: (i32, i32), building_index: i64) -> (i32, i32) {
    let (cx, cz) = group_center;
    let row = building_index % 2;
    let pos_in_row = (building_index / 2) as i32;
    let bx = cx + (pos_in_row - 3) * BUILDING_SPACING;
    let bz = if row == 0 { cz - 20 } else { cz + 20 };
    (bx, bz)
}

/// The three architectural styles a building can take, selected
/// deterministically from the channel's identity so that re-running
/// generation (or regenerating from scratch) always picks the same style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BuildingStyle {
    MedievalCastle,
    TimberCottage,
    StoneWatchtower,
}

impl BuildingStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MedievalCastle => "medieval_castle",
            Self::TimberCottage => "timber_cottage",
            Self::StoneWatchtower => "stone_watchtower",
        }
    }
}

/// `style = |channelId| mod 3`. `channel_id` is the channel's external
/// (chat-platform) identifier so that the style is knowable as soon as the
/// channel-created event arrives, before any surrogate id exists.
pub fn building_style(channel_external_id: &str) -> BuildingStyle {
    let hash = fnv1a(channel_external_id.as_bytes());
    match hash % 3 {
        0 => BuildingStyle::MedievalCastle,
        1 => BuildingStyle::TimberCottage,
        _ => BuildingStyle::StoneWatchtower,
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// A building's footprint/floor count, scaled by channel member count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeTier {
    Small,
    Medium,
    Large,
}

impl SizeTier {
    pub fn from_member_count(member_count: Option<i32>) -> Self {
        match member_count {
            Some(n) if n < 10 => Self::Small,
            Some(n) if n < 30 => Self::Medium,
            Some(_) => Self::Large,
            None => Self::Medium,
        }
    }

    /// Side length of the square footprint.
    pub fn footprint(self) -> i32 {
        match self {
            Self::Small => 15,
            Self::Medium => 21,
            Self::Large => 27,
        }
    }

    pub fn floors(self) -> i32 {
        match self {
            Self::Small => 2,
            Self::Medium => 3,
            Self::Large => 4,
        }
    }

    pub fn half_footprint(self) -> i32 {
        self.footprint() / 2
    }
}

/// Maps a source village center to one of the 16 radial Crossroads station
/// slots by the angle from the hub origin to that village.
pub fn crossroads_station_slot(src_center: (i32, i32)) -> (i32, i32) {
    let (sx, sz) = src_center;
    let angle = (sz as f64).atan2(sx as f64);
    let slot_span = std::f64::consts::TAU / CROSSROADS_STATION_SLOTS as f64;
    let mut slot = (angle / slot_span).round() as i32 % CROSSROADS_STATION_SLOTS;
    if slot < 0 {
        slot += CROSSROADS_STATION_SLOTS;
    }
    let slot_angle = slot as f64 * slot_span;
    let x = (CROSSROADS_STATION_RADIUS as f64 * slot_angle.cos()).round() as i32;
    let z = (CROSSROADS_STATION_RADIUS as f64 * slot_angle.sin()).round() as i32;
    (x, z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_assign_never_lands_on_hub() {
        for idx in 1..200i64 {
            let (x, z) = grid_assign(idx);
            assert_ne!((x, z), (0, 0));
        }
    }

    #[test]
    fn grid_assign_first_village() {
        assert_eq!(grid_assign(1), (175, 0));
    }

    #[test]
    fn grid_assign_wraps_rows() {
        assert_eq!(grid_assign(10), (0, 175));
        assert_eq!(grid_assign(11), (175, 175));
    }

    #[test]
    fn building_place_centers_rows_on_plaza() {
        let center = (175, 0);
        assert_eq!(building_place(center, 0), (103, -20));
        assert_eq!(building_place(center, 1), (103, 20));
        assert_eq!(building_place(center, 2), (127, -20));
    }

    #[test]
    fn building_style_is_deterministic() {
        let a = building_style("channel-123");
        let b = building_style("channel-123");
        assert_eq!(a, b);
    }

    #[test]
    fn crossroads_slot_for_due_east_village_is_slot_zero() {
        let (x, z) = crossroads_station_slot((175, 0));
        assert_eq!((x, z), (CROSSROADS_STATION_RADIUS, 0));
    }

    #[test]
    fn size_tier_boundaries() {
        assert_eq!(SizeTier::from_member_count(Some(9)), SizeTier::Small);
        assert_eq!(SizeTier::from_member_count(Some(10)), SizeTier::Medium);
        assert_eq!(SizeTier::from_member_count(Some(29)), SizeTier::Medium);
        assert_eq!(SizeTier::from_member_count(Some(30)), SizeTier::Large);
        assert_eq!(SizeTier::from_member_count(None), SizeTier::Medium);
    }
}
