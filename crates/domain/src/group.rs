//! The durable representation of a chat category: a village.

use serde::{Deserialize, Serialize};

use crate::ids::GroupId;

/// A chat-platform category mapped to a village at deterministic world
/// coordinates.
///
/// Invariants (enforced jointly by this type, the catalogue store's
/// uniqueness constraints, and the event consumer):
/// - G1: `(center_x, center_z)` is globally unique across all groups.
/// - G2: `(center_x, center_z) = grid_assign(village_index)`; cell `(0, 0)`
///   is reserved for the hub and never assigned.
/// - G3: `village_index` is monotonically assigned from `max(existing) + 1`,
///   never reused after archival.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub external_id: String,
    pub guild_id: String,
    pub name: String,
    pub position: i32,
    pub village_index: i64,
    pub center_x: i32,
    pub center_z: i32,
    pub is_archived: bool,
}

impl Group {
    /// Construct the row for a brand-new group, given the next free village
    /// index (the caller — the catalogue store, under its own locking —
    /// supplies `max(existing) + 1`).
    pub fn new(
        external_id: impl Into<String>,
        guild_id: impl Into<String>,
        name: impl Into<String>,
        position: i32,
        village_index: i64,
    ) -> Self {
        let (center_x, center_z) = crate::placement::grid_assign(village_index);
        Self {
            id: GroupId::new(0),
            external_id: external_id.into(),
            guild_id: guild_id.into(),
            name: name.into(),
            position,
            village_index,
            center_x,
            center_z,
            is_archived: false,
        }
    }

    pub fn center(&self) -> (i32, i32) {
        (self.center_x, self.center_z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_group_places_itself_on_the_grid() {
        let g = Group::new("ext-1", "guild-1", "Alpha", 0, 1);
        assert_eq!(g.center(), (175, 0));
        assert!(!g.is_archived);
    }
}
