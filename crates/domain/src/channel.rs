//! The durable representation of a text channel: a building.

use serde::{Deserialize, Serialize};

use crate::ids::{ChannelId, GroupId};

/// A text channel mapped to a building placed on its village's main street.
///
/// Invariants:
/// - C1: `building_index` is `max(existing non-archived in same group) + 1`
///   at creation.
/// - C2: once set, `(building_x, building_z) = building_place(group.center,
///   building_index)`.
/// - C3: archival is one-way; `is_archived` never clears.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub external_id: String,
    pub group_id: GroupId,
    pub name: String,
    pub topic: Option<String>,
    pub member_count: i32,
    pub position: i32,
    pub building_index: i64,
    pub building_x: Option<i32>,
    pub building_z: Option<i32>,
    pub is_archived: bool,
}

impl Channel {
    pub fn new(
        external_id: impl Into<String>,
        group_id: GroupId,
        name: impl Into<String>,
        position: i32,
        building_index: i64,
        topic: Option<String>,
        member_count: Option<i32>,
    ) -> Self {
        Self {
            id: ChannelId::new(0),
            external_id: external_id.into(),
            group_id,
            name: name.into(),
            topic,
            member_count: member_count.unwrap_or(0),
            position,
            building_index,
            building_x: None,
            building_z: None,
            is_archived: false,
        }
    }

    /// Materialise this channel's building coordinates. Idempotent: calling
    /// it twice with the same group center yields the same result (C2).
    pub fn materialise(&mut self, group_center: (i32, i32)) {
        let (bx, bz) = crate::placement::building_place(group_center, self.building_index);
        self.building_x = Some(bx);
        self.building_z = Some(bz);
    }

    pub fn building_coords(&self) -> Option<(i32, i32)> {
        match (self.building_x, self.building_z) {
            (Some(x), Some(z)) => Some((x, z)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn materialise_is_idempotent() {
        let mut c = Channel::new("ext-c1", GroupId::new(1), "general", 0, 0, None, None);
        c.materialise((175, 0));
        let first = c.building_coords();
        c.materialise((175, 0));
        assert_eq!(c.building_coords(), first);
    }
}
