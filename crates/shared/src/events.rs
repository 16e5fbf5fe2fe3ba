//! Records carried on the three pub/sub topics of §4.1.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `events:discord:channel` — camelCase on the wire; unknown fields are
/// ignored by `serde`'s default (non-`deny_unknown_fields`) behavior and an
/// unrecognized `eventType` is rejected by `ChatEventType`'s deserializer so
/// the consumer can log-and-drop it (§4.1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEventRecord {
    pub event_type: ChatEventType,
    pub timestamp: DateTime<Utc>,
    pub guild_id: String,
    pub group_external_id: String,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub channel_external_id: Option<String>,
    #[serde(default)]
    pub channel_name: Option<String>,
    #[serde(default)]
    pub old_name: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub member_count: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ChatEventType {
    GroupCreated,
    GroupDeleted,
    ChannelCreated,
    ChannelDeleted,
    ChannelUpdated,
}

/// `events:minecraft:player` — produced by the plugin, consumed by whichever
/// component needs presence. The core treats this as opaque pass-through;
/// no component in this spec currently subscribes to it, but the record is
/// defined so the topic's contract is fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerEventRecord {
    pub event_type: PlayerEventType,
    pub player_uuid: String,
    pub player_name: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum PlayerEventType {
    PlayerJoined,
    PlayerLeft,
}

/// `events:world:activity` — best-effort build-start / build-complete
/// broadcast, fire-and-forget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldActivityRecord {
    pub kind: WorldActivityKind,
    pub summary: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum WorldActivityKind {
    BuildStarted,
    BuildCompleted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_fields_are_ignored() {
        let json = r#"{
            "eventType": "ChannelCreated",
            "timestamp": "2026-01-01T00:00:00Z",
            "guildId": "g1",
            "groupExternalId": "grp1",
            "channelExternalId": "ch1",
            "channelName": "general",
            "somethingFuture": 123
        }"#;
        let rec: ChatEventRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.event_type, ChatEventType::ChannelCreated);
        assert_eq!(rec.channel_name.as_deref(), Some("general"));
    }

    #[test]
    fn unknown_event_type_fails_to_parse_and_is_dropped_by_caller() {
        let json = r#"{
            "eventType": "SomethingNew",
            "timestamp": "2026-01-01T00:00:00Z",
            "guildId": "g1",
            "groupExternalId": "grp1"
        }"#;
        let rec = serde_json::from_str::<ChatEventRecord>(json);
        assert!(rec.is_err());
    }
}
