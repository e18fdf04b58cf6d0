use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::ids::{AssetId, MessageId, SessionId};
use super::part::Part;
use super::role::Role;

/// Downstream processing state of a stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskProcessStatus {
    #[default]
    Pending,
    Running,
    Success,
    Failed,
}

/// Canonical message ready to be handed to persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<MessageId>,
    pub role: Role,
    pub parts: Vec<Part>,
    /// Assets referenced by media parts, in part order without duplicates.
    #[serde(default)]
    pub asset_ids: Vec<AssetId>,
}

impl NewMessage {
    pub fn new(parent_id: Option<MessageId>, role: Role, parts: Vec<Part>) -> Self {
        let asset_ids = referenced_assets(&parts);
        Self {
            parent_id,
            role,
            parts,
            asset_ids,
        }
    }
}

/// A stored conversation message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub session_id: SessionId,
    #[serde(default)]
    pub parent_id: Option<MessageId>,
    pub role: Role,
    pub parts: Vec<Part>,
    #[serde(default, rename = "session_task_process_status")]
    pub task_status: TaskProcessStatus,
    pub created_at_unix_seconds: u64,
    pub updated_at_unix_seconds: u64,
}

impl Message {
    /// Mints a fresh id and timestamps for a normalized draft.
    pub fn create(session_id: SessionId, input: NewMessage) -> Self {
        let now = now_unix_seconds();
        Self {
            id: MessageId::new_v7(),
            session_id,
            parent_id: input.parent_id,
            role: input.role,
            parts: input.parts,
            task_status: TaskProcessStatus::Pending,
            created_at_unix_seconds: now,
            updated_at_unix_seconds: now,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn asset_ids(&self) -> Vec<AssetId> {
        referenced_assets(&self.parts)
    }
}

fn referenced_assets(parts: &[Part]) -> Vec<AssetId> {
    let mut asset_ids = Vec::new();
    for asset_id in parts.iter().filter_map(Part::asset_id) {
        if !asset_ids.contains(&asset_id) {
            asset_ids.push(asset_id);
        }
    }
    asset_ids
}

fn now_unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::part::MediaPart;

    #[test]
    fn asset_ids_follow_part_order_without_duplicates() {
        let first = AssetId::new_v7();
        let second = AssetId::new_v7();
        let parts = vec![
            Part::image(MediaPart::with_asset(second, "image/png")),
            Part::text("caption"),
            Part::file(MediaPart::with_asset(first, "application/pdf")),
            Part::audio(MediaPart::with_asset(second, "audio/wav")),
            Part::video(MediaPart::default()),
        ];
        let draft = NewMessage::new(None, Role::User, parts);
        assert_eq!(draft.asset_ids, vec![second, first]);
    }

    #[test]
    fn create_stamps_pending_status_and_equal_timestamps() {
        let session_id = SessionId::new_v7();
        let parent_id = MessageId::new_v7();
        let message = Message::create(
            session_id,
            NewMessage::new(Some(parent_id), Role::Assistant, vec![Part::text("hi")]),
        );
        assert_eq!(message.session_id, session_id);
        assert_eq!(message.parent_id, Some(parent_id));
        assert!(!message.is_root());
        assert_eq!(message.task_status, TaskProcessStatus::Pending);
        assert_eq!(
            message.created_at_unix_seconds,
            message.updated_at_unix_seconds
        );
    }

    #[test]
    fn message_wire_shape_uses_status_field_name() {
        let message = Message::create(
            SessionId::new_v7(),
            NewMessage::new(None, Role::User, vec![Part::text("hi")]),
        );
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["session_task_process_status"], json!("pending"));
        assert_eq!(value["role"], json!("user"));
        assert_eq!(value["parts"], json!([{ "type": "text", "text": "hi" }]));

        let back: Message = serde_json::from_value(value).unwrap();
        assert_eq!(back, message);
    }
}
