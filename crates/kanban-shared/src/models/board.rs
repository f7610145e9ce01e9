use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A Kanban board. The owner is fixed at creation and is not required to
/// appear in `members`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: Uuid,
    pub title: String,
    pub owner_id: Uuid,
    pub members: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Board {
    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.members.contains(&user_id)
    }

    /// Owner or member: anyone who may see the board and work on its tasks.
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.is_owner(user_id) || self.is_member(user_id)
    }
}

/// Removes duplicate ids while keeping first-seen order.
pub fn dedup_members(members: Vec<Uuid>) -> Vec<Uuid> {
    let mut unique = Vec::with_capacity(members.len());
    for id in members {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    unique
}
