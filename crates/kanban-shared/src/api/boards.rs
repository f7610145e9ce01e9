use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{FieldReader, FromJson, TaskSummary, UserSummary};
use crate::models::Board;
use crate::stats::BoardCounts;
use crate::validation::ValidationErrors;

/// `POST /boards/`. The owner is always the caller and cannot be supplied.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CreateBoardRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub members: Vec<Uuid>,
}

/// `PATCH /boards/{id}/`. `members` replaces the whole member set.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateBoardRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<Uuid>>,
}

impl FromJson for CreateBoardRequest {
    fn from_json(body: Value) -> Result<Self, ValidationErrors> {
        let mut fields = FieldReader::new(body)?;
        let req = Self {
            title: fields.optional("title"),
            members: fields.optional("members").unwrap_or_default(),
        };
        fields.finish(req)
    }
}

impl FromJson for UpdateBoardRequest {
    fn from_json(body: Value) -> Result<Self, ValidationErrors> {
        let mut fields = FieldReader::new(body)?;
        let req = Self {
            title: fields.optional("title"),
            members: fields.optional("members"),
        };
        fields.finish(req)
    }
}

/// List entry (also the create response).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSummary {
    pub id: Uuid,
    pub title: String,
    pub owner_id: Uuid,
    #[serde(flatten)]
    pub counts: BoardCounts,
}

impl BoardSummary {
    pub fn new(board: &Board, counts: BoardCounts) -> Self {
        Self {
            id: board.id,
            title: board.title.clone(),
            owner_id: board.owner_id,
            counts,
        }
    }
}

/// `GET /boards/{id}/`: the summary plus nested members and tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardDetail {
    pub id: Uuid,
    pub title: String,
    pub owner_id: Uuid,
    #[serde(flatten)]
    pub counts: BoardCounts,
    pub members: Vec<UserSummary>,
    pub tasks: Vec<TaskSummary>,
}

/// `PATCH /boards/{id}/` response: owner and members as nested users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardUpdateView {
    pub id: Uuid,
    pub title: String,
    pub owner_data: UserSummary,
    pub members_data: Vec<UserSummary>,
}
