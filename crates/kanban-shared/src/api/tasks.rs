use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::fields::nullable;
use super::{FieldReader, FromJson, UserSummary};
use crate::models::{Priority, Task, TaskStatus};
use crate::validation::ValidationErrors;

/// `POST /tasks/`. `board` is optional only so that its absence reaches the
/// access check instead of failing deserialization.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

/// `PUT /tasks/{id}/`. `board` and `title` are required; `board` must name
/// the task's current board. Omitted optional fields keep their value and an
/// explicit `null` clears a nullable one.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ReplaceTaskRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(
        default,
        deserialize_with = "nullable::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub assignee_id: Option<Option<Uuid>>,
    #[serde(
        default,
        deserialize_with = "nullable::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub reviewer_id: Option<Option<Uuid>>,
    #[serde(
        default,
        deserialize_with = "nullable::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<NaiveDate>>,
}

/// `PATCH /tasks/{id}/`. There is no `board` field: a task never moves.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PatchTaskRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(
        default,
        deserialize_with = "nullable::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub assignee_id: Option<Option<Uuid>>,
    #[serde(
        default,
        deserialize_with = "nullable::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub reviewer_id: Option<Option<Uuid>>,
    #[serde(
        default,
        deserialize_with = "nullable::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<NaiveDate>>,
}

impl FromJson for CreateTaskRequest {
    /// A `null` board counts as a missing one.
    fn from_json(body: Value) -> Result<Self, ValidationErrors> {
        let mut fields = FieldReader::new(body)?;
        let req = Self {
            board: fields.nullable("board").flatten(),
            title: fields.optional("title"),
            description: fields.optional("description"),
            status: fields.optional("status"),
            priority: fields.optional("priority"),
            assignee_id: fields.nullable("assignee_id").flatten(),
            reviewer_id: fields.nullable("reviewer_id").flatten(),
            due_date: fields.nullable("due_date").flatten(),
        };
        fields.finish(req)
    }
}

impl FromJson for ReplaceTaskRequest {
    fn from_json(body: Value) -> Result<Self, ValidationErrors> {
        let mut fields = FieldReader::new(body)?;
        let req = Self {
            board: fields.optional("board"),
            title: fields.optional("title"),
            description: fields.optional("description"),
            status: fields.optional("status"),
            priority: fields.optional("priority"),
            assignee_id: fields.nullable("assignee_id"),
            reviewer_id: fields.nullable("reviewer_id"),
            due_date: fields.nullable("due_date"),
        };
        fields.finish(req)
    }
}

impl FromJson for PatchTaskRequest {
    /// `board` is left for the caller: the patch shape cannot carry it.
    fn from_json(body: Value) -> Result<Self, ValidationErrors> {
        let mut fields = FieldReader::new(body)?;
        let req = Self {
            title: fields.optional("title"),
            description: fields.optional("description"),
            status: fields.optional("status"),
            priority: fields.optional("priority"),
            assignee_id: fields.nullable("assignee_id"),
            reviewer_id: fields.nullable("reviewer_id"),
            due_date: fields.nullable("due_date"),
        };
        fields.finish(req)
    }
}

/// The mutable part of a task update, shared by PUT and PATCH once the
/// board reference has been checked.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub assignee_id: Option<Option<Uuid>>,
    pub reviewer_id: Option<Option<Uuid>>,
    pub due_date: Option<Option<NaiveDate>>,
}

impl TaskChanges {
    /// Applies every present field to `task`.
    pub fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(assignee_id) = self.assignee_id {
            task.assignee_id = assignee_id;
        }
        if let Some(reviewer_id) = self.reviewer_id {
            task.reviewer_id = reviewer_id;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
    }
}

impl ReplaceTaskRequest {
    pub fn into_parts(self) -> (Option<Uuid>, TaskChanges) {
        let changes = TaskChanges {
            title: self.title,
            description: self.description,
            status: self.status,
            priority: self.priority,
            assignee_id: self.assignee_id,
            reviewer_id: self.reviewer_id,
            due_date: self.due_date,
        };
        (self.board, changes)
    }
}

impl From<PatchTaskRequest> for TaskChanges {
    fn from(req: PatchTaskRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            assignee_id: req.assignee_id,
            reviewer_id: req.reviewer_id,
            due_date: req.due_date,
        }
    }
}

/// Task as returned by create, retrieve, list and full replace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskView {
    pub id: Uuid,
    pub board: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub assignee: Option<UserSummary>,
    pub reviewer: Option<UserSummary>,
    pub due_date: Option<NaiveDate>,
    pub comments_count: usize,
}

/// Task nested inside a board detail; the board is implied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub assignee: Option<UserSummary>,
    pub reviewer: Option<UserSummary>,
    pub due_date: Option<NaiveDate>,
    pub comments_count: usize,
}

/// `PATCH /tasks/{id}/` response: only the fields a partial update may touch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPatchView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub assignee: Option<UserSummary>,
    pub reviewer: Option<UserSummary>,
    pub due_date: Option<NaiveDate>,
}

impl TaskView {
    pub fn new(
        task: &Task,
        assignee: Option<UserSummary>,
        reviewer: Option<UserSummary>,
        comments_count: usize,
    ) -> Self {
        Self {
            id: task.id,
            board: task.board_id,
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            priority: task.priority,
            assignee,
            reviewer,
            due_date: task.due_date,
            comments_count,
        }
    }
}

impl From<TaskView> for TaskSummary {
    fn from(view: TaskView) -> Self {
        Self {
            id: view.id,
            title: view.title,
            description: view.description,
            status: view.status,
            priority: view.priority,
            assignee: view.assignee,
            reviewer: view.reviewer,
            due_date: view.due_date,
            comments_count: view.comments_count,
        }
    }
}

impl From<TaskView> for TaskPatchView {
    fn from(view: TaskView) -> Self {
        Self {
            id: view.id,
            title: view.title,
            description: view.description,
            status: view.status,
            priority: view.priority,
            assignee: view.assignee,
            reviewer: view.reviewer,
            due_date: view.due_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let cleared: PatchTaskRequest =
            serde_json::from_value(json!({ "assignee_id": null, "status": "done" })).unwrap();
        assert_eq!(cleared.assignee_id, Some(None));
        assert_eq!(cleared.reviewer_id, None);
        assert_eq!(cleared.status, Some(TaskStatus::Done));

        let id = Uuid::new_v4();
        let set: PatchTaskRequest = serde_json::from_value(json!({ "reviewer_id": id })).unwrap();
        assert_eq!(set.reviewer_id, Some(Some(id)));
    }

    #[test]
    fn patch_shape_has_no_board() {
        let req: PatchTaskRequest =
            serde_json::from_value(json!({ "board": Uuid::new_v4(), "title": "x" })).unwrap();
        let echoed = serde_json::to_value(&req).unwrap();
        assert!(echoed.get("board").is_none());
    }

    #[test]
    fn patch_body_rejects_null_for_plain_fields() {
        let errors = PatchTaskRequest::from_json(json!({ "title": null, "priority": null }))
            .unwrap_err();
        assert_eq!(errors.get("title").unwrap(), [crate::validation::NULL]);
        assert_eq!(errors.get("priority").unwrap(), [crate::validation::NULL]);

        let cleared = PatchTaskRequest::from_json(json!({ "due_date": null })).unwrap();
        assert_eq!(cleared.due_date, Some(None));
    }

    #[test]
    fn create_body_reports_every_bad_field() {
        let errors = CreateTaskRequest::from_json(json!({
            "board": Uuid::new_v4(),
            "status": "blocked",
            "assignee_id": "nope",
            "due_date": "31/12/2025",
        }))
        .unwrap_err();

        assert!(errors.contains("status"));
        assert!(errors.contains("assignee_id"));
        assert!(errors.contains("due_date"));
        assert!(!errors.contains("board"));
    }

    #[test]
    fn create_body_treats_null_board_as_missing() {
        let req = CreateTaskRequest::from_json(json!({ "board": null, "title": "x" })).unwrap();
        assert_eq!(req.board, None);
    }

    #[test]
    fn changes_apply_only_present_fields() {
        let mut task = Task {
            id: Uuid::new_v4(),
            board_id: Uuid::new_v4(),
            title: "Fix bug".to_string(),
            description: "crash on start".to_string(),
            created_by: Uuid::new_v4(),
            assignee_id: Some(Uuid::new_v4()),
            reviewer_id: None,
            due_date: None,
            status: TaskStatus::Todo,
            priority: Priority::High,
            created_at: Utc::now(),
        };
        let board_id = task.board_id;

        TaskChanges {
            status: Some(TaskStatus::Done),
            assignee_id: Some(None),
            ..TaskChanges::default()
        }
        .apply(&mut task);

        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.assignee_id, None);
        assert_eq!(task.title, "Fix bug");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.board_id, board_id);
    }

    #[test]
    fn statuses_use_snake_case() {
        assert_eq!(serde_json::to_value(TaskStatus::InProgress).unwrap(), "in_progress");
        assert_eq!(serde_json::to_value(Priority::High).unwrap(), "high");
        assert!(serde_json::from_value::<TaskStatus>(json!("blocked")).is_err());
    }
}
