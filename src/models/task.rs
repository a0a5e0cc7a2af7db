use chrono::{DateTime, Utc};
use mongodb::bson::DateTime as BsonDateTime;
use serde::{Deserialize, Serialize};

use super::{from_bson, to_bson};
use crate::store::StoreError;

/// Storage shape of a task, as kept in the `tasks` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub priority: String,
    pub note: Option<String>,
    pub created_at: BsonDateTime,
    pub pomodoro_count: i32,
    /// Not checked against the categories collection.
    pub category_id: Option<String>,
}

/// Wire shape of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDto {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub priority: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub pomodoro_count: i32,
    pub category_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub id: Option<String>,
    pub title: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<String>,
    pub note: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub pomodoro_count: Option<i32>,
    pub category_id: Option<String>,
}

/// Merge-patch payload: absent fields leave the stored value untouched.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<String>,
    pub note: Option<String>,
    pub pomodoro_count: Option<i32>,
    pub category_id: Option<String>,
}

impl TryFrom<Task> for TaskDto {
    type Error = StoreError;

    fn try_from(task: Task) -> Result<Self, Self::Error> {
        let created_at = from_bson(task.created_at).ok_or_else(|| StoreError::Corrupt {
            collection: "tasks",
            id: task.id.clone(),
            reason: format!("created_at {} is out of range", task.created_at.timestamp_millis()),
        })?;
        Ok(Self {
            id: task.id,
            title: task.title,
            completed: task.completed,
            priority: task.priority,
            note: task.note,
            created_at,
            pomodoro_count: task.pomodoro_count,
            category_id: task.category_id,
        })
    }
}

impl From<TaskDto> for Task {
    fn from(dto: TaskDto) -> Self {
        Self {
            id: dto.id,
            title: dto.title,
            completed: dto.completed,
            priority: dto.priority,
            note: dto.note,
            created_at: to_bson(dto.created_at),
            pomodoro_count: dto.pomodoro_count,
            category_id: dto.category_id,
        }
    }
}

impl Task {
    /// Applies a merge-patch. Only fields present in `changes` are written.
    pub fn apply(&mut self, changes: UpdateTaskRequest) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(completed) = changes.completed {
            self.completed = completed;
        }
        if let Some(priority) = changes.priority {
            self.priority = priority;
        }
        if let Some(note) = changes.note {
            self.note = Some(note);
        }
        if let Some(pomodoro_count) = changes.pomodoro_count {
            self.pomodoro_count = pomodoro_count;
        }
        if let Some(category_id) = changes.category_id {
            self.category_id = Some(category_id);
        }
    }
}
