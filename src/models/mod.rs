pub mod category;
pub mod task;
pub mod user;

use chrono::{DateTime, Utc};
use mongodb::bson::DateTime as BsonDateTime;

pub use category::{Category, CategoryDto, CreateCategoryRequest, UpdateCategoryRequest};
pub use task::{CreateTaskRequest, Task, TaskDto, UpdateTaskRequest};
pub use user::{AuthRequest, AuthResponse, RegisterRequest, User, UserProfile};

/// Stored timestamps keep millisecond precision, so wire values are truncated
/// on the way in to make create-then-get round trips exact.
pub(crate) fn to_bson(ts: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(ts.timestamp_millis())
}

/// `None` when the stored date lies outside the range chrono can represent.
pub(crate) fn from_bson(ts: BsonDateTime) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ts.timestamp_millis())
}

/// Treats `Some("")` and whitespace-only strings like absent values.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
