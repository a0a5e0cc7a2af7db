// src/task.rs

use actix_web::{web, HttpResponse};
use chrono::Utc;
use log::{debug, info};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::models::{non_blank, to_bson, CreateTaskRequest, Task, TaskDto, UpdateTaskRequest};
use crate::store::{StoreError, TaskStore};

const DEFAULT_PRIORITY: &str = "medium";

fn to_wire(tasks: Vec<Task>) -> Result<Vec<TaskDto>, ApiError> {
    let dtos = tasks
        .into_iter()
        .map(TaskDto::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(dtos)
}

pub async fn list(store: &dyn TaskStore) -> Result<Vec<TaskDto>, ApiError> {
    let tasks = store.list_tasks().await?;
    to_wire(tasks)
}

pub async fn get(store: &dyn TaskStore, id: &str) -> Result<TaskDto, ApiError> {
    let task = store.get_task(id).await?.ok_or(ApiError::NotFound)?;
    Ok(TaskDto::try_from(task)?)
}

/// Fills in id, createdAt and defaults, then stores the task.
pub async fn create(store: &dyn TaskStore, request: CreateTaskRequest) -> Result<TaskDto, ApiError> {
    let title = non_blank(request.title.as_deref())
        .ok_or_else(|| ApiError::validation("title is required"))?
        .to_string();

    let task = Task {
        id: non_blank(request.id.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        title,
        completed: request.completed.unwrap_or(false),
        priority: non_blank(request.priority.as_deref())
            .unwrap_or(DEFAULT_PRIORITY)
            .to_string(),
        note: request.note,
        created_at: to_bson(request.created_at.unwrap_or_else(Utc::now)),
        pomodoro_count: request.pomodoro_count.unwrap_or(0),
        category_id: request.category_id,
    };

    store.insert_task(&task).await.map_err(|e| match e {
        StoreError::Duplicate { key, .. } => ApiError::Conflict(format!("task {key} already exists")),
        other => other.into(),
    })?;
    info!("Task created: {}", task.id);
    Ok(TaskDto::try_from(task)?)
}

pub async fn update(
    store: &dyn TaskStore,
    id: &str,
    changes: UpdateTaskRequest,
) -> Result<TaskDto, ApiError> {
    if changes.title.is_some() && non_blank(changes.title.as_deref()).is_none() {
        return Err(ApiError::validation("title must not be blank"));
    }

    let mut task = store.get_task(id).await?.ok_or(ApiError::NotFound)?;
    task.apply(changes);

    // The record may have been deleted between the read and the write.
    if !store.replace_task(&task).await? {
        return Err(ApiError::NotFound);
    }
    info!("Task updated: {}", task.id);
    Ok(TaskDto::try_from(task)?)
}

pub async fn delete(store: &dyn TaskStore, id: &str) -> Result<(), ApiError> {
    if !store.delete_task(id).await? {
        return Err(ApiError::NotFound);
    }
    info!("Task deleted: {}", id);
    Ok(())
}

/// Tasks whose `categoryId` is exactly `category_id`; uncategorized tasks never match.
pub async fn list_by_category(
    store: &dyn TaskStore,
    category_id: &str,
) -> Result<Vec<TaskDto>, ApiError> {
    let tasks = store.tasks_in_category(category_id).await?;
    to_wire(tasks)
}

/// GET /api/tasks
pub async fn list_tasks(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let tasks = list(data.tasks.as_ref()).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// GET /api/tasks/{id}
pub async fn get_task(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let task = get(data.tasks.as_ref(), &id).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// POST /api/tasks
pub async fn create_task(
    data: web::Data<AppState>,
    payload: web::Json<CreateTaskRequest>,
) -> Result<HttpResponse, ApiError> {
    debug!("Received create_task request: {:?}", payload);
    let task = create(data.tasks.as_ref(), payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// PUT /api/tasks/{id}
pub async fn update_task(
    data: web::Data<AppState>,
    id: web::Path<String>,
    payload: web::Json<UpdateTaskRequest>,
) -> Result<HttpResponse, ApiError> {
    let task = update(data.tasks.as_ref(), &id, payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// DELETE /api/tasks/{id}
pub async fn delete_task(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    delete(data.tasks.as_ref(), &id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/tasks/category/{category_id}
pub async fn list_tasks_by_category(
    data: web::Data<AppState>,
    category_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let tasks = list_by_category(data.tasks.as_ref(), &category_id).await?;
    Ok(HttpResponse::Ok().json(tasks))
}
