// src/category.rs

use actix_web::{web, HttpResponse};
use log::{info, warn};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::models::category::DEFAULT_CATEGORY_ID;
use crate::models::{non_blank, Category, CategoryDto, CreateCategoryRequest, UpdateCategoryRequest};
use crate::store::{CategoryStore, StoreError};

/// Seeds the reserved "default" category if it is missing.
///
/// Runs once before the server starts accepting requests. Re-running it is
/// harmless: an existing default record is left as is, and losing an insert
/// race to another instance counts as success.
pub async fn bootstrap(store: &dyn CategoryStore, color: &str) -> Result<(), ApiError> {
    if store.get_category(DEFAULT_CATEGORY_ID).await?.is_some() {
        return Ok(());
    }
    match store.insert_category(&Category::bootstrap(color)).await {
        Ok(()) => {
            info!("Seeded default category");
            Ok(())
        }
        Err(StoreError::Duplicate { .. }) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

pub async fn list(store: &dyn CategoryStore) -> Result<Vec<CategoryDto>, ApiError> {
    let categories = store.list_categories().await?;
    Ok(categories.into_iter().map(CategoryDto::from).collect())
}

pub async fn get(store: &dyn CategoryStore, id: &str) -> Result<CategoryDto, ApiError> {
    store
        .get_category(id)
        .await?
        .map(CategoryDto::from)
        .ok_or(ApiError::NotFound)
}

pub async fn create(
    store: &dyn CategoryStore,
    request: CreateCategoryRequest,
) -> Result<CategoryDto, ApiError> {
    let title = non_blank(request.title.as_deref())
        .ok_or_else(|| ApiError::validation("title is required"))?
        .to_string();
    let color = non_blank(request.color.as_deref())
        .ok_or_else(|| ApiError::validation("color is required"))?
        .to_string();

    let category = Category {
        id: non_blank(request.id.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        title,
        description: request.description,
        color,
    };

    store.insert_category(&category).await.map_err(|e| match e {
        StoreError::Duplicate { key, .. } => {
            ApiError::Conflict(format!("category {key} already exists"))
        }
        other => other.into(),
    })?;
    info!("Category created: {}", category.id);
    Ok(category.into())
}

pub async fn update(
    store: &dyn CategoryStore,
    id: &str,
    changes: UpdateCategoryRequest,
) -> Result<CategoryDto, ApiError> {
    if changes.title.is_some() && non_blank(changes.title.as_deref()).is_none() {
        return Err(ApiError::validation("title must not be blank"));
    }
    if changes.color.is_some() && non_blank(changes.color.as_deref()).is_none() {
        return Err(ApiError::validation("color must not be blank"));
    }

    let mut category = store.get_category(id).await?.ok_or(ApiError::NotFound)?;
    category.apply(changes);

    if !store.replace_category(&category).await? {
        return Err(ApiError::NotFound);
    }
    info!("Category updated: {}", category.id);
    Ok(category.into())
}

/// Deleting a category leaves tasks that reference it untouched.
pub async fn delete(store: &dyn CategoryStore, id: &str) -> Result<(), ApiError> {
    if id == DEFAULT_CATEGORY_ID {
        warn!("Refused to delete the default category");
        return Err(ApiError::InvalidOperation);
    }
    if !store.delete_category(id).await? {
        return Err(ApiError::NotFound);
    }
    info!("Category deleted: {}", id);
    Ok(())
}

/// GET /api/categories
pub async fn list_categories(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let categories = list(data.categories.as_ref()).await?;
    Ok(HttpResponse::Ok().json(categories))
}

/// GET /api/categories/{id}
pub async fn get_category(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let category = get(data.categories.as_ref(), &id).await?;
    Ok(HttpResponse::Ok().json(category))
}

/// POST /api/categories
pub async fn create_category(
    data: web::Data<AppState>,
    payload: web::Json<CreateCategoryRequest>,
) -> Result<HttpResponse, ApiError> {
    let category = create(data.categories.as_ref(), payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(category))
}

/// PUT /api/categories/{id}
pub async fn update_category(
    data: web::Data<AppState>,
    id: web::Path<String>,
    payload: web::Json<UpdateCategoryRequest>,
) -> Result<HttpResponse, ApiError> {
    let category = update(data.categories.as_ref(), &id, payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(category))
}

/// DELETE /api/categories/{id}
pub async fn delete_category(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    delete(data.categories.as_ref(), &id).await?;
    Ok(HttpResponse::NoContent().finish())
}
