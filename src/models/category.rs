use serde::{Deserialize, Serialize};

/// Id of the seeded category that can never be deleted.
pub const DEFAULT_CATEGORY_ID: &str = "default";
pub const DEFAULT_CATEGORY_TITLE: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDto {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub color: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

impl From<Category> for CategoryDto {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            title: category.title,
            description: category.description,
            color: category.color,
        }
    }
}

impl From<CategoryDto> for Category {
    fn from(dto: CategoryDto) -> Self {
        Self {
            id: dto.id,
            title: dto.title,
            description: dto.description,
            color: dto.color,
        }
    }
}

impl Category {
    pub fn bootstrap(color: &str) -> Self {
        Self {
            id: DEFAULT_CATEGORY_ID.to_string(),
            title: DEFAULT_CATEGORY_TITLE.to_string(),
            description: None,
            color: color.to_string(),
        }
    }

    pub fn apply(&mut self, changes: UpdateCategoryRequest) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(description) = changes.description {
            self.description = Some(description);
        }
        if let Some(color) = changes.color {
            self.color = color;
        }
    }
}
