use shared::{Category, NewCategory, TransactionType};
use tracing::info;
use uuid::Uuid;

use crate::db::Database;
use crate::error::AppError;

/// Category listing and creation. Categories are never updated or deleted
/// through the API surface.
#[derive(Clone)]
pub struct CategoryService {
    db: Database,
}

impl CategoryService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<Category>, AppError> {
        Ok(self.db.list_categories().await?)
    }

    pub async fn create(&self, payload: NewCategory) -> Result<Category, AppError> {
        let name = require(payload.name.as_deref(), "name")?;
        let kind = require(payload.transaction_type.as_deref(), "type")?;
        let color = require(payload.color.as_deref(), "color")?;

        let transaction_type = TransactionType::parse(kind)
            .ok_or_else(|| AppError::validation("Type must be 'income' or 'expense'"))?;

        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            transaction_type,
            color: color.to_string(),
            icon: payload.icon.unwrap_or_else(|| "circle".to_string()),
        };
        category.validate().map_err(AppError::Validation)?;

        self.db.insert_category(&category).await?;
        info!("Created category {} ({})", category.name, category.id);
        Ok(category)
    }
}

fn require<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, AppError> {
    value.ok_or_else(|| AppError::validation(format!("Missing required field: {field}")))
}
