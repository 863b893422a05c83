use chrono::Utc;
use shared::{ExportResponse, StoreSnapshot};
use tracing::info;

use crate::db::Database;
use crate::error::AppError;

/// Whole-store export and import.
#[derive(Clone)]
pub struct DataExchangeService {
    db: Database,
}

impl DataExchangeService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn export(&self) -> Result<ExportResponse, AppError> {
        let data = StoreSnapshot {
            transactions: self.db.list_transactions().await?,
            categories: self.db.list_categories().await?,
        };
        info!(
            "Exporting {} transactions and {} categories",
            data.transactions.len(),
            data.categories.len()
        );
        Ok(ExportResponse {
            exported_at: Utc::now().to_rfc3339(),
            data,
        })
    }

    /// Replace the whole store with the imported snapshot. Every record is
    /// re-validated first, so the import path cannot smuggle in data the
    /// ingestion endpoints would have rejected.
    pub async fn import(&self, body: serde_json::Value) -> Result<(), AppError> {
        let data = body
            .get("data")
            .ok_or_else(|| AppError::validation("Missing data field"))?;
        let snapshot: StoreSnapshot = serde_json::from_value(data.clone())
            .map_err(|_| AppError::validation("Invalid data format"))?;

        for t in &snapshot.transactions {
            t.validate().map_err(AppError::Validation)?;
        }
        for c in &snapshot.categories {
            c.validate().map_err(AppError::Validation)?;
        }

        self.db.replace_all(&snapshot).await?;
        info!(
            "Imported {} transactions and {} categories",
            snapshot.transactions.len(),
            snapshot.categories.len()
        );
        Ok(())
    }
}
