use chrono::Utc;
use shared::{
    category_breakdown, monthly_data, FinancialSummary, NewTransaction, Transaction,
    TransactionPatch, TransactionType, TransactionsResponse,
};
use tracing::info;
use uuid::Uuid;

use crate::db::Database;
use crate::error::AppError;

/// Transaction ingestion, lookup, and the combined list-with-aggregates view.
#[derive(Clone)]
pub struct TransactionService {
    db: Database,
}

impl TransactionService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// All transactions (newest first) together with the derived summary,
    /// category breakdown, and monthly rollup.
    pub async fn list(&self) -> Result<TransactionsResponse, AppError> {
        let transactions = self.db.list_transactions().await?;
        let summary = FinancialSummary::calculate(&transactions);
        let breakdown = category_breakdown(&transactions);
        let monthly = monthly_data(&transactions);
        Ok(TransactionsResponse {
            transactions,
            summary,
            category_breakdown: breakdown,
            monthly_data: monthly,
        })
    }

    /// Validate the payload, assign id and creation timestamp, and persist.
    pub async fn create(&self, payload: NewTransaction) -> Result<Transaction, AppError> {
        let kind = require(payload.transaction_type.as_deref(), "type")?;
        let amount_raw = payload
            .amount
            .as_ref()
            .ok_or_else(|| AppError::validation("Missing required field: amount"))?;
        let category = require(payload.category.as_deref(), "category")?;
        let description = require(payload.description.as_deref(), "description")?;
        let date = require(payload.date.as_deref(), "date")?;

        let transaction_type = TransactionType::parse(kind)
            .ok_or_else(|| AppError::validation("Type must be 'income' or 'expense'"))?;
        let amount = parse_amount(amount_raw)
            .ok_or_else(|| AppError::validation("Amount must be a positive number"))?;

        let transaction = Transaction {
            id: Uuid::new_v4().to_string(),
            transaction_type,
            amount,
            category: category.to_string(),
            description: description.to_string(),
            date: date.to_string(),
            created_at: Utc::now().to_rfc3339(),
        };
        transaction
            .validate()
            .map_err(AppError::Validation)?;

        self.db.insert_transaction(&transaction).await?;
        info!("Created transaction {}", transaction.id);
        Ok(transaction)
    }

    /// Merge the patch into the stored record: present fields overwrite,
    /// absent fields are preserved, the id never changes.
    pub async fn update(&self, id: &str, patch: TransactionPatch) -> Result<Transaction, AppError> {
        let mut transaction = self
            .db
            .get_transaction(id)
            .await?
            .ok_or_else(|| AppError::not_found("Transaction not found"))?;

        if let Some(kind) = patch.transaction_type {
            transaction.transaction_type = kind;
        }
        if let Some(amount) = patch.amount {
            transaction.amount = amount;
        }
        if let Some(category) = patch.category {
            transaction.category = category;
        }
        if let Some(description) = patch.description {
            transaction.description = description;
        }
        if let Some(date) = patch.date {
            transaction.date = date;
        }
        transaction
            .validate()
            .map_err(AppError::Validation)?;

        if !self.db.update_transaction(&transaction).await? {
            return Err(AppError::not_found("Transaction not found"));
        }
        info!("Updated transaction {}", transaction.id);
        Ok(transaction)
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        if !self.db.delete_transaction(id).await? {
            return Err(AppError::not_found("Transaction not found"));
        }
        info!("Deleted transaction {}", id);
        Ok(())
    }
}

fn require<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, AppError> {
    value.ok_or_else(|| AppError::validation(format!("Missing required field: {field}")))
}

/// Accept a JSON number or a numeric string; only strictly positive finite
/// values qualify.
fn parse_amount(value: &serde_json::Value) -> Option<f64> {
    let amount = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if amount.is_finite() && amount > 0.0 {
        Some(amount)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn setup() -> TransactionService {
        let db = Database::init_test().await.expect("Failed to create test database");
        TransactionService::new(db)
    }

    fn valid_payload() -> NewTransaction {
        NewTransaction {
            transaction_type: Some("income".to_string()),
            amount: Some(json!(1200.0)),
            category: Some("Freelance".to_string()),
            description: Some("Web project".to_string()),
            date: Some("2025-11-05".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let service = setup().await;

        let created = service.create(valid_payload()).await.expect("Create failed");
        assert!(!created.id.is_empty());
        assert!(!created.created_at.is_empty());
        assert_eq!(created.transaction_type, TransactionType::Income);
        assert_eq!(created.amount, 1200.0);
        assert_eq!(created.category, "Freelance");

        let fetched = service
            .db
            .get_transaction(&created.id)
            .await
            .unwrap()
            .expect("Created transaction should be stored");
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_accepts_numeric_string_amount() {
        let service = setup().await;
        let mut payload = valid_payload();
        payload.amount = Some(json!("55.5"));

        let created = service.create(payload).await.expect("Create failed");
        assert_eq!(created.amount, 55.5);
    }

    #[tokio::test]
    async fn test_create_rejects_missing_fields() {
        let service = setup().await;

        for field in ["type", "amount", "category", "description", "date"] {
            let mut payload = valid_payload();
            match field {
                "type" => payload.transaction_type = None,
                "amount" => payload.amount = None,
                "category" => payload.category = None,
                "description" => payload.description = None,
                _ => payload.date = None,
            }
            let err = service.create(payload).await.expect_err("Should reject");
            match err {
                AppError::Validation(msg) => {
                    assert_eq!(msg, format!("Missing required field: {field}"))
                }
                other => panic!("Expected validation error, got {other:?}"),
            }
        }

        // Nothing was stored
        let listed = service.db.list_transactions().await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_bad_type_and_amount() {
        let service = setup().await;

        let mut payload = valid_payload();
        payload.transaction_type = Some("transfer".to_string());
        let err = service.create(payload).await.expect_err("Should reject");
        assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("income")));

        for amount in [json!(-5.0), json!(0), json!("not a number"), json!(null)] {
            let mut payload = valid_payload();
            payload.amount = Some(amount);
            let err = service.create(payload).await.expect_err("Should reject");
            match err {
                AppError::Validation(msg) => {
                    assert_eq!(msg, "Amount must be a positive number")
                }
                other => panic!("Expected validation error, got {other:?}"),
            }
        }

        let listed = service.db.list_transactions().await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_malformed_date() {
        let service = setup().await;

        for date in ["ステーキ", "2025/11/05", "2025-1-5"] {
            let mut payload = valid_payload();
            payload.date = Some(date.to_string());
            let err = service.create(payload).await.expect_err("Should reject");
            match err {
                AppError::Validation(msg) => {
                    assert_eq!(msg, "Date must be in YYYY-MM-DD format")
                }
                other => panic!("Expected validation error, got {other:?}"),
            }
        }

        // Nothing was stored, so listing (and its aggregates) stays sound
        let response = service.list().await.expect("List failed");
        assert!(response.transactions.is_empty());
        assert!(response.monthly_data.is_empty());
    }

    #[tokio::test]
    async fn test_update_rejects_malformed_date() {
        let service = setup().await;
        let created = service.create(valid_payload()).await.unwrap();

        let patch = TransactionPatch {
            date: Some("ステーキ".to_string()),
            ..Default::default()
        };
        let err = service.update(&created.id, patch).await.expect_err("Should reject");
        assert!(matches!(err, AppError::Validation(_)));

        // The stored record keeps its well-formed date
        let stored = service.db.get_transaction(&created.id).await.unwrap().unwrap();
        assert_eq!(stored.date, created.date);
        let response = service.list().await.expect("List failed");
        assert!(response.monthly_data.contains_key("2025-11"));
    }

    #[tokio::test]
    async fn test_update_merges_partial_fields() {
        let service = setup().await;
        let created = service.create(valid_payload()).await.unwrap();

        let patch = TransactionPatch {
            amount: Some(1500.0),
            description: Some("Bigger web project".to_string()),
            ..Default::default()
        };
        let updated = service.update(&created.id, patch).await.expect("Update failed");

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.amount, 1500.0);
        assert_eq!(updated.description, "Bigger web project");
        // Untouched fields are preserved
        assert_eq!(updated.transaction_type, created.transaction_type);
        assert_eq!(updated.category, created.category);
        assert_eq!(updated.date, created.date);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_patch_values() {
        let service = setup().await;
        let created = service.create(valid_payload()).await.unwrap();

        let patch = TransactionPatch {
            amount: Some(-1.0),
            ..Default::default()
        };
        let err = service.update(&created.id, patch).await.expect_err("Should reject");
        assert!(matches!(err, AppError::Validation(_)));

        // The stored record is unchanged
        let stored = service.db.get_transaction(&created.id).await.unwrap().unwrap();
        assert_eq!(stored.amount, created.amount);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let service = setup().await;
        let err = service
            .update("missing", TransactionPatch::default())
            .await
            .expect_err("Should fail");
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_not_found() {
        let service = setup().await;
        let created = service.create(valid_payload()).await.unwrap();

        let err = service.delete("missing").await.expect_err("Should fail");
        assert!(matches!(err, AppError::NotFound(_)));

        // The store is unchanged by the failed delete
        assert_eq!(service.db.list_transactions().await.unwrap().len(), 1);

        service.delete(&created.id).await.expect("Delete failed");
        assert!(service.db.list_transactions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_includes_aggregates() {
        let service = setup().await;
        service.create(valid_payload()).await.unwrap();

        let mut expense = valid_payload();
        expense.transaction_type = Some("expense".to_string());
        expense.amount = Some(json!(200.0));
        expense.category = Some("Shopping".to_string());
        expense.date = Some("2025-12-01".to_string());
        service.create(expense).await.unwrap();

        let response = service.list().await.expect("List failed");
        assert_eq!(response.transactions.len(), 2);
        // Newest date first
        assert_eq!(response.transactions[0].date, "2025-12-01");
        assert_eq!(response.summary.total_income, 1200.0);
        assert_eq!(response.summary.total_expenses, 200.0);
        assert_eq!(response.summary.balance, 1000.0);
        assert_eq!(response.category_breakdown["Shopping"].expense, 200.0);
        assert_eq!(response.monthly_data["2025-11"].income, 1200.0);
        assert_eq!(response.monthly_data["2025-12"].expense, 200.0);
    }
}
