use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use shared::{Category, NewCategory, NewTransaction, Report, Transaction, TransactionPatch};
use tracing::info;

use crate::db::Database;
use crate::domain::{CategoryService, DataExchangeService, ReportService, TransactionService};
use crate::error::AppError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub transactions: TransactionService,
    pub categories: CategoryService,
    pub reports: ReportService,
    pub data: DataExchangeService,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self {
            transactions: TransactionService::new(db.clone()),
            categories: CategoryService::new(db.clone()),
            reports: ReportService::new(db.clone()),
            data: DataExchangeService::new(db),
        }
    }
}

/// All API routes, nested under /api.
pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route(
            "/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route(
            "/transactions/:id",
            put(update_transaction).delete(delete_transaction),
        )
        .route("/categories", get(list_categories).post(create_category))
        .route("/reports", get(get_reports))
        .route("/export", get(export_data))
        .route("/import", post(import_data));

    Router::new().nest("/api", api_routes).with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn list_transactions(
    State(state): State<AppState>,
) -> Result<Json<shared::TransactionsResponse>, AppError> {
    info!("GET /api/transactions");
    Ok(Json(state.transactions.list().await?))
}

async fn create_transaction(
    State(state): State<AppState>,
    Json(payload): Json<NewTransaction>,
) -> Result<(StatusCode, Json<Transaction>), AppError> {
    info!("POST /api/transactions");
    let created = state.transactions.create(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<TransactionPatch>,
) -> Result<Json<Transaction>, AppError> {
    info!("PUT /api/transactions/{}", id);
    let updated = state.transactions.update(&id, patch).await?;
    Ok(Json(updated))
}

async fn delete_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    info!("DELETE /api/transactions/{}", id);
    state.transactions.delete(&id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Transaction deleted",
    })))
}

async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>, AppError> {
    info!("GET /api/categories");
    Ok(Json(state.categories.list().await?))
}

async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<NewCategory>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    info!("POST /api/categories");
    let created = state.categories.create(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Deserialize, Debug)]
struct ReportQuery {
    period: Option<String>,
}

async fn get_reports(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Report>, AppError> {
    info!("GET /api/reports - query: {:?}", query);
    Ok(Json(state.reports.report(query.period.as_deref()).await?))
}

async fn export_data(
    State(state): State<AppState>,
) -> Result<Json<shared::ExportResponse>, AppError> {
    info!("GET /api/export");
    Ok(Json(state.data.export().await?))
}

async fn import_data(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    info!("POST /api/import");
    state.data.import(body).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Data imported successfully",
    })))
}
