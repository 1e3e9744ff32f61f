use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use http::StatusCode;
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extractors::AuthUser;
use crate::models::{ApiResponse, CreateTransactionRequest, Transaction, UpdateTransactionRequest};
use crate::routes::blocking;
use crate::services::ledger_service::LedgerService;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_transactions).post(create_transaction))
        .route(
            "/:id",
            get(get_transaction)
                .put(update_transaction)
                .delete(delete_transaction),
        )
}

/// Loads a transaction and checks that `user_id` owns it.
fn owned_transaction(ledger: &LedgerService, user_id: Uuid, id: Uuid) -> Result<Transaction, AppError> {
    let transaction = ledger.get(id)?;
    if transaction.user_id != user_id {
        warn!("User {} tried to access transaction {} of another user", user_id, id);
        return Err(AppError::Unauthorized);
    }
    Ok(transaction)
}

pub async fn list_transactions(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<ApiResponse<Vec<Transaction>>>, AppError> {
    info!("GET /api/transactions - Listing ledger of user {}", user.id);
    let ledger = state.ledger.clone();
    let transactions = blocking(move || ledger.list_by_user(user.id))
        .await
        .map_err(|e| {
            error!("Failed to list transactions for user {}: {}", user.id, e);
            e
        })?;
    Ok(Json(ApiResponse::ok(transactions, "Transactions retrieved successfully")))
}

pub async fn create_transaction(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Transaction>>), AppError> {
    info!("POST /api/transactions - Creating transaction for user {}", user.id);
    let Json(request) = payload?;
    let input = request.validate()?;

    let ledger = state.ledger.clone();
    let transaction = blocking(move || ledger.create_with_funds_check(user.id, input))
        .await
        .map_err(|e| {
            error!("Failed to create transaction for user {}: {}", user.id, e);
            e
        })?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(transaction, "Transaction created successfully")),
    ))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Transaction>>, AppError> {
    info!("GET /api/transactions/{} - Fetching transaction", id);
    let ledger = state.ledger.clone();
    let transaction = blocking(move || owned_transaction(&ledger, user.id, id)).await?;
    Ok(Json(ApiResponse::ok(transaction, "Transaction retrieved successfully")))
}

pub async fn update_transaction(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateTransactionRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Transaction>>, AppError> {
    info!("PUT /api/transactions/{} - Updating transaction", id);
    let ledger = state.ledger.clone();
    let transaction = blocking(move || {
        owned_transaction(&ledger, user.id, id)?;
        let Json(request) = payload?;
        ledger.update(id, request.validate()?)
    })
    .await
    .map_err(|e| {
        error!("Failed to update transaction {}: {}", id, e);
        e
    })?;
    Ok(Json(ApiResponse::ok(transaction, "Transaction updated successfully")))
}

pub async fn delete_transaction(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    info!("DELETE /api/transactions/{} - Deleting transaction", id);
    let ledger = state.ledger.clone();
    let deleted = blocking(move || {
        owned_transaction(&ledger, user.id, id)?;
        ledger.delete(id)
    })
    .await
    .map_err(|e| {
        error!("Failed to delete transaction {}: {}", id, e);
        e
    })?;
    if !deleted {
        return Err(AppError::NotFound("Transaction not found".into()));
    }
    Ok(Json(ApiResponse::ok(Value::Null, "Transaction deleted successfully")))
}
