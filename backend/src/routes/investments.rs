use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use http::StatusCode;
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extractors::AuthUser;
use crate::models::{
    ApiResponse, CreateInvestmentRequest, Investment, PortfolioSummary, PriceUpdate,
    RefreshPricesRequest, UpdateInvestmentRequest,
};
use crate::routes::blocking;
use crate::services::valuation_service::InvestmentService;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_investments).post(create_investment))
        .route("/summary", get(portfolio_summary))
        .route("/refresh-prices", post(refresh_prices))
        .route("/:id", put(update_investment).delete(delete_investment))
}

fn owned_investment(investments: &InvestmentService, user_id: Uuid, id: Uuid) -> Result<Investment, AppError> {
    let investment = investments.get(id)?;
    if investment.user_id != user_id {
        warn!("User {} tried to access investment {} of another user", user_id, id);
        return Err(AppError::Unauthorized);
    }
    Ok(investment)
}

pub async fn list_investments(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<ApiResponse<Vec<Investment>>>, AppError> {
    info!("GET /api/investments - Listing holdings of user {}", user.id);
    let investments = state.investments.clone();
    let holdings = blocking(move || investments.list_by_user(user.id))
        .await
        .map_err(|e| {
            error!("Failed to list investments for user {}: {}", user.id, e);
            e
        })?;
    Ok(Json(ApiResponse::ok(holdings, "Investments retrieved successfully")))
}

pub async fn create_investment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<CreateInvestmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Investment>>), AppError> {
    info!("POST /api/investments - Creating investment for user {}", user.id);
    let Json(request) = payload?;
    let input = request.validate()?;

    let investments = state.investments.clone();
    let investment = blocking(move || investments.create(user.id, input))
        .await
        .map_err(|e| {
            error!("Failed to create investment for user {}: {}", user.id, e);
            e
        })?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(investment, "Investment created successfully")),
    ))
}

pub async fn portfolio_summary(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<ApiResponse<PortfolioSummary>>, AppError> {
    info!("GET /api/investments/summary - Portfolio summary of user {}", user.id);
    let investments = state.investments.clone();
    let summary = blocking(move || investments.summary(user.id)).await?;
    Ok(Json(ApiResponse::ok(summary, "Portfolio summary retrieved successfully")))
}

pub async fn update_investment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateInvestmentRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Investment>>, AppError> {
    info!("PUT /api/investments/{} - Updating investment", id);
    let investments = state.investments.clone();
    let investment = blocking(move || {
        owned_investment(&investments, user.id, id)?;
        let Json(request) = payload?;
        investments.update(id, request.validate()?)
    })
    .await
    .map_err(|e| {
        error!("Failed to update investment {}: {}", id, e);
        e
    })?;
    Ok(Json(ApiResponse::ok(investment, "Investment updated successfully")))
}

pub async fn delete_investment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    info!("DELETE /api/investments/{} - Deleting investment", id);
    let investments = state.investments.clone();
    let deleted = blocking(move || {
        owned_investment(&investments, user.id, id)?;
        investments.delete(id)
    })
    .await?;
    if !deleted {
        return Err(AppError::NotFound("Investment not found".into()));
    }
    Ok(Json(ApiResponse::ok(Value::Null, "Investment deleted successfully")))
}

/// With a `{prices: [...]}` body, applies the given prices to the caller's own
/// holdings only. With an empty body, asks the price provider for a market
/// quote of every symbol the caller holds and applies it to every holding of
/// that symbol. Only the caller's holdings are returned.
pub async fn refresh_prices(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Bytes,
) -> Result<Json<ApiResponse<Vec<Investment>>>, AppError> {
    info!("POST /api/investments/refresh-prices - Refreshing prices for user {}", user.id);
    let investments = state.investments.clone();

    let result = if body.iter().all(u8::is_ascii_whitespace) {
        let holdings = {
            let investments = investments.clone();
            blocking(move || investments.list_by_user(user.id)).await?
        };
        let quotes = quote_holdings(&state, &holdings).await?;
        blocking(move || investments.refresh_prices(&quotes)).await
    } else {
        let request: RefreshPricesRequest = serde_json::from_slice(&body)
            .map_err(|e| AppError::Validation(format!("Invalid refresh request: {}", e)))?;
        blocking(move || investments.refresh_owned_prices(user.id, &request.prices)).await
    };
    let refreshed = result.map_err(|e| {
        error!("Failed to refresh prices for user {}: {}", user.id, e);
        e
    })?;

    let own: Vec<Investment> = refreshed
        .into_iter()
        .filter(|i| i.user_id == user.id)
        .collect();
    Ok(Json(ApiResponse::ok(own, "Investment prices updated successfully")))
}

/// One quote per distinct symbol, seeded from the first holding's price.
async fn quote_holdings(state: &AppState, holdings: &[Investment]) -> Result<Vec<PriceUpdate>, AppError> {
    let mut last_prices = BTreeMap::new();
    for holding in holdings {
        last_prices
            .entry(holding.symbol.clone())
            .or_insert_with(|| holding.current_price.clone());
    }

    let mut updates = Vec::with_capacity(last_prices.len());
    for (symbol, last_price) in last_prices {
        let new_price = state
            .price_provider
            .quote(&symbol, &last_price)
            .await
            .map_err(|e| {
                error!("Failed to quote {}: {}", symbol, e);
                AppError::from(e)
            })?;
        updates.push(PriceUpdate { symbol, new_price });
    }
    Ok(updates)
}
