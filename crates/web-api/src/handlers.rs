use crate::animation::CompletionError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tier_rewards_core::{is_valid_level, tier, Network};
use tier_rewards_distribution::LevelGraph;
use tier_rewards_rates::pricing;
use uuid::Uuid;

/// Uniform JSON envelope: `{ success, data }` or `{ success, message }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            message: None,
        })
    }
}

pub type ApiError = (StatusCode, Json<ApiResponse<()>>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ApiResponse {
            success: false,
            data: None,
            message: Some(message.into()),
        }),
    )
}

fn internal_error(e: &anyhow::Error) -> ApiError {
    tracing::error!("Request failed: {e:#}");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
}

fn parse_network(symbol: &str) -> Result<Network, ApiError> {
    Network::parse(symbol).ok_or_else(|| {
        api_error(
            StatusCode::BAD_REQUEST,
            format!("unknown network: {symbol}"),
        )
    })
}

// ---- conversion rates ----

/// Returns the effective conversion rate table.
pub async fn list_rates(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<BTreeMap<Network, Decimal>>> {
    let rates = state.rates.get_rates().await;
    ApiResponse::ok(rates.into_iter().collect())
}

#[derive(Debug, Deserialize)]
pub struct UpsertRateRequest {
    pub rate_to_usd: Decimal,
}

#[derive(Debug, Serialize)]
pub struct RateResponse {
    pub network: Network,
    pub rate_to_usd: Decimal,
}

/// Upserts one network's rate and invalidates the cache.
///
/// # Errors
/// 400 for unknown networks or non-positive rates, 500 on storage failure.
pub async fn put_rate(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Json(req): Json<UpsertRateRequest>,
) -> Result<Json<ApiResponse<RateResponse>>, ApiError> {
    let network = parse_network(&symbol)?;
    if req.rate_to_usd <= Decimal::ZERO {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "rate_to_usd must be positive",
        ));
    }

    state
        .rate_repo
        .upsert(network, req.rate_to_usd)
        .await
        .map_err(|e| internal_error(&e))?;
    state.rates.invalidate().await;

    Ok(ApiResponse::ok(RateResponse {
        network,
        rate_to_usd: req.rate_to_usd,
    }))
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// Networks whose live quote was accepted and persisted.
    pub updated: usize,
}

/// Pulls live oracle quotes into the authoritative store.
///
/// Oracle unavailability is not an error: the response reports zero
/// updates and the database table stays as it was.
///
/// # Errors
/// 500 only when persisting an accepted quote fails.
pub async fn refresh_rates(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<RefreshResponse>>, ApiError> {
    let updated = state
        .oracle
        .persist_live_rates(state.rate_repo.as_ref())
        .await
        .map_err(|e| internal_error(&e))?;

    if updated > 0 {
        state.rates.invalidate().await;
    }

    Ok(ApiResponse::ok(RefreshResponse { updated }))
}

// ---- network rewards ----

#[derive(Debug, Deserialize)]
pub struct CreateRewardRequest {
    pub network: String,
    pub level: i16,
    pub reward_amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRewardRequest {
    pub reward_amount: Decimal,
    pub is_active: bool,
}

/// Lists all network reward records.
///
/// # Errors
/// 500 on storage failure.
pub async fn list_rewards(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<tier_rewards_core::NetworkRewardRecord>>>, ApiError> {
    let records = state
        .rewards
        .list()
        .await
        .map_err(|e| internal_error(&e))?;
    Ok(ApiResponse::ok(records))
}

/// Creates a network reward record.
///
/// # Errors
/// 400 for unknown networks, invalid levels, or negative amounts; 500 on
/// storage failure.
pub async fn create_reward(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRewardRequest>,
) -> Result<Json<ApiResponse<tier_rewards_core::NetworkRewardRecord>>, ApiError> {
    let network = parse_network(&req.network)?;
    if !is_valid_level(req.level) {
        return Err(api_error(StatusCode::BAD_REQUEST, "level must be 1..=5"));
    }
    if req.reward_amount < Decimal::ZERO {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "reward_amount must be non-negative",
        ));
    }

    let record = state
        .rewards
        .insert(network, req.level, req.reward_amount)
        .await
        .map_err(|e| internal_error(&e))?;
    Ok(ApiResponse::ok(record))
}

/// Updates a network reward record's amount and active flag.
///
/// # Errors
/// 404 when the record does not exist, 500 on storage failure.
pub async fn update_reward(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateRewardRequest>,
) -> Result<Json<ApiResponse<tier_rewards_core::NetworkRewardRecord>>, ApiError> {
    if req.reward_amount < Decimal::ZERO {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "reward_amount must be non-negative",
        ));
    }

    let record = state
        .rewards
        .update(id, req.reward_amount, req.is_active)
        .await
        .map_err(|e| internal_error(&e))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "reward record not found"))?;
    Ok(ApiResponse::ok(record))
}

/// Deletes a network reward record.
///
/// # Errors
/// 404 when the record does not exist, 500 on storage failure.
pub async fn delete_reward(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let deleted = state
        .rewards
        .delete(id)
        .await
        .map_err(|e| internal_error(&e))?;
    if !deleted {
        return Err(api_error(StatusCode::NOT_FOUND, "reward record not found"));
    }
    Ok(ApiResponse::ok(()))
}

// ---- tier pricing ----

#[derive(Debug, Serialize)]
pub struct TierPriceResponse {
    pub tier: i16,
    pub price_usd: Decimal,
}

/// Computes the dynamic upgrade price for a tier from active rewards.
///
/// # Errors
/// 400 for out-of-range tiers, 500 on storage failure.
pub async fn tier_price(
    State(state): State<Arc<AppState>>,
    Path(tier_number): Path<i16>,
) -> Result<Json<ApiResponse<TierPriceResponse>>, ApiError> {
    if !is_valid_level(tier_number) {
        return Err(api_error(StatusCode::BAD_REQUEST, "tier must be 1..=5"));
    }

    let records = state
        .rewards
        .list_active()
        .await
        .map_err(|e| internal_error(&e))?;
    let rates = state.rates.get_rates().await;

    Ok(ApiResponse::ok(TierPriceResponse {
        tier: tier_number,
        price_usd: pricing::price_for_tier(tier_number, &records, &rates),
    }))
}

/// Returns the price a specific user pays for a tier (override-aware).
///
/// # Errors
/// 400 for out-of-range tiers, 404 for unknown users, 500 on storage
/// failure.
pub async fn user_tier_price(
    State(state): State<Arc<AppState>>,
    Path((user_id, tier_number)): Path<(Uuid, i16)>,
) -> Result<Json<ApiResponse<TierPriceResponse>>, ApiError> {
    if !is_valid_level(tier_number) {
        return Err(api_error(StatusCode::BAD_REQUEST, "tier must be 1..=5"));
    }

    let user = state
        .ledger
        .get_user(user_id)
        .await
        .map_err(|e| internal_error(&e))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "user not found"))?;

    Ok(ApiResponse::ok(TierPriceResponse {
        tier: tier_number,
        price_usd: pricing::effective_price(&user, tier_number),
    }))
}

/// Lists the static tier table.
pub async fn list_tiers() -> Json<ApiResponse<Vec<tier_rewards_core::TierDefinition>>> {
    ApiResponse::ok(tier::definitions().to_vec())
}

// ---- level graphs ----

/// Returns the level graph with the user's rewards distributed onto it.
///
/// # Errors
/// 400 for invalid levels, 404 for unknown users or missing templates,
/// 500 on storage failure or a malformed stored template.
pub async fn user_level_graph(
    State(state): State<Arc<AppState>>,
    Path((user_id, level)): Path<(Uuid, i16)>,
) -> Result<Json<ApiResponse<LevelGraph>>, ApiError> {
    if !is_valid_level(level) {
        return Err(api_error(StatusCode::BAD_REQUEST, "level must be 1..=5"));
    }

    if state
        .ledger
        .get_user(user_id)
        .await
        .map_err(|e| internal_error(&e))?
        .is_none()
    {
        return Err(api_error(StatusCode::NOT_FOUND, "user not found"));
    }

    let raw = state
        .graphs
        .level_graph(level)
        .await
        .map_err(|e| internal_error(&e))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "no graph template for level"))?;

    let template: LevelGraph = serde_json::from_value(raw).map_err(|e| {
        tracing::error!(level, "Stored level graph is malformed: {e}");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "malformed level graph")
    })?;

    let rewards = state
        .ledger
        .level_rewards(user_id, level)
        .await
        .map_err(|e| internal_error(&e))?;
    let rates = state.rates.get_rates().await;

    let graph = state.distributor.distribute(&template, &rewards, &rates);
    Ok(ApiResponse::ok(graph))
}

// ---- animation completion ----

#[derive(Debug, Serialize)]
pub struct WatchedResponse {
    /// False when the level was already watched (no balance change).
    pub credited: bool,
    pub amount_usd: Decimal,
    pub balance: Decimal,
}

/// Marks a level's animation watched and credits its reward exactly once.
///
/// # Errors
/// 400 for invalid levels, 403 when the user's tier does not unlock the
/// level, 404 for unknown users, 500 on storage failure.
pub async fn mark_animation_watched(
    State(state): State<Arc<AppState>>,
    Path((user_id, level)): Path<(Uuid, i16)>,
) -> Result<Json<ApiResponse<WatchedResponse>>, ApiError> {
    let outcome = state
        .animation_handler()
        .complete(user_id, level)
        .await
        .map_err(|e| match e {
            CompletionError::InvalidLevel(_) => {
                api_error(StatusCode::BAD_REQUEST, e.to_string())
            }
            CompletionError::UnknownUser => api_error(StatusCode::NOT_FOUND, e.to_string()),
            CompletionError::InsufficientTier { .. } => {
                api_error(StatusCode::FORBIDDEN, e.to_string())
            }
            CompletionError::Storage(inner) => internal_error(&inner),
        })?;

    Ok(ApiResponse::ok(WatchedResponse {
        credited: outcome.credited,
        amount_usd: outcome.amount_usd,
        balance: outcome.balance,
    }))
}
