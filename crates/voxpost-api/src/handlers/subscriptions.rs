//! Subscription and usage endpoints.

use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use voxpost_core::models::{SubscriptionStatus, SubscriptionTier, TierLimits, UsageResponse};

use crate::auth::AuthContext;
use crate::error::HttpAppError;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionResponse {
    pub tier: SubscriptionTier,
    pub status: SubscriptionStatus,
    pub recordings_per_day: i32,
    pub transcriptions_per_day: i32,
    pub exports_per_day: i32,
}

#[utoipa::path(
    get,
    path = "/api/subscriptions",
    tag = "subscription",
    responses(
        (status = 200, description = "Current subscription tier and limits", body = SubscriptionResponse)
    )
)]
pub async fn get_subscription(auth: AuthContext) -> Result<impl IntoResponse, HttpAppError> {
    let limits = TierLimits::for_tier(auth.user.subscription_tier);

    Ok(Json(SubscriptionResponse {
        tier: auth.user.subscription_tier,
        status: auth.user.subscription_status,
        recordings_per_day: limits.recordings_per_day,
        transcriptions_per_day: limits.transcriptions_per_day,
        exports_per_day: limits.exports_per_day,
    }))
}

#[utoipa::path(
    get,
    path = "/api/subscriptions/usage",
    tag = "subscription",
    responses(
        (status = 200, description = "Today's usage against tier limits", body = UsageResponse)
    )
)]
pub async fn get_usage(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
) -> Result<impl IntoResponse, HttpAppError> {
    let usage = state.services.quota.usage_for(&auth.user).await?;
    Ok(Json(usage))
}
