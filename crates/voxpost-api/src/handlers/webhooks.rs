//! Billing provider webhook.
//!
//! The payment provider is the source of truth for subscription state; this
//! endpoint applies its events to the local user row. It sits outside the JWT
//! middleware and authenticates with a shared secret instead.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use utoipa::ToSchema;
use validator::Validate;
use voxpost_core::models::{SubscriptionStatus, SubscriptionTier};
use voxpost_core::AppError;

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
pub enum BillingEventType {
    #[serde(rename = "checkout.session.completed")]
    CheckoutCompleted,
    #[serde(rename = "customer.subscription.deleted")]
    SubscriptionDeleted,
    #[serde(rename = "invoice.payment_failed")]
    PaymentFailed,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BillingEvent {
    #[serde(rename = "type")]
    pub event_type: BillingEventType,
    /// Identity-provider user id, matching the JWT `sub` claim.
    #[validate(length(min = 1, message = "external_user_id must not be empty"))]
    pub external_user_id: String,
    /// Tier purchased; only meaningful for checkout events.
    pub tier: Option<SubscriptionTier>,
}

/// What the event does to the subscription row, given the user's current tier.
fn apply_event(
    event: &BillingEvent,
    current_tier: SubscriptionTier,
) -> Result<(SubscriptionTier, SubscriptionStatus), AppError> {
    match event.event_type {
        BillingEventType::CheckoutCompleted => {
            let tier = event.tier.ok_or_else(|| {
                AppError::InvalidInput("Checkout event is missing the tier".to_string())
            })?;
            Ok((tier, SubscriptionStatus::Active))
        }
        BillingEventType::SubscriptionDeleted => {
            Ok((SubscriptionTier::Free, SubscriptionStatus::Canceled))
        }
        // Tier stays until the provider cancels; only the status degrades.
        BillingEventType::PaymentFailed => Ok((current_tier, SubscriptionStatus::PastDue)),
    }
}

fn verify_secret(headers: &HeaderMap, expected: Option<&str>) -> Result<(), AppError> {
    let expected = expected.ok_or_else(|| {
        AppError::Internal("Billing webhook secret is not configured".to_string())
    })?;

    let provided = headers
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing webhook secret".to_string()))?;

    // Constant-time comparison; a timing oracle here would leak the secret.
    if provided.as_bytes().ct_eq(expected.as_bytes()).into() {
        Ok(())
    } else {
        Err(AppError::Unauthorized("Invalid webhook secret".to_string()))
    }
}

#[utoipa::path(
    post,
    path = "/api/webhooks/billing",
    tag = "webhooks",
    request_body = BillingEvent,
    responses(
        (status = 200, description = "Subscription updated"),
        (status = 401, description = "Missing or invalid webhook secret", body = ErrorResponse),
        (status = 404, description = "Unknown user", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, headers, event))]
pub async fn billing_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ValidatedJson(event): ValidatedJson<BillingEvent>,
) -> Result<impl IntoResponse, HttpAppError> {
    verify_secret(&headers, state.config.billing_webhook_secret.as_deref())?;

    let existing = state
        .db
        .users
        .get_by_external_id(&event.external_user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Unknown user".to_string()))?;

    let (tier, status) = apply_event(&event, existing.subscription_tier)?;

    let user = state
        .db
        .users
        .update_subscription(&event.external_user_id, tier, status)
        .await?
        .ok_or_else(|| AppError::NotFound("Unknown user".to_string()))?;

    tracing::info!(
        user_id = %user.id,
        event = ?event.event_type,
        tier = ?tier,
        status = ?status,
        "Subscription updated from billing event"
    );

    Ok((StatusCode::OK, Json(json!({ "updated": true }))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(secret: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            WEBHOOK_SECRET_HEADER,
            HeaderValue::from_str(secret).unwrap(),
        );
        headers
    }

    #[test]
    fn test_verify_secret_accepts_match() {
        let headers = headers_with("s3cret");
        assert!(verify_secret(&headers, Some("s3cret")).is_ok());
    }

    #[test]
    fn test_verify_secret_rejects_mismatch() {
        let headers = headers_with("wrong");
        assert!(matches!(
            verify_secret(&headers, Some("s3cret")),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_verify_secret_rejects_missing_header() {
        let headers = HeaderMap::new();
        assert!(matches!(
            verify_secret(&headers, Some("s3cret")),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_verify_secret_errors_when_unconfigured() {
        let headers = headers_with("anything");
        assert!(matches!(
            verify_secret(&headers, None),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn test_checkout_event_activates_purchased_tier() {
        let event = BillingEvent {
            event_type: BillingEventType::CheckoutCompleted,
            external_user_id: "user_1".to_string(),
            tier: Some(SubscriptionTier::Pro),
        };
        let (tier, status) = apply_event(&event, SubscriptionTier::Free).unwrap();
        assert_eq!(tier, SubscriptionTier::Pro);
        assert_eq!(status, SubscriptionStatus::Active);
    }

    #[test]
    fn test_checkout_event_without_tier_is_invalid() {
        let event = BillingEvent {
            event_type: BillingEventType::CheckoutCompleted,
            external_user_id: "user_1".to_string(),
            tier: None,
        };
        assert!(matches!(
            apply_event(&event, SubscriptionTier::Free),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_subscription_deleted_downgrades_to_free() {
        let event = BillingEvent {
            event_type: BillingEventType::SubscriptionDeleted,
            external_user_id: "user_1".to_string(),
            tier: None,
        };
        let (tier, status) = apply_event(&event, SubscriptionTier::Middle).unwrap();
        assert_eq!(tier, SubscriptionTier::Free);
        assert_eq!(status, SubscriptionStatus::Canceled);
    }

    #[test]
    fn test_payment_failed_keeps_tier() {
        let event = BillingEvent {
            event_type: BillingEventType::PaymentFailed,
            external_user_id: "user_1".to_string(),
            tier: None,
        };
        let (tier, status) = apply_event(&event, SubscriptionTier::Pro).unwrap();
        assert_eq!(tier, SubscriptionTier::Pro);
        assert_eq!(status, SubscriptionStatus::PastDue);
    }

    #[test]
    fn test_event_type_deserializes_provider_names() {
        let event: BillingEvent = serde_json::from_str(
            r#"{"type": "customer.subscription.deleted", "external_user_id": "user_1"}"#,
        )
        .unwrap();
        assert_eq!(event.event_type, BillingEventType::SubscriptionDeleted);
    }
}
