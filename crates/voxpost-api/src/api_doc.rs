//! OpenAPI document, served at `/api-docs/openapi.json`.

use utoipa::OpenApi;

use crate::error::ErrorResponse;
use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "VoxPost API",
        description = "Voice recordings to platform-ready social content: upload, transcribe, export."
    ),
    paths(
        handlers::health::health,
        handlers::recordings::upload_recording,
        handlers::recordings::list_recordings,
        handlers::recordings::get_recording,
        handlers::recordings::get_recording_lifecycle,
        handlers::recordings::update_recording,
        handlers::recordings::delete_recording,
        handlers::recordings::delete_recording_file,
        handlers::transcriptions::start_transcription,
        handlers::transcriptions::list_transcriptions,
        handlers::transcriptions::get_transcription,
        handlers::transcriptions::get_transcription_lifecycle,
        handlers::transcriptions::retry_transcription,
        handlers::exports::create_export,
        handlers::exports::list_exports,
        handlers::exports::get_export,
        handlers::subscriptions::get_subscription,
        handlers::subscriptions::get_usage,
        handlers::webhooks::billing_webhook,
        handlers::admin::trigger_cleanup,
    ),
    components(schemas(
        ErrorResponse,
        voxpost_core::models::RecordingResponse,
        voxpost_core::models::RecordingStatus,
        voxpost_core::models::TranscriptionResponse,
        voxpost_core::models::TranscriptionStatus,
        voxpost_core::models::ExportResponse,
        voxpost_core::models::ExportFormat,
        voxpost_core::models::FileLifecycleInfo,
        voxpost_core::models::FileType,
        voxpost_core::lifecycle::DeletionCountdown,
        voxpost_core::models::UsageResponse,
        voxpost_core::models::SubscriptionTier,
        voxpost_core::models::SubscriptionStatus,
        voxpost_core::models::PaginationResponse,
        handlers::recordings::RecordingListResponse,
        handlers::recordings::UpdateRecordingRequest,
        handlers::transcriptions::TranscriptionListResponse,
        handlers::exports::CreateExportRequest,
        handlers::exports::ExportRequestOptions,
        handlers::exports::ExportListResponse,
        handlers::subscriptions::SubscriptionResponse,
        handlers::webhooks::BillingEvent,
        handlers::webhooks::BillingEventType,
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "recordings", description = "Recording upload and lifecycle"),
        (name = "transcriptions", description = "Transcription orchestration"),
        (name = "exports", description = "Platform content generation"),
        (name = "subscription", description = "Subscription tier and usage"),
        (name = "webhooks", description = "Billing provider callbacks"),
        (name = "admin", description = "Operator endpoints")
    )
)]
pub struct ApiDoc;
