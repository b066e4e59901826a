//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{equipment, health, persons, tracking, transactions};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Labtrack API",
        version = "1.0.0",
        description = "Laboratory equipment lifecycle and transaction tracking REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Equipment
        equipment::list_equipment,
        equipment::get_equipment,
        equipment::create_equipment,
        equipment::last_transaction,
        equipment::equipment_history,
        // Transactions
        transactions::record_transaction,
        transactions::resolve_person,
        // Tracking
        tracking::get_timeline,
        // Persons
        persons::get_client,
        persons::get_technician,
    ),
    components(
        schemas(
            // Equipment
            crate::models::equipment::Equipment,
            crate::models::equipment::EquipmentDetails,
            crate::models::equipment::CreateEquipment,
            crate::models::enums::AvailabilityStatus,
            crate::models::enums::OperationalStatus,
            // Transactions
            crate::models::enums::TransactionType,
            crate::models::transaction::Transaction,
            crate::models::transaction::RecordTransactionRequest,
            crate::models::transaction::TrackingTimeline,
            crate::lifecycle::timeline::Cycle,
            crate::lifecycle::timeline::CycleSummary,
            // Persons
            crate::models::enums::ClientType,
            crate::models::enums::PersonKind,
            crate::models::person::Client,
            crate::models::person::ClientInput,
            crate::models::person::Technician,
            crate::models::person::TechnicianInput,
            // Person matches
            crate::lifecycle::matcher::MatchField,
            crate::models::pending::PersonMatchPending,
            crate::models::pending::SuggestedPerson,
            crate::models::pending::Decision,
            crate::models::pending::ResolvePersonRequest,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "equipment", description = "Equipment registry and per-unit history"),
        (name = "transactions", description = "Scanned action recording"),
        (name = "tracking", description = "Tracking code timelines"),
        (name = "persons", description = "Clients and technicians")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
