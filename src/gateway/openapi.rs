//! OpenAPI documentation
//!
//! Served as JSON at `/api-docs/openapi.json`.

use utoipa::OpenApi;

use crate::gateway::types::{CreateTransferBody, CreateTransferResponseData, HealthResponse};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Outbox Payment Service API",
        version = "1.0.0",
        description = "Creates transfers and notifies external parties through a transactional outbox."
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health_check,
        crate::gateway::handlers::create_transfer,
    ),
    components(schemas(CreateTransferBody, CreateTransferResponseData, HealthResponse)),
    tags(
        (name = "System", description = "Service status"),
        (name = "Transfer", description = "Transfer creation")
    )
)]
pub struct ApiDoc;
