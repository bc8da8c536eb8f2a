//! Transfer handlers

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use super::super::state::AppState;
use super::super::types::{
    ApiError, ApiResponse, ApiResult, CreateTransferBody, CreateTransferResponseData,
};

/// Create transfer endpoint
///
/// POST /api/v1/transfers
///
/// Stores the transfer and its pending notification in one transaction.
/// The notification is delivered later by the dispatcher.
#[utoipa::path(
    post,
    path = "/api/v1/transfers",
    request_body = CreateTransferBody,
    responses(
        (status = 201, description = "Transfer created", body = CreateTransferResponseData, content_type = "application/json"),
        (status = 400, description = "Malformed request body"),
        (status = 500, description = "Transfer could not be stored")
    ),
    tag = "Transfer"
)]
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateTransferBody>, JsonRejection>,
) -> ApiResult<CreateTransferResponseData> {
    let Json(body) = payload.map_err(|rejection| {
        tracing::warn!("Rejected transfer request: {}", rejection.body_text());
        ApiError::bad_request(rejection.body_text())
    })?;

    match state.transfers.create_transfer(body.into()).await {
        Ok(transfer_id) => Ok((
            StatusCode::CREATED,
            Json(ApiResponse::success(CreateTransferResponseData { transfer_id })),
        )),
        Err(e) => {
            tracing::error!(code = e.code(), "Transfer creation failed: {}", e);
            Err(ApiError::internal(e.to_string()))
        }
    }
}
