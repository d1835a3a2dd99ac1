//! Borrow detail (line item) endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::borrow::{
        BorrowDetail, BorrowDetailQuery, BorrowDetailUpdateQuery, BorrowStatus,
        CreateBorrowDetail, DeleteBorrowDetails, UpdateBorrowDetail,
    },
};

use super::AuthenticatedUser;

/// Create borrow detail response
#[derive(Serialize, ToSchema)]
pub struct CreateBorrowDetailResponse {
    pub id: i64,
}

/// Batch create response with ids in input order
#[derive(Serialize, ToSchema)]
pub struct CreateBorrowDetailsResponse {
    pub ids: Vec<i64>,
}

fn parse_status(raw: &str) -> AppResult<BorrowStatus> {
    raw.parse()
        .map_err(|e: String| AppError::Validation(e))
}

/// List line items for a borrow transaction
#[utoipa::path(
    get,
    path = "/borrow-details",
    tag = "borrow-details",
    security(("bearer_auth" = [])),
    params(
        ("borrow_id" = i64, Query, description = "Borrow transaction ID")
    ),
    responses(
        (status = 200, description = "Line items for the borrow", body = Vec<BorrowDetail>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_borrow_details(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<BorrowDetailQuery>,
) -> AppResult<Json<Vec<BorrowDetail>>> {
    claims.require_staff()?;

    let details = state.services.borrow_details.list(query.borrow_id).await?;
    Ok(Json(details))
}

/// Create a line item, borrowing copies of a book
#[utoipa::path(
    post,
    path = "/borrow-details",
    tag = "borrow-details",
    security(("bearer_auth" = [])),
    request_body = CreateBorrowDetail,
    responses(
        (status = 201, description = "Line item created", body = CreateBorrowDetailResponse),
        (status = 400, description = "Invalid quantity"),
        (status = 404, description = "Borrow or book not found"),
        (status = 422, description = "Not enough copies available")
    )
)]
pub async fn create_borrow_detail(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateBorrowDetail>,
) -> AppResult<(StatusCode, Json<CreateBorrowDetailResponse>)> {
    claims.require_staff()?;
    request
        .validate()
        .map_err(|e| AppError::InvalidQuantity(e.to_string()))?;

    let id = state.services.borrow_details.create(request).await?;
    Ok((StatusCode::CREATED, Json(CreateBorrowDetailResponse { id })))
}

/// Create several line items as one atomic batch
#[utoipa::path(
    post,
    path = "/borrow-details/batch",
    tag = "borrow-details",
    security(("bearer_auth" = [])),
    request_body = Vec<CreateBorrowDetail>,
    responses(
        (status = 201, description = "All line items created", body = CreateBorrowDetailsResponse),
        (status = 400, description = "Invalid quantity in the batch"),
        (status = 404, description = "A referenced borrow or book was not found"),
        (status = 422, description = "Not enough copies available; nothing created")
    )
)]
pub async fn create_borrow_details_batch(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(requests): Json<Vec<CreateBorrowDetail>>,
) -> AppResult<(StatusCode, Json<CreateBorrowDetailsResponse>)> {
    claims.require_staff()?;

    let ids = state.services.borrow_details.create_batch(requests).await?;
    Ok((StatusCode::CREATED, Json(CreateBorrowDetailsResponse { ids })))
}

/// Update a line item under a status argument
#[utoipa::path(
    put,
    path = "/borrow-details/{id}",
    tag = "borrow-details",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Line item ID"),
        ("status" = String, Query, description = "\"MUON\" to keep borrowing, \"DA TRA\" to return")
    ),
    request_body = UpdateBorrowDetail,
    responses(
        (status = 204, description = "Line item updated"),
        (status = 400, description = "Invalid quantity or status"),
        (status = 404, description = "Line item or replacement book not found"),
        (status = 422, description = "Not enough copies available; nothing changed")
    )
)]
pub async fn update_borrow_detail(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
    Query(query): Query<BorrowDetailUpdateQuery>,
    Json(request): Json<UpdateBorrowDetail>,
) -> AppResult<StatusCode> {
    claims.require_staff()?;

    let status = parse_status(&query.status)?;
    state.services.borrow_details.update(id, request, status).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a line item, returning its copies to the shelf
#[utoipa::path(
    delete,
    path = "/borrow-details/{id}",
    tag = "borrow-details",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Line item ID")
    ),
    responses(
        (status = 204, description = "Line item deleted"),
        (status = 404, description = "Line item not found")
    )
)]
pub async fn delete_borrow_detail(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    claims.require_staff()?;

    state.services.borrow_details.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete several line items as one atomic batch
#[utoipa::path(
    delete,
    path = "/borrow-details/batch/delete",
    tag = "borrow-details",
    security(("bearer_auth" = [])),
    request_body = DeleteBorrowDetails,
    responses(
        (status = 204, description = "All line items deleted"),
        (status = 404, description = "Some ids were not found; nothing deleted")
    )
)]
pub async fn delete_borrow_details_batch(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<DeleteBorrowDetails>,
) -> AppResult<StatusCode> {
    claims.require_staff()?;

    state.services.borrow_details.delete_batch(request.ids).await?;
    Ok(StatusCode::NO_CONTENT)
}
