//! Borrow transaction endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::borrow::{Borrow, BorrowWithDetails, CreateBorrow, UpdateBorrow},
};

use super::AuthenticatedUser;

/// Create borrow response
#[derive(Serialize, ToSchema)]
pub struct CreateBorrowResponse {
    pub id: i64,
}

/// List all borrows with their line items
#[utoipa::path(
    get,
    path = "/borrows",
    tag = "borrows",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "List of borrows", body = Vec<BorrowWithDetails>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_borrows(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BorrowWithDetails>>> {
    claims.require_staff()?;

    let borrows = state.services.borrows.list().await?;
    Ok(Json(borrows))
}

/// Get one borrow with its line items
#[utoipa::path(
    get,
    path = "/borrows/{id}",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Borrow ID")
    ),
    responses(
        (status = 200, description = "Borrow details", body = BorrowWithDetails),
        (status = 404, description = "Borrow not found")
    )
)]
pub async fn get_borrow(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<BorrowWithDetails>> {
    claims.require_staff()?;

    let borrow = state.services.borrows.get(id).await?;
    Ok(Json(borrow))
}

/// Create a new borrow transaction
#[utoipa::path(
    post,
    path = "/borrows",
    tag = "borrows",
    security(("bearer_auth" = [])),
    request_body = CreateBorrow,
    responses(
        (status = 201, description = "Borrow created", body = CreateBorrowResponse),
        (status = 400, description = "Invalid dates"),
        (status = 404, description = "User not found")
    )
)]
pub async fn create_borrow(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateBorrow>,
) -> AppResult<(StatusCode, Json<CreateBorrowResponse>)> {
    claims.require_staff()?;

    let id = state.services.borrows.create(request).await?;
    Ok((StatusCode::CREATED, Json(CreateBorrowResponse { id })))
}

/// Update a borrow header
#[utoipa::path(
    put,
    path = "/borrows/{id}",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Borrow ID")
    ),
    request_body = UpdateBorrow,
    responses(
        (status = 200, description = "Borrow updated", body = Borrow),
        (status = 400, description = "Invalid dates"),
        (status = 404, description = "Borrow not found")
    )
)]
pub async fn update_borrow(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateBorrow>,
) -> AppResult<Json<Borrow>> {
    claims.require_staff()?;

    let updated = state.services.borrows.update(id, request).await?;
    Ok(Json(updated))
}

/// Delete a borrow and all of its line items, restoring inventory
#[utoipa::path(
    delete,
    path = "/borrows/{id}",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Borrow ID")
    ),
    responses(
        (status = 204, description = "Borrow deleted"),
        (status = 404, description = "Borrow not found")
    )
)]
pub async fn delete_borrow(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    claims.require_staff()?;

    state.services.borrows.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
