use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::state::AppState,
    domain::{AdminDashboard, UpdateAdminStatusRequest, UpdateRoleRequest, UserProfile},
    error::Result,
};

#[derive(Debug, Deserialize)]
pub struct UserSearchQuery {
    pub email: Option<String>,
}

pub async fn dashboard(State(state): State<AppState>) -> Result<Json<AdminDashboard>> {
    let dashboard = state.service_context.user_service.dashboard().await?;
    Ok(Json(dashboard))
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserSearchQuery>,
) -> Result<Json<Vec<UserProfile>>> {
    let users = state.service_context.user_service
        .list(query.email.as_deref())
        .await?;

    Ok(Json(users.iter().map(UserProfile::from).collect()))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserProfile>> {
    let user = state.service_context.user_service.get(id).await?;
    Ok(Json(UserProfile::from(&user)))
}

pub async fn update_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRoleRequest>,
) -> Result<Json<UserProfile>> {
    let user = state.service_context.user_service
        .set_role(id, &request.role)
        .await?;

    Ok(Json(UserProfile::from(&user)))
}

pub async fn update_admin_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAdminStatusRequest>,
) -> Result<Json<UserProfile>> {
    let user = state.service_context.user_service
        .set_admin_status(id, request.is_admin)
        .await?;

    Ok(Json(UserProfile::from(&user)))
}
