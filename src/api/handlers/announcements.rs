use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
    Extension,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    api::{state::AppState, middleware::auth::{viewer_of, CurrentUser}},
    domain::{Announcement, CreateAnnouncementRequest, UpdateAnnouncementRequest},
    error::Result,
    service::{CreatedAnnouncement, Feed, FeedQuery, FeedSummary, ReviewRequest},
};

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
    user: Option<Extension<CurrentUser>>,
) -> Result<Json<Feed>> {
    let viewer = viewer_of(user.as_deref());
    let feed = state.service_context.announcement_service
        .feed(&viewer, &query, Utc::now())
        .await?;

    Ok(Json(feed))
}

pub async fn summary(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
) -> Result<Json<FeedSummary>> {
    let viewer = viewer_of(user.as_deref());
    let summary = state.service_context.announcement_service
        .summary(&viewer, Utc::now())
        .await?;

    Ok(Json(summary))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: Option<Extension<CurrentUser>>,
) -> Result<Json<Announcement>> {
    let viewer = viewer_of(user.as_deref());
    let announcement = state.service_context.announcement_service
        .get_visible(id, &viewer, Utc::now())
        .await?;

    Ok(Json(announcement))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(request): Json<CreateAnnouncementRequest>,
) -> Result<(StatusCode, Json<CreatedAnnouncement>)> {
    let created = state.service_context.announcement_service
        .create(&current_user.user, request, Utc::now())
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(current_user): Extension<CurrentUser>,
    Json(patch): Json<UpdateAnnouncementRequest>,
) -> Result<Json<Announcement>> {
    let updated = state.service_context.announcement_service
        .update(&current_user.user, id, patch)
        .await?;

    Ok(Json(updated))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<StatusCode> {
    state.service_context.announcement_service
        .delete(&current_user.user, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(current_user): Extension<CurrentUser>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<Announcement>> {
    let reviewed = state.service_context.announcement_service
        .review(&current_user.user, id, request.action)
        .await?;

    Ok(Json(reviewed))
}
