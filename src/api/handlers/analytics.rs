use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Redirect,
    Json,
    Extension,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::{state::AppState, middleware::auth::{viewer_of, CurrentUser}},
    domain::{AnalyticsStats, Engagement, TrackEngagementRequest},
    error::Result,
    service::LinkStats,
};

#[derive(Debug, Deserialize)]
pub struct RedirectQuery {
    #[serde(rename = "announcementId")]
    pub announcement_id: Uuid,
}

pub async fn track(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Json(request): Json<TrackEngagementRequest>,
) -> Result<(StatusCode, Json<Engagement>)> {
    let viewer = viewer_of(user.as_deref());
    let engagement = state.service_context.analytics_service
        .track(&viewer, request, Utc::now())
        .await?;

    Ok((StatusCode::CREATED, Json(engagement)))
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<AnalyticsStats>> {
    let stats = state.service_context.analytics_service
        .stats(Utc::now())
        .await?;

    Ok(Json(stats))
}

pub async fn link_stats(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LinkStats>> {
    let stats = state.service_context.analytics_service
        .link_stats(id)
        .await?;

    Ok(Json(stats))
}

pub async fn redirect(
    State(state): State<AppState>,
    Query(query): Query<RedirectQuery>,
    user: Option<Extension<CurrentUser>>,
) -> Result<Redirect> {
    let viewer = viewer_of(user.as_deref());
    let target = state.service_context.analytics_service
        .redirect_target(&viewer, query.announcement_id, Utc::now())
        .await?;

    Ok(Redirect::temporary(&target))
}
