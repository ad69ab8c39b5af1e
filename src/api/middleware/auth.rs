use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use chrono::Utc;

use crate::{
    api::state::AppState,
    auth::extract_token,
    domain::{Role, User, Viewer},
    error::{AppError, Result},
};

#[derive(Clone)]
pub struct CurrentUser {
    pub user: User,
}

impl CurrentUser {
    pub fn role(&self) -> Role {
        self.user.role()
    }

    pub fn viewer(&self) -> Viewer {
        Viewer::from_user(&self.user)
    }
}

/// Why a presented token did not yield a user. Left in the request
/// extensions so guarded routes can answer 401 or 403 accordingly.
#[derive(Clone, Debug)]
pub struct AuthRejection {
    pub forbidden: bool,
    pub message: String,
}

impl AuthRejection {
    fn into_error(self) -> AppError {
        if self.forbidden {
            AppError::Forbidden(self.message)
        } else {
            AppError::Unauthorized(self.message)
        }
    }
}

pub fn viewer_of(user: Option<&CurrentUser>) -> Viewer {
    user.map(CurrentUser::viewer).unwrap_or_else(Viewer::anonymous)
}

async fn authenticate(state: &AppState, headers: &HeaderMap, jar: &CookieJar) -> Result<Option<CurrentUser>> {
    let Some(token) = extract_token(headers, jar) else {
        return Ok(None);
    };

    let verifier = state
        .service_context
        .token_verifier
        .as_ref()
        .ok_or_else(|| AppError::Unauthorized("Token verification is not configured".to_string()))?;

    let profile = verifier.verify(&token)?.into_profile()?;
    let user = state
        .service_context
        .user_service
        .sync_identity(profile, Utc::now())
        .await?;

    if !state.settings.is_allowed_domain(user.email_domain().as_deref()) {
        tracing::info!(user_id = %user.id, "Sign-in from a domain outside the allow list");
        return Err(AppError::Forbidden("Your email domain is not allowed".to_string()));
    }

    Ok(Some(CurrentUser { user }))
}

/// Resolves the viewer for every API request. Never rejects: failures leave
/// the request anonymous with an [`AuthRejection`] attached.
pub async fn optional_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&state, request.headers(), &jar).await {
        Ok(Some(user)) => {
            request.extensions_mut().insert(user);
        }
        Ok(None) => {}
        Err(e) => {
            tracing::debug!("Treating request as anonymous: {}", e);
            let rejection = match e {
                AppError::Forbidden(message) => AuthRejection { forbidden: true, message },
                AppError::Unauthorized(message) => AuthRejection { forbidden: false, message },
                other => AuthRejection {
                    forbidden: false,
                    message: format!("Authentication failed: {}", other),
                },
            };
            request.extensions_mut().insert(rejection);
        }
    }

    next.run(request).await
}

fn current_user(request: &Request) -> Result<CurrentUser> {
    if let Some(user) = request.extensions().get::<CurrentUser>() {
        return Ok(user.clone());
    }
    match request.extensions().get::<AuthRejection>() {
        Some(rejection) => Err(rejection.clone().into_error()),
        None => Err(AppError::Unauthorized("Authentication required".to_string())),
    }
}

pub async fn require_auth(request: Request, next: Next) -> Result<Response> {
    current_user(&request)?;
    Ok(next.run(request).await)
}

pub async fn require_admin(request: Request, next: Next) -> Result<Response> {
    let user = current_user(&request)?;
    if !user.role().meets(Role::StudentAdmin) {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }
    Ok(next.run(request).await)
}

pub async fn require_super_admin(request: Request, next: Next) -> Result<Response> {
    let user = current_user(&request)?;
    if !user.role().meets(Role::SuperAdmin) {
        return Err(AppError::Forbidden("Super admin access required".to_string()));
    }
    Ok(next.run(request).await)
}
