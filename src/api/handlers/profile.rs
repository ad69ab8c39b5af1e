use axum::{Extension, Json};

use crate::{
    api::middleware::auth::CurrentUser,
    domain::UserProfile,
};

pub async fn get_profile(
    Extension(current_user): Extension<CurrentUser>,
) -> Json<UserProfile> {
    Json(UserProfile::from(&current_user.user))
}
