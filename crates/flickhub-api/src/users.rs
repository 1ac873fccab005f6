use axum::{Extension, Json, extract::State, response::IntoResponse};
use axum_extra::extract::{WithRejection, cookie::CookieJar};
use tracing::info;

use flickhub_types::api::{MessageResponse, ProfileUpdate, UserUpdatedResponse};

use crate::error::{ApiError, ApiResult};
use crate::middleware::{Claims, removal_cookie};
use crate::{AppState, run_blocking};

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let users = state.users.clone();
    let info = run_blocking(move || users.get_user_info(claims.sub)).await?;
    Ok(Json(info))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(update), _): WithRejection<Json<ProfileUpdate>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let users = state.users.clone();
    let user = run_blocking(move || users.update_user(&update, claims.sub)).await?;
    Ok(Json(UserUpdatedResponse {
        message: "User updated".into(),
        user,
    }))
}

/// Delete the signed-in account and end the session.
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    jar: CookieJar,
) -> ApiResult<impl IntoResponse> {
    let users = state.users.clone();
    let uname = run_blocking(move || users.delete_user(claims.sub)).await?;
    info!("Deleted user {} ({})", uname, claims.sub);

    Ok((
        jar.remove(removal_cookie()),
        Json(MessageResponse::new(format!("User {} deleted", uname))),
    ))
}
