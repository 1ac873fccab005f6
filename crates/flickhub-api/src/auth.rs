use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::{WithRejection, cookie::CookieJar};
use tracing::info;

use flickhub_db::users::verify_password;
use flickhub_types::api::{MessageResponse, NewUser, SignInRequest, SignInResponse, SignUpResponse};

use crate::error::{ApiError, ApiResult};
use crate::middleware::removal_cookie;
use crate::{AppState, run_blocking};

pub async fn sign_up(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<NewUser>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    if req.uname.trim().is_empty() || req.pw.is_empty() || req.email.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Username, password and email are required".into(),
        ));
    }

    let users = state.users.clone();
    let email = req.email.clone();
    if run_blocking(move || users.is_email_in_use(&email)).await? {
        return Err(ApiError::Conflict("Email already in use".into()));
    }

    let users = state.users.clone();
    let uname = req.uname.clone();
    let user_id = run_blocking(move || users.create_user(&req)).await?;
    info!("Created user {} ({})", uname, user_id);

    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            message: "User created".into(),
            user_id,
        }),
    ))
}

/// Check the password and hand out the `uJwt` session cookie.
pub async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(req), _): WithRejection<Json<SignInRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let users = state.users.clone();
    let uname = req.uname.clone();
    let credentials = run_blocking(move || users.get_password_and_id(&uname))
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    let password = req.pw;
    let hash = credentials.pw;
    if !run_blocking(move || verify_password(&password, &hash)).await? {
        return Err(ApiError::InvalidCredentials);
    }

    let token = state.session.create_token(credentials.id_users, &req.uname)?;
    info!("User {} signed in", req.uname);

    Ok((
        jar.add(state.session.session_cookie(token)),
        Json(SignInResponse {
            message: "User signed in successfully".into(),
            user_id: credentials.id_users,
        }),
    ))
}

pub async fn sign_out(jar: CookieJar) -> impl IntoResponse {
    (
        jar.remove(removal_cookie()),
        Json(MessageResponse::new("User signed out")),
    )
}
