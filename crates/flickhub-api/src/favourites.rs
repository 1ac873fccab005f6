use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;

use flickhub_db::Scope;
use flickhub_types::api::{FavouriteAddedResponse, MessageResponse, NewFavourite};

use crate::error::{ApiError, ApiResult};
use crate::middleware::Claims;
use crate::{AppState, run_blocking};

/// Group favourites are open to any member; user favourites only to their owner.
fn check_owner(scope: Scope, owner: i64, claims: &Claims) -> ApiResult<()> {
    if scope == Scope::User && owner != claims.sub {
        return Err(ApiError::Unauthorized);
    }
    Ok(())
}

pub async fn add_favourite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(fav), _): WithRejection<Json<NewFavourite>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    if let Some(owner) = fav.id_users {
        check_owner(Scope::User, owner, &claims)?;
    }

    let favourites = state.favourites.clone();
    let favourite = run_blocking(move || favourites.add_to_favourites(&fav)).await?;

    Ok((
        StatusCode::CREATED,
        Json(FavouriteAddedResponse {
            message: "Added to favourites".into(),
            favourite,
        }),
    ))
}

pub async fn list_all_favourites(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let favourites = state.favourites.clone();
    let rows = run_blocking(move || favourites.get_all_favourites()).await?;
    Ok(Json(rows))
}

pub async fn list_favourites(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    WithRejection(Path((scope, owner)), _): WithRejection<Path<(String, i64)>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let scope: Scope = scope.parse()?;

    let favourites = state.favourites.clone();
    let rows = run_blocking(move || favourites.get_favourites(scope, owner)).await?;
    Ok(Json(rows))
}

pub async fn delete_favourite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path((scope, owner, name)), _): WithRejection<
        Path<(String, i64, String)>,
        ApiError,
    >,
) -> ApiResult<impl IntoResponse> {
    let scope: Scope = scope.parse()?;
    check_owner(scope, owner, &claims)?;

    let favourites = state.favourites.clone();
    let deleted = run_blocking(move || favourites.delete_favourite(scope, owner, &name)).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound("Favourite not found".into()));
    }
    Ok(Json(MessageResponse::new("Favourite deleted")))
}
