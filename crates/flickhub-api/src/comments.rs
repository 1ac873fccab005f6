use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;

use flickhub_db::StoreError;
use flickhub_types::api::{
    CommentListResponse, CommentPostedResponse, CommentsQuery, MessageResponse, PostCommentRequest,
};

use crate::error::{ApiError, ApiResult};
use crate::middleware::Claims;
use crate::{AppState, run_blocking};

/// The author is always the signed-in user. A body `id_users` naming anyone
/// else is refused.
pub async fn post_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): WithRejection<Json<PostCommentRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    if req.id_users.is_some_and(|id| id != claims.sub) {
        return Err(ApiError::Unauthorized);
    }
    let id_groups = req.id_groups.ok_or(StoreError::MissingGroupId)?;

    let comments = state.comments.clone();
    let text = req.user_comments;
    let comment =
        run_blocking(move || comments.create_comment(id_groups, claims.sub, &text)).await?;

    Ok(Json(CommentPostedResponse {
        message: "Comment posted".into(),
        post_comments: comment,
    }))
}

pub async fn get_comments(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    WithRejection(Query(query), _): WithRejection<Query<CommentsQuery>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let comments = state.comments.clone();
    let rows = run_blocking(move || comments.get_comments(query.id_groups)).await?;

    Ok(Json(CommentListResponse {
        message: "Success".into(),
        comments: rows,
    }))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id_comments), _): WithRejection<Path<i64>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let comments = state.comments.clone();
    run_blocking(move || comments.delete_comment(id_comments, claims.sub)).await?;
    Ok(Json(MessageResponse::new("Comment deleted successfully")))
}
