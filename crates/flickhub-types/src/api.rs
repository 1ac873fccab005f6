use serde::{Deserialize, Serialize};

use crate::ids::lenient_id;
use crate::models::{Comment, Favourite, UpdatedUser};

// -- Session --

/// JWT claims carried in the `uJwt` session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub uname: String,
    pub exp: usize,
}

// -- Users --

/// Sign-up payload. Missing fields deserialize as empty strings so the
/// handler can answer with a 400 instead of a body-parse rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub uname: String,
    #[serde(default)]
    pub pw: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignUpResponse {
    pub message: String,
    #[serde(rename = "userId")]
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    #[serde(default)]
    pub uname: String,
    #[serde(default)]
    pub pw: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignInResponse {
    pub message: String,
    #[serde(rename = "userId")]
    pub user_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub fname: Option<String>,
    pub lname: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserUpdatedResponse {
    pub message: String,
    pub user: UpdatedUser,
}

// -- Favourites --

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewFavourite {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id_users: Option<i64>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub id_groups: Option<i64>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub movie_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub series_id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FavouriteAddedResponse {
    pub message: String,
    pub favourite: Favourite,
}

// -- Comments --

#[derive(Debug, Deserialize)]
pub struct PostCommentRequest {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id_groups: Option<i64>,
    /// Optional; when present it must name the signed-in user.
    #[serde(default, deserialize_with = "lenient_id")]
    pub id_users: Option<i64>,
    #[serde(default)]
    pub user_comments: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentsQuery {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id_groups: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CommentPostedResponse {
    pub message: String,
    #[serde(rename = "postComments")]
    pub post_comments: Comment,
}

#[derive(Debug, Serialize)]
pub struct CommentListResponse {
    pub message: String,
    pub comments: Vec<Comment>,
}

// -- Generic --

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
