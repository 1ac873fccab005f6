use serde::{Deserialize, Serialize};

/// Public profile fields of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub lname: Option<String>,
    pub fname: Option<String>,
    pub uname: String,
    pub email: String,
}

/// Row returned after a profile update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatedUser {
    pub uname: String,
    pub fname: Option<String>,
    pub lname: Option<String>,
}

/// A user- or group-scoped bookmark of a movie or series.
///
/// Exactly one of `id_users`/`id_groups` and exactly one of
/// `movie_id`/`series_id` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favourite {
    pub id_favourites: i64,
    pub id_users: Option<i64>,
    pub id_groups: Option<i64>,
    pub movie_id: Option<i64>,
    pub series_id: Option<i64>,
    pub name: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id_comments: i64,
    pub id_groups: i64,
    pub id_users: i64,
    pub user_comments: String,
    pub created_at: String,
}
