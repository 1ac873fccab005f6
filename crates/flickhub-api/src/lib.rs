pub mod auth;
pub mod comments;
pub mod error;
pub mod favourites;
pub mod middleware;
pub mod users;

use std::sync::Arc;

use axum::{
    Json, Router,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde_json::json;
use tracing::error;

use flickhub_db::{CommentStore, FavouriteStore, Pool, UserStore};

use crate::error::{ApiError, ApiResult};
use crate::middleware::{SessionConfig, require_auth};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub users: UserStore,
    pub favourites: FavouriteStore,
    pub comments: CommentStore,
    pub session: SessionConfig,
}

impl AppStateInner {
    /// Build every store on top of the same pool.
    pub fn new(pool: Pool, session: SessionConfig) -> AppState {
        Arc::new(Self {
            users: UserStore::new(pool.clone()),
            favourites: FavouriteStore::new(pool.clone()),
            comments: CommentStore::new(pool),
            session,
        })
    }
}

/// Run a blocking store call off the async runtime.
pub(crate) async fn run_blocking<F, T>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> flickhub_db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal("store task failed".into())
        })?
        .map_err(ApiError::from)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// All routes. Everything except health, sign-up and sign-in requires the
/// `uJwt` session cookie.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/users/signup", post(auth::sign_up))
        .route("/users/signin", post(auth::sign_in))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/users/signout", post(auth::sign_out))
        .route("/users/profile", get(users::get_profile).put(users::update_profile))
        .route("/users/delete", delete(users::delete_account))
        .route("/comments", get(comments::get_comments))
        .route("/comments/comment", post(comments::post_comment))
        .route("/comments/delete/{id}", delete(comments::delete_comment))
        .route(
            "/favourites",
            get(favourites::list_all_favourites).post(favourites::add_favourite),
        )
        .route("/favourites/{scope}/{id}", get(favourites::list_favourites))
        .route(
            "/favourites/{scope}/{id}/{name}",
            delete(favourites::delete_favourite),
        )
        .layer(axum::middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        let pool = Pool::open_in_memory().unwrap();
        let session = SessionConfig {
            jwt_secret: "test-secret".into(),
            ttl: chrono::Duration::hours(1),
            secure_cookie: false,
        };
        router(AppStateInner::new(pool, session))
    }

    struct Reply {
        status: StatusCode,
        content_type: Option<String>,
        set_cookie: Option<String>,
        body: Value,
    }

    async fn send(app: &Router, req: Request<Body>) -> Reply {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        Reply {
            status,
            content_type,
            set_cookie,
            body,
        }
    }

    fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn empty_request(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn sign_up(app: &Router, uname: &str) -> i64 {
        let reply = send(
            app,
            json_request(
                "POST",
                "/users/signup",
                None,
                json!({ "uname": uname, "pw": uname, "email": format!("{}@test.com", uname) }),
            ),
        )
        .await;
        assert_eq!(reply.status, StatusCode::CREATED);
        reply.body["userId"].as_i64().unwrap()
    }

    /// Returns the `uJwt=<token>` pair to send back as a Cookie header.
    async fn sign_in(app: &Router, uname: &str) -> String {
        let reply = send(
            app,
            json_request(
                "POST",
                "/users/signin",
                None,
                json!({ "uname": uname, "pw": uname }),
            ),
        )
        .await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["message"], "User signed in successfully");
        let set_cookie = reply.set_cookie.unwrap();
        assert!(set_cookie.contains("HttpOnly"));
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn post_comment(app: &Router, cookie: &str, group: Value, text: &str) -> Reply {
        send(
            app,
            json_request(
                "POST",
                "/comments/comment",
                Some(cookie),
                json!({ "id_groups": group, "user_comments": text }),
            ),
        )
        .await
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = app();
        let reply = send(&app, empty_request("GET", "/health", None)).await;
        assert_eq!(reply.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_routes_need_a_valid_cookie() {
        let app = app();

        let reply = post_comment(&app, "other=1", json!("1"), "hello").await;
        assert_eq!(reply.status, StatusCode::FORBIDDEN);
        assert_eq!(reply.body["error"], "Unauthorized");

        let reply = send(
            &app,
            empty_request("GET", "/comments?id_groups=1", Some("uJwt=invalidToken")),
        )
        .await;
        assert_eq!(reply.status, StatusCode::FORBIDDEN);
        assert_eq!(reply.body["error"], "Unauthorized");

        let reply = send(
            &app,
            empty_request("DELETE", "/comments/delete/1", Some("uJwt=invalidToken")),
        )
        .await;
        assert_eq!(reply.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn sign_up_rejects_reused_email_and_bad_input() {
        let app = app();
        sign_up(&app, "test").await;

        let reply = send(
            &app,
            json_request(
                "POST",
                "/users/signup",
                None,
                json!({ "uname": "other", "pw": "pw", "email": "test@test.com" }),
            ),
        )
        .await;
        assert_eq!(reply.status, StatusCode::CONFLICT);
        assert_eq!(reply.body["error"], "Email already in use");

        let reply = send(
            &app,
            json_request("POST", "/users/signup", None, json!({ "uname": "x" })),
        )
        .await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn sign_in_with_wrong_password_fails() {
        let app = app();
        sign_up(&app, "test").await;

        let reply = send(
            &app,
            json_request(
                "POST",
                "/users/signin",
                None,
                json!({ "uname": "test", "pw": "nope" }),
            ),
        )
        .await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert!(reply.set_cookie.is_none());
    }

    #[tokio::test]
    async fn comment_lifecycle_between_two_users() {
        let app = app();
        sign_up(&app, "alice").await;
        sign_up(&app, "bob").await;
        let alice = sign_in(&app, "alice").await;
        let bob = sign_in(&app, "bob").await;

        let reply = post_comment(&app, &alice, json!("1"), "This is a test comment").await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["message"], "Comment posted");
        assert!(reply.body["postComments"].is_object());
        let comment_id = reply.body["postComments"]["id_comments"].as_i64().unwrap();

        let reply = send(&app, empty_request("GET", "/comments?id_groups=1", Some(&bob))).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["message"], "Success");
        assert_eq!(reply.body["comments"].as_array().unwrap().len(), 1);

        let uri = format!("/comments/delete/{}", comment_id);
        let reply = send(&app, empty_request("DELETE", &uri, Some(&bob))).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
        assert_eq!(
            reply.body["error"],
            "Comment not found or you do not have permission to delete it"
        );

        let reply = send(&app, empty_request("DELETE", &uri, Some(&alice))).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["message"], "Comment deleted successfully");
    }

    #[tokio::test]
    async fn listing_comments_validates_group() {
        let app = app();
        sign_up(&app, "test").await;
        let cookie = sign_in(&app, "test").await;

        let reply = send(&app, empty_request("GET", "/comments?id_groups=", Some(&cookie))).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(reply.body["error"], "Missing groupId");

        let reply = send(&app, empty_request("GET", "/comments?id_groups=2", Some(&cookie))).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
        assert_eq!(reply.body["error"], "No comments found for your group");
    }

    #[tokio::test]
    async fn cannot_post_as_someone_else() {
        let app = app();
        sign_up(&app, "alice").await;
        let bob_id = sign_up(&app, "bob").await;
        let alice = sign_in(&app, "alice").await;

        let reply = send(
            &app,
            json_request(
                "POST",
                "/comments/comment",
                Some(&alice),
                json!({ "id_groups": 1, "id_users": bob_id, "user_comments": "spoof" }),
            ),
        )
        .await;
        assert_eq!(reply.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn favourites_flow() {
        let app = app();
        let id = sign_up(&app, "fan").await;
        let cookie = sign_in(&app, "fan").await;

        let fav = json!({
            "id_users": id.to_string(),
            "id_groups": "",
            "movie_id": "603",
            "series_id": "",
            "name": "The Matrix",
            "avatar": ""
        });
        let reply = send(&app, json_request("POST", "/favourites", Some(&cookie), fav.clone())).await;
        assert_eq!(reply.status, StatusCode::CREATED);
        assert_eq!(reply.body["favourite"]["movie_id"], 603);
        assert!(reply.body["favourite"]["avatar"].is_null());

        let reply = send(&app, json_request("POST", "/favourites", Some(&cookie), fav)).await;
        assert_eq!(reply.status, StatusCode::CONFLICT);
        assert_eq!(reply.body["error"], "Already in favourites");

        let both = json!({ "id_users": id, "movie_id": 1, "series_id": 2 });
        let reply = send(&app, json_request("POST", "/favourites", Some(&cookie), both)).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);

        let uri = format!("/favourites/user/{}", id);
        let reply = send(&app, empty_request("GET", &uri, Some(&cookie))).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body.as_array().unwrap().len(), 1);

        let reply = send(&app, empty_request("GET", "/favourites/planet/1", Some(&cookie))).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);

        let uri = format!("/favourites/user/{}/The%20Matrix", id);
        let reply = send(&app, empty_request("DELETE", &uri, Some(&cookie))).await;
        assert_eq!(reply.status, StatusCode::OK);

        let reply = send(&app, empty_request("DELETE", &uri, Some(&cookie))).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn user_favourites_are_owner_only() {
        let app = app();
        let alice_id = sign_up(&app, "alice").await;
        sign_up(&app, "bob").await;
        let bob = sign_in(&app, "bob").await;

        let fav = json!({ "id_users": alice_id, "movie_id": 1, "name": "x" });
        let reply = send(&app, json_request("POST", "/favourites", Some(&bob), fav)).await;
        assert_eq!(reply.status, StatusCode::FORBIDDEN);

        let group_fav = json!({ "id_groups": 1, "movie_id": 1, "name": "x" });
        let reply = send(&app, json_request("POST", "/favourites", Some(&bob), group_fav)).await;
        assert_eq!(reply.status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn profile_update_and_account_deletion() {
        let app = app();
        let id = sign_up(&app, "dana").await;
        let cookie = sign_in(&app, "dana").await;

        let reply = send(
            &app,
            json_request(
                "PUT",
                "/users/profile",
                Some(&cookie),
                json!({ "fname": "Dana", "lname": "Scully" }),
            ),
        )
        .await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["user"]["lname"], "Scully");

        let reply = send(&app, empty_request("GET", "/users/profile", Some(&cookie))).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["email"], "dana@test.com");
        assert_eq!(reply.body["fname"], "Dana");

        let reply = send(&app, empty_request("DELETE", "/users/delete", Some(&cookie))).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["message"], "User dana deleted");

        // The token is still valid but the user is gone.
        let reply = send(&app, empty_request("GET", "/users/profile", Some(&cookie))).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);

        let reply = post_comment(&app, &cookie, json!(1), "still here?").await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
        assert_eq!(reply.body["error"], "User not found");

        let fav = json!({ "id_users": id, "movie_id": 5, "name": "x" });
        let reply = send(&app, json_request("POST", "/favourites", Some(&cookie), fav)).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
        assert_eq!(reply.body["error"], "User not found");
    }

    fn assert_json_bad_request(reply: &Reply) {
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(reply.content_type.as_deref(), Some("application/json"));
        assert!(reply.body["error"].is_string());
    }

    #[tokio::test]
    async fn malformed_input_gets_json_bad_request() {
        let app = app();
        sign_up(&app, "test").await;
        let cookie = sign_in(&app, "test").await;

        let reply = send(&app, empty_request("GET", "/comments?id_groups=abc", Some(&cookie))).await;
        assert_json_bad_request(&reply);

        let reply = send(
            &app,
            json_request(
                "POST",
                "/favourites",
                Some(&cookie),
                json!({ "id_groups": 1, "movie_id": "abc" }),
            ),
        )
        .await;
        assert_json_bad_request(&reply);

        let reply = send(&app, empty_request("DELETE", "/comments/delete/abc", Some(&cookie))).await;
        assert_json_bad_request(&reply);

        let reply = send(&app, empty_request("GET", "/favourites/user/abc", Some(&cookie))).await;
        assert_json_bad_request(&reply);

        let reply = send(
            &app,
            Request::builder()
                .method("POST")
                .uri("/users/signin")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
        assert_json_bad_request(&reply);
    }
}
