//! The HTTP surface
//!
//! Every route under `/api/v1` expects the verified claims of the caller's
//! access token in the request extensions, as placed there by the
//! `aliri_tower` JWT layer. `/health` is open.

use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, FromRef, Path, Query, State},
    http::Method,
    routing::{get, put},
    Json, Router,
};
use realmsync_claims::Caller;
use realmsync_gateway::{dto::ExternalUser, UserId};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    validate::UserUpdate, ResponseEnvelope, RoleReconciler, ServiceError, UserService,
    ValidationError,
};

mod extract;

pub use extract::{AccessDenied, Admin, Authenticated, Authz};

/// Shared, immutable state handed to every request
#[derive(Clone, Debug)]
pub struct AppState {
    authz: Authz,
    users: UserService,
    reconciler: RoleReconciler,
}

impl AppState {
    /// Bundles the services behind the routes
    pub fn new(authz: Authz, users: UserService, reconciler: RoleReconciler) -> Self {
        Self {
            authz,
            users,
            reconciler,
        }
    }
}

impl FromRef<AppState> for Authz {
    fn from_ref(state: &AppState) -> Self {
        state.authz.clone()
    }
}

impl FromRef<AppState> for UserService {
    fn from_ref(state: &AppState) -> Self {
        state.users.clone()
    }
}

impl FromRef<AppState> for RoleReconciler {
    fn from_ref(state: &AppState) -> Self {
        state.reconciler.clone()
    }
}

/// Routes requiring an authenticated caller, relative to `/api/v1`
pub fn api() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/users", get(search_users).post(create_user))
        .route("/users/by-username/:username", get(find_user_id))
        .route("/users/:id", put(update_user))
        .route("/users/:id/roles/available", get(available_roles))
}

/// The complete application, with `api` nested under `/api/v1`
pub fn router(api: Router<AppState>, state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .layer(cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Browser clients on any origin may call the API with their bearer token
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([
            Method::HEAD,
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .max_age(Duration::from_secs(1800))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "UP" }))
}

async fn me(Authenticated(caller): Authenticated) -> Json<Caller> {
    Json(caller)
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    search: String,
}

async fn search_users(
    _: Admin,
    State(users): State<UserService>,
    Query(params): Query<SearchParams>,
) -> ResponseEnvelope {
    users.search_users(&params.search).await
}

async fn find_user_id(
    _: Admin,
    State(users): State<UserService>,
    Path(username): Path<String>,
) -> ResponseEnvelope {
    users.find_user_id(&username).await
}

async fn create_user(
    Admin(caller): Admin,
    State(users): State<UserService>,
    body: Result<Json<ExternalUser>, JsonRejection>,
) -> ResponseEnvelope {
    let Json(user) = match body {
        Ok(body) => body,
        Err(rejection) => return malformed(rejection),
    };

    tracing::info!(
        caller = caller.username().unwrap_or_default(),
        username = %user.username,
        "creating user"
    );
    users.create_user(&user).await
}

async fn update_user(
    Admin(caller): Admin,
    State(reconciler): State<RoleReconciler>,
    Path(id): Path<UserId>,
    body: Result<Json<UserUpdate>, JsonRejection>,
) -> ResponseEnvelope {
    let Json(update) = match body {
        Ok(body) => body,
        Err(rejection) => return malformed(rejection),
    };

    tracing::info!(
        caller = caller.username().unwrap_or_default(),
        user.id = %id,
        "updating user"
    );
    reconciler.update_user(&id, update).await
}

async fn available_roles(
    _: Admin,
    State(users): State<UserService>,
    Path(id): Path<UserId>,
) -> ResponseEnvelope {
    users.available_roles(&id).await
}

fn malformed(rejection: JsonRejection) -> ResponseEnvelope {
    let err: ValidationError = [rejection.body_text()].into_iter().collect();
    ServiceError::from(err).into()
}
