//! Page routes.
//!
//! The portal UI is rendered elsewhere; these handlers describe the page and
//! the viewer the gate attached, which is what the gate tests observe.

use axum::{
    Extension, Json, Router,
    extract::{Path, Query},
    http::{StatusCode, Uri},
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::context::PrincipalContext;

type Viewer = Option<Extension<PrincipalContext>>;

pub fn router() -> Router {
    Router::new()
        .route("/", get(home))
        .route("/events", get(events))
        .route("/register-user", get(register_user))
        .route("/register/:step", get(register_step))
        .route("/profile", get(profile))
        .route("/admin", get(admin))
        .route("/admin/login", get(admin_login))
        .route("/admin/*rest", get(admin))
}

fn page(name: &str, uri: &Uri, viewer: Viewer) -> Json<Value> {
    let viewer = viewer.map(|Extension(p)| {
        json!({
            "id": p.account_id().as_str(),
            "role": p.role().as_str(),
        })
    });
    Json(json!({
        "page": name,
        "path": uri.path(),
        "viewer": viewer,
    }))
}

#[derive(Debug, Deserialize)]
pub struct HomeQuery {
    #[serde(rename = "returnUrl")]
    pub return_url: Option<String>,
}

pub async fn home(viewer: Viewer, uri: Uri, Query(q): Query<HomeQuery>) -> Json<Value> {
    let Json(mut body) = page("home", &uri, viewer);
    body["returnUrl"] = json!(q.return_url);
    Json(body)
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub error: Option<String>,
}

pub async fn events(viewer: Viewer, uri: Uri, Query(q): Query<EventsQuery>) -> Json<Value> {
    let Json(mut body) = page("events", &uri, viewer);
    body["error"] = json!(q.error);
    Json(body)
}

pub async fn register_user(viewer: Viewer, uri: Uri) -> Json<Value> {
    page("register-user", &uri, viewer)
}

pub async fn register_step(viewer: Viewer, uri: Uri, Path(step): Path<String>) -> Json<Value> {
    let Json(mut body) = page("register", &uri, viewer);
    body["step"] = json!(step);
    Json(body)
}

pub async fn profile(viewer: Viewer, uri: Uri) -> Json<Value> {
    page("profile", &uri, viewer)
}

pub async fn admin(viewer: Viewer, uri: Uri) -> Json<Value> {
    page("admin", &uri, viewer)
}

pub async fn admin_login(viewer: Viewer, uri: Uri) -> Json<Value> {
    page("admin-login", &uri, viewer)
}

pub async fn not_found(uri: Uri) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "not_found", "message": format!("no page at {}", uri.path()) })),
    )
}
