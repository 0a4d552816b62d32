use axum::Router;

pub mod auth;
pub mod pages;
pub mod system;
pub mod users;

/// Router for everything behind the route gate: JSON API plus pages.
pub fn router() -> Router {
    Router::new()
        .nest("/api/auth", auth::router())
        .nest("/api/users", users::router())
        .merge(pages::router())
        .fallback(pages::not_found)
}
