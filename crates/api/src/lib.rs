//! HTTP API: server, routing, session cookies, and the route gate.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod cookies;
pub mod middleware;
