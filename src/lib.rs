pub mod common;
pub mod config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use axum::{
    routing::{get, post},
    Router,
};

use crate::config::AppState;

pub fn build_router(app_state: AppState) -> Router {
    // Rotas de credenciais de funcionários
    let employee_auth_routes = Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/change-password", post(handlers::auth::trocar_senha))
        .route("/reset-password", post(handlers::auth::resetar_senha))
        .route("/create", post(handlers::auth::criar_credenciais))
        .route("/me", get(handlers::auth::usuario_atual));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth/employee", employee_auth_routes)
        .with_state(app_state)
}
