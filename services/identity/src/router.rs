use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tower_http::trace::TraceLayer;

use inkpad_core::health::{healthz, readyz};
use inkpad_core::middleware::request_id_layer;

use crate::handlers::{
    password::reset_password,
    session::{get_session, login, logout},
    signup::{signup, signup_with_connection},
    two_factor::{enroll_two_factor, remove_two_factor},
    users::{delete_user, list_users},
    verification::{prepare_verification, verify_code},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Verification
        .route("/auth/verification", post(prepare_verification))
        .route("/auth/verify", post(verify_code))
        // Signup
        .route("/auth/signup", post(signup))
        .route("/auth/signup/connection", post(signup_with_connection))
        // Session
        .route("/auth/login", post(login))
        .route("/auth/session", get(get_session))
        .route("/auth/session", delete(logout))
        // Password
        .route("/auth/password", put(reset_password))
        // Two-factor
        .route("/auth/2fa", post(enroll_two_factor))
        .route("/auth/2fa", delete(remove_two_factor))
        // Users
        .route("/admin/users", get(list_users))
        .route("/users/{username}", delete(delete_user))
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}
