use sea_orm::Database;
use tracing::info;

use inkpad_identity::config::IdentityConfig;
use inkpad_identity::router::build_router;
use inkpad_identity::state::AppState;

#[tokio::main]
async fn main() {
    inkpad_core::tracing::init_tracing();

    let config = IdentityConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let state = AppState {
        db,
        public_origin: config.public_origin,
        cookie_domain: config.cookie_domain,
        totp_issuer: config.totp_issuer,
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.identity_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("identity service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
