use axum::http::StatusCode;

/// `GET /healthz` — liveness probe.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// `GET /readyz` — readiness probe. Services that need a deeper check
/// (database ping etc.) mount their own handler instead.
pub async fn readyz() -> StatusCode {
    StatusCode::OK
}
