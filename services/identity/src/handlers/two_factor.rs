use axum::response::{IntoResponse, Redirect, Response};
use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::cookie::CookieJar;

use crate::domain::repository::UserRepository as _;
use crate::error::IdentityError;
use crate::handlers::current_session;
use crate::state::AppState;
use crate::usecase::verification::{
    EnrollTwoFactorUseCase, RemoveTwoFactorUseCase, RequireRecentVerificationUseCase,
};

/// Enroll (or re-enroll) 2FA. Gated on a recent verification so a hijacked
/// browser cannot quietly swap the secret. Returns the secret and
/// provisioning URI exactly once.
pub async fn enroll_two_factor(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Response, IdentityError> {
    let (jar, session) = current_session(&state, jar).await?;
    let Some(session) = session else {
        return Ok((
            jar,
            Redirect::to(&IdentityError::login_url(Some("/settings/two-factor"))),
        )
            .into_response());
    };
    let gate = RequireRecentVerificationUseCase {
        verifications: state.verification_repo(),
    };
    gate.execute(&session, "/settings/two-factor").await?;

    let Some(user) = state.user_repo().find_by_id(session.user_id).await? else {
        return Err(IdentityError::UserNotFound);
    };
    let usecase = EnrollTwoFactorUseCase {
        verifications: state.verification_repo(),
        issuer: state.totp_issuer.clone(),
    };
    let enrollment = usecase.execute(session.user_id, &user.email).await?;
    let body = serde_json::json!({
        "secret": enrollment.secret,
        "otpAuthUri": enrollment.otp_auth_uri,
    });
    Ok((jar, (StatusCode::CREATED, Json(body))).into_response())
}

/// Remove the standing 2FA enrollment. Same gate as enrolling.
pub async fn remove_two_factor(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Response, IdentityError> {
    let (jar, session) = current_session(&state, jar).await?;
    let Some(session) = session else {
        return Ok((
            jar,
            Redirect::to(&IdentityError::login_url(Some("/settings/two-factor"))),
        )
            .into_response());
    };
    let gate = RequireRecentVerificationUseCase {
        verifications: state.verification_repo(),
    };
    gate.execute(&session, "/settings/two-factor").await?;

    let usecase = RemoveTwoFactorUseCase {
        verifications: state.verification_repo(),
    };
    usecase.execute(session.user_id).await?;
    Ok((jar, StatusCode::NO_CONTENT).into_response())
}
