use axum::response::{IntoResponse, Redirect, Response};
use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::domain::types::VerificationKind;
use crate::error::IdentityError;
use crate::handlers::current_session;
use crate::state::AppState;
use crate::usecase::verification::{
    ConsumeVerificationInput, ConsumeVerificationUseCase, PrepareVerificationInput,
    PrepareVerificationUseCase, RedirectFlows, RequireRecentVerificationUseCase,
};

#[derive(Deserialize)]
pub struct PrepareVerificationRequest {
    #[serde(rename = "type")]
    pub kind: VerificationKind,
    pub target: String,
    #[serde(rename = "redirectTo")]
    pub redirect_to: Option<String>,
    /// Validity window in seconds; defaults to the delivery TTL.
    pub period: Option<u64>,
}

/// Issue (or replace) a one-time code for the target and queue its delivery.
/// The code itself never appears in the response.
pub async fn prepare_verification(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<PrepareVerificationRequest>,
) -> Result<Response, IdentityError> {
    // 2FA enrollment has its own endpoint; its secret must reach the
    // authenticator app, not an inbox.
    if body.kind == VerificationKind::TwoFactor {
        return Err(IdentityError::UnsupportedVerificationKind);
    }
    // Changing the login email is a sensitive action: it needs a session and,
    // for 2FA accounts, a fresh check.
    let jar = if body.kind == VerificationKind::ChangeEmail {
        let (jar, session) = current_session(&state, jar).await?;
        let Some(session) = session else {
            let login = IdentityError::login_url(Some("/settings/profile/change-email"));
            return Ok((jar, Redirect::to(&login)).into_response());
        };
        let gate = RequireRecentVerificationUseCase {
            verifications: state.verification_repo(),
        };
        gate.execute(&session, "/settings/profile/change-email")
            .await?;
        jar
    } else {
        jar
    };
    let usecase = PrepareVerificationUseCase {
        verifications: state.verification_repo(),
        public_origin: state.public_origin.clone(),
    };
    let prepared = usecase
        .execute(PrepareVerificationInput {
            kind: body.kind,
            target: body.target,
            redirect_to: body.redirect_to,
            period_secs: body.period,
        })
        .await?;
    let body = serde_json::json!({ "verifyUrl": prepared.verify_url });
    Ok((jar, (StatusCode::CREATED, Json(body))).into_response())
}

#[derive(Deserialize)]
pub struct VerifyCodeRequest {
    pub code: String,
    #[serde(rename = "type")]
    pub kind: VerificationKind,
    pub target: String,
    #[serde(rename = "redirectTo")]
    pub redirect_to: Option<String>,
}

/// Check a submitted code and run the flow behind its kind. A bad code is a
/// 400; a good one redirects into the next step of the funnel.
pub async fn verify_code(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<VerifyCodeRequest>,
) -> Result<Response, IdentityError> {
    let (jar, session) = current_session(&state, jar).await?;
    let usecase = ConsumeVerificationUseCase {
        verifications: state.verification_repo(),
        flows: RedirectFlows {
            sessions: state.session_repo(),
        },
    };
    let outcome = usecase
        .execute(ConsumeVerificationInput {
            code: body.code,
            kind: body.kind,
            target: body.target,
            redirect_to: body.redirect_to,
            session_id: session.map(|s| s.id),
        })
        .await?;
    Ok((jar, Redirect::to(&outcome.redirect_to)).into_response())
}
