use axum::response::{IntoResponse, Redirect, Response};
use axum::{Json, extract::State};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use uuid::Uuid;

use crate::cookies::{SESSION_COOKIE, clear_session_cookie, set_session_cookie};
use crate::domain::types::VerificationKind;
use crate::error::IdentityError;
use crate::handlers::current_session;
use crate::state::AppState;
use crate::usecase::session::{LoginInput, LoginUseCase, LogoutUseCase};
use crate::usecase::verification::verify_path;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(rename = "redirectTo")]
    pub redirect_to: Option<String>,
}

/// Password login. Unknown username and wrong password answer identically.
/// Accounts with 2FA get their cookie but land on the verify page; the
/// session stays unverified until a code checks out.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<Response, IdentityError> {
    let usecase = LoginUseCase {
        users: state.user_repo(),
        sessions: state.session_repo(),
        verifications: state.verification_repo(),
    };
    let Some(output) = usecase
        .execute(LoginInput {
            username: body.username,
            password: body.password,
        })
        .await?
    else {
        return Err(IdentityError::InvalidCredentials);
    };

    let jar = set_session_cookie(
        jar,
        output.session.id.to_string(),
        state.cookie_domain.clone(),
    );
    let destination = body.redirect_to.as_deref().unwrap_or("/");
    let location = if output.requires_two_factor {
        verify_path(
            VerificationKind::TwoFactor,
            &output.session.user_id.to_string(),
            Some(destination),
        )
    } else {
        destination.to_owned()
    };
    Ok((jar, Redirect::to(&location)).into_response())
}

/// Who the cookie belongs to. Dead cookies come back cleared with a redirect
/// into the login flow.
pub async fn get_session(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Response, IdentityError> {
    let (jar, session) = current_session(&state, jar).await?;
    let Some(session) = session else {
        return Ok((jar, Redirect::to(&IdentityError::login_url(None))).into_response());
    };
    let body = serde_json::json!({
        "userId": session.user_id,
        "expiresAt": session.expires_at,
        "verifiedAt": session.verified_at,
    });
    Ok((jar, Json(body)).into_response())
}

/// Logout never fails. The session id is taken straight from the cookie with
/// no lookup, the row delete is best effort, and the cookie is cleared even
/// when the cookie carried garbage.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    let session_id = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| cookie.value().parse::<Uuid>().ok());
    if let Some(session_id) = session_id {
        let usecase = LogoutUseCase {
            sessions: state.session_repo(),
        };
        usecase.execute(session_id).await;
    }
    let jar = clear_session_cookie(jar, state.cookie_domain.clone());
    (jar, Redirect::to("/")).into_response()
}
