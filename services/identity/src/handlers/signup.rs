use axum::response::{IntoResponse, Redirect, Response};
use axum::{Json, extract::State};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::cookies::set_session_cookie;
use crate::error::IdentityError;
use crate::state::AppState;
use crate::usecase::signup::{
    SignupInput, SignupUseCase, SignupWithConnectionInput, SignupWithConnectionUseCase,
};

#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub username: String,
    pub name: Option<String>,
    pub password: String,
    /// The onboarding code that was emailed to `email`.
    pub code: String,
    #[serde(rename = "redirectTo")]
    pub redirect_to: Option<String>,
}

pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<SignupRequest>,
) -> Result<Response, IdentityError> {
    let usecase = SignupUseCase {
        users: state.user_repo(),
        verifications: state.verification_repo(),
    };
    let session = usecase
        .execute(SignupInput {
            email: body.email,
            username: body.username,
            name: body.name,
            password: body.password,
            code: body.code,
        })
        .await?;
    let jar = set_session_cookie(jar, session.id.to_string(), state.cookie_domain.clone());
    let destination = body.redirect_to.as_deref().unwrap_or("/");
    Ok((jar, Redirect::to(destination)).into_response())
}

#[derive(Deserialize)]
pub struct SignupWithConnectionRequest {
    pub email: String,
    pub username: String,
    pub name: Option<String>,
    #[serde(rename = "providerName")]
    pub provider_name: String,
    #[serde(rename = "providerId")]
    pub provider_id: String,
    #[serde(rename = "redirectTo")]
    pub redirect_to: Option<String>,
}

pub async fn signup_with_connection(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<SignupWithConnectionRequest>,
) -> Result<Response, IdentityError> {
    let usecase = SignupWithConnectionUseCase {
        users: state.user_repo(),
    };
    let session = usecase
        .execute(SignupWithConnectionInput {
            email: body.email,
            username: body.username,
            name: body.name,
            provider_name: body.provider_name,
            provider_id: body.provider_id,
        })
        .await?;
    let jar = set_session_cookie(jar, session.id.to_string(), state.cookie_domain.clone());
    let destination = body.redirect_to.as_deref().unwrap_or("/");
    Ok((jar, Redirect::to(destination)).into_response())
}
