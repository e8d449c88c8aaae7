use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use crate::error::IdentityError;
use crate::state::AppState;
use crate::usecase::password::{ResetPasswordInput, ResetPasswordUseCase};

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    /// Email or username the reset code was issued against.
    pub target: String,
    pub code: String,
    #[serde(rename = "newPassword")]
    pub new_password: String,
}

/// Replace a forgotten password. Needs no session; the emailed code is the
/// proof of ownership, and it is burnt here.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<StatusCode, IdentityError> {
    let usecase = ResetPasswordUseCase {
        users: state.user_repo(),
        verifications: state.verification_repo(),
    };
    usecase
        .execute(ResetPasswordInput {
            target: body.target,
            code: body.code,
            new_password: body.new_password,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
