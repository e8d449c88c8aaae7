use axum::extract::Path;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::types::User;
use crate::error::IdentityError;
use crate::handlers::current_session;
use crate::state::AppState;
use crate::usecase::user::{DeleteUserUseCase, ListUsersUseCase};

#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub name: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            name: user.name,
            created_at: user.created_at,
        }
    }
}

/// Admin roster of all accounts.
pub async fn list_users(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Response, IdentityError> {
    let (jar, session) = current_session(&state, jar).await?;
    let Some(session) = session else {
        return Ok((
            jar,
            Redirect::to(&IdentityError::login_url(Some("/admin/users"))),
        )
            .into_response());
    };
    let usecase = ListUsersUseCase {
        users: state.user_repo(),
    };
    let users = usecase.execute(session.user_id).await?;
    let body: Vec<UserResponse> = users.into_iter().map(Into::into).collect();
    Ok((jar, Json(body)).into_response())
}

/// Delete an account. `delete:user:own` covers self-deletion,
/// `delete:user:any` everyone else.
pub async fn delete_user(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(username): Path<String>,
) -> Result<Response, IdentityError> {
    let (jar, session) = current_session(&state, jar).await?;
    let Some(session) = session else {
        return Ok((jar, Redirect::to(&IdentityError::login_url(None))).into_response());
    };
    let usecase = DeleteUserUseCase {
        users: state.user_repo(),
    };
    usecase.execute(session.user_id, &username).await?;
    Ok((jar, StatusCode::NO_CONTENT).into_response())
}
