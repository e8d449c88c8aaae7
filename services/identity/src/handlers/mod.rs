pub mod password;
pub mod session;
pub mod signup;
pub mod two_factor;
pub mod users;
pub mod verification;

use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::cookies::{SESSION_COOKIE, clear_session_cookie};
use crate::domain::types::Session;
use crate::error::IdentityError;
use crate::state::AppState;
use crate::usecase::session::AuthenticateUseCase;

/// Resolve the session cookie. A cookie pointing at a dead or garbled session
/// comes back cleared, so the browser stops presenting it.
pub(crate) async fn current_session(
    state: &AppState,
    jar: CookieJar,
) -> Result<(CookieJar, Option<Session>), IdentityError> {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Ok((jar, None));
    };
    let Ok(session_id) = cookie.value().parse::<Uuid>() else {
        return Ok((clear_session_cookie(jar, state.cookie_domain.clone()), None));
    };
    let usecase = AuthenticateUseCase {
        sessions: state.session_repo(),
    };
    match usecase.execute(session_id).await? {
        Some(session) => Ok((jar, Some(session))),
        None => Ok((clear_session_cookie(jar, state.cookie_domain.clone()), None)),
    }
}
