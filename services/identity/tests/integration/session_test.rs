use chrono::{Duration, Utc};
use uuid::Uuid;

use inkpad_identity::domain::types::{SESSION_TTL_SECS, VerificationKind};
use inkpad_identity::usecase::password::hash_password;
use inkpad_identity::usecase::session::{
    AuthenticateUseCase, LoginInput, LoginUseCase, LogoutUseCase,
};

use crate::helpers::{
    MockSessionRepo, MockUserRepo, MockVerificationRepo, active_verification, test_session,
    test_user,
};

#[tokio::test]
async fn should_issue_session_on_correct_password() {
    let user = test_user();
    let hash = hash_password("letmein please").unwrap();

    let sessions = MockSessionRepo::empty();
    let sessions_handle = sessions.sessions_handle();
    let uc = LoginUseCase {
        users: MockUserRepo::new(vec![user.clone()]).with_password(user.id, &hash),
        sessions,
        verifications: MockVerificationRepo::empty(),
    };

    let output = uc
        .execute(LoginInput {
            username: "kody".to_owned(),
            password: "letmein please".to_owned(),
        })
        .await
        .unwrap()
        .expect("login should succeed");

    assert_eq!(output.session.user_id, user.id);
    assert!(!output.requires_two_factor);
    assert!(output.session.verified_at.is_none());

    let sessions = sessions_handle.lock().unwrap();
    assert_eq!(sessions.len(), 1);
    let ttl = sessions[0].expires_at - sessions[0].created_at;
    assert_eq!(ttl, Duration::seconds(SESSION_TTL_SECS), "30-day expiry");
}

#[tokio::test]
async fn should_answer_identically_for_unknown_user_and_wrong_password() {
    let user = test_user();
    let hash = hash_password("the real password").unwrap();

    let uc = LoginUseCase {
        users: MockUserRepo::new(vec![user.clone()]).with_password(user.id, &hash),
        sessions: MockSessionRepo::empty(),
        verifications: MockVerificationRepo::empty(),
    };
    let wrong_password = uc
        .execute(LoginInput {
            username: "kody".to_owned(),
            password: "not the password".to_owned(),
        })
        .await
        .unwrap();

    let uc = LoginUseCase {
        users: MockUserRepo::empty(),
        sessions: MockSessionRepo::empty(),
        verifications: MockVerificationRepo::empty(),
    };
    let unknown_user = uc
        .execute(LoginInput {
            username: "nobody".to_owned(),
            password: "whatever".to_owned(),
        })
        .await
        .unwrap();

    assert!(wrong_password.is_none());
    assert!(unknown_user.is_none());
}

#[tokio::test]
async fn should_return_none_for_passwordless_account() {
    let user = test_user();
    let uc = LoginUseCase {
        users: MockUserRepo::new(vec![user]),
        sessions: MockSessionRepo::empty(),
        verifications: MockVerificationRepo::empty(),
    };
    let output = uc
        .execute(LoginInput {
            username: "kody".to_owned(),
            password: "anything".to_owned(),
        })
        .await
        .unwrap();
    assert!(output.is_none());
}

#[tokio::test]
async fn should_flag_two_factor_accounts_at_login() {
    let user = test_user();
    let hash = hash_password("letmein please").unwrap();

    let uc = LoginUseCase {
        users: MockUserRepo::new(vec![user.clone()]).with_password(user.id, &hash),
        sessions: MockSessionRepo::empty(),
        verifications: MockVerificationRepo::new(vec![active_verification(
            VerificationKind::TwoFactor,
            &user.id.to_string(),
        )]),
    };
    let output = uc
        .execute(LoginInput {
            username: "kody".to_owned(),
            password: "letmein please".to_owned(),
        })
        .await
        .unwrap()
        .expect("credentials are correct");

    assert!(output.requires_two_factor);
}

#[tokio::test]
async fn should_resolve_active_session() {
    let session = test_session(test_user().id);
    let uc = AuthenticateUseCase {
        sessions: MockSessionRepo::new(vec![session.clone()]),
    };
    let found = uc.execute(session.id).await.unwrap();
    assert_eq!(found, Some(session));
}

#[tokio::test]
async fn should_treat_expired_session_as_absent() {
    let mut session = test_session(test_user().id);
    session.expires_at = Utc::now() - Duration::seconds(1);

    let uc = AuthenticateUseCase {
        sessions: MockSessionRepo::new(vec![session.clone()]),
    };
    assert_eq!(uc.execute(session.id).await.unwrap(), None);

    let uc = AuthenticateUseCase {
        sessions: MockSessionRepo::empty(),
    };
    assert_eq!(uc.execute(Uuid::new_v4()).await.unwrap(), None);
}

#[tokio::test]
async fn should_delete_session_on_logout() {
    let session = test_session(test_user().id);
    let sessions = MockSessionRepo::new(vec![session.clone()]);
    let handle = sessions.sessions_handle();

    let uc = LogoutUseCase { sessions };
    uc.execute(session.id).await;
    assert!(handle.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_logout_without_consulting_the_session_lookup() {
    let session = test_session(test_user().id);
    let sessions = MockSessionRepo::new(vec![session.clone()]).failing_find();
    let handle = sessions.sessions_handle();

    // A broken lookup must not stand between the cookie and its deletion.
    let uc = LogoutUseCase { sessions };
    uc.execute(session.id).await;
    assert!(handle.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_swallow_delete_failure_on_logout() {
    let session = test_session(test_user().id);
    let uc = LogoutUseCase {
        sessions: MockSessionRepo::new(vec![session.clone()]).failing_delete(),
    };
    // Must not error or panic; the handler clears the cookie regardless.
    uc.execute(session.id).await;
}
