use inkpad_identity::domain::types::VerificationKind;
use inkpad_identity::error::IdentityError;
use inkpad_identity::usecase::password::{
    ResetPasswordInput, ResetPasswordUseCase, hash_password, verify_password,
};

use crate::helpers::{MockUserRepo, MockVerificationRepo, active_verification, test_user};

#[tokio::test]
async fn should_replace_hash_and_burn_code_on_valid_reset() {
    let user = test_user();
    let old_hash = hash_password("old password").unwrap();
    let verification = active_verification(VerificationKind::ResetPassword, &user.email);
    let code = verification.totp.current_code();

    let users = MockUserRepo::new(vec![user.clone()]).with_password(user.id, &old_hash);
    let hashes = users.hashes_handle();
    let verifications = MockVerificationRepo::new(vec![verification]);
    let rows = verifications.rows_handle();

    let uc = ResetPasswordUseCase {
        users,
        verifications,
    };
    uc.execute(ResetPasswordInput {
        target: user.email.clone(),
        code,
        new_password: "brand new password".to_owned(),
    })
    .await
    .unwrap();

    let hashes = hashes.lock().unwrap();
    let hash = hashes.get(&user.id).unwrap();
    assert!(verify_password("brand new password", hash));
    assert!(!verify_password("old password", hash));
    assert!(rows.lock().unwrap().is_empty(), "reset code must be burnt");
}

#[tokio::test]
async fn should_reset_by_username_target() {
    let user = test_user();
    let verification = active_verification(VerificationKind::ResetPassword, &user.username);
    let code = verification.totp.current_code();

    let users = MockUserRepo::new(vec![user.clone()]);
    let hashes = users.hashes_handle();

    let uc = ResetPasswordUseCase {
        users,
        verifications: MockVerificationRepo::new(vec![verification]),
    };
    uc.execute(ResetPasswordInput {
        target: user.username.clone(),
        code,
        new_password: "brand new password".to_owned(),
    })
    .await
    .unwrap();

    assert!(hashes.lock().unwrap().contains_key(&user.id));
}

#[tokio::test]
async fn should_reject_reset_with_bad_code_and_keep_hash() {
    let user = test_user();
    let old_hash = hash_password("old password").unwrap();
    let verification = active_verification(VerificationKind::ResetPassword, &user.email);

    let users = MockUserRepo::new(vec![user.clone()]).with_password(user.id, &old_hash);
    let hashes = users.hashes_handle();

    let uc = ResetPasswordUseCase {
        users,
        verifications: MockVerificationRepo::new(vec![verification]),
    };
    let result = uc
        .execute(ResetPasswordInput {
            target: user.email.clone(),
            code: "WRONGG".to_owned(),
            new_password: "attacker password".to_owned(),
        })
        .await;

    assert!(matches!(result, Err(IdentityError::InvalidCode)));
    let hashes = hashes.lock().unwrap();
    assert!(verify_password("old password", hashes.get(&user.id).unwrap()));
}

#[tokio::test]
async fn should_answer_unknown_target_like_a_bad_code() {
    let verification = active_verification(VerificationKind::ResetPassword, "ghost@example.com");
    let code = verification.totp.current_code();
    let verifications = MockVerificationRepo::new(vec![verification]);
    let rows = verifications.rows_handle();

    let uc = ResetPasswordUseCase {
        users: MockUserRepo::empty(),
        verifications,
    };
    let result = uc
        .execute(ResetPasswordInput {
            target: "ghost@example.com".to_owned(),
            code,
            new_password: "whatever".to_owned(),
        })
        .await;

    assert!(
        matches!(result, Err(IdentityError::InvalidCode)),
        "resets must not confirm which accounts exist"
    );
    assert_eq!(
        rows.lock().unwrap().len(),
        1,
        "lookup failure must leave the challenge usable"
    );
}
