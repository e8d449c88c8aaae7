use chrono::Utc;
use uuid::Uuid;

use inkpad_identity::domain::types::User;
use inkpad_identity::error::IdentityError;
use inkpad_identity::usecase::user::{DeleteUserUseCase, ListUsersUseCase};

use crate::helpers::{MockUserRepo, test_user};

fn other_user(username: &str) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        email: format!("{username}@example.com"),
        username: username.to_owned(),
        name: None,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn should_list_users_for_admin() {
    let admin = test_user();
    let uc = ListUsersUseCase {
        users: MockUserRepo::new(vec![admin.clone(), other_user("alice")])
            .with_role(admin.id, "admin"),
    };
    let users = uc.execute(admin.id).await.unwrap();
    assert_eq!(users.len(), 2);
}

#[tokio::test]
async fn should_refuse_listing_without_admin_role() {
    let user = test_user();
    let uc = ListUsersUseCase {
        users: MockUserRepo::new(vec![user.clone()]).with_role(user.id, "user"),
    };
    let result = uc.execute(user.id).await;

    match result {
        Err(IdentityError::MissingRole(role)) => assert_eq!(role, "admin"),
        other => panic!("expected MissingRole, got {other:?}"),
    }
}

#[tokio::test]
async fn should_delete_own_account_with_own_access() {
    let user = test_user();
    let users = MockUserRepo::new(vec![user.clone()]).with_grant(user.id, "delete", "user", "own");
    let handle = users.users_handle();

    let uc = DeleteUserUseCase { users };
    uc.execute(user.id, "kody").await.unwrap();
    assert!(handle.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_refuse_deleting_others_with_only_own_access() {
    let actor = test_user();
    let victim = other_user("alice");
    let users = MockUserRepo::new(vec![actor.clone(), victim.clone()]).with_grant(
        actor.id, "delete", "user", "own",
    );
    let handle = users.users_handle();

    let uc = DeleteUserUseCase { users };
    let result = uc.execute(actor.id, "alice").await;

    match result {
        Err(IdentityError::MissingPermission(permission)) => {
            assert_eq!(permission.to_string(), "delete:user:any");
        }
        other => panic!("expected MissingPermission, got {other:?}"),
    }
    assert_eq!(handle.lock().unwrap().len(), 2, "nothing deleted");
}

#[tokio::test]
async fn should_delete_other_account_with_any_access() {
    let admin = test_user();
    let victim = other_user("alice");
    let users = MockUserRepo::new(vec![admin.clone(), victim.clone()]).with_grant(
        admin.id, "delete", "user", "any",
    );
    let handle = users.users_handle();

    let uc = DeleteUserUseCase { users };
    uc.execute(admin.id, "alice").await.unwrap();

    let remaining = handle.lock().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, admin.id);
}

#[tokio::test]
async fn should_return_not_found_for_unknown_username() {
    let admin = test_user();
    let uc = DeleteUserUseCase {
        users: MockUserRepo::new(vec![admin.clone()]).with_grant(admin.id, "delete", "user", "any"),
    };
    let result = uc.execute(admin.id, "nobody").await;
    assert!(matches!(result, Err(IdentityError::UserNotFound)));
}
