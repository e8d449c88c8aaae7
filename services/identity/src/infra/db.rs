use anyhow::Context as _;
use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection,
    DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionError,
    TransactionTrait, sea_query::OnConflict,
};
use uuid::Uuid;

use inkpad_identity_schema::{
    connections, outbox_events, passwords, permission_roles, permissions, role_users, roles,
    sessions, users, verifications,
};

use crate::domain::repository::{
    NewUser, SessionRepository, UserRepository, VerificationRepository,
};
use crate::domain::types::{
    OutboxEvent, PermissionData, SESSION_TTL_SECS, Session, User, Verification, VerificationKind,
};
use crate::error::IdentityError;
use crate::totp::{TotpAlgorithm, TotpConfig};

fn flatten_txn_error(e: TransactionError<IdentityError>, what: &'static str) -> IdentityError {
    match e {
        TransactionError::Connection(db) => {
            IdentityError::Internal(anyhow::Error::new(db).context(what))
        }
        TransactionError::Transaction(e) => e,
    }
}

// ── User repository ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, IdentityError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?;
        Ok(model.map(user_from_model))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, IdentityError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find user by email")?;
        Ok(model.map(user_from_model))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, IdentityError> {
        let model = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.db)
            .await
            .context("find user by username")?;
        Ok(model.map(user_from_model))
    }

    async fn list(&self) -> Result<Vec<User>, IdentityError> {
        let models = users::Entity::find()
            .order_by_asc(users::Column::Username)
            .all(&self.db)
            .await
            .context("list users")?;
        Ok(models.into_iter().map(user_from_model).collect())
    }

    async fn password_hash(&self, user_id: Uuid) -> Result<Option<String>, IdentityError> {
        let model = passwords::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .context("find password hash")?;
        Ok(model.map(|m| m.hash))
    }

    async fn set_password_hash(&self, user_id: Uuid, hash: &str) -> Result<(), IdentityError> {
        passwords::ActiveModel {
            user_id: Set(user_id),
            hash: Set(hash.to_owned()),
        }
        .update(&self.db)
        .await
        .context("set password hash")?;
        Ok(())
    }

    async fn create_with_password(
        &self,
        user: &NewUser,
        password_hash: &str,
    ) -> Result<Session, IdentityError> {
        let user = user.clone();
        let password_hash = password_hash.to_owned();
        self.db
            .transaction::<_, Session, IdentityError>(|txn| {
                Box::pin(async move {
                    let user_id = insert_user(txn, &user).await?;
                    passwords::ActiveModel {
                        user_id: Set(user_id),
                        hash: Set(password_hash),
                    }
                    .insert(txn)
                    .await
                    .context("insert password")?;
                    grant_default_role(txn, user_id).await?;
                    insert_session(txn, user_id).await
                })
            })
            .await
            .map_err(|e| flatten_txn_error(e, "signup transaction"))
    }

    async fn create_with_connection(
        &self,
        user: &NewUser,
        provider_name: &str,
        provider_id: &str,
    ) -> Result<Session, IdentityError> {
        let user = user.clone();
        let provider_name = provider_name.to_owned();
        let provider_id = provider_id.to_owned();
        self.db
            .transaction::<_, Session, IdentityError>(|txn| {
                Box::pin(async move {
                    let user_id = insert_user(txn, &user).await?;
                    let now = Utc::now();
                    connections::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        provider_name: Set(provider_name),
                        provider_id: Set(provider_id),
                        user_id: Set(user_id),
                        created_at: Set(now),
                        updated_at: Set(now),
                    }
                    .insert(txn)
                    .await
                    .context("insert connection")?;
                    grant_default_role(txn, user_id).await?;
                    insert_session(txn, user_id).await
                })
            })
            .await
            .map_err(|e| flatten_txn_error(e, "connection signup transaction"))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, IdentityError> {
        let result = users::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete user")?;
        Ok(result.rows_affected > 0)
    }

    async fn has_role(&self, user_id: Uuid, role: &str) -> Result<bool, IdentityError> {
        let Some(role) = roles::Entity::find()
            .filter(roles::Column::Name.eq(role))
            .one(&self.db)
            .await
            .context("find role by name")?
        else {
            return Ok(false);
        };
        let grant = role_users::Entity::find_by_id((user_id, role.id))
            .one(&self.db)
            .await
            .context("find role grant")?;
        Ok(grant.is_some())
    }

    async fn has_permission(
        &self,
        user_id: Uuid,
        permission: &PermissionData,
    ) -> Result<bool, IdentityError> {
        let mut query = permissions::Entity::find()
            .filter(permissions::Column::Action.eq(&permission.action))
            .filter(permissions::Column::Entity.eq(&permission.entity));
        if let Some(access) = &permission.access {
            query = query.filter(permissions::Column::Access.is_in(access.clone()));
        }
        let permission_ids: Vec<Uuid> = query
            .all(&self.db)
            .await
            .context("find matching permissions")?
            .into_iter()
            .map(|m| m.id)
            .collect();
        if permission_ids.is_empty() {
            return Ok(false);
        }

        let role_ids: Vec<Uuid> = permission_roles::Entity::find()
            .filter(permission_roles::Column::PermissionId.is_in(permission_ids))
            .all(&self.db)
            .await
            .context("find roles carrying permission")?
            .into_iter()
            .map(|m| m.role_id)
            .collect();
        if role_ids.is_empty() {
            return Ok(false);
        }

        let count = role_users::Entity::find()
            .filter(role_users::Column::UserId.eq(user_id))
            .filter(role_users::Column::RoleId.is_in(role_ids))
            .count(&self.db)
            .await
            .context("count role grants")?;
        Ok(count > 0)
    }
}

async fn insert_user(txn: &DatabaseTransaction, user: &NewUser) -> Result<Uuid, IdentityError> {
    let now = Utc::now();
    let id = Uuid::new_v4();
    users::ActiveModel {
        id: Set(id),
        email: Set(user.email.clone()),
        username: Set(user.username.clone()),
        name: Set(user.name.clone()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(txn)
    .await
    .context("insert user")?;
    Ok(id)
}

/// Grant the default `user` role inside the signup transaction. If the seed
/// row is gone the whole signup rolls back; a user without the baseline role
/// must not exist.
async fn grant_default_role(txn: &DatabaseTransaction, user_id: Uuid) -> Result<(), IdentityError> {
    let role = roles::Entity::find()
        .filter(roles::Column::Name.eq("user"))
        .one(txn)
        .await
        .context("find default role")?
        .ok_or(IdentityError::MissingDefaultRole)?;
    role_users::ActiveModel {
        user_id: Set(user_id),
        role_id: Set(role.id),
    }
    .insert(txn)
    .await
    .context("grant default role")?;
    Ok(())
}

async fn insert_session(txn: &DatabaseTransaction, user_id: Uuid) -> Result<Session, IdentityError> {
    let now = Utc::now();
    let model = sessions::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        created_at: Set(now),
        updated_at: Set(now),
        expires_at: Set(now + Duration::seconds(SESSION_TTL_SECS)),
        verified_at: Set(None),
    }
    .insert(txn)
    .await
    .context("insert session")?;
    Ok(session_from_model(model))
}

fn user_from_model(model: users::Model) -> User {
    User {
        id: model.id,
        email: model.email,
        username: model.username,
        name: model.name,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

// ── Session repository ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbSessionRepository {
    pub db: DatabaseConnection,
}

impl SessionRepository for DbSessionRepository {
    async fn create(&self, user_id: Uuid) -> Result<Session, IdentityError> {
        let now = Utc::now();
        let model = sessions::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            created_at: Set(now),
            updated_at: Set(now),
            expires_at: Set(now + Duration::seconds(SESSION_TTL_SECS)),
            verified_at: Set(None),
        }
        .insert(&self.db)
        .await
        .context("create session")?;
        Ok(session_from_model(model))
    }

    async fn find_active(&self, id: Uuid) -> Result<Option<Session>, IdentityError> {
        let now = Utc::now();
        let model = sessions::Entity::find()
            .filter(sessions::Column::Id.eq(id))
            .filter(sessions::Column::ExpiresAt.gt(now))
            .one(&self.db)
            .await
            .context("find active session")?;
        Ok(model.map(session_from_model))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, IdentityError> {
        let result = sessions::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete session")?;
        Ok(result.rows_affected > 0)
    }

    async fn mark_verified(&self, id: Uuid) -> Result<(), IdentityError> {
        let now = Utc::now();
        sessions::ActiveModel {
            id: Set(id),
            verified_at: Set(Some(now)),
            updated_at: Set(now),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("mark session verified")?;
        Ok(())
    }
}

fn session_from_model(model: sessions::Model) -> Session {
    Session {
        id: model.id,
        user_id: model.user_id,
        created_at: model.created_at,
        updated_at: model.updated_at,
        expires_at: model.expires_at,
        verified_at: model.verified_at,
    }
}

// ── Verification repository ───────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbVerificationRepository {
    pub db: DatabaseConnection,
}

impl VerificationRepository for DbVerificationRepository {
    async fn upsert(&self, verification: &Verification) -> Result<(), IdentityError> {
        verifications::Entity::insert(verification_to_active_model(verification))
            .on_conflict(upsert_on_conflict())
            .exec_without_returning(&self.db)
            .await
            .context("upsert verification")?;
        Ok(())
    }

    async fn upsert_with_outbox(
        &self,
        verification: &Verification,
        event: &OutboxEvent,
    ) -> Result<(), IdentityError> {
        self.db
            .transaction::<_, (), sea_orm::DbErr>(|txn| {
                let verification = verification.clone();
                let event = event.clone();
                Box::pin(async move {
                    verifications::Entity::insert(verification_to_active_model(&verification))
                        .on_conflict(upsert_on_conflict())
                        .exec_without_returning(txn)
                        .await?;
                    insert_outbox_event(txn, &event).await?;
                    Ok(())
                })
            })
            .await
            .context("upsert verification with outbox")?;
        Ok(())
    }

    async fn find_active(
        &self,
        target: &str,
        kind: VerificationKind,
    ) -> Result<Option<Verification>, IdentityError> {
        let model = active_verifications(target, kind)
            .one(&self.db)
            .await
            .context("find active verification")?;
        model.map(verification_from_model).transpose()
    }

    async fn exists(&self, target: &str, kind: VerificationKind) -> Result<bool, IdentityError> {
        let count = active_verifications(target, kind)
            .count(&self.db)
            .await
            .context("count active verifications")?;
        Ok(count > 0)
    }

    async fn delete(&self, target: &str, kind: VerificationKind) -> Result<bool, IdentityError> {
        let result = verifications::Entity::delete_many()
            .filter(verifications::Column::Target.eq(target))
            .filter(verifications::Column::Kind.eq(kind.as_str()))
            .exec(&self.db)
            .await
            .context("delete verification")?;
        Ok(result.rows_affected > 0)
    }
}

fn active_verifications(
    target: &str,
    kind: VerificationKind,
) -> sea_orm::Select<verifications::Entity> {
    let now = Utc::now();
    verifications::Entity::find()
        .filter(verifications::Column::Target.eq(target))
        .filter(verifications::Column::Kind.eq(kind.as_str()))
        .filter(
            Condition::any()
                .add(verifications::Column::ExpiresAt.is_null())
                .add(verifications::Column::ExpiresAt.gt(now)),
        )
}

/// Last writer wins: re-preparing a challenge for the same (target, kind)
/// replaces the secret and the expiry.
fn upsert_on_conflict() -> OnConflict {
    OnConflict::columns([verifications::Column::Target, verifications::Column::Kind])
        .update_columns([
            verifications::Column::Id,
            verifications::Column::Secret,
            verifications::Column::Algorithm,
            verifications::Column::Digits,
            verifications::Column::Period,
            verifications::Column::CharSet,
            verifications::Column::CreatedAt,
            verifications::Column::ExpiresAt,
        ])
        .to_owned()
}

fn verification_to_active_model(verification: &Verification) -> verifications::ActiveModel {
    verifications::ActiveModel {
        id: Set(verification.id),
        kind: Set(verification.kind.as_str().to_owned()),
        target: Set(verification.target.clone()),
        secret: Set(verification.totp.secret.clone()),
        algorithm: Set(verification.totp.algorithm.as_str().to_owned()),
        digits: Set(verification.totp.digits as i32),
        period: Set(verification.totp.period_secs as i64),
        char_set: Set(verification.totp.char_set.clone()),
        created_at: Set(verification.created_at),
        expires_at: Set(verification.expires_at),
    }
}

fn verification_from_model(model: verifications::Model) -> Result<Verification, IdentityError> {
    let kind = VerificationKind::parse(&model.kind)
        .with_context(|| format!("unknown verification kind {:?}", model.kind))?;
    let algorithm = TotpAlgorithm::parse(&model.algorithm)
        .with_context(|| format!("unknown totp algorithm {:?}", model.algorithm))?;
    Ok(Verification {
        id: model.id,
        kind,
        target: model.target,
        totp: TotpConfig {
            secret: model.secret,
            algorithm,
            digits: model.digits as u32,
            period_secs: model.period as u64,
            char_set: model.char_set,
        },
        created_at: model.created_at,
        expires_at: model.expires_at,
    })
}

async fn insert_outbox_event(
    txn: &DatabaseTransaction,
    event: &OutboxEvent,
) -> Result<(), sea_orm::DbErr> {
    let now = Utc::now();
    outbox_events::ActiveModel {
        id: Set(event.id),
        kind: Set(event.kind.clone()),
        payload: Set(event.payload.clone()),
        idempotency_key: Set(event.idempotency_key.clone()),
        attempts: Set(0),
        last_error: Set(None),
        created_at: Set(now),
        next_attempt_at: Set(now),
        processed_at: Set(None),
        failed_at: Set(None),
    }
    .insert(txn)
    .await?;
    Ok(())
}
