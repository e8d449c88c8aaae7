use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use uuid::Uuid;

use inkpad_identity::domain::repository::{
    NewUser, SessionRepository, UserRepository, VerificationRepository,
};
use inkpad_identity::domain::types::{
    OutboxEvent, PermissionData, SESSION_TTL_SECS, Session, User, Verification, VerificationKind,
};
use inkpad_identity::error::IdentityError;
use inkpad_identity::totp::{TotpAlgorithm, TotpConfig};

// ── MockUserRepo ─────────────────────────────────────────────────────────────

/// A permission grant: (user, action, entity, access).
pub type Grant = (Uuid, &'static str, &'static str, &'static str);

#[derive(Clone)]
pub struct MockUserRepo {
    pub users: Arc<Mutex<Vec<User>>>,
    pub password_hashes: Arc<Mutex<HashMap<Uuid, String>>>,
    pub roles: Vec<(Uuid, &'static str)>,
    pub grants: Vec<Grant>,
    /// When false the signup transaction aborts as if the `user` role seed
    /// row were missing, leaving nothing behind.
    pub has_default_role: bool,
}

impl MockUserRepo {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users: Arc::new(Mutex::new(users)),
            password_hashes: Arc::new(Mutex::new(HashMap::new())),
            roles: vec![],
            grants: vec![],
            has_default_role: true,
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    pub fn with_password(self, user_id: Uuid, hash: &str) -> Self {
        self.password_hashes
            .lock()
            .unwrap()
            .insert(user_id, hash.to_owned());
        self
    }

    pub fn with_role(mut self, user_id: Uuid, role: &'static str) -> Self {
        self.roles.push((user_id, role));
        self
    }

    pub fn with_grant(
        mut self,
        user_id: Uuid,
        action: &'static str,
        entity: &'static str,
        access: &'static str,
    ) -> Self {
        self.grants.push((user_id, action, entity, access));
        self
    }

    pub fn without_default_role(mut self) -> Self {
        self.has_default_role = false;
        self
    }

    pub fn users_handle(&self) -> Arc<Mutex<Vec<User>>> {
        Arc::clone(&self.users)
    }

    pub fn hashes_handle(&self) -> Arc<Mutex<HashMap<Uuid, String>>> {
        Arc::clone(&self.password_hashes)
    }

    fn fresh_session(user_id: Uuid) -> Session {
        let now = Utc::now();
        Session {
            id: Uuid::new_v4(),
            user_id,
            created_at: now,
            updated_at: now,
            expires_at: now + Duration::seconds(SESSION_TTL_SECS),
            verified_at: None,
        }
    }
}

impl UserRepository for MockUserRepo {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, IdentityError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, IdentityError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, IdentityError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>, IdentityError> {
        Ok(self.users.lock().unwrap().clone())
    }

    async fn password_hash(&self, user_id: Uuid) -> Result<Option<String>, IdentityError> {
        Ok(self.password_hashes.lock().unwrap().get(&user_id).cloned())
    }

    async fn set_password_hash(&self, user_id: Uuid, hash: &str) -> Result<(), IdentityError> {
        self.password_hashes
            .lock()
            .unwrap()
            .insert(user_id, hash.to_owned());
        Ok(())
    }

    async fn create_with_password(
        &self,
        user: &NewUser,
        password_hash: &str,
    ) -> Result<Session, IdentityError> {
        if !self.has_default_role {
            return Err(IdentityError::MissingDefaultRole);
        }
        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            email: user.email.clone(),
            username: user.username.clone(),
            name: user.name.clone(),
            created_at: now,
            updated_at: now,
        };
        let session = Self::fresh_session(created.id);
        self.password_hashes
            .lock()
            .unwrap()
            .insert(created.id, password_hash.to_owned());
        self.users.lock().unwrap().push(created);
        Ok(session)
    }

    async fn create_with_connection(
        &self,
        user: &NewUser,
        _provider_name: &str,
        _provider_id: &str,
    ) -> Result<Session, IdentityError> {
        if !self.has_default_role {
            return Err(IdentityError::MissingDefaultRole);
        }
        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            email: user.email.clone(),
            username: user.username.clone(),
            name: user.name.clone(),
            created_at: now,
            updated_at: now,
        };
        let session = Self::fresh_session(created.id);
        self.users.lock().unwrap().push(created);
        Ok(session)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, IdentityError> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() < before)
    }

    async fn has_role(&self, user_id: Uuid, role: &str) -> Result<bool, IdentityError> {
        Ok(self.roles.iter().any(|(u, r)| *u == user_id && *r == role))
    }

    async fn has_permission(
        &self,
        user_id: Uuid,
        permission: &PermissionData,
    ) -> Result<bool, IdentityError> {
        Ok(self.grants.iter().any(|(u, action, entity, access)| {
            *u == user_id
                && *action == permission.action
                && *entity == permission.entity
                && permission
                    .access
                    .as_ref()
                    .is_none_or(|wanted| wanted.iter().any(|a| a == access))
        }))
    }
}

// ── MockSessionRepo ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockSessionRepo {
    pub sessions: Arc<Mutex<Vec<Session>>>,
    /// When set, `delete` fails; logout must swallow it.
    pub fail_delete: bool,
    /// When set, `find_active` fails; paths that must never fail visibly
    /// cannot depend on it.
    pub fail_find: bool,
}

impl MockSessionRepo {
    pub fn new(sessions: Vec<Session>) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(sessions)),
            fail_delete: false,
            fail_find: false,
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub fn failing_find(mut self) -> Self {
        self.fail_find = true;
        self
    }

    pub fn sessions_handle(&self) -> Arc<Mutex<Vec<Session>>> {
        Arc::clone(&self.sessions)
    }
}

impl SessionRepository for MockSessionRepo {
    async fn create(&self, user_id: Uuid) -> Result<Session, IdentityError> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            user_id,
            created_at: now,
            updated_at: now,
            expires_at: now + Duration::seconds(SESSION_TTL_SECS),
            verified_at: None,
        };
        self.sessions.lock().unwrap().push(session.clone());
        Ok(session)
    }

    async fn find_active(&self, id: Uuid) -> Result<Option<Session>, IdentityError> {
        if self.fail_find {
            return Err(IdentityError::Internal(anyhow::anyhow!(
                "simulated session lookup failure"
            )));
        }
        let now = Utc::now();
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id && s.expires_at > now)
            .cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, IdentityError> {
        if self.fail_delete {
            return Err(IdentityError::Internal(anyhow::anyhow!(
                "simulated session delete failure"
            )));
        }
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|s| s.id != id);
        Ok(sessions.len() < before)
    }

    async fn mark_verified(&self, id: Uuid) -> Result<(), IdentityError> {
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(session) = sessions.iter_mut().find(|s| s.id == id) {
            session.verified_at = Some(Utc::now());
        }
        Ok(())
    }
}

// ── MockVerificationRepo ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockVerificationRepo {
    pub rows: Arc<Mutex<Vec<Verification>>>,
    pub events: Arc<Mutex<Vec<OutboxEvent>>>,
}

impl MockVerificationRepo {
    pub fn new(rows: Vec<Verification>) -> Self {
        Self {
            rows: Arc::new(Mutex::new(rows)),
            events: Arc::new(Mutex::new(vec![])),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    pub fn rows_handle(&self) -> Arc<Mutex<Vec<Verification>>> {
        Arc::clone(&self.rows)
    }

    pub fn events_handle(&self) -> Arc<Mutex<Vec<OutboxEvent>>> {
        Arc::clone(&self.events)
    }

    fn replace(&self, verification: &Verification) {
        let mut rows = self.rows.lock().unwrap();
        rows.retain(|v| !(v.target == verification.target && v.kind == verification.kind));
        rows.push(verification.clone());
    }
}

impl VerificationRepository for MockVerificationRepo {
    async fn upsert(&self, verification: &Verification) -> Result<(), IdentityError> {
        self.replace(verification);
        Ok(())
    }

    async fn upsert_with_outbox(
        &self,
        verification: &Verification,
        event: &OutboxEvent,
    ) -> Result<(), IdentityError> {
        self.replace(verification);
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn find_active(
        &self,
        target: &str,
        kind: VerificationKind,
    ) -> Result<Option<Verification>, IdentityError> {
        let now = Utc::now();
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|v| {
                v.target == target
                    && v.kind == kind
                    && v.expires_at.is_none_or(|expires| expires > now)
            })
            .cloned())
    }

    async fn exists(&self, target: &str, kind: VerificationKind) -> Result<bool, IdentityError> {
        Ok(self.find_active(target, kind).await?.is_some())
    }

    async fn delete(&self, target: &str, kind: VerificationKind) -> Result<bool, IdentityError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|v| !(v.target == target && v.kind == kind));
        Ok(rows.len() < before)
    }
}

// ── Test fixture helpers ─────────────────────────────────────────────────────

pub fn test_user() -> User {
    let now = Utc::now();
    User {
        id: Uuid::parse_str("00000000-0000-0000-0000-000000000001").unwrap(),
        email: "kody@example.com".to_owned(),
        username: "kody".to_owned(),
        name: Some("Kody".to_owned()),
        created_at: now,
        updated_at: now,
    }
}

pub fn test_totp() -> TotpConfig {
    TotpConfig {
        secret: "JBSWY3DPEHPK3PXPJBSWY3DPEHPK3PXP".to_owned(),
        algorithm: TotpAlgorithm::Sha256,
        digits: 6,
        period_secs: 600,
        char_set: "ABCDEFGHJKLMNPQRSTUVWXYZ123456789".to_owned(),
    }
}

/// An unexpired challenge for (target, kind) backed by [`test_totp`].
pub fn active_verification(kind: VerificationKind, target: &str) -> Verification {
    let now = Utc::now();
    let expires_at = match kind {
        VerificationKind::TwoFactor => None,
        _ => Some(now + Duration::seconds(600)),
    };
    Verification {
        id: Uuid::new_v4(),
        kind,
        target: target.to_owned(),
        totp: test_totp(),
        created_at: now,
        expires_at,
    }
}

/// A challenge whose expiry is already in the past.
pub fn expired_verification(kind: VerificationKind, target: &str) -> Verification {
    let mut verification = active_verification(kind, target);
    verification.expires_at = Some(Utc::now() - Duration::seconds(30));
    verification
}

pub fn test_session(user_id: Uuid) -> Session {
    let now = Utc::now();
    Session {
        id: Uuid::new_v4(),
        user_id,
        created_at: now,
        updated_at: now,
        expires_at: now + Duration::seconds(SESSION_TTL_SECS),
        verified_at: None,
    }
}
