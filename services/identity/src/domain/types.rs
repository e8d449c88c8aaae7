use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::totp::TotpConfig;

/// Session lifetime in seconds (30 days).
pub const SESSION_TTL_SECS: i64 = 60 * 60 * 24 * 30;

/// How long a 2FA check stays fresh before sensitive actions demand a new one
/// (2 hours).
pub const REVERIFY_WINDOW_SECS: i64 = 60 * 60 * 2;

/// Lifetime of emailed one-time codes (10 minutes).
pub const VERIFICATION_TTL_SECS: u64 = 60 * 10;

/// Time step for authenticator-app codes.
pub const TWO_FACTOR_PERIOD_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// When the session last passed a 2FA check. `None` until the first check.
    pub verified_at: Option<DateTime<Utc>>,
}

/// The closed set of verification flows. Adding a flow means adding a variant
/// and a dispatch arm; an unknown kind cannot reach the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerificationKind {
    ResetPassword,
    Onboarding,
    ChangeEmail,
    #[serde(rename = "2fa")]
    TwoFactor,
}

impl VerificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ResetPassword => "reset-password",
            Self::Onboarding => "onboarding",
            Self::ChangeEmail => "change-email",
            Self::TwoFactor => "2fa",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "reset-password" => Some(Self::ResetPassword),
            "onboarding" => Some(Self::Onboarding),
            "change-email" => Some(Self::ChangeEmail),
            "2fa" => Some(Self::TwoFactor),
            _ => None,
        }
    }

    /// Whether the code is delivered out of band (email) rather than read from
    /// an authenticator app.
    pub fn is_delivered(self) -> bool {
        !matches!(self, Self::TwoFactor)
    }
}

impl fmt::Display for VerificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pending (or, for 2FA, standing) one-time-code challenge. At most one row
/// exists per (target, kind) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub id: Uuid,
    pub kind: VerificationKind,
    pub target: String,
    pub totp: TotpConfig,
    pub created_at: DateTime<Utc>,
    /// `None` for 2FA enrollments, which live until explicitly removed.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Event row written in the same transaction as the state change it reports.
/// A relay delivers these out of band.
#[derive(Debug, Clone)]
pub struct OutboxEvent {
    pub id: Uuid,
    pub kind: String,
    pub payload: serde_json::Value,
    pub idempotency_key: String,
}

/// A parsed `action:entity` or `action:entity:access,access` permission
/// string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionData {
    pub action: String,
    pub entity: String,
    /// `None` means any access level satisfies the check.
    pub access: Option<Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid permission string: {0}")]
pub struct InvalidPermissionString(pub String);

impl FromStr for PermissionData {
    type Err = InvalidPermissionString;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut parts = value.splitn(3, ':');
        let action = parts.next().unwrap_or_default();
        let entity = parts.next().unwrap_or_default();
        if action.is_empty() || entity.is_empty() {
            return Err(InvalidPermissionString(value.to_owned()));
        }
        let access = parts.next().map(|raw| {
            raw.split(',')
                .filter(|part| !part.is_empty())
                .map(str::to_owned)
                .collect::<Vec<_>>()
        });
        if access.as_ref().is_some_and(Vec::is_empty) {
            return Err(InvalidPermissionString(value.to_owned()));
        }
        Ok(Self {
            action: action.to_owned(),
            entity: entity.to_owned(),
            access,
        })
    }
}

impl fmt::Display for PermissionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.action, self.entity)?;
        if let Some(access) = &self.access {
            write!(f, ":{}", access.join(","))?;
        }
        Ok(())
    }
}
