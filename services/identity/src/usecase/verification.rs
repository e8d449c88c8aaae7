use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::domain::repository::{SessionRepository, VerificationRepository};
use crate::domain::types::{
    OutboxEvent, REVERIFY_WINDOW_SECS, Session, TWO_FACTOR_PERIOD_SECS, VERIFICATION_TTL_SECS,
    Verification, VerificationKind,
};
use crate::error::IdentityError;
use crate::totp::TotpConfig;

/// Relative `/verify` URL for a challenge, with the destination to land on
/// after a successful check.
pub fn verify_path(kind: VerificationKind, target: &str, redirect_to: Option<&str>) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query.append_pair("type", kind.as_str());
    query.append_pair("target", target);
    if let Some(dest) = redirect_to {
        query.append_pair("redirectTo", dest);
    }
    format!("/verify?{}", query.finish())
}

async fn check_code<V: VerificationRepository>(
    verifications: &V,
    code: &str,
    kind: VerificationKind,
    target: &str,
) -> Result<bool, IdentityError> {
    // An absent challenge and an expired one answer the same way. Telling the
    // caller which it was would leak whether a challenge ever existed.
    let Some(verification) = verifications.find_active(target, kind).await? else {
        return Ok(false);
    };
    Ok(verification.totp.verify(code))
}

// ── Prepare ───────────────────────────────────────────────────────────────────

/// Bounds for a caller-supplied code validity window.
pub const MIN_PERIOD_SECS: u64 = 30;
pub const MAX_PERIOD_SECS: u64 = 3600;

pub struct PrepareVerificationInput {
    pub kind: VerificationKind,
    pub target: String,
    pub redirect_to: Option<String>,
    /// Requested validity window in seconds. Clamped to
    /// [`MIN_PERIOD_SECS`]..=[`MAX_PERIOD_SECS`]; ignored for 2FA, whose
    /// codes always roll every [`TWO_FACTOR_PERIOD_SECS`].
    pub period_secs: Option<u64>,
}

pub struct PreparedVerification {
    pub otp: String,
    pub verify_url: String,
    pub verification: Verification,
}

pub struct PrepareVerificationUseCase<V>
where
    V: VerificationRepository,
{
    pub verifications: V,
    /// External origin of the app, used to build absolute verify URLs for
    /// delivery.
    pub public_origin: String,
}

impl<V> PrepareVerificationUseCase<V>
where
    V: VerificationRepository,
{
    pub async fn execute(
        &self,
        input: PrepareVerificationInput,
    ) -> Result<PreparedVerification, IdentityError> {
        let period_secs = if input.kind.is_delivered() {
            // Emailed codes stay valid for the whole delivery window.
            input
                .period_secs
                .unwrap_or(VERIFICATION_TTL_SECS)
                .clamp(MIN_PERIOD_SECS, MAX_PERIOD_SECS)
        } else {
            TWO_FACTOR_PERIOD_SECS
        };
        let totp = TotpConfig::generate(period_secs);
        let otp = totp.current_code();
        let now = Utc::now();
        // 2FA enrollments have no expiry; they stand until explicitly removed.
        let expires_at = input
            .kind
            .is_delivered()
            .then(|| now + Duration::seconds(period_secs as i64));
        let verification = Verification {
            id: Uuid::new_v4(),
            kind: input.kind,
            target: input.target.clone(),
            totp,
            created_at: now,
            expires_at,
        };

        let path = verify_path(input.kind, &input.target, input.redirect_to.as_deref());
        let verify_url = format!("{}{path}", self.public_origin.trim_end_matches('/'));

        if input.kind.is_delivered() {
            let event = OutboxEvent {
                id: Uuid::new_v4(),
                kind: "verification_code_issued".to_owned(),
                payload: json!({
                    "kind": input.kind,
                    "target": input.target,
                    "code": otp,
                    "verifyUrl": verify_url,
                }),
                idempotency_key: format!("verification_code_issued:{}", verification.id),
            };
            self.verifications
                .upsert_with_outbox(&verification, &event)
                .await?;
        } else {
            self.verifications.upsert(&verification).await?;
        }

        Ok(PreparedVerification {
            otp,
            verify_url,
            verification,
        })
    }
}

// ── Check ─────────────────────────────────────────────────────────────────────

/// Read-only code check. Leaves the challenge in place.
pub struct CheckCodeUseCase<V>
where
    V: VerificationRepository,
{
    pub verifications: V,
}

impl<V> CheckCodeUseCase<V>
where
    V: VerificationRepository,
{
    pub async fn execute(
        &self,
        code: &str,
        kind: VerificationKind,
        target: &str,
    ) -> Result<bool, IdentityError> {
        check_code(&self.verifications, code, kind, target).await
    }
}

// ── Consume ───────────────────────────────────────────────────────────────────

/// Where to send the caller after a successful verification.
#[derive(Debug, PartialEq, Eq)]
pub struct VerifyOutcome {
    pub redirect_to: String,
}

/// Per-kind continuation after a code checks out. One method per
/// [`VerificationKind`] variant; the dispatcher matches on the enum, so an
/// unhandled kind is a compile error.
pub trait VerificationFlows: Send + Sync {
    async fn reset_password(
        &self,
        target: &str,
        redirect_to: Option<&str>,
    ) -> Result<VerifyOutcome, IdentityError>;

    async fn onboarding(
        &self,
        target: &str,
        redirect_to: Option<&str>,
    ) -> Result<VerifyOutcome, IdentityError>;

    async fn change_email(
        &self,
        target: &str,
        redirect_to: Option<&str>,
    ) -> Result<VerifyOutcome, IdentityError>;

    async fn two_factor(
        &self,
        target: &str,
        session_id: Option<Uuid>,
        redirect_to: Option<&str>,
    ) -> Result<VerifyOutcome, IdentityError>;
}

pub struct ConsumeVerificationInput {
    pub code: String,
    pub kind: VerificationKind,
    pub target: String,
    pub redirect_to: Option<String>,
    /// The caller's session, needed by the 2FA flow to stamp freshness.
    pub session_id: Option<Uuid>,
}

pub struct ConsumeVerificationUseCase<V, F>
where
    V: VerificationRepository,
    F: VerificationFlows,
{
    pub verifications: V,
    pub flows: F,
}

impl<V, F> ConsumeVerificationUseCase<V, F>
where
    V: VerificationRepository,
    F: VerificationFlows,
{
    pub async fn execute(
        &self,
        input: ConsumeVerificationInput,
    ) -> Result<VerifyOutcome, IdentityError> {
        let valid = check_code(&self.verifications, &input.code, input.kind, &input.target).await?;
        if !valid {
            return Err(IdentityError::InvalidCode);
        }

        // One-shot kinds burn the challenge before the flow runs, so a second
        // submit of the same code fails even if the flow itself errors. The
        // standing 2FA enrollment must survive its own checks.
        if input.kind.is_delivered() {
            self.verifications.delete(&input.target, input.kind).await?;
        }

        let redirect_to = input.redirect_to.as_deref();
        match input.kind {
            VerificationKind::ResetPassword => {
                self.flows.reset_password(&input.target, redirect_to).await
            }
            VerificationKind::Onboarding => self.flows.onboarding(&input.target, redirect_to).await,
            VerificationKind::ChangeEmail => {
                self.flows.change_email(&input.target, redirect_to).await
            }
            VerificationKind::TwoFactor => {
                self.flows
                    .two_factor(&input.target, input.session_id, redirect_to)
                    .await
            }
        }
    }
}

/// Production flows: hand the browser the next page of each funnel and, for
/// 2FA, stamp the session.
pub struct RedirectFlows<S>
where
    S: SessionRepository,
{
    pub sessions: S,
}

impl<S> VerificationFlows for RedirectFlows<S>
where
    S: SessionRepository,
{
    async fn reset_password(
        &self,
        target: &str,
        _redirect_to: Option<&str>,
    ) -> Result<VerifyOutcome, IdentityError> {
        let query: String = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("target", target)
            .finish();
        Ok(VerifyOutcome {
            redirect_to: format!("/reset-password?{query}"),
        })
    }

    async fn onboarding(
        &self,
        target: &str,
        _redirect_to: Option<&str>,
    ) -> Result<VerifyOutcome, IdentityError> {
        let query: String = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("email", target)
            .finish();
        Ok(VerifyOutcome {
            redirect_to: format!("/onboarding?{query}"),
        })
    }

    async fn change_email(
        &self,
        _target: &str,
        redirect_to: Option<&str>,
    ) -> Result<VerifyOutcome, IdentityError> {
        Ok(VerifyOutcome {
            redirect_to: redirect_to.unwrap_or("/settings/profile").to_owned(),
        })
    }

    async fn two_factor(
        &self,
        _target: &str,
        session_id: Option<Uuid>,
        redirect_to: Option<&str>,
    ) -> Result<VerifyOutcome, IdentityError> {
        if let Some(session_id) = session_id {
            self.sessions.mark_verified(session_id).await?;
        }
        Ok(VerifyOutcome {
            redirect_to: redirect_to.unwrap_or("/").to_owned(),
        })
    }
}

// ── Recent-verification gate ──────────────────────────────────────────────────

/// Guard in front of sensitive actions. Accounts without 2FA pass through;
/// accounts with 2FA must have passed a check within the freshness window.
pub struct RequireRecentVerificationUseCase<V>
where
    V: VerificationRepository,
{
    pub verifications: V,
}

impl<V> RequireRecentVerificationUseCase<V>
where
    V: VerificationRepository,
{
    pub async fn execute(&self, session: &Session, return_to: &str) -> Result<(), IdentityError> {
        let target = session.user_id.to_string();
        if !self
            .verifications
            .exists(&target, VerificationKind::TwoFactor)
            .await?
        {
            return Ok(());
        }
        let fresh = session.verified_at.is_some_and(|at| {
            Utc::now().signed_duration_since(at) < Duration::seconds(REVERIFY_WINDOW_SECS)
        });
        if fresh {
            return Ok(());
        }
        // The standing enrollment secret is what gets checked; no new
        // challenge is issued here.
        Err(IdentityError::ReverificationRequired {
            verify_url: verify_path(VerificationKind::TwoFactor, &target, Some(return_to)),
        })
    }
}

// ── 2FA enrollment ────────────────────────────────────────────────────────────

pub struct TwoFactorEnrollment {
    pub secret: String,
    pub otp_auth_uri: String,
}

/// Create (or replace) the standing 2FA challenge for a user. The secret only
/// leaves the server here, once, for the authenticator app to capture.
pub struct EnrollTwoFactorUseCase<V>
where
    V: VerificationRepository,
{
    pub verifications: V,
    pub issuer: String,
}

impl<V> EnrollTwoFactorUseCase<V>
where
    V: VerificationRepository,
{
    pub async fn execute(
        &self,
        user_id: Uuid,
        account_name: &str,
    ) -> Result<TwoFactorEnrollment, IdentityError> {
        let totp = TotpConfig::generate(TWO_FACTOR_PERIOD_SECS);
        let verification = Verification {
            id: Uuid::new_v4(),
            kind: VerificationKind::TwoFactor,
            target: user_id.to_string(),
            totp,
            created_at: Utc::now(),
            // Stands until the user removes it.
            expires_at: None,
        };
        self.verifications.upsert(&verification).await?;
        let otp_auth_uri = verification.totp.auth_uri(&self.issuer, account_name);
        Ok(TwoFactorEnrollment {
            secret: verification.totp.secret,
            otp_auth_uri,
        })
    }
}

/// Drop the standing 2FA challenge. Idempotent.
pub struct RemoveTwoFactorUseCase<V>
where
    V: VerificationRepository,
{
    pub verifications: V,
}

impl<V> RemoveTwoFactorUseCase<V>
where
    V: VerificationRepository,
{
    pub async fn execute(&self, user_id: Uuid) -> Result<(), IdentityError> {
        self.verifications
            .delete(&user_id.to_string(), VerificationKind::TwoFactor)
            .await?;
        Ok(())
    }
}
