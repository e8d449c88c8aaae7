use sea_orm::entity::prelude::*;

/// Pending verification challenge: a TOTP configuration bound to a
/// (target, kind) pair. Unique on (target, kind) — preparing a new challenge
/// for the same pair replaces the previous one.
///
/// `expires_at` is nullable: two-factor enrollments live until explicitly
/// deleted, everything else carries `created_at + period`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "verifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Wire value of `VerificationKind` (e.g. "onboarding", "2fa").
    pub kind: String,
    /// What is being verified: an email address or a user id.
    pub target: String,
    /// Base32 TOTP secret.
    pub secret: String,
    pub algorithm: String,
    pub digits: i32,
    /// Validity window of one code, in seconds.
    pub period: i64,
    pub char_set: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
