/// Identity service configuration loaded from environment variables.
#[derive(Debug)]
pub struct IdentityConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// External origin of the app (e.g. "https://notes.example.com").
    pub public_origin: String,
    /// Cookie domain attribute (root domain, e.g. "example.com").
    pub cookie_domain: String,
    /// Issuer label for authenticator-app provisioning URIs.
    pub totp_issuer: String,
    /// TCP port to listen on (default 3114). Env var: `IDENTITY_PORT`.
    pub identity_port: u16,
}

impl IdentityConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            public_origin: std::env::var("PUBLIC_ORIGIN").expect("PUBLIC_ORIGIN"),
            cookie_domain: std::env::var("COOKIE_DOMAIN").expect("COOKIE_DOMAIN"),
            totp_issuer: std::env::var("TOTP_ISSUER").unwrap_or_else(|_| "Inkpad".to_owned()),
            identity_port: std::env::var("IDENTITY_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3114),
        }
    }
}
