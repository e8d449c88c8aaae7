//! Time-based one-time password engine.
//!
//! Codes are derived HOTP-style: HMAC over the big-endian time counter, dynamic
//! truncation to a 31-bit integer, then repeated mod/div by the charset length
//! to produce `digits` symbols. The default charset omits `0`, `O` and `I` so
//! codes survive being read aloud or retyped from an email.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use data_encoding::BASE32_NOPAD;
use hmac::{Hmac, Mac};
use rand::RngExt;
use sha1::Sha1;
use sha2::{Sha256, Sha512};

pub const DEFAULT_CHAR_SET: &str = "ABCDEFGHJKLMNPQRSTUVWXYZ123456789";
pub const DEFAULT_DIGITS: u32 = 6;
pub const DEFAULT_PERIOD_SECS: u64 = 30;

/// Secret length in base32 symbols (160 bits of entropy).
const SECRET_SYMBOLS: usize = 32;

/// Accept codes from the previous and next time step to absorb clock skew and
/// the delay between code generation and submission.
const SKEW_STEPS: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotpAlgorithm {
    Sha1,
    Sha256,
    Sha512,
}

impl TotpAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sha1 => "SHA-1",
            Self::Sha256 => "SHA-256",
            Self::Sha512 => "SHA-512",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "SHA-1" => Some(Self::Sha1),
            "SHA-256" => Some(Self::Sha256),
            "SHA-512" => Some(Self::Sha512),
            _ => None,
        }
    }
}

impl fmt::Display for TotpAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to re-derive a code later. Persisted alongside the
/// verification record so a code can be checked on a different node than the
/// one that generated it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotpConfig {
    /// Base32 (RFC 4648, no padding) encoded secret.
    pub secret: String,
    pub algorithm: TotpAlgorithm,
    pub digits: u32,
    pub period_secs: u64,
    pub char_set: String,
}

impl TotpConfig {
    /// Fresh config with a random secret and the given time step.
    pub fn generate(period_secs: u64) -> Self {
        Self {
            secret: random_secret(),
            algorithm: TotpAlgorithm::Sha256,
            digits: DEFAULT_DIGITS,
            period_secs,
            char_set: DEFAULT_CHAR_SET.to_owned(),
        }
    }

    /// The code valid right now.
    pub fn current_code(&self) -> String {
        self.code_at(now_secs())
    }

    /// The code valid at the given unix timestamp.
    pub fn code_at(&self, unix_secs: u64) -> String {
        let Ok(secret) = BASE32_NOPAD.decode(self.secret.as_bytes()) else {
            return String::new();
        };
        let counter = unix_secs / self.period_secs.max(1);
        self.hotp(&secret, counter)
    }

    /// Whether `code` is valid right now. Malformed input is a mismatch, never
    /// an error.
    pub fn verify(&self, code: &str) -> bool {
        self.verify_at(code, now_secs())
    }

    /// Whether `code` is valid at the given unix timestamp, tolerating
    /// [`SKEW_STEPS`] time steps in either direction.
    pub fn verify_at(&self, code: &str, unix_secs: u64) -> bool {
        let Ok(secret) = BASE32_NOPAD.decode(self.secret.as_bytes()) else {
            return false;
        };
        let counter = (unix_secs / self.period_secs.max(1)) as i64;
        let mut matched = false;
        for step in -SKEW_STEPS..=SKEW_STEPS {
            let Ok(candidate_counter) = u64::try_from(counter + step) else {
                continue;
            };
            let candidate = self.hotp(&secret, candidate_counter);
            // No early exit: every window is checked so timing does not reveal
            // which one matched.
            matched |= constant_time_eq(candidate.as_bytes(), code.as_bytes());
        }
        matched
    }

    /// `otpauth://` provisioning URI for authenticator apps.
    pub fn auth_uri(&self, issuer: &str, account: &str) -> String {
        let label: String = url::form_urlencoded::byte_serialize(
            format!("{issuer}:{account}").as_bytes(),
        )
        .collect();
        // Authenticator apps expect the algorithm name without the dash.
        let algorithm = self.algorithm.as_str().replace('-', "");
        let query: String = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("secret", &self.secret)
            .append_pair("issuer", issuer)
            .append_pair("algorithm", &algorithm)
            .append_pair("digits", &self.digits.to_string())
            .append_pair("period", &self.period_secs.to_string())
            .finish();
        format!("otpauth://totp/{label}?{query}")
    }

    fn hotp(&self, secret: &[u8], counter: u64) -> String {
        let message = counter.to_be_bytes();
        // HMAC accepts keys of any length, so new_from_slice cannot fail here.
        let digest: Vec<u8> = match self.algorithm {
            TotpAlgorithm::Sha1 => {
                let mut mac = Hmac::<Sha1>::new_from_slice(secret)
                    .expect("HMAC accepts keys of any length");
                mac.update(&message);
                mac.finalize().into_bytes().to_vec()
            }
            TotpAlgorithm::Sha256 => {
                let mut mac = Hmac::<Sha256>::new_from_slice(secret)
                    .expect("HMAC accepts keys of any length");
                mac.update(&message);
                mac.finalize().into_bytes().to_vec()
            }
            TotpAlgorithm::Sha512 => {
                let mut mac = Hmac::<Sha512>::new_from_slice(secret)
                    .expect("HMAC accepts keys of any length");
                mac.update(&message);
                mac.finalize().into_bytes().to_vec()
            }
        };
        let offset = (digest[digest.len() - 1] & 0xf) as usize;
        let mut value = u32::from_be_bytes([
            digest[offset] & 0x7f,
            digest[offset + 1],
            digest[offset + 2],
            digest[offset + 3],
        ]);
        let symbols: Vec<char> = self.char_set.chars().collect();
        let radix = symbols.len() as u32;
        let mut code = String::with_capacity(self.digits as usize);
        for _ in 0..self.digits {
            code.push(symbols[(value % radix) as usize]);
            value /= radix;
        }
        code
    }
}

fn random_secret() -> String {
    const BASE32_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";
    let mut rng = rand::rng();
    (0..SECRET_SYMBOLS)
        .map(|_| BASE32_ALPHABET[rng.random_range(0..BASE32_ALPHABET.len())] as char)
        .collect()
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before UNIX epoch")
        .as_secs()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
