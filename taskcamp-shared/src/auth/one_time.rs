/// One-time tokens for email verification and password reset
///
/// A one-time token is a single-use, expiring credential. The plaintext is
/// sent to the user (in a verification or reset link) exactly once; only its
/// SHA-256 hash and an expiry timestamp are persisted on the user record.
/// Verification re-hashes the presented token and looks it up by
/// `hash = $1 AND expiry > now()`, so an expired token is indistinguishable
/// from one that never existed.
///
/// # Example
///
/// ```
/// use taskcamp_shared::auth::one_time::{generate_one_time_token, hash_token};
///
/// let issued = generate_one_time_token();
///
/// // `issued.token` goes into the email; `issued.token_hash` and
/// // `issued.expires_at` go into the database.
/// assert_eq!(issued.token_hash, hash_token(&issued.token));
/// assert_ne!(issued.token, issued.token_hash);
/// ```
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Number of random bytes in a token (hex-encoded to double the length)
const TOKEN_BYTES: usize = 32;

/// How long a freshly issued token stays valid
const TOKEN_TTL_MINUTES: i64 = 20;

/// A freshly issued one-time token
///
/// `token` is the plaintext to deliver to the user. `token_hash` and
/// `expires_at` are what gets persisted; the plaintext must never be.
#[derive(Debug, Clone)]
pub struct OneTimeToken {
    /// Plaintext token (hex, 64 chars) - email it, do not store it
    pub token: String,

    /// SHA-256 hash of the token (hex, 64 chars) - store this
    pub token_hash: String,

    /// Expiry timestamp - store alongside the hash
    pub expires_at: DateTime<Utc>,
}

/// Generates a one-time token with the default 20 minute lifetime
pub fn generate_one_time_token() -> OneTimeToken {
    generate_with_ttl(Duration::minutes(TOKEN_TTL_MINUTES))
}

/// Generates a one-time token with a caller-chosen lifetime
pub fn generate_with_ttl(ttl: Duration) -> OneTimeToken {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);

    let token = hex::encode(bytes);
    let token_hash = hash_token(&token);

    OneTimeToken {
        token,
        token_hash,
        expires_at: Utc::now() + ttl,
    }
}

/// Hashes a token with SHA-256
///
/// Returns the hex-encoded digest (64 characters). Deterministic, so the
/// lookup key for a presented token is just `hash_token(presented)`.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Verifies a presented token against a stored hash
///
/// Comparison is constant-time over the full hash length.
pub fn verify_token(presented: &str, stored_hash: &str) -> bool {
    constant_time_compare(&hash_token(presented), stored_hash)
}

/// Constant-time string comparison
///
/// Accumulates differences with bitwise OR instead of short-circuiting, so
/// the comparison time does not depend on where the strings diverge.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}
