/// User model and database operations
///
/// Users carry their credential state directly on the row: the Argon2id
/// password hash, the email-verified flag, the currently active refresh
/// token (one per user - a new login silently replaces the previous
/// session's), and the hashed one-time tokens for email verification and
/// password reset.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     username VARCHAR(20) NOT NULL UNIQUE,
///     email CITEXT NOT NULL UNIQUE,
///     full_name VARCHAR(100),
///     avatar_url VARCHAR(512),
///     password_hash VARCHAR(255) NOT NULL,
///     email_verified BOOLEAN NOT NULL DEFAULT FALSE,
///     refresh_token TEXT,
///     email_verification_token_hash VARCHAR(64),
///     email_verification_expires_at TIMESTAMPTZ,
///     password_reset_token_hash VARCHAR(64),
///     password_reset_expires_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Username/email uniqueness is enforced by the database at write time; a
/// violation surfaces as a unique-constraint error that the API maps to a
/// 409 conflict.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// All user columns, in schema order, for RETURNING/SELECT lists
const USER_COLUMNS: &str = "id, username, email, full_name, avatar_url, password_hash, \
     email_verified, refresh_token, email_verification_token_hash, \
     email_verification_expires_at, password_reset_token_hash, \
     password_reset_expires_at, created_at, updated_at";

/// User model representing a user account
///
/// Never serialize this struct to an API response - use [`UserProfile`],
/// which strips the credential fields.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Unique username (lowercase, 3-20 chars)
    pub username: String,

    /// Email address (case-insensitive via CITEXT), unique
    pub email: String,

    /// Optional display name
    pub full_name: Option<String>,

    /// Optional avatar URL
    pub avatar_url: Option<String>,

    /// Argon2id password hash, never plaintext
    pub password_hash: String,

    /// Whether the email address has been verified
    pub email_verified: bool,

    /// Currently active refresh token
    ///
    /// NULL when logged out. Refresh requests are only honored while the
    /// presented token equals this value, which is what makes rotation
    /// invalidate the previous token.
    pub refresh_token: Option<String>,

    /// SHA-256 hash of the outstanding email-verification token
    pub email_verification_token_hash: Option<String>,

    /// Expiry of the email-verification token
    pub email_verification_expires_at: Option<DateTime<Utc>>,

    /// SHA-256 hash of the outstanding password-reset token
    pub password_reset_token_hash: Option<String>,

    /// Expiry of the password-reset token
    pub password_reset_expires_at: Option<DateTime<Utc>>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Unique username
    pub username: String,

    /// Unique email address
    pub email: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,

    /// Optional display name
    pub full_name: Option<String>,
}

/// Sanitized user representation for API responses
///
/// Contains no password hash, no refresh token, and no one-time token
/// fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// User ID
    pub id: Uuid,

    /// Username
    pub username: String,

    /// Email address
    pub email: String,

    /// Display name
    pub full_name: Option<String>,

    /// Avatar URL
    pub avatar_url: Option<String>,

    /// Whether the email has been verified
    pub email_verified: bool,

    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            avatar_url: user.avatar_url,
            email_verified: user.email_verified,
            created_at: user.created_at,
        }
    }
}

impl User {
    /// Creates a new (unverified) user
    ///
    /// # Errors
    ///
    /// Returns a unique-constraint violation if the username or email is
    /// already taken, which callers map to a conflict response.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (username, email, password_hash, full_name)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(data.username)
            .bind(data.email)
            .bind(data.password_hash)
            .bind(data.full_name)
            .fetch_one(pool)
            .await
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email address (case-insensitive via CITEXT)
    ///
    /// Email is the only login lookup key; the login request may also carry
    /// a username, but it is never used for lookup.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user holding either the given username or the given email
    ///
    /// Used by registration to report a conflict before attempting the
    /// insert; the unique constraints remain the real guard against races.
    pub async fn find_by_username_or_email(
        pool: &PgPool,
        username: &str,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1 OR email = $2");

        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Persists a newly issued refresh token, replacing any previous one
    ///
    /// The previous session's refresh token stops working the moment this
    /// commits, because refresh compares against the stored value.
    pub async fn store_refresh_token(
        pool: &PgPool,
        id: Uuid,
        refresh_token: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(refresh_token)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Clears the stored refresh token (logout)
    pub async fn clear_refresh_token(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token = NULL, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Stores a new email-verification token hash and expiry
    pub async fn set_email_verification_token(
        pool: &PgPool,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users
             SET email_verification_token_hash = $2,
                 email_verification_expires_at = $3,
                 updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Consumes an email-verification token
    ///
    /// Single atomic statement: marks the email verified and clears the
    /// token fields for the user whose stored hash matches AND whose token
    /// has not expired. An expired token matches nothing, making it
    /// indistinguishable from an absent one, and a consumed token cannot be
    /// replayed because the hash is gone.
    pub async fn consume_email_verification_token(
        pool: &PgPool,
        token_hash: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE users
             SET email_verified = TRUE,
                 email_verification_token_hash = NULL,
                 email_verification_expires_at = NULL,
                 updated_at = NOW()
             WHERE email_verification_token_hash = $1
               AND email_verification_expires_at > NOW()
             RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(token_hash)
            .fetch_optional(pool)
            .await
    }

    /// Stores a new password-reset token hash and expiry
    pub async fn set_password_reset_token(
        pool: &PgPool,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users
             SET password_reset_token_hash = $2,
                 password_reset_expires_at = $3,
                 updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Consumes a password-reset token, setting the new password hash
    ///
    /// Same shape as [`Self::consume_email_verification_token`]: hash and
    /// expiry filter plus clearing of the token fields in one statement, so
    /// a reset token works exactly once.
    pub async fn consume_password_reset_token(
        pool: &PgPool,
        token_hash: &str,
        new_password_hash: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE users
             SET password_hash = $2,
                 password_reset_token_hash = NULL,
                 password_reset_expires_at = NULL,
                 updated_at = NOW()
             WHERE password_reset_token_hash = $1
               AND password_reset_expires_at > NOW()
             RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(token_hash)
            .bind(new_password_hash)
            .fetch_optional(pool)
            .await
    }

    /// Replaces the password hash (authenticated change-password flow)
    pub async fn update_password(
        pool: &PgPool,
        id: Uuid,
        new_password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(new_password_hash)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            full_name: Some("Alice Lovelace".to_string()),
            avatar_url: None,
            password_hash: "$argon2id$secret".to_string(),
            email_verified: false,
            refresh_token: Some("some.refresh.token".to_string()),
            email_verification_token_hash: Some("abc".to_string()),
            email_verification_expires_at: Some(Utc::now()),
            password_reset_token_hash: None,
            password_reset_expires_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_profile_strips_credential_fields() {
        let profile = UserProfile::from(sample_user());
        let json = serde_json::to_value(&profile).unwrap();
        let object = json.as_object().unwrap();

        assert_eq!(object["username"], "alice");
        assert_eq!(object["email"], "alice@example.com");
        assert_eq!(object["fullName"], "Alice Lovelace");
        assert_eq!(object["emailVerified"], false);

        // No secret material may appear in any serialized form
        let rendered = json.to_string();
        assert!(!rendered.contains("password"));
        assert!(!rendered.contains("refresh"));
        assert!(!rendered.contains("argon2id"));
        assert!(!rendered.contains("Token"));
    }

    #[test]
    fn test_profile_uses_camel_case_keys() {
        let profile = UserProfile::from(sample_user());
        let json = serde_json::to_value(&profile).unwrap();
        let object = json.as_object().unwrap();

        assert!(object.contains_key("fullName"));
        assert!(object.contains_key("avatarUrl"));
        assert!(object.contains_key("emailVerified"));
        assert!(object.contains_key("createdAt"));
        assert!(!object.contains_key("full_name"));
    }

    #[test]
    fn test_user_columns_cover_the_struct() {
        // Keep the column list in sync with the struct fields
        assert_eq!(USER_COLUMNS.split(',').count(), 14);
    }
}
