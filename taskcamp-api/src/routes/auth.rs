/// Authentication endpoints
///
/// The full account lifecycle: register → verify email → login →
/// access/refresh rotation → logout, plus the password flows.
///
/// # Endpoints
///
/// - `POST /api/v1/auth/register` - Create an (unverified) account
/// - `GET  /api/v1/auth/verify-email/:token` - Consume a verification token
/// - `POST /api/v1/auth/resend-verification` - Reissue the verification token
/// - `POST /api/v1/auth/login` - Authenticate, set auth cookies
/// - `POST /api/v1/auth/logout` - Revoke the refresh token, clear cookies
/// - `GET  /api/v1/auth/current-user` - Sanitized profile of the caller
/// - `POST /api/v1/auth/refresh-token` - Rotate the token pair
/// - `POST /api/v1/auth/forgot-password` - Issue a reset token by email
/// - `POST /api/v1/auth/reset-password/:token` - Consume a reset token
/// - `POST /api/v1/auth/change-password` - Authenticated password change
///
/// Tokens ride in `accessToken`/`refreshToken` cookies, HttpOnly and
/// Secure. The refresh token is additionally persisted on the user row;
/// rotation compares the presented token against that stored value, which
/// is what limits each user to a single active session.
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Extension, Path, State},
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Json,
};
use serde::{Deserialize, Serialize};
use taskcamp_shared::auth::{
    jwt,
    middleware::{self as auth_mw, AuthContext},
    one_time, password,
};
use taskcamp_shared::models::user::{CreateUser, User, UserProfile};
use validator::{Validate, ValidationError};

/// Register request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Unique username, 3-20 chars, lowercase
    #[validate(
        length(min = 3, max = 20, message = "Username must be between 3 and 20 characters"),
        custom(function = "validate_lowercase", message = "Username must be in lowercase")
    )]
    pub username: String,

    /// Email address
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    /// Password, at least 6 characters
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,

    /// Optional display name
    #[validate(length(min = 3, max = 50, message = "Full name must be between 3 and 50 characters"))]
    pub full_name: Option<String>,
}

fn validate_lowercase(value: &str) -> Result<(), ValidationError> {
    if value.chars().any(|c| c.is_uppercase()) {
        return Err(ValidationError::new("lowercase"));
    }
    Ok(())
}

/// Login request
///
/// A `username` field is accepted for compatibility but never used for
/// lookup - login resolves the account by email only.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Email address (the lookup key)
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    /// Password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    /// Ignored; see the login handler
    #[allow(dead_code)]
    pub username: Option<String>,
}

/// Refresh request body (fallback when the cookie is absent)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh_token: Option<String>,
}

/// Forgot-password request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    /// Email of the account to reset
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

/// Reset-password request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    /// New password
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub new_password: String,
}

/// Change-password request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    /// Current password
    #[validate(length(min = 1, message = "Old password is required"))]
    pub old_password: String,

    /// New password
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub new_password: String,
}

/// Response carrying a sanitized user
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// Outcome description
    pub message: String,

    /// Sanitized user profile
    pub user: UserProfile,
}

/// Response carrying only a message
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Outcome description
    pub message: String,
}

/// Rotated token pair, also set as cookies
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPairResponse {
    /// New access token
    pub access_token: String,

    /// New refresh token
    pub refresh_token: String,
}

/// Builds an auth cookie
///
/// HttpOnly always; Secure per configuration (disabled only for non-HTTPS
/// dev setups).
fn auth_cookie(name: &str, value: &str, max_age_seconds: i64, secure: bool) -> HeaderValue {
    let mut cookie =
        format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_seconds}");
    if secure {
        cookie.push_str("; Secure");
    }

    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// Builds a cookie that clears `name`
fn clear_cookie(name: &str, secure: bool) -> HeaderValue {
    auth_cookie(name, "", 0, secure)
}

/// Set-Cookie headers for a fresh token pair
fn token_cookies(
    state: &AppState,
    access_token: &str,
    refresh_token: &str,
) -> AppendHeaders<[(axum::http::HeaderName, HeaderValue); 2]> {
    let secure = state.config.api.cookie_secure;

    AppendHeaders([
        (
            SET_COOKIE,
            auth_cookie(
                auth_mw::ACCESS_TOKEN_COOKIE,
                access_token,
                jwt::TokenType::Access.default_expiration().num_seconds(),
                secure,
            ),
        ),
        (
            SET_COOKIE,
            auth_cookie(
                auth_mw::REFRESH_TOKEN_COOKIE,
                refresh_token,
                jwt::TokenType::Refresh.default_expiration().num_seconds(),
                secure,
            ),
        ),
    ])
}

/// Issues a token pair and persists the refresh half on the user row
///
/// The previous refresh token (if any) stops working as soon as the new
/// one is stored.
async fn issue_and_store_tokens(
    state: &AppState,
    user_id: uuid::Uuid,
) -> ApiResult<(String, String)> {
    let (access_token, refresh_token) = jwt::issue_token_pair(user_id, state.jwt_secret())?;
    User::store_refresh_token(&state.db, user_id, &refresh_token).await?;

    Ok((access_token, refresh_token))
}

/// Register a new user
///
/// Creates an unverified account and emails a verification link. The email
/// send is fire-and-forget: a mail failure is logged and the registration
/// still succeeds.
///
/// # Errors
///
/// - `400` validation failed
/// - `409` username or email already in use
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate().map_err(ApiError::from_validation_errors)?;

    if User::find_by_username_or_email(&state.db, &req.username, &req.email)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "Username or email already in use".to_string(),
        ));
    }

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            username: req.username,
            email: req.email,
            password_hash,
            full_name: req.full_name,
        },
    )
    .await?;

    let issued = one_time::generate_one_time_token();
    User::set_email_verification_token(&state.db, user.id, &issued.token_hash, issued.expires_at)
        .await?;

    send_verification_mail(&state, &user, &issued.token);

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            message: "User registered successfully. Please verify your email to activate your account.".to_string(),
            user: user.into(),
        }),
    ))
}

/// Spawns the verification email off the request path
fn send_verification_mail(state: &AppState, user: &User, token: &str) {
    let mailer = state.mailer.clone();
    let email = user.email.clone();
    let username = user.username.clone();
    let verify_url = format!(
        "{}/api/v1/auth/verify-email/{}",
        state.config.api.public_base_url, token
    );

    tokio::spawn(async move {
        mailer
            .send_verification_email(&email, &username, &verify_url)
            .await;
    });
}

/// Consume an email-verification token
///
/// The token is matched by hash with an `expiry > now` filter and cleared
/// in the same statement, so it succeeds exactly once; replays and expired
/// tokens are both unauthorized.
pub async fn verify_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let token_hash = one_time::hash_token(&token);

    User::consume_email_verification_token(&state.db, &token_hash)
        .await?
        .ok_or_else(|| {
            ApiError::Unauthorized("Invalid or expired verification token".to_string())
        })?;

    Ok(Json(MessageResponse {
        message: "Email verified successfully".to_string(),
    }))
}

/// Reissue the verification token for the authenticated caller
pub async fn resend_verification(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MessageResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if user.email_verified {
        return Err(ApiError::BadRequest("Email is already verified".to_string()));
    }

    let issued = one_time::generate_one_time_token();
    User::set_email_verification_token(&state.db, user.id, &issued.token_hash, issued.expires_at)
        .await?;

    send_verification_mail(&state, &user, &issued.token);

    Ok(Json(MessageResponse {
        message: "Verification email resent successfully".to_string(),
    }))
}

/// Login
///
/// Lookup is by email only; a username in the request body is ignored
/// (documented behavior, not an oversight). On success the access/refresh
/// pair is issued, the refresh token is persisted (replacing any previous
/// session's), and both tokens are set as HttpOnly cookies.
///
/// # Errors
///
/// - `404` no account with that email
/// - `401` password mismatch
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate().map_err(ApiError::from_validation_errors)?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let (access_token, refresh_token) = issue_and_store_tokens(&state, user.id).await?;

    Ok((
        token_cookies(&state, &access_token, &refresh_token),
        Json(UserResponse {
            message: "Login successful".to_string(),
            user: user.into(),
        }),
    ))
}

/// Logout
///
/// Clears the persisted refresh token - every refresh token ever issued to
/// this user stops working - and expires both cookies.
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<impl IntoResponse> {
    User::clear_refresh_token(&state.db, auth.user_id).await?;

    let secure = state.config.api.cookie_secure;

    Ok((
        AppendHeaders([
            (SET_COOKIE, clear_cookie(auth_mw::ACCESS_TOKEN_COOKIE, secure)),
            (
                SET_COOKIE,
                clear_cookie(auth_mw::REFRESH_TOKEN_COOKIE, secure),
            ),
        ]),
        Json(MessageResponse {
            message: "Logout successful".to_string(),
        }),
    ))
}

/// Sanitized profile of the authenticated caller
pub async fn current_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UserResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse {
        message: "Current user fetched successfully".to_string(),
        user: user.into(),
    }))
}

/// Rotate the token pair
///
/// The presented refresh token (cookie, or body for non-browser clients)
/// must both verify as a refresh JWT and equal the value persisted on the
/// user row. On success a new pair is issued and the new refresh token is
/// persisted, making the presented one unusable. No state changes on
/// failure.
pub async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<RefreshRequest>>,
) -> ApiResult<impl IntoResponse> {
    let presented = auth_mw::extract_refresh_token(&headers)
        .or_else(|| body.and_then(|Json(b)| b.refresh_token))
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized access".to_string()))?;

    let claims = jwt::validate_refresh_token(&presented, state.jwt_secret())
        .map_err(|_| ApiError::Unauthorized("Invalid or expired refresh token".to_string()))?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invalid refresh token - user not found".to_string()))?;

    let stored = user.refresh_token.as_deref().unwrap_or_default();
    if !one_time::constant_time_compare(&presented, stored) {
        return Err(ApiError::Unauthorized(
            "Refresh token expired. Please login again.".to_string(),
        ));
    }

    let (access_token, refresh_token) = issue_and_store_tokens(&state, user.id).await?;

    Ok((
        token_cookies(&state, &access_token, &refresh_token),
        Json(TokenPairResponse {
            access_token,
            refresh_token,
        }),
    ))
}

/// Issue a password-reset token and email the reset link
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate().map_err(ApiError::from_validation_errors)?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User with this email does not exist".to_string()))?;

    let issued = one_time::generate_one_time_token();
    User::set_password_reset_token(&state.db, user.id, &issued.token_hash, issued.expires_at)
        .await?;

    let mailer = state.mailer.clone();
    let email = user.email.clone();
    let username = user.username.clone();
    let reset_url = format!(
        "{}?token={}",
        state.config.mail.password_reset_url, issued.token
    );

    tokio::spawn(async move {
        mailer
            .send_password_reset_email(&email, &username, &reset_url)
            .await;
    });

    Ok(Json(MessageResponse {
        message: "Password reset email sent successfully".to_string(),
    }))
}

/// Consume a password-reset token and set the new password
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate().map_err(ApiError::from_validation_errors)?;

    let token_hash = one_time::hash_token(&token);
    let new_password_hash = password::hash_password(&req.new_password)?;

    User::consume_password_reset_token(&state.db, &token_hash, &new_password_hash)
        .await?
        .ok_or_else(|| {
            ApiError::Unauthorized("Invalid or expired password reset token".to_string())
        })?;

    Ok(Json(MessageResponse {
        message: "Password reset successfully".to_string(),
    }))
}

/// Authenticated password change
///
/// # Errors
///
/// - `401` old password does not match
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate().map_err(ApiError::from_validation_errors)?;

    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let valid = password::verify_password(&req.old_password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Old password is incorrect".to_string(),
        ));
    }

    let new_password_hash = password::hash_password(&req.new_password)?;
    User::update_password(&state.db, user.id, &new_password_hash).await?;

    Ok(Json(MessageResponse {
        message: "Password changed successfully".to_string(),
    }))
}
