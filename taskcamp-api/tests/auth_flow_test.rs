/// Integration tests for the authentication lifecycle
///
/// Register → verify → login → refresh rotation → logout, plus the
/// password flows. These tests drive the full router; they skip (and pass
/// vacuously) when DATABASE_URL is not set.
mod common;

use axum::http::StatusCode;
use chrono::Duration;
use common::{body_json, send_json, signup_and_login, unique_suffix, TestContext};
use serde_json::json;
use taskcamp_shared::auth::one_time;
use taskcamp_shared::models::user::User;

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let suffix = unique_suffix();
    let username = format!("dup{suffix}");
    let email = format!("dup-{suffix}@example.com");
    let body = json!({ "username": username, "email": email, "password": "secret1" });

    let response = send_json(&ctx.app, "POST", "/api/v1/auth/register", Some(body.clone()), None).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // Same username and email
    let response = send_json(&ctx.app, "POST", "/api/v1/auth/register", Some(body), None).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Same email, different username
    let response = send_json(
        &ctx.app,
        "POST",
        "/api/v1/auth/register",
        Some(json!({
            "username": format!("other{suffix}"),
            "email": email,
            "password": "secret1",
        })),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["statusCode"], 409);
}

#[tokio::test]
async fn test_register_response_is_sanitized() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let suffix = unique_suffix();
    let response = send_json(
        &ctx.app,
        "POST",
        "/api/v1/auth/register",
        Some(json!({
            "username": format!("alice{suffix}"),
            "email": format!("alice-{suffix}@example.com"),
            "password": "secret1",
            "fullName": "Alice Lovelace",
        })),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["user"]["fullName"], "Alice Lovelace");
    assert_eq!(body["user"]["emailVerified"], false);

    let rendered = body.to_string();
    assert!(!rendered.contains("password"));
    assert!(!rendered.contains("refreshToken"));
    assert!(!rendered.contains("argon2"));
}

#[tokio::test]
async fn test_login_and_current_user_scenario() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let suffix = unique_suffix();
    let email = format!("alice-{suffix}@example.com");
    send_json(
        &ctx.app,
        "POST",
        "/api/v1/auth/register",
        Some(json!({
            "username": format!("alice{suffix}"),
            "email": email,
            "password": "secret1",
        })),
        None,
    )
    .await;

    // Unknown email looks up nothing
    let response = send_json(
        &ctx.app,
        "POST",
        "/api/v1/auth/login",
        Some(json!({ "email": format!("nobody-{suffix}@example.com"), "password": "secret1" })),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Wrong password
    let response = send_json(
        &ctx.app,
        "POST",
        "/api/v1/auth/login",
        Some(json!({ "email": email, "password": "wrong" })),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["statusCode"], 401);

    // Correct password sets both cookies
    let response = send_json(
        &ctx.app,
        "POST",
        "/api/v1/auth/login",
        Some(json!({ "email": email, "password": "secret1" })),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let access = common::response_cookie(&response, "accessToken").unwrap();
    let refresh = common::response_cookie(&response, "refreshToken").unwrap();
    assert!(!access.is_empty());
    assert!(!refresh.is_empty());

    let set_cookie_raw: Vec<String> = response
        .headers()
        .get_all(axum::http::header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    for cookie in &set_cookie_raw {
        assert!(cookie.contains("HttpOnly"), "auth cookies must be HttpOnly");
    }

    // Without a cookie the protected route never runs
    let response = send_json(&ctx.app, "GET", "/api/v1/auth/current-user", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // With the cookie we get the sanitized profile back
    let response = send_json(
        &ctx.app,
        "GET",
        "/api/v1/auth/current-user",
        None,
        Some(&format!("accessToken={access}")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["user"]["email"], email.as_str());
    let rendered = body.to_string();
    assert!(!rendered.contains("password"));
    assert!(!rendered.contains("argon2"));
}

#[tokio::test]
async fn test_login_ignores_username_field() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let user = signup_and_login(&ctx, "uname").await;

    // A bogus username alongside the right email still logs in: the
    // lookup key is the email, nothing else.
    let response = send_json(
        &ctx.app,
        "POST",
        "/api/v1/auth/login",
        Some(json!({
            "email": user.email,
            "password": user.password,
            "username": "somebody-else",
        })),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_rotation_invalidates_previous_token() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let user = signup_and_login(&ctx, "rot").await;
    let first_refresh = user.refresh_token.clone();

    // Rotate
    let response = send_json(
        &ctx.app,
        "POST",
        "/api/v1/auth/refresh-token",
        None,
        Some(&format!("refreshToken={first_refresh}")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let second_refresh = body["refreshToken"].as_str().unwrap().to_string();
    assert_ne!(first_refresh, second_refresh);
    assert!(body["accessToken"].as_str().is_some());

    // The pre-rotation token no longer matches the stored value
    let response = send_json(
        &ctx.app,
        "POST",
        "/api/v1/auth/refresh-token",
        None,
        Some(&format!("refreshToken={first_refresh}")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The rotated token still works
    let response = send_json(
        &ctx.app,
        "POST",
        "/api/v1/auth/refresh-token",
        None,
        Some(&format!("refreshToken={second_refresh}")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_token_accepted_in_body() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let user = signup_and_login(&ctx, "body").await;

    let response = send_json(
        &ctx.app,
        "POST",
        "/api/v1/auth/refresh-token",
        Some(json!({ "refreshToken": user.refresh_token })),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_revokes_refresh_and_clears_cookies() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let user = signup_and_login(&ctx, "out").await;

    let response = send_json(
        &ctx.app,
        "POST",
        "/api/v1/auth/logout",
        None,
        Some(&user.cookies()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Cookies are expired on the way out
    let cleared: Vec<String> = response
        .headers()
        .get_all(axum::http::header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert!(cleared.iter().all(|c| c.contains("Max-Age=0")));

    // Every refresh token issued before logout is dead
    let response = send_json(
        &ctx.app,
        "POST",
        "/api/v1/auth/refresh-token",
        None,
        Some(&format!("refreshToken={}", user.refresh_token)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_verify_email_succeeds_exactly_once() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let user = signup_and_login(&ctx, "ver").await;

    // Stand in for the emailed link: issue a token straight onto the row
    let issued = one_time::generate_one_time_token();
    User::set_email_verification_token(&ctx.db, user.id, &issued.token_hash, issued.expires_at)
        .await
        .unwrap();

    let uri = format!("/api/v1/auth/verify-email/{}", issued.token);
    let response = send_json(&ctx.app, "GET", &uri, None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let verified = User::find_by_id(&ctx.db, user.id).await.unwrap().unwrap();
    assert!(verified.email_verified);
    assert!(verified.email_verification_token_hash.is_none());
    assert!(verified.email_verification_expires_at.is_none());

    // Replay fails: the stored hash was cleared on consumption
    let response = send_json(&ctx.app, "GET", &uri, None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_verification_token_rejected() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let user = signup_and_login(&ctx, "exp").await;

    // Correct hash, but the expiry filter makes it invisible
    let issued = one_time::generate_with_ttl(Duration::minutes(-5));
    User::set_email_verification_token(&ctx.db, user.id, &issued.token_hash, issued.expires_at)
        .await
        .unwrap();

    let uri = format!("/api/v1/auth/verify-email/{}", issued.token);
    let response = send_json(&ctx.app, "GET", &uri, None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let user_row = User::find_by_id(&ctx.db, user.id).await.unwrap().unwrap();
    assert!(!user_row.email_verified);
}

#[tokio::test]
async fn test_password_reset_flow() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let user = signup_and_login(&ctx, "rst").await;

    // Issue the reset token through the endpoint, then plant a known one
    let response = send_json(
        &ctx.app,
        "POST",
        "/api/v1/auth/forgot-password",
        Some(json!({ "email": user.email })),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let issued = one_time::generate_one_time_token();
    User::set_password_reset_token(&ctx.db, user.id, &issued.token_hash, issued.expires_at)
        .await
        .unwrap();

    let uri = format!("/api/v1/auth/reset-password/{}", issued.token);
    let response = send_json(
        &ctx.app,
        "POST",
        &uri,
        Some(json!({ "newPassword": "brand-new-pass" })),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // The token is spent
    let response = send_json(
        &ctx.app,
        "POST",
        &uri,
        Some(json!({ "newPassword": "another-pass" })),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Old password is gone, new one works
    let response = send_json(
        &ctx.app,
        "POST",
        "/api/v1/auth/login",
        Some(json!({ "email": user.email, "password": user.password })),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send_json(
        &ctx.app,
        "POST",
        "/api/v1/auth/login",
        Some(json!({ "email": user.email, "password": "brand-new-pass" })),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_forgot_password_unknown_email() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let response = send_json(
        &ctx.app,
        "POST",
        "/api/v1/auth/forgot-password",
        Some(json!({ "email": format!("ghost-{}@example.com", unique_suffix()) })),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_change_password_requires_matching_old_password() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let user = signup_and_login(&ctx, "chg").await;

    let response = send_json(
        &ctx.app,
        "POST",
        "/api/v1/auth/change-password",
        Some(json!({ "oldPassword": "wrong", "newPassword": "next-secret" })),
        Some(&user.cookies()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send_json(
        &ctx.app,
        "POST",
        "/api/v1/auth/change-password",
        Some(json!({ "oldPassword": user.password, "newPassword": "next-secret" })),
        Some(&user.cookies()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send_json(
        &ctx.app,
        "POST",
        "/api/v1/auth/login",
        Some(json!({ "email": user.email, "password": "next-secret" })),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_resend_verification_rejected_when_already_verified() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let user = signup_and_login(&ctx, "rsnd").await;

    // Fresh accounts can request a resend
    let response = send_json(
        &ctx.app,
        "POST",
        "/api/v1/auth/resend-verification",
        None,
        Some(&user.cookies()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Verify, then the resend becomes a bad request
    let row = User::find_by_id(&ctx.db, user.id).await.unwrap().unwrap();
    let hash = row.email_verification_token_hash.unwrap();
    sqlx::query(
        "UPDATE users SET email_verified = TRUE, email_verification_token_hash = NULL WHERE id = $1",
    )
    .bind(user.id)
    .execute(&ctx.db)
    .await
    .unwrap();
    assert!(!hash.is_empty());

    let response = send_json(
        &ctx.app,
        "POST",
        "/api/v1/auth/resend-verification",
        None,
        Some(&user.cookies()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
