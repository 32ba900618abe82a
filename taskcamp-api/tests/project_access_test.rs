/// Integration tests for project authorization and CRUD
///
/// Exercises the role gate end-to-end: non-members are forbidden, members
/// are forbidden from admin operations, and promotions take effect on the
/// next request. Skips (passing vacuously) when DATABASE_URL is not set.
mod common;

use axum::http::StatusCode;
use common::{body_json, create_project, send_json, signup_and_login, TestContext};
use serde_json::json;

#[tokio::test]
async fn test_role_gate_and_promotion() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let alice = signup_and_login(&ctx, "palice").await;
    let bob = signup_and_login(&ctx, "pbob").await;

    let project_id = create_project(&ctx, &alice, "Launch Plan").await;
    let project_uri = format!("/api/v1/projects/{project_id}");
    let update_body = json!({ "name": "Launch Plan v2" });

    // Bob has no membership row: forbidden
    let response = send_json(
        &ctx.app,
        "PUT",
        &project_uri,
        Some(update_body.clone()),
        Some(&bob.cookies()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["statusCode"], 403);

    // Alice adds Bob as a plain member - still not enough for updates
    let response = send_json(
        &ctx.app,
        "POST",
        &format!("{project_uri}/members"),
        Some(json!({ "email": bob.email, "role": "member" })),
        Some(&alice.cookies()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send_json(
        &ctx.app,
        "PUT",
        &project_uri,
        Some(update_body.clone()),
        Some(&bob.cookies()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Reads are fine for a member
    let response = send_json(&ctx.app, "GET", &project_uri, None, Some(&bob.cookies())).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Promote Bob to admin: the same call now succeeds
    let response = send_json(
        &ctx.app,
        "PUT",
        &format!("{project_uri}/members/{}", bob.id),
        Some(json!({ "newRole": "admin" })),
        Some(&alice.cookies()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send_json(
        &ctx.app,
        "PUT",
        &project_uri,
        Some(update_body),
        Some(&bob.cookies()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["project"]["name"], "Launch Plan v2");
}

#[tokio::test]
async fn test_unauthenticated_requests_never_reach_handlers() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let alice = signup_and_login(&ctx, "uauth").await;
    let project_id = create_project(&ctx, &alice, "Secret Plan").await;

    for (method, uri) in [
        ("GET", "/api/v1/projects".to_string()),
        ("GET", format!("/api/v1/projects/{project_id}")),
        ("PUT", format!("/api/v1/projects/{project_id}")),
        ("DELETE", format!("/api/v1/projects/{project_id}")),
        ("GET", format!("/api/v1/projects/{project_id}/members")),
    ] {
        let body = if method == "PUT" {
            Some(json!({ "name": "Nope" }))
        } else {
            None
        };
        let response = send_json(&ctx.app, method, &uri, body, None).await;
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "{method} {uri} must require authentication"
        );
    }
}

#[tokio::test]
async fn test_member_add_is_an_upsert() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let alice = signup_and_login(&ctx, "upal").await;
    let bob = signup_and_login(&ctx, "upbob").await;
    let project_id = create_project(&ctx, &alice, "Upsert Check").await;
    let members_uri = format!("/api/v1/projects/{project_id}/members");

    for role in ["member", "project_admin"] {
        let response = send_json(
            &ctx.app,
            "POST",
            &members_uri,
            Some(json!({ "email": bob.email, "role": role })),
            Some(&alice.cookies()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = send_json(&ctx.app, "GET", &members_uri, None, Some(&alice.cookies())).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let members = body["members"].as_array().unwrap();

    // Alice (creator/admin) + Bob, exactly once each
    assert_eq!(members.len(), 2);

    let bob_rows: Vec<_> = members
        .iter()
        .filter(|m| m["userId"] == bob.id.to_string())
        .collect();
    assert_eq!(bob_rows.len(), 1);
    // Second add won: last write wins on role
    assert_eq!(bob_rows[0]["role"], "project_admin");
}

#[tokio::test]
async fn test_project_listing_includes_role_and_member_count() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let alice = signup_and_login(&ctx, "lsal").await;
    let bob = signup_and_login(&ctx, "lsbob").await;
    let project_id = create_project(&ctx, &alice, "Listing Check").await;

    send_json(
        &ctx.app,
        "POST",
        &format!("/api/v1/projects/{project_id}/members"),
        Some(json!({ "email": bob.email, "role": "member" })),
        Some(&alice.cookies()),
    )
    .await;

    let response = send_json(&ctx.app, "GET", "/api/v1/projects", None, Some(&alice.cookies())).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let listing = body["projects"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["id"] == project_id.to_string())
        .expect("created project appears in the listing")
        .clone();

    assert_eq!(listing["role"], "admin");
    assert_eq!(listing["memberCount"], 2);

    // Bob sees it too, as a member
    let response = send_json(&ctx.app, "GET", "/api/v1/projects", None, Some(&bob.cookies())).await;
    let body = body_json(response).await;
    let listing = body["projects"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["id"] == project_id.to_string())
        .expect("membership makes the project visible")
        .clone();
    assert_eq!(listing["role"], "member");
}

#[tokio::test]
async fn test_member_removal_revokes_access() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let alice = signup_and_login(&ctx, "rmal").await;
    let bob = signup_and_login(&ctx, "rmbob").await;
    let project_id = create_project(&ctx, &alice, "Removal Check").await;

    send_json(
        &ctx.app,
        "POST",
        &format!("/api/v1/projects/{project_id}/members"),
        Some(json!({ "email": bob.email, "role": "member" })),
        Some(&alice.cookies()),
    )
    .await;

    let response = send_json(
        &ctx.app,
        "GET",
        &format!("/api/v1/projects/{project_id}"),
        None,
        Some(&bob.cookies()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send_json(
        &ctx.app,
        "DELETE",
        &format!("/api/v1/projects/{project_id}/members/{}", bob.id),
        None,
        Some(&alice.cookies()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // No membership row, no access
    let response = send_json(
        &ctx.app,
        "GET",
        &format!("/api/v1/projects/{project_id}"),
        None,
        Some(&bob.cookies()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_task_permissions_by_role() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let alice = signup_and_login(&ctx, "tkal").await;
    let bob = signup_and_login(&ctx, "tkbob").await;
    let project_id = create_project(&ctx, &alice, "Task Roles").await;
    let tasks_uri = format!("/api/v1/projects/{project_id}/tasks");

    send_json(
        &ctx.app,
        "POST",
        &format!("/api/v1/projects/{project_id}/members"),
        Some(json!({ "email": bob.email, "role": "member" })),
        Some(&alice.cookies()),
    )
    .await;

    // Admin creates a task
    let response = send_json(
        &ctx.app,
        "POST",
        &tasks_uri,
        Some(json!({ "title": "Draft announcement", "assignedTo": bob.id })),
        Some(&alice.cookies()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let task = body_json(response).await;
    let task_id = task["task"]["id"].as_str().unwrap().to_string();

    // A plain member cannot create tasks
    let response = send_json(
        &ctx.app,
        "POST",
        &tasks_uri,
        Some(json!({ "title": "Rogue task" })),
        Some(&bob.cookies()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // But can read them, with the assignee join populated
    let response = send_json(&ctx.app, "GET", &tasks_uri, None, Some(&bob.cookies())).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let tasks = body["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["assigneeUsername"], bob.username.as_str());

    // Admin adds a subtask; the member may toggle completion...
    let response = send_json(
        &ctx.app,
        "POST",
        &format!("{tasks_uri}/{task_id}/subtasks"),
        Some(json!({ "title": "Collect quotes" })),
        Some(&alice.cookies()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let subtask = body_json(response).await;
    let subtask_id = subtask["subtask"]["id"].as_str().unwrap().to_string();

    let subtask_uri = format!("{tasks_uri}/{task_id}/subtasks/{subtask_id}");
    let response = send_json(
        &ctx.app,
        "PUT",
        &subtask_uri,
        Some(json!({ "isCompleted": true })),
        Some(&bob.cookies()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["subtask"]["isCompleted"], true);

    // ...but not rename it
    let response = send_json(
        &ctx.app,
        "PUT",
        &subtask_uri,
        Some(json!({ "title": "Renamed" })),
        Some(&bob.cookies()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Task detail includes subtasks
    let response = send_json(
        &ctx.app,
        "GET",
        &format!("{tasks_uri}/{task_id}"),
        None,
        Some(&alice.cookies()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["subtasks"].as_array().unwrap().len(), 1);

    // Member cannot delete; admin can
    let response = send_json(
        &ctx.app,
        "DELETE",
        &format!("{tasks_uri}/{task_id}"),
        None,
        Some(&bob.cookies()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send_json(
        &ctx.app,
        "DELETE",
        &format!("{tasks_uri}/{task_id}"),
        None,
        Some(&alice.cookies()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_task_ids_are_scoped_to_their_project() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let alice = signup_and_login(&ctx, "scal").await;
    let project_a = create_project(&ctx, &alice, "Project A").await;
    let project_b = create_project(&ctx, &alice, "Project B").await;

    let response = send_json(
        &ctx.app,
        "POST",
        &format!("/api/v1/projects/{project_a}/tasks"),
        Some(json!({ "title": "Only in A" })),
        Some(&alice.cookies()),
    )
    .await;
    let task = body_json(response).await;
    let task_id = task["task"]["id"].as_str().unwrap().to_string();

    // Reaching A's task through B's path is a 404, not a leak
    let response = send_json(
        &ctx.app,
        "GET",
        &format!("/api/v1/projects/{project_b}/tasks/{task_id}"),
        None,
        Some(&alice.cookies()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
