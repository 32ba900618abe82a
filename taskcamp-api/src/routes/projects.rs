/// Project and member endpoints
///
/// Every handler here runs behind the authentication layer; project-scoped
/// handlers then resolve the caller's role through
/// [`require_project_role`] before touching any project state. The
/// pipeline per request is authenticate → authorize → handle, each stage
/// returning a result.
///
/// # Endpoints
///
/// - `GET    /api/v1/projects` - The caller's projects (with member count)
/// - `POST   /api/v1/projects` - Create a project (creator becomes admin)
/// - `GET    /api/v1/projects/:project_id` - Fetch one project (any role)
/// - `PUT    /api/v1/projects/:project_id` - Update (admin)
/// - `DELETE /api/v1/projects/:project_id` - Delete (admin)
/// - `GET    /api/v1/projects/:project_id/members` - List members (any role)
/// - `POST   /api/v1/projects/:project_id/members` - Add/upsert member (admin)
/// - `PUT    /api/v1/projects/:project_id/members/:user_id` - Change role (admin)
/// - `DELETE /api/v1/projects/:project_id/members/:user_id` - Remove (admin)
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use taskcamp_shared::auth::{
    authorization::{require_project_role, ADMIN_ONLY, ANY_ROLE},
    middleware::AuthContext,
};
use taskcamp_shared::models::{
    member::{MemberWithUser, ProjectMember, ProjectRole},
    project::{Project, ProjectInput, ProjectWithMembership},
    user::User,
};
use uuid::Uuid;
use validator::Validate;

/// Create/update project request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRequest {
    /// Project name
    #[validate(length(min = 3, max = 50, message = "Project name must be between 3 and 50 characters"))]
    pub name: String,

    /// Optional description
    #[validate(length(max = 200, message = "Description can be up to 200 characters long"))]
    pub description: Option<String>,
}

/// Add-member request
///
/// The target user is identified by email; adding an existing member
/// updates their role in place (upsert).
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    /// Email of the user to add
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    /// Role to assign
    pub role: ProjectRole,
}

/// Role-change request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemberRoleRequest {
    /// New role for the member
    pub new_role: ProjectRole,
}

/// Project list response
#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    /// Outcome description
    pub message: String,

    /// Projects with the caller's role and member count
    pub projects: Vec<ProjectWithMembership>,
}

/// Single-project response
#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    /// Outcome description
    pub message: String,

    /// The project
    pub project: Project,
}

/// Member list response
#[derive(Debug, Serialize)]
pub struct MemberListResponse {
    /// Outcome description
    pub message: String,

    /// Members with their public user fields
    pub members: Vec<MemberWithUser>,
}

/// Single-member response
#[derive(Debug, Serialize)]
pub struct MemberResponse {
    /// Outcome description
    pub message: String,

    /// The membership row
    pub member: ProjectMember,
}

/// Lists the caller's projects with role and member count
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ProjectListResponse>> {
    let projects = Project::list_for_user(&state.db, auth.user_id).await?;

    Ok(Json(ProjectListResponse {
        message: "Projects fetched successfully".to_string(),
        projects,
    }))
}

/// Creates a project; the caller becomes its admin
///
/// The admin membership is written in the same transaction as the project
/// row - this is the only way a project gets its first admin.
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<ProjectRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate().map_err(ApiError::from_validation_errors)?;

    let project = Project::create_with_admin(
        &state.db,
        ProjectInput {
            name: req.name,
            description: req.description,
        },
        auth.user_id,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ProjectResponse {
            message: "Project created successfully".to_string(),
            project,
        }),
    ))
}

/// Fetches one project (any project role)
pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<ProjectResponse>> {
    require_project_role(&state.db, project_id, auth.user_id, ANY_ROLE).await?;

    let project = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(ProjectResponse {
        message: "Project fetched successfully".to_string(),
        project,
    }))
}

/// Updates a project's name/description (admin only)
pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<ProjectRequest>,
) -> ApiResult<Json<ProjectResponse>> {
    require_project_role(&state.db, project_id, auth.user_id, ADMIN_ONLY).await?;

    req.validate().map_err(ApiError::from_validation_errors)?;

    let project = Project::update(
        &state.db,
        project_id,
        ProjectInput {
            name: req.name,
            description: req.description,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(ProjectResponse {
        message: "Project updated successfully".to_string(),
        project,
    }))
}

/// Deletes a project (admin only); members/tasks cascade
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<ProjectResponse>> {
    require_project_role(&state.db, project_id, auth.user_id, ADMIN_ONLY).await?;

    let project = Project::delete(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(ProjectResponse {
        message: "Project deleted successfully".to_string(),
        project,
    }))
}

/// Lists a project's members (any project role)
pub async fn list_members(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<MemberListResponse>> {
    require_project_role(&state.db, project_id, auth.user_id, ANY_ROLE).await?;

    let members = ProjectMember::list_by_project(&state.db, project_id).await?;

    Ok(Json(MemberListResponse {
        message: "Project members fetched successfully".to_string(),
        members,
    }))
}

/// Adds a user (by email) to a project, or updates their role (admin only)
///
/// Upsert semantics: at most one membership row per (project, user);
/// concurrent adds settle on last-write-wins for the role.
pub async fn add_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<impl IntoResponse> {
    require_project_role(&state.db, project_id, auth.user_id, ADMIN_ONLY).await?;

    req.validate().map_err(ApiError::from_validation_errors)?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let member = ProjectMember::upsert(&state.db, project_id, user.id, req.role).await?;

    Ok((
        StatusCode::CREATED,
        Json(MemberResponse {
            message: "Member added to project successfully".to_string(),
            member,
        }),
    ))
}

/// Changes an existing member's role (admin only)
pub async fn update_member_role(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, user_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateMemberRoleRequest>,
) -> ApiResult<Json<MemberResponse>> {
    require_project_role(&state.db, project_id, auth.user_id, ADMIN_ONLY).await?;

    let member = ProjectMember::update_role(&state.db, project_id, user_id, req.new_role)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project member not found".to_string()))?;

    Ok(Json(MemberResponse {
        message: "Member role updated successfully".to_string(),
        member,
    }))
}

/// Removes a member from a project (admin only)
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<MessageOnly>> {
    require_project_role(&state.db, project_id, auth.user_id, ADMIN_ONLY).await?;

    let removed = ProjectMember::delete(&state.db, project_id, user_id).await?;
    if !removed {
        return Err(ApiError::NotFound("Project member not found".to_string()));
    }

    Ok(Json(MessageOnly {
        message: "Project member deleted successfully".to_string(),
    }))
}

/// Bare message response
#[derive(Debug, Serialize)]
pub struct MessageOnly {
    /// Outcome description
    pub message: String,
}
