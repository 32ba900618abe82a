/// Task and sub-task endpoints
///
/// All task routes are project-scoped and sit behind the same
/// authenticate → authorize pipeline as the project routes: reads need any
/// project role, task mutations need admin or project_admin, and a plain
/// member may only toggle sub-task completion.
///
/// # Endpoints
///
/// - `GET    /api/v1/projects/:project_id/tasks` - List tasks
/// - `POST   /api/v1/projects/:project_id/tasks` - Create a task
/// - `GET    /api/v1/projects/:project_id/tasks/:task_id` - Task with assignee + subtasks
/// - `PUT    /api/v1/projects/:project_id/tasks/:task_id` - Update
/// - `DELETE /api/v1/projects/:project_id/tasks/:task_id` - Delete
/// - `POST   /api/v1/projects/:project_id/tasks/:task_id/subtasks` - Add sub-task
/// - `PUT    /api/v1/projects/:project_id/tasks/:task_id/subtasks/:subtask_id` - Update sub-task
/// - `DELETE /api/v1/projects/:project_id/tasks/:task_id/subtasks/:subtask_id` - Delete sub-task
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
    authorization::{require_project_role, ANY_ROLE, TASK_MANAGERS},
    middleware::AuthContext,
};
use taskcamp_shared::models::{
    member::ProjectRole,
    project::Project,
    subtask::SubTask,
    task::{Attachment, CreateTask, Task, TaskStatus, TaskWithAssignee, UpdateTask},
};
use uuid::Uuid;
use validator::Validate;

/// Create-task request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    /// Task title
    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"))]
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Assignee user ID
    pub assigned_to: Option<Uuid>,

    /// Initial status (defaults to todo)
    #[serde(default = "default_status")]
    pub status: TaskStatus,

    /// Attachments captured at creation
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

fn default_status() -> TaskStatus {
    TaskStatus::Todo
}

/// Update-task request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    /// New title
    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"))]
    pub title: String,

    /// New description
    pub description: Option<String>,

    /// New assignee (absent clears the assignment)
    pub assigned_to: Option<Uuid>,

    /// New status
    pub status: TaskStatus,
}

/// Create-sub-task request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubTaskRequest {
    /// Sub-task title
    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"))]
    pub title: String,
}

/// Update-sub-task request
///
/// Both fields are optional; omitted fields keep their current value. A
/// plain member may only change `isCompleted`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubTaskRequest {
    /// New title
    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"))]
    pub title: Option<String>,

    /// New completion flag
    pub is_completed: Option<bool>,
}

/// Task list response
#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    /// Outcome description
    pub message: String,

    /// Tasks with assignee profile fields
    pub tasks: Vec<TaskWithAssignee>,
}

/// Single-task response
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    /// Outcome description
    pub message: String,

    /// The task
    pub task: Task,
}

/// Enriched task response: assignee fields plus sub-tasks
#[derive(Debug, Serialize)]
pub struct TaskDetailResponse {
    /// Outcome description
    pub message: String,

    /// The task with assignee profile fields
    pub task: TaskWithAssignee,

    /// The task's sub-tasks
    pub subtasks: Vec<SubTask>,
}

/// Single-sub-task response
#[derive(Debug, Serialize)]
pub struct SubTaskResponse {
    /// Outcome description
    pub message: String,

    /// The sub-task
    pub subtask: SubTask,
}

/// Bare message response
#[derive(Debug, Serialize)]
pub struct MessageOnly {
    /// Outcome description
    pub message: String,
}

/// Asserts the project exists, 404 otherwise
async fn require_project_exists(state: &AppState, project_id: Uuid) -> ApiResult<()> {
    Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(())
}

/// Loads a task and checks it belongs to the project in the path
async fn require_task_in_project(
    state: &AppState,
    project_id: Uuid,
    task_id: Uuid,
) -> ApiResult<Task> {
    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    if task.project_id != project_id {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    Ok(task)
}

/// Lists a project's tasks (any project role)
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<TaskListResponse>> {
    require_project_role(&state.db, project_id, auth.user_id, ANY_ROLE).await?;
    require_project_exists(&state, project_id).await?;

    let tasks = Task::list_by_project(&state.db, project_id).await?;

    Ok(Json(TaskListResponse {
        message: "Tasks fetched successfully".to_string(),
        tasks,
    }))
}

/// Creates a task (admin or project_admin)
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<impl IntoResponse> {
    require_project_role(&state.db, project_id, auth.user_id, TASK_MANAGERS).await?;
    require_project_exists(&state, project_id).await?;

    req.validate().map_err(ApiError::from_validation_errors)?;

    let task = Task::create(
        &state.db,
        CreateTask {
            project_id,
            title: req.title,
            description: req.description,
            assigned_to: req.assigned_to,
            assigned_by: auth.user_id,
            status: req.status,
            attachments: req.attachments,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(TaskResponse {
            message: "Task created successfully".to_string(),
            task,
        }),
    ))
}

/// Fetches a task with its assignee fields and sub-tasks (any role)
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, task_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<TaskDetailResponse>> {
    require_project_role(&state.db, project_id, auth.user_id, ANY_ROLE).await?;
    require_task_in_project(&state, project_id, task_id).await?;

    let task = Task::find_with_assignee(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let subtasks = SubTask::list_by_task(&state.db, task_id).await?;

    Ok(Json(TaskDetailResponse {
        message: "Task fetched successfully".to_string(),
        task,
        subtasks,
    }))
}

/// Updates a task (admin or project_admin)
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, task_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    require_project_role(&state.db, project_id, auth.user_id, TASK_MANAGERS).await?;
    require_task_in_project(&state, project_id, task_id).await?;

    req.validate().map_err(ApiError::from_validation_errors)?;

    let task = Task::update(
        &state.db,
        task_id,
        UpdateTask {
            title: req.title,
            description: req.description,
            assigned_to: req.assigned_to,
            status: req.status,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(TaskResponse {
        message: "Task updated successfully".to_string(),
        task,
    }))
}

/// Deletes a task (admin or project_admin); sub-tasks cascade
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, task_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<MessageOnly>> {
    require_project_role(&state.db, project_id, auth.user_id, TASK_MANAGERS).await?;
    require_task_in_project(&state, project_id, task_id).await?;

    let deleted = Task::delete(&state.db, task_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    Ok(Json(MessageOnly {
        message: "Task deleted successfully".to_string(),
    }))
}

/// Creates a sub-task (admin or project_admin)
pub async fn create_subtask(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, task_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<CreateSubTaskRequest>,
) -> ApiResult<impl IntoResponse> {
    require_project_role(&state.db, project_id, auth.user_id, TASK_MANAGERS).await?;
    require_task_in_project(&state, project_id, task_id).await?;

    req.validate().map_err(ApiError::from_validation_errors)?;

    let subtask = SubTask::create(&state.db, task_id, &req.title, auth.user_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubTaskResponse {
            message: "Subtask created successfully".to_string(),
            subtask,
        }),
    ))
}

/// Updates a sub-task
///
/// Admin and project_admin may change anything; a plain member may only
/// toggle the completion flag.
pub async fn update_subtask(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, task_id, subtask_id)): Path<(Uuid, Uuid, Uuid)>,
    Json(req): Json<UpdateSubTaskRequest>,
) -> ApiResult<Json<SubTaskResponse>> {
    let role = require_project_role(&state.db, project_id, auth.user_id, ANY_ROLE).await?;
    require_task_in_project(&state, project_id, task_id).await?;

    req.validate().map_err(ApiError::from_validation_errors)?;

    let existing = SubTask::find_by_id(&state.db, subtask_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Subtask not found".to_string()))?;

    if existing.task_id != task_id {
        return Err(ApiError::NotFound("Subtask not found".to_string()));
    }

    if role == ProjectRole::Member && req.title.is_some() {
        return Err(ApiError::Forbidden(
            "Members may only update subtask completion".to_string(),
        ));
    }

    let title = req.title.unwrap_or(existing.title);
    let is_completed = req.is_completed.unwrap_or(existing.is_completed);

    let subtask = SubTask::update(&state.db, subtask_id, &title, is_completed)
        .await?
        .ok_or_else(|| ApiError::NotFound("Subtask not found".to_string()))?;

    Ok(Json(SubTaskResponse {
        message: "Subtask updated successfully".to_string(),
        subtask,
    }))
}

/// Deletes a sub-task (admin or project_admin)
pub async fn delete_subtask(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, task_id, subtask_id)): Path<(Uuid, Uuid, Uuid)>,
) -> ApiResult<Json<MessageOnly>> {
    require_project_role(&state.db, project_id, auth.user_id, TASK_MANAGERS).await?;
    require_task_in_project(&state, project_id, task_id).await?;

    let existing = SubTask::find_by_id(&state.db, subtask_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Subtask not found".to_string()))?;

    if existing.task_id != task_id {
        return Err(ApiError::NotFound("Subtask not found".to_string()));
    }

    SubTask::delete(&state.db, subtask_id).await?;

    Ok(Json(MessageOnly {
        message: "Subtask deleted successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_task_request_defaults() {
        let json = r#"{"title":"Ship the landing page"}"#;
        let req: CreateTaskRequest = serde_json::from_str(json).unwrap();

        assert_eq!(req.status, TaskStatus::Todo);
        assert!(req.attachments.is_empty());
        assert!(req.assigned_to.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_task_request_with_attachments() {
        let json = r#"{
            "title": "Review design",
            "status": "in_progress",
            "attachments": [
                {"url": "https://files.example.com/mock.png", "mimeType": "image/png", "sizeBytes": 1024}
            ]
        }"#;
        let req: CreateTaskRequest = serde_json::from_str(json).unwrap();

        assert_eq!(req.status, TaskStatus::InProgress);
        assert_eq!(req.attachments.len(), 1);
        assert_eq!(req.attachments[0].mime_type, "image/png");
    }

    #[test]
    fn test_title_length_enforced() {
        let req = CreateTaskRequest {
            title: "x".repeat(101),
            description: None,
            assigned_to: None,
            status: TaskStatus::Todo,
            attachments: vec![],
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_subtask_request_partial() {
        let json = r#"{"isCompleted":true}"#;
        let req: UpdateSubTaskRequest = serde_json::from_str(json).unwrap();

        assert_eq!(req.is_completed, Some(true));
        assert!(req.title.is_none());
        assert!(req.validate().is_ok());
    }
}
