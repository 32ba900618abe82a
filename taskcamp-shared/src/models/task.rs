/// Task model and database operations
///
/// Tasks belong to a project and carry an optional assignee, a status, and
/// a list of attachments stored as JSONB on the row.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('todo', 'in_progress', 'done');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     title VARCHAR(100) NOT NULL,
///     description TEXT,
///     assigned_to UUID REFERENCES users(id) ON DELETE SET NULL,
///     assigned_by UUID NOT NULL REFERENCES users(id),
///     status task_status NOT NULL DEFAULT 'todo',
///     attachments JSONB NOT NULL DEFAULT '[]',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started
    Todo,

    /// Being worked on
    InProgress,

    /// Finished
    Done,
}

impl TaskStatus {
    /// Status as its wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }
}

/// File attached to a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Where the file is served from
    pub url: String,

    /// MIME type as uploaded
    pub mime_type: String,

    /// Size in bytes
    pub size_bytes: u64,
}

/// Task model
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Owning project
    pub project_id: Uuid,

    /// Task title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Assignee, if any
    pub assigned_to: Option<Uuid>,

    /// Who created/assigned the task
    pub assigned_by: Uuid,

    /// Lifecycle status
    pub status: TaskStatus,

    /// Attached files
    pub attachments: Json<Vec<Attachment>>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct CreateTask {
    /// Owning project
    pub project_id: Uuid,

    /// Task title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Assignee, if any
    pub assigned_to: Option<Uuid>,

    /// Creator
    pub assigned_by: Uuid,

    /// Initial status
    pub status: TaskStatus,

    /// Attachments captured at creation
    pub attachments: Vec<Attachment>,
}

/// Input for updating a task
#[derive(Debug, Clone)]
pub struct UpdateTask {
    /// New title
    pub title: String,

    /// New description
    pub description: Option<String>,

    /// New assignee (None clears it)
    pub assigned_to: Option<Uuid>,

    /// New status
    pub status: TaskStatus,
}

/// Task joined with its assignee's public profile fields
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TaskWithAssignee {
    /// Task ID
    pub id: Uuid,

    /// Owning project
    pub project_id: Uuid,

    /// Task title
    pub title: String,

    /// Description
    pub description: Option<String>,

    /// Assignee user ID
    pub assigned_to: Option<Uuid>,

    /// Creator user ID
    pub assigned_by: Uuid,

    /// Status
    pub status: TaskStatus,

    /// Attachments
    pub attachments: Json<Vec<Attachment>>,

    /// Assignee's username (when assigned)
    pub assignee_username: Option<String>,

    /// Assignee's display name (when assigned)
    pub assignee_full_name: Option<String>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a task
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            "INSERT INTO tasks (project_id, title, description, assigned_to, assigned_by, status, attachments)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id, project_id, title, description, assigned_to, assigned_by,
                       status, attachments, created_at, updated_at",
        )
        .bind(data.project_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.assigned_to)
        .bind(data.assigned_by)
        .bind(data.status)
        .bind(Json(data.attachments))
        .fetch_one(pool)
        .await
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            "SELECT id, project_id, title, description, assigned_to, assigned_by,
                    status, attachments, created_at, updated_at
             FROM tasks
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a task joined with its assignee's profile fields
    pub async fn find_with_assignee(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<TaskWithAssignee>, sqlx::Error> {
        sqlx::query_as::<_, TaskWithAssignee>(
            "SELECT t.id, t.project_id, t.title, t.description, t.assigned_to, t.assigned_by,
                    t.status, t.attachments,
                    u.username AS assignee_username,
                    u.full_name AS assignee_full_name,
                    t.created_at, t.updated_at
             FROM tasks t
             LEFT JOIN users u ON u.id = t.assigned_to
             WHERE t.id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Lists a project's tasks with assignee profile fields
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<TaskWithAssignee>, sqlx::Error> {
        sqlx::query_as::<_, TaskWithAssignee>(
            "SELECT t.id, t.project_id, t.title, t.description, t.assigned_to, t.assigned_by,
                    t.status, t.attachments,
                    u.username AS assignee_username,
                    u.full_name AS assignee_full_name,
                    t.created_at, t.updated_at
             FROM tasks t
             LEFT JOIN users u ON u.id = t.assigned_to
             WHERE t.project_id = $1
             ORDER BY t.created_at DESC",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Updates a task
    ///
    /// Returns `None` when the task does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            "UPDATE tasks
             SET title = $2, description = $3, assigned_to = $4, status = $5, updated_at = NOW()
             WHERE id = $1
             RETURNING id, project_id, title, description, assigned_to, assigned_by,
                       status, attachments, created_at, updated_at",
        )
        .bind(id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.assigned_to)
        .bind(data.status)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a task (subtasks cascade)
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
