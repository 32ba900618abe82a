/// Project model and database operations
///
/// Projects are created by an authenticated user who becomes the project's
/// admin in the same operation (see [`Project::create_with_admin`]); that
/// implicit membership is the only way a project gets its first admin.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(50) NOT NULL,
///     description VARCHAR(200),
///     created_by UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::member::ProjectRole;

/// Project model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique project ID
    pub id: Uuid,

    /// Project name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Creator's user ID
    pub created_by: Uuid,

    /// When the project was created
    pub created_at: DateTime<Utc>,

    /// When the project was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or updating a project
#[derive(Debug, Clone)]
pub struct ProjectInput {
    /// Project name
    pub name: String,

    /// Optional description
    pub description: Option<String>,
}

/// A project as seen from one user's membership, with member count
///
/// This is the enriched listing read: the caller's role on the project plus
/// how many members it has.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectWithMembership {
    /// Project ID
    pub id: Uuid,

    /// Project name
    pub name: String,

    /// Project description
    pub description: Option<String>,

    /// Creator's user ID
    pub created_by: Uuid,

    /// The caller's role on this project
    pub role: ProjectRole,

    /// Number of members on the project
    pub member_count: i64,

    /// When the project was created
    pub created_at: DateTime<Utc>,

    /// When the project was last updated
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Creates a project and its creator's admin membership
    ///
    /// Both rows are written in one transaction so a project can never
    /// exist without an admin.
    pub async fn create_with_admin(
        pool: &PgPool,
        data: ProjectInput,
        created_by: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let project = sqlx::query_as::<_, Project>(
            "INSERT INTO projects (name, description, created_by)
             VALUES ($1, $2, $3)
             RETURNING id, name, description, created_by, created_at, updated_at",
        )
        .bind(data.name)
        .bind(data.description)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO project_members (project_id, user_id, role)
             VALUES ($1, $2, $3)",
        )
        .bind(project.id)
        .bind(created_by)
        .bind(ProjectRole::Admin)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(project)
    }

    /// Finds a project by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            "SELECT id, name, description, created_by, created_at, updated_at
             FROM projects
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Updates a project's name and description
    ///
    /// Returns `None` when the project does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: ProjectInput,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            "UPDATE projects
             SET name = $2, description = $3, updated_at = NOW()
             WHERE id = $1
             RETURNING id, name, description, created_by, created_at, updated_at",
        )
        .bind(id)
        .bind(data.name)
        .bind(data.description)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a project, returning the deleted row
    ///
    /// Memberships, tasks, and subtasks go with it via ON DELETE CASCADE.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            "DELETE FROM projects
             WHERE id = $1
             RETURNING id, name, description, created_by, created_at, updated_at",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Lists the projects a user belongs to, with role and member count
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<ProjectWithMembership>, sqlx::Error> {
        sqlx::query_as::<_, ProjectWithMembership>(
            "SELECT p.id, p.name, p.description, p.created_by,
                    pm.role,
                    (SELECT COUNT(*) FROM project_members m
                     WHERE m.project_id = p.id) AS member_count,
                    p.created_at, p.updated_at
             FROM project_members pm
             JOIN projects p ON p.id = pm.project_id
             WHERE pm.user_id = $1
             ORDER BY p.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
