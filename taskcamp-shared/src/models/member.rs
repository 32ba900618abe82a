/// Project membership model and roles
///
/// A membership row is the sole authorization fact for project operations:
/// one row per (project, user) pair, carrying a role from the closed
/// [`ProjectRole`] set. Adding a member who is already on the project
/// upserts the row instead of duplicating it - concurrent adds resolve to
/// last-write-wins on the role, relying on the database's atomic
/// `ON CONFLICT` handling rather than application locking.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE project_role AS ENUM ('admin', 'project_admin', 'member');
///
/// CREATE TABLE project_members (
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role project_role NOT NULL DEFAULT 'member',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (project_id, user_id)
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Roles a user can hold within one specific project
///
/// This is a per-project permission level, not a global one. The project
/// creator is written as `Admin` at creation time; every other assignment
/// goes through the member-management endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectRole {
    /// Full control over the project: settings, members, deletion
    Admin,

    /// Can manage tasks but not project settings or members
    ProjectAdmin,

    /// Regular member
    Member,
}

impl ProjectRole {
    /// Role as its wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectRole::Admin => "admin",
            ProjectRole::ProjectAdmin => "project_admin",
            ProjectRole::Member => "member",
        }
    }

    /// Parses a role from its wire string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(ProjectRole::Admin),
            "project_admin" => Some(ProjectRole::ProjectAdmin),
            "member" => Some(ProjectRole::Member),
            _ => None,
        }
    }
}

/// Membership row: a user's role on a project
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMember {
    /// Project ID
    pub project_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role within the project
    pub role: ProjectRole,

    /// When the membership was created
    pub created_at: DateTime<Utc>,

    /// When the membership was last changed
    pub updated_at: DateTime<Utc>,
}

/// Membership enriched with the member's public user fields
///
/// Produced by the member-listing join; exposes no credential fields.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MemberWithUser {
    /// Project ID
    pub project_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role within the project
    pub role: ProjectRole,

    /// Member's username
    pub username: String,

    /// Member's email
    pub email: String,

    /// Member's display name
    pub full_name: Option<String>,

    /// Member's avatar URL
    pub avatar_url: Option<String>,

    /// When the membership was created
    pub created_at: DateTime<Utc>,
}

impl ProjectMember {
    /// Inserts or updates a membership (upsert)
    ///
    /// At most one row per (project, user): a second add for the same pair
    /// updates the role in place. Races between concurrent adds settle on
    /// whichever write lands last.
    pub async fn upsert(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
        role: ProjectRole,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ProjectMember>(
            "INSERT INTO project_members (project_id, user_id, role)
             VALUES ($1, $2, $3)
             ON CONFLICT (project_id, user_id)
             DO UPDATE SET role = EXCLUDED.role, updated_at = NOW()
             RETURNING project_id, user_id, role, created_at, updated_at",
        )
        .bind(project_id)
        .bind(user_id)
        .bind(role)
        .fetch_one(pool)
        .await
    }

    /// Finds a specific membership
    pub async fn find(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectMember>(
            "SELECT project_id, user_id, role, created_at, updated_at
             FROM project_members
             WHERE project_id = $1 AND user_id = $2",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Resolves a user's role on a project
    ///
    /// `None` means no membership row exists - the caller is not on the
    /// project at all.
    pub async fn get_role(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ProjectRole>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT role FROM project_members WHERE project_id = $1 AND user_id = $2",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Updates an existing member's role
    ///
    /// Returns `None` when no membership row exists; this never creates
    /// one (that is what [`Self::upsert`] is for).
    pub async fn update_role(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
        role: ProjectRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectMember>(
            "UPDATE project_members
             SET role = $3, updated_at = NOW()
             WHERE project_id = $1 AND user_id = $2
             RETURNING project_id, user_id, role, created_at, updated_at",
        )
        .bind(project_id)
        .bind(user_id)
        .bind(role)
        .fetch_optional(pool)
        .await
    }

    /// Removes a member from a project
    pub async fn delete(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM project_members WHERE project_id = $1 AND user_id = $2")
                .bind(project_id)
                .bind(user_id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists a project's members joined with their public user fields
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<MemberWithUser>, sqlx::Error> {
        sqlx::query_as::<_, MemberWithUser>(
            "SELECT pm.project_id, pm.user_id, pm.role,
                    u.username, u.email, u.full_name, u.avatar_url,
                    pm.created_at
             FROM project_members pm
             JOIN users u ON u.id = pm.user_id
             WHERE pm.project_id = $1
             ORDER BY pm.created_at ASC",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Counts members on a project
    pub async fn count_by_project(pool: &PgPool, project_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM project_members WHERE project_id = $1")
            .bind(project_id)
            .fetch_one(pool)
            .await
    }
}
