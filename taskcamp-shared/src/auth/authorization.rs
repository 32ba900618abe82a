/// Project authorization gate
///
/// Authorization for project-scoped operations is a membership lookup plus
/// a pure set-membership predicate: resolve the caller's role on the target
/// project, then check `role ∈ required`. No membership row means the
/// caller is not on the project at all and gets a forbidden error, same as
/// holding a role outside the required set.
///
/// The only path to a project's first admin is project creation itself: the
/// creator's membership row is written with [`ProjectRole::Admin`] in the
/// same operation that creates the project.
///
/// # Example
///
/// ```no_run
/// use taskcamp_shared::auth::authorization::{require_project_role, ADMIN_ONLY};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, project_id: Uuid, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// // Only project admins may pass
/// let role = require_project_role(&pool, project_id, user_id, ADMIN_ONLY).await?;
/// # Ok(())
/// # }
/// ```
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::member::{ProjectMember, ProjectRole};

/// Every role - read access to a project the caller belongs to
pub const ANY_ROLE: &[ProjectRole] = &[
    ProjectRole::Admin,
    ProjectRole::ProjectAdmin,
    ProjectRole::Member,
];

/// Project administration: update/delete project, manage members
pub const ADMIN_ONLY: &[ProjectRole] = &[ProjectRole::Admin];

/// Task management: create/update/delete tasks
pub const TASK_MANAGERS: &[ProjectRole] = &[ProjectRole::Admin, ProjectRole::ProjectAdmin];

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Caller has no membership row on the project
    #[error("Not a member of project {0}")]
    NotMember(Uuid),

    /// Caller is a member but the role is outside the required set
    #[error("Role {role:?} is not permitted for this operation")]
    RoleNotAllowed {
        /// The role the caller actually holds
        role: ProjectRole,
    },

    /// Database error during role resolution
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Pure authorization predicate: `role ∈ allowed`
pub fn role_allowed(role: ProjectRole, allowed: &[ProjectRole]) -> bool {
    allowed.contains(&role)
}

/// Resolves the caller's role on a project and enforces the required set
///
/// Returns the caller's role on success so handlers can branch on it
/// without a second lookup.
///
/// # Errors
///
/// - `AuthzError::NotMember` when no membership row exists
/// - `AuthzError::RoleNotAllowed` when the role is outside `allowed`
pub async fn require_project_role(
    pool: &PgPool,
    project_id: Uuid,
    user_id: Uuid,
    allowed: &[ProjectRole],
) -> Result<ProjectRole, AuthzError> {
    let role = ProjectMember::get_role(pool, project_id, user_id)
        .await?
        .ok_or(AuthzError::NotMember(project_id))?;

    if !role_allowed(role, allowed) {
        return Err(AuthzError::RoleNotAllowed { role });
    }

    Ok(role)
}
