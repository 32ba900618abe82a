/// Database models for TaskCamp
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts, credentials, and the token fields that drive
///   the auth lifecycle
/// - `project`: Projects and the enriched project-with-member-count read
/// - `member`: Project memberships with roles (the authorization facts)
/// - `task`: Tasks within a project, with assignee and attachments
/// - `subtask`: Sub-tasks hanging off a task
///
/// # Example
///
/// ```no_run
/// use taskcamp_shared::models::user::{CreateUser, User};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let user = User::create(
///     &pool,
///     CreateUser {
///         username: "alice".to_string(),
///         email: "alice@example.com".to_string(),
///         password_hash: "$argon2id$...".to_string(),
///         full_name: Some("Alice Lovelace".to_string()),
///     },
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```

pub mod member;
pub mod project;
pub mod subtask;
pub mod task;
pub mod user;
