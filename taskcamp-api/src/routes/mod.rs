/// API route handlers
///
/// Organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication lifecycle (register, verify, login, logout,
///   refresh, password flows)
/// - `projects`: Project CRUD and member management
/// - `tasks`: Task and sub-task CRUD within a project

pub mod auth;
pub mod health;
pub mod projects;
pub mod tasks;
