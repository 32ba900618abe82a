/// Database layer for TaskCamp
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool management with a startup health
///   check
/// - `migrations`: sqlx migration runner for the workspace `migrations/`
///   directory
///
/// The pool is created once at startup and handed to the API as part of its
/// state; model functions all take `&PgPool` so the store stays an injected
/// dependency rather than a global.

pub mod migrations;
pub mod pool;
