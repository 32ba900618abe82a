/// Sub-task model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE subtasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     title VARCHAR(100) NOT NULL,
///     is_completed BOOLEAN NOT NULL DEFAULT FALSE,
///     created_by UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Sub-task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SubTask {
    /// Unique sub-task ID
    pub id: Uuid,

    /// Owning task
    pub task_id: Uuid,

    /// Sub-task title
    pub title: String,

    /// Completion flag
    pub is_completed: bool,

    /// Who created the sub-task
    pub created_by: Uuid,

    /// When the sub-task was created
    pub created_at: DateTime<Utc>,

    /// When the sub-task was last updated
    pub updated_at: DateTime<Utc>,
}

impl SubTask {
    /// Creates a sub-task
    pub async fn create(
        pool: &PgPool,
        task_id: Uuid,
        title: &str,
        created_by: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, SubTask>(
            "INSERT INTO subtasks (task_id, title, created_by)
             VALUES ($1, $2, $3)
             RETURNING id, task_id, title, is_completed, created_by, created_at, updated_at",
        )
        .bind(task_id)
        .bind(title)
        .bind(created_by)
        .fetch_one(pool)
        .await
    }

    /// Finds a sub-task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, SubTask>(
            "SELECT id, task_id, title, is_completed, created_by, created_at, updated_at
             FROM subtasks
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Lists a task's sub-tasks, oldest first
    pub async fn list_by_task(pool: &PgPool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, SubTask>(
            "SELECT id, task_id, title, is_completed, created_by, created_at, updated_at
             FROM subtasks
             WHERE task_id = $1
             ORDER BY created_at ASC",
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    /// Updates a sub-task's title and completion flag
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        title: &str,
        is_completed: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, SubTask>(
            "UPDATE subtasks
             SET title = $2, is_completed = $3, updated_at = NOW()
             WHERE id = $1
             RETURNING id, task_id, title, is_completed, created_by, created_at, updated_at",
        )
        .bind(id)
        .bind(title)
        .bind(is_completed)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a sub-task
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM subtasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtask_serializes_camel_case() {
        let subtask = SubTask {
            id: Uuid::new_v4(),
            task_id: Uuid::new_v4(),
            title: "Write copy".to_string(),
            is_completed: true,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&subtask).unwrap();
        let object = json.as_object().unwrap();

        assert!(object.contains_key("taskId"));
        assert!(object.contains_key("isCompleted"));
        assert_eq!(json["isCompleted"], true);
    }
}
