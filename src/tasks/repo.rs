use anyhow::Context;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

pub const STATUS_PENDING: &str = "pending";

#[derive(Debug, Clone, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid,
    pub image_path: String,
    pub status: String,
    pub result_path: Option<String>,
    pub created_at: OffsetDateTime,
}

#[async_trait]
pub trait TaskRepo: Send + Sync {
    /// Tasks owned by `user_id`, newest first.
    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Task>>;
    /// Creates a `pending` task.
    async fn create(&self, user_id: Uuid, image_path: &str) -> anyhow::Result<Task>;
    /// `None` when the task does not exist or belongs to someone else.
    async fn get_for_user(&self, user_id: Uuid, task_id: Uuid) -> anyhow::Result<Option<Task>>;
}

#[derive(Clone)]
pub struct PgTaskRepo {
    db: PgPool,
}

impl PgTaskRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskRepo for PgTaskRepo {
    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Task>> {
        let rows = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, image_path, status, result_path, created_at
              FROM tasks
             WHERE user_id = $1
             ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list tasks by user")?;
        Ok(rows)
    }

    async fn create(&self, user_id: Uuid, image_path: &str) -> anyhow::Result<Task> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (id, user_id, image_path, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, image_path, status, result_path, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(image_path)
        .bind(STATUS_PENDING)
        .fetch_one(&self.db)
        .await
        .context("insert task")?;
        Ok(task)
    }

    async fn get_for_user(&self, user_id: Uuid, task_id: Uuid) -> anyhow::Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, image_path, status, result_path, created_at
              FROM tasks
             WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("get task for user")?;
        Ok(task)
    }
}
