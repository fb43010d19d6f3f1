use crate::models::{NewTodo, Todo, TodoParams, User};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// RepositoryError
///
/// Storage failures surfaced to the controller. Nothing here distinguishes a missing
/// record; absence is always reported as `Ok(None)` / `Ok(false)`.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Repository Trait
///
/// The persistence contract the controller and the auth extractor depend on. Handlers
/// never see a concrete store: Postgres in production, the in-memory store in tests.
///
/// **Send + Sync + async_trait** are required so `Arc<dyn Repository>` can live in
/// `AppState` and cross axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Todo Retrieval ---
    // Unscoped lookup by id. Ownership is checked by the caller.
    async fn find_todo(&self, id: Uuid) -> RepoResult<Option<Todo>>;
    async fn find_todos_by_owner(&self, user_id: Uuid) -> RepoResult<Vec<Todo>>;
    async fn todo_exists(&self, id: Uuid) -> RepoResult<bool>;
    async fn count_todos(&self) -> RepoResult<i64>;

    // --- Todo Writes ---
    async fn insert_todo(&self, todo: NewTodo) -> RepoResult<Todo>;
    // Writes only the fields present in `patch`. Returns None if the row is gone.
    async fn update_todo(&self, id: Uuid, patch: &TodoParams) -> RepoResult<Option<Todo>>;
    // Sets `complete` and leaves every other column as stored.
    async fn mark_todo_complete(&self, id: Uuid) -> RepoResult<Option<Todo>>;
    // Returns true if a row was removed.
    async fn delete_todo(&self, id: Uuid) -> RepoResult<bool>;
    // Returns the number of rows removed.
    async fn delete_todos_by_owner(&self, user_id: Uuid) -> RepoResult<u64>;

    // --- User/Auth ---
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>>;
    async fn create_user(&self, user: User) -> RepoResult<User>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const TODO_COLUMNS: &str = "id, user_id, title, complete, created_at, updated_at";

/// PostgresRepository
///
/// `Repository` backed by PostgreSQL. Queries are bound at runtime, so the crate
/// builds without a live database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded migrations under `migrations/`.
    pub async fn migrate(&self) -> RepoResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_todo(&self, id: Uuid) -> RepoResult<Option<Todo>> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| tracing::error!("find_todo error: {:?}", e))?;
        Ok(todo)
    }

    /// find_todos_by_owner
    ///
    /// Newest first. Callers must not rely on the ordering.
    async fn find_todos_by_owner(&self, user_id: Uuid) -> RepoResult<Vec<Todo>> {
        let todos = sqlx::query_as::<_, Todo>(&format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| tracing::error!("find_todos_by_owner error: {:?}", e))?;
        Ok(todos)
    }

    async fn todo_exists(&self, id: Uuid) -> RepoResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM todos WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .inspect_err(|e| tracing::error!("todo_exists error: {:?}", e))?;
        Ok(exists)
    }

    async fn count_todos(&self) -> RepoResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM todos")
            .fetch_one(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("count_todos error: {:?}", e))?;
        Ok(count)
    }

    /// insert_todo
    ///
    /// The id is issued here, never taken from the request.
    async fn insert_todo(&self, todo: NewTodo) -> RepoResult<Todo> {
        let inserted = sqlx::query_as::<_, Todo>(&format!(
            "INSERT INTO todos (id, user_id, title, complete, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, NOW(), NOW()) RETURNING {TODO_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(todo.user_id)
        .bind(todo.title)
        .bind(todo.complete)
        .fetch_one(&self.pool)
        .await
        .inspect_err(|e| tracing::error!("insert_todo error: {:?}", e))?;
        Ok(inserted)
    }

    /// update_todo
    ///
    /// A NULL parameter keeps the stored column. `user_id` is absent from the SET
    /// list: ownership is immutable.
    async fn update_todo(&self, id: Uuid, patch: &TodoParams) -> RepoResult<Option<Todo>> {
        let updated = sqlx::query_as::<_, Todo>(&format!(
            "UPDATE todos SET title = COALESCE($2, title), complete = COALESCE($3, complete), \
             updated_at = NOW() WHERE id = $1 RETURNING {TODO_COLUMNS}"
        ))
        .bind(id)
        .bind(patch.title.as_deref())
        .bind(patch.complete)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| tracing::error!("update_todo error: {:?}", e))?;
        Ok(updated)
    }

    async fn mark_todo_complete(&self, id: Uuid) -> RepoResult<Option<Todo>> {
        let updated = sqlx::query_as::<_, Todo>(&format!(
            "UPDATE todos SET complete = TRUE, updated_at = NOW() \
             WHERE id = $1 RETURNING {TODO_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| tracing::error!("mark_todo_complete error: {:?}", e))?;
        Ok(updated)
    }

    async fn delete_todo(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("delete_todo error: {:?}", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_todos_by_owner(&self, user_id: Uuid) -> RepoResult<u64> {
        let result = sqlx::query("DELETE FROM todos WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("delete_todos_by_owner error: {:?}", e))?;
        Ok(result.rows_affected())
    }

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT id, email FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("get_user error: {:?}", e))?;
        Ok(user)
    }

    /// create_user
    ///
    /// Upserts on `id`, so re-seeding a known actor only refreshes the email.
    async fn create_user(&self, user: User) -> RepoResult<User> {
        let created = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email) VALUES ($1, $2) \
             ON CONFLICT (id) DO UPDATE SET email = EXCLUDED.email RETURNING id, email",
        )
        .bind(user.id)
        .bind(user.email)
        .fetch_one(&self.pool)
        .await
        .inspect_err(|e| tracing::error!("create_user error: {:?}", e))?;
        Ok(created)
    }
}

/// InMemoryRepository
///
/// A `Repository` kept entirely in process memory. Used by the test suite and for
/// running the service without Postgres. Each map is behind its own `RwLock`; a
/// single write operation holds the lock for its whole read-modify-write.
#[derive(Default)]
pub struct InMemoryRepository {
    todos: RwLock<HashMap<Uuid, Todo>>,
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn find_todo(&self, id: Uuid) -> RepoResult<Option<Todo>> {
        Ok(self.todos.read().await.get(&id).cloned())
    }

    async fn find_todos_by_owner(&self, user_id: Uuid) -> RepoResult<Vec<Todo>> {
        let mut todos: Vec<Todo> = self
            .todos
            .read()
            .await
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        todos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(todos)
    }

    async fn todo_exists(&self, id: Uuid) -> RepoResult<bool> {
        Ok(self.todos.read().await.contains_key(&id))
    }

    async fn count_todos(&self) -> RepoResult<i64> {
        Ok(self.todos.read().await.len() as i64)
    }

    async fn insert_todo(&self, todo: NewTodo) -> RepoResult<Todo> {
        let now = Utc::now();
        let stored = Todo {
            id: Uuid::new_v4(),
            user_id: todo.user_id,
            title: todo.title,
            complete: todo.complete,
            created_at: now,
            updated_at: now,
        };
        self.todos.write().await.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_todo(&self, id: Uuid, patch: &TodoParams) -> RepoResult<Option<Todo>> {
        let mut todos = self.todos.write().await;
        Ok(todos.get_mut(&id).map(|existing| {
            if let Some(title) = &patch.title {
                existing.title = title.clone();
            }
            if let Some(complete) = patch.complete {
                existing.complete = complete;
            }
            existing.updated_at = Utc::now();
            existing.clone()
        }))
    }

    async fn mark_todo_complete(&self, id: Uuid) -> RepoResult<Option<Todo>> {
        let mut todos = self.todos.write().await;
        Ok(todos.get_mut(&id).map(|existing| {
            existing.complete = true;
            existing.updated_at = Utc::now();
            existing.clone()
        }))
    }

    async fn delete_todo(&self, id: Uuid) -> RepoResult<bool> {
        Ok(self.todos.write().await.remove(&id).is_some())
    }

    async fn delete_todos_by_owner(&self, user_id: Uuid) -> RepoResult<u64> {
        let mut todos = self.todos.write().await;
        let before = todos.len();
        todos.retain(|_, t| t.user_id != user_id);
        Ok((before - todos.len()) as u64)
    }

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create_user(&self, user: User) -> RepoResult<User> {
        self.users.write().await.insert(user.id, user.clone());
        Ok(user)
    }
}
