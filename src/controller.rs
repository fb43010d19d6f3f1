use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::TodoError,
    models::{NewTodo, Todo, TodoDraft, TodoParams, ValidationErrors},
    repository::RepositoryState,
};

/// TodoOutcome
///
/// What a write operation did. The presentation layer turns every variant except
/// `ValidationFailed` into a redirect to the list; `ValidationFailed` re-renders the
/// form the request came from.
#[derive(Debug, Clone, PartialEq)]
pub enum TodoOutcome {
    Created(Todo),
    Updated(Todo),
    Deleted(Todo),
    Completed(Todo),
    DeletedAll(u64),
    // Nothing was written.
    ValidationFailed {
        todo: TodoDraft,
        errors: ValidationErrors,
    },
}

pub type TodoResult = Result<TodoOutcome, TodoError>;

/// TodoController
///
/// Owner-scoped CRUD over the `todos` resource. Every operation receives the acting
/// user explicitly and only ever reads or writes that user's records.
#[derive(Clone)]
pub struct TodoController {
    repo: RepositoryState,
}

impl TodoController {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    /// find_owned
    ///
    /// The single guarded lookup. A record that does not exist and a record owned by
    /// another user both yield `TodoError::NotFound`.
    pub async fn find_owned(&self, actor: &AuthUser, id: Uuid) -> Result<Todo, TodoError> {
        match self.repo.find_todo(id).await? {
            Some(todo) if todo.user_id == actor.id => Ok(todo),
            _ => {
                tracing::debug!(todo_id = %id, "no owned todo for actor");
                Err(TodoError::NotFound)
            }
        }
    }

    /// list
    ///
    /// All of the actor's todos. Ordering is whatever the store returns.
    #[tracing::instrument(skip_all, fields(actor = %actor.id))]
    pub async fn list(&self, actor: &AuthUser) -> Result<Vec<Todo>, TodoError> {
        Ok(self.repo.find_todos_by_owner(actor.id).await?)
    }

    /// Blank form state for a new record. Touches no storage.
    pub fn prepare_new(&self, _actor: &AuthUser) -> TodoDraft {
        TodoDraft::default()
    }

    #[tracing::instrument(skip_all, fields(actor = %actor.id, todo_id = %id))]
    pub async fn fetch_for_edit(&self, actor: &AuthUser, id: Uuid) -> Result<Todo, TodoError> {
        self.find_owned(actor, id).await
    }

    /// create
    ///
    /// Validates the params and inserts a record owned by the actor. On validation
    /// failure nothing is persisted and the rejected draft is handed back.
    #[tracing::instrument(skip_all, fields(actor = %actor.id))]
    pub async fn create(&self, actor: &AuthUser, params: TodoParams) -> TodoResult {
        let draft = TodoDraft::from_params(params);

        if let Err(errors) = draft.validate() {
            tracing::debug!(?errors, "create rejected");
            return Ok(TodoOutcome::ValidationFailed {
                todo: draft,
                errors,
            });
        }

        let new_todo = NewTodo {
            user_id: actor.id,
            title: draft.title.unwrap_or_default(),
            complete: draft.complete,
        };

        let todo = self.repo.insert_todo(new_todo).await?;
        tracing::info!(todo_id = %todo.id, "todo created");
        Ok(TodoOutcome::Created(todo))
    }

    /// update
    ///
    /// Ownership first, then the permitted fields are applied and validated. Neither
    /// a foreign record nor an invalid edit is ever written. Only the fields present
    /// in `params` reach the store; the rest keep whatever value is stored then.
    #[tracing::instrument(skip_all, fields(actor = %actor.id, todo_id = %id))]
    pub async fn update(&self, actor: &AuthUser, id: Uuid, params: TodoParams) -> TodoResult {
        let existing = self.find_owned(actor, id).await?;
        let draft = existing.to_draft().apply(params.clone());

        if let Err(errors) = draft.validate() {
            tracing::debug!(?errors, "update rejected");
            return Ok(TodoOutcome::ValidationFailed {
                todo: draft,
                errors,
            });
        }

        // The row can disappear between the lookup and the write.
        let todo = self
            .repo
            .update_todo(existing.id, &params)
            .await?
            .ok_or(TodoError::NotFound)?;
        tracing::info!("todo updated");
        Ok(TodoOutcome::Updated(todo))
    }

    #[tracing::instrument(skip_all, fields(actor = %actor.id, todo_id = %id))]
    pub async fn destroy(&self, actor: &AuthUser, id: Uuid) -> TodoResult {
        let todo = self.find_owned(actor, id).await?;

        if !self.repo.delete_todo(todo.id).await? {
            return Err(TodoError::NotFound);
        }
        tracing::info!("todo deleted");
        Ok(TodoOutcome::Deleted(todo))
    }

    /// mark_complete
    ///
    /// One-directional: sets `complete` and never clears it. Marking an already
    /// complete todo succeeds again.
    #[tracing::instrument(skip_all, fields(actor = %actor.id, todo_id = %id))]
    pub async fn mark_complete(&self, actor: &AuthUser, id: Uuid) -> TodoResult {
        let existing = self.find_owned(actor, id).await?;

        let todo = self
            .repo
            .mark_todo_complete(existing.id)
            .await?
            .ok_or(TodoError::NotFound)?;
        tracing::info!("todo completed");
        Ok(TodoOutcome::Completed(todo))
    }

    /// delete_all
    ///
    /// Removes every todo the actor owns and nothing else.
    #[tracing::instrument(skip_all, fields(actor = %actor.id))]
    pub async fn delete_all(&self, actor: &AuthUser) -> TodoResult {
        let removed = self.repo.delete_todos_by_owner(actor.id).await?;
        tracing::info!(removed, "todos deleted");
        Ok(TodoOutcome::DeletedAll(removed))
    }
}
