use axum::http::StatusCode;

use crate::repository::RepositoryError;

/// TodoError
///
/// Hard failures of a controller operation. `NotFound` covers both a missing record
/// and a record owned by someone else; callers cannot tell the two apart.
#[derive(Debug, thiserror::Error)]
pub enum TodoError {
    #[error("record not found")]
    NotFound,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<TodoError> for StatusCode {
    fn from(err: TodoError) -> Self {
        match err {
            TodoError::NotFound => StatusCode::NOT_FOUND,
            TodoError::Repository(e) => {
                tracing::error!("repository failure: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
