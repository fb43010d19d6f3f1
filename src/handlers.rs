use crate::{
    auth::AuthUser,
    controller::{TodoController, TodoOutcome},
    models::{self, Todo, TodoDraft, TodoFormResponse, TodoParams, UserProfile},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use uuid::Uuid;

/// Where every successful write sends the client.
pub const TODOS_PATH: &str = "/todos";

/// render_outcome
///
/// Maps a write outcome onto the presentation layer: successful writes redirect to
/// the list, a validation failure re-renders the form with the rejected draft.
fn render_outcome(outcome: TodoOutcome) -> Response {
    match outcome {
        TodoOutcome::ValidationFailed { todo, errors } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(TodoFormResponse { todo, errors }),
        )
            .into_response(),
        TodoOutcome::Created(_)
        | TodoOutcome::Updated(_)
        | TodoOutcome::Deleted(_)
        | TodoOutcome::Completed(_)
        | TodoOutcome::DeletedAll(_) => Redirect::to(TODOS_PATH).into_response(),
    }
}

// --- Handlers ---

/// get_me
///
/// [Authenticated Route] The current actor's profile and how many todos they own.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = UserProfile))
)]
pub async fn get_me(
    actor: AuthUser,
    State(todos): State<TodoController>,
) -> Result<Json<UserProfile>, StatusCode> {
    let owned = todos.list(&actor).await.map_err(StatusCode::from)?;
    Ok(Json(UserProfile {
        id: actor.id,
        email: actor.email,
        todo_count: owned.len() as i64,
    }))
}

/// list_todos
///
/// [Authenticated Route] Lists the todos owned by the requesting user.
#[utoipa::path(
    get,
    path = "/todos",
    responses((status = 200, description = "My Todos", body = [Todo]))
)]
pub async fn list_todos(
    actor: AuthUser,
    State(todos): State<TodoController>,
) -> Result<Json<Vec<models::Todo>>, StatusCode> {
    let list = todos.list(&actor).await.map_err(StatusCode::from)?;
    Ok(Json(list))
}

/// new_todo
///
/// [Authenticated Route] Blank form state for a new todo.
#[utoipa::path(
    get,
    path = "/todos/new",
    responses((status = 200, description = "Empty draft", body = TodoDraft))
)]
pub async fn new_todo(actor: AuthUser, State(todos): State<TodoController>) -> Json<TodoDraft> {
    Json(todos.prepare_new(&actor))
}

/// create_todo
///
/// [Authenticated Route] Creates a todo owned by the requesting user. The owner is
/// always taken from the session, never from the body.
#[utoipa::path(
    post,
    path = "/todos",
    request_body = TodoParams,
    responses(
        (status = 303, description = "Created, redirect to /todos"),
        (status = 422, description = "Invalid", body = TodoFormResponse)
    )
)]
pub async fn create_todo(
    actor: AuthUser,
    State(todos): State<TodoController>,
    Json(payload): Json<TodoParams>,
) -> Result<Response, StatusCode> {
    let outcome = todos.create(&actor, payload).await.map_err(StatusCode::from)?;
    Ok(render_outcome(outcome))
}

/// edit_todo
///
/// [Authenticated Route] Loads one of the user's todos for editing.
#[utoipa::path(
    get,
    path = "/todos/{id}/edit",
    params(("id" = Uuid, Path, description = "Todo ID")),
    responses(
        (status = 200, description = "Found", body = Todo),
        (status = 404, description = "Not Found")
    )
)]
pub async fn edit_todo(
    actor: AuthUser,
    State(todos): State<TodoController>,
    Path(id): Path<Uuid>,
) -> Result<Json<models::Todo>, StatusCode> {
    let todo = todos
        .fetch_for_edit(&actor, id)
        .await
        .map_err(StatusCode::from)?;
    Ok(Json(todo))
}

/// update_todo
///
/// [Authenticated Route] Applies the permitted fields to one of the user's todos.
///
/// *Authorization*: a todo that does not exist and one owned by someone else both
/// answer 404.
#[utoipa::path(
    put,
    path = "/todos/{id}",
    params(("id" = Uuid, Path, description = "Todo ID")),
    request_body = TodoParams,
    responses(
        (status = 303, description = "Updated, redirect to /todos"),
        (status = 404, description = "Not Found"),
        (status = 422, description = "Invalid", body = TodoFormResponse)
    )
)]
pub async fn update_todo(
    actor: AuthUser,
    State(todos): State<TodoController>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TodoParams>,
) -> Result<Response, StatusCode> {
    let outcome = todos
        .update(&actor, id, payload)
        .await
        .map_err(StatusCode::from)?;
    Ok(render_outcome(outcome))
}

/// delete_todo
#[utoipa::path(
    delete,
    path = "/todos/{id}",
    params(("id" = Uuid, Path, description = "Todo ID")),
    responses(
        (status = 303, description = "Deleted, redirect to /todos"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_todo(
    actor: AuthUser,
    State(todos): State<TodoController>,
    Path(id): Path<Uuid>,
) -> Result<Response, StatusCode> {
    let outcome = todos.destroy(&actor, id).await.map_err(StatusCode::from)?;
    Ok(render_outcome(outcome))
}

/// complete_todo
///
/// [Authenticated Route] Marks one of the user's todos as complete.
#[utoipa::path(
    put,
    path = "/todos/{id}/completed",
    params(("id" = Uuid, Path, description = "Todo ID")),
    responses(
        (status = 303, description = "Completed, redirect to /todos"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn complete_todo(
    actor: AuthUser,
    State(todos): State<TodoController>,
    Path(id): Path<Uuid>,
) -> Result<Response, StatusCode> {
    let outcome = todos
        .mark_complete(&actor, id)
        .await
        .map_err(StatusCode::from)?;
    Ok(render_outcome(outcome))
}

/// delete_all_todos
///
/// [Authenticated Route] Removes every todo the user owns. Other users' todos are
/// untouched.
#[utoipa::path(
    delete,
    path = "/todos",
    responses((status = 303, description = "Deleted, redirect to /todos"))
)]
pub async fn delete_all_todos(
    actor: AuthUser,
    State(todos): State<TodoController>,
) -> Result<Response, StatusCode> {
    let outcome = todos.delete_all(&actor).await.map_err(StatusCode::from)?;
    Ok(render_outcome(outcome))
}
