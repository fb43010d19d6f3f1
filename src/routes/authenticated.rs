use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, put},
};

/// Authenticated Router Module
///
/// The todo resource. Every handler receives a validated `AuthUser`, and every
/// lookup by id goes through the controller's owner-or-not-found check.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        .route("/me", get(handlers::get_me))
        // GET /todos    : the user's todos
        // POST /todos   : create, 303 to /todos or 422 with the rejected draft
        // DELETE /todos : delete every todo the user owns
        .route(
            "/todos",
            get(handlers::list_todos)
                .post(handlers::create_todo)
                .delete(handlers::delete_all_todos),
        )
        // GET /todos/new
        // Static segment; axum prefers it over the `{id}` captures below.
        .route("/todos/new", get(handlers::new_todo))
        // PUT/DELETE /todos/{id}
        // A foreign id answers 404, exactly like a missing one.
        .route(
            "/todos/{id}",
            put(handlers::update_todo).delete(handlers::delete_todo),
        )
        // GET /todos/{id}/edit
        .route("/todos/{id}/edit", get(handlers::edit_todo))
        // PUT /todos/{id}/completed
        .route("/todos/{id}/completed", put(handlers::complete_todo))
}
