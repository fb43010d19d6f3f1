use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// The actor's identity record from the `users` table. The controller only ever
/// compares `id`; `email` is surfaced through `/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub email: String,
}

/// Todo
///
/// A persisted record from the `todos` table. `user_id` is set once on insert and
/// never written again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Todo {
    pub id: Uuid,
    // FK to users.id (Owner).
    pub user_id: Uuid,
    pub title: String,
    pub complete: bool,

    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// Form-shaped copy of a stored record, used to re-display an edit form.
    pub fn to_draft(&self) -> TodoDraft {
        TodoDraft {
            id: Some(self.id),
            title: Some(self.title.clone()),
            complete: self.complete,
        }
    }
}

/// NewTodo
///
/// A validated candidate ready for insertion. Only the controller builds these,
/// after `TodoDraft::validate` has passed.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTodo {
    pub user_id: Uuid,
    pub title: String,
    pub complete: bool,
}

// --- Request Payloads (Input Schemas) ---

/// TodoParams
///
/// The permitted fields of a create or update request. Anything else in the request
/// body (`id`, `user_id`, timestamps) is dropped during deserialization, so ownership
/// and identity can never be mass-assigned.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct TodoParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complete: Option<bool>,
}

// --- Form Schemas (Output) ---

/// TodoDraft
///
/// Unsaved form state. `id` is only present when the draft re-displays an
/// existing record that failed validation on update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct TodoDraft {
    pub id: Option<Uuid>,
    pub title: Option<String>,
    pub complete: bool,
}

impl TodoDraft {
    /// Draft for a brand new record populated from request params.
    pub fn from_params(params: TodoParams) -> Self {
        Self {
            id: None,
            title: params.title,
            complete: params.complete.unwrap_or(false),
        }
    }

    /// Overlays the permitted params on top of this draft.
    pub fn apply(mut self, params: TodoParams) -> Self {
        if let Some(title) = params.title {
            self.title = Some(title);
        }
        if let Some(complete) = params.complete {
            self.complete = complete;
        }
        self
    }

    /// validate
    ///
    /// Checks the required-field constraints. A title made only of whitespace is
    /// treated the same as a missing one.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => {}
            _ => errors.add("title", "can't be blank"),
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// FieldError
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// ValidationErrors
///
/// Every constraint a draft violated, in the order they were checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: &str) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// TodoFormResponse
///
/// Body of a 422 response: the rejected draft plus the reasons, so the client can
/// re-render the form it came from.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TodoFormResponse {
    pub todo: TodoDraft,
    pub errors: ValidationErrors,
}

/// UserProfile
///
/// Output schema for the authenticated user's profile (GET /me).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub todo_count: i64,
}
