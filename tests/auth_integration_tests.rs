use axum::{
    extract::FromRequestParts,
    http::{Method, Request, StatusCode, Uri, header, request::Parts},
};
use async_trait::async_trait;
use jsonwebtoken::{EncodingKey, Header, encode};
use std::{sync::Arc, time::SystemTime};
use todo_portal::{
    AppState, InMemoryRepository,
    auth::{AuthUser, Claims, LOCAL_USER_HEADER},
    config::{AppConfig, Env},
    models::{NewTodo, Todo, TodoParams, User},
    repository::{RepoResult, Repository, RepositoryError},
};
use uuid::Uuid;

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";
const TEST_USER_ID: Uuid = Uuid::from_u128(1);

// Signs a token for `user_id` expiring `exp_offset` seconds from now (negative: already expired).
fn create_token(user_id: Uuid, exp_offset: i64, secret: &str) -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let claims = Claims {
        sub: user_id,
        iat: now as usize,
        exp: (now + exp_offset) as usize,
    };

    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

async fn create_app_state(env: Env, users: Vec<User>) -> AppState {
    let repo = InMemoryRepository::new();
    for user in users {
        repo.create_user(user).await.unwrap();
    }

    let config = AppConfig {
        env,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    };

    AppState::new(Arc::new(repo), config)
}

// Every call fails as if the pool could not hand out a connection.
struct UnavailableRepository;

fn unavailable<T>() -> RepoResult<T> {
    Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
}

#[async_trait]
impl Repository for UnavailableRepository {
    async fn find_todo(&self, _id: Uuid) -> RepoResult<Option<Todo>> {
        unavailable()
    }
    async fn find_todos_by_owner(&self, _user_id: Uuid) -> RepoResult<Vec<Todo>> {
        unavailable()
    }
    async fn todo_exists(&self, _id: Uuid) -> RepoResult<bool> {
        unavailable()
    }
    async fn count_todos(&self) -> RepoResult<i64> {
        unavailable()
    }
    async fn insert_todo(&self, _todo: NewTodo) -> RepoResult<Todo> {
        unavailable()
    }
    async fn update_todo(&self, _id: Uuid, _patch: &TodoParams) -> RepoResult<Option<Todo>> {
        unavailable()
    }
    async fn mark_todo_complete(&self, _id: Uuid) -> RepoResult<Option<Todo>> {
        unavailable()
    }
    async fn delete_todo(&self, _id: Uuid) -> RepoResult<bool> {
        unavailable()
    }
    async fn delete_todos_by_owner(&self, _user_id: Uuid) -> RepoResult<u64> {
        unavailable()
    }
    async fn get_user(&self, _id: Uuid) -> RepoResult<Option<User>> {
        unavailable()
    }
    async fn create_user(&self, _user: User) -> RepoResult<User> {
        unavailable()
    }
}

fn unavailable_app_state(env: Env) -> AppState {
    let config = AppConfig {
        env,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    };
    AppState::new(Arc::new(UnavailableRepository), config)
}

fn test_user() -> User {
    User {
        id: TEST_USER_ID,
        email: "test@example.com".to_string(),
    }
}

fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn with_bearer(parts: &mut Parts, token: &str) {
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );
}

// --- Tests ---

#[tokio::test]
async fn test_auth_success_with_valid_jwt() {
    let token = create_token(TEST_USER_ID, 3600, TEST_JWT_SECRET);
    let app_state = create_app_state(Env::Production, vec![test_user()]).await;

    let mut parts = get_request_parts(Method::GET, "/todos".parse().unwrap());
    with_bearer(&mut parts, &token);

    let user = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap();

    assert_eq!(user.id, TEST_USER_ID);
    assert_eq!(user.email, "test@example.com");
}

#[tokio::test]
async fn test_auth_failure_with_missing_header() {
    let app_state = create_app_state(Env::Production, vec![test_user()]).await;

    let mut parts = get_request_parts(Method::GET, "/todos".parse().unwrap());

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(auth_user.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_without_bearer_prefix() {
    let token = create_token(TEST_USER_ID, 3600, TEST_JWT_SECRET);
    let app_state = create_app_state(Env::Production, vec![test_user()]).await;

    let mut parts = get_request_parts(Method::GET, "/todos".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&token).unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(auth_user.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_with_expired_jwt() {
    // Well past the default validation leeway.
    let token = create_token(TEST_USER_ID, -3600, TEST_JWT_SECRET);
    let app_state = create_app_state(Env::Production, vec![test_user()]).await;

    let mut parts = get_request_parts(Method::GET, "/todos".parse().unwrap());
    with_bearer(&mut parts, &token);

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(auth_user.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_with_wrong_secret() {
    let token = create_token(TEST_USER_ID, 3600, "some-other-secret");
    let app_state = create_app_state(Env::Production, vec![test_user()]).await;

    let mut parts = get_request_parts(Method::GET, "/todos".parse().unwrap());
    with_bearer(&mut parts, &token);

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(auth_user.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_for_unknown_user() {
    // Valid signature, but the subject has no users row.
    let token = create_token(Uuid::new_v4(), 3600, TEST_JWT_SECRET);
    let app_state = create_app_state(Env::Production, vec![test_user()]).await;

    let mut parts = get_request_parts(Method::GET, "/todos".parse().unwrap());
    with_bearer(&mut parts, &token);

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(auth_user.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_local_bypass_success() {
    let local_user = User {
        id: Uuid::new_v4(),
        email: "local@dev.com".to_string(),
    };
    let app_state = create_app_state(Env::Local, vec![local_user.clone()]).await;

    let mut parts = get_request_parts(Method::GET, "/todos".parse().unwrap());
    parts.headers.insert(
        header::HeaderName::from_static(LOCAL_USER_HEADER),
        header::HeaderValue::from_str(&local_user.id.to_string()).unwrap(),
    );

    let user = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap();

    assert_eq!(user.id, local_user.id);
    assert_eq!(user.email, "local@dev.com");
}

#[tokio::test]
async fn test_local_bypass_unknown_user_rejected() {
    let app_state = create_app_state(Env::Local, vec![test_user()]).await;

    let mut parts = get_request_parts(Method::GET, "/todos".parse().unwrap());
    parts.headers.insert(
        header::HeaderName::from_static(LOCAL_USER_HEADER),
        header::HeaderValue::from_str(&Uuid::new_v4().to_string()).unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(auth_user.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_local_bypass_disabled_in_prod() {
    let app_state = create_app_state(Env::Production, vec![test_user()]).await;

    let mut parts = get_request_parts(Method::GET, "/todos".parse().unwrap());
    // Provide ONLY the local bypass header, for a user that does exist.
    parts.headers.insert(
        header::HeaderName::from_static(LOCAL_USER_HEADER),
        header::HeaderValue::from_str(&TEST_USER_ID.to_string()).unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(auth_user.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bearer_lookup_failure_is_server_error() {
    let token = create_token(TEST_USER_ID, 3600, TEST_JWT_SECRET);
    let app_state = unavailable_app_state(Env::Production);

    let mut parts = get_request_parts(Method::GET, "/todos".parse().unwrap());
    with_bearer(&mut parts, &token);

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(auth_user.unwrap_err(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_local_bypass_lookup_failure_is_server_error() {
    // A valid bearer token is present too: the failure must not fall through to it.
    let token = create_token(TEST_USER_ID, 3600, TEST_JWT_SECRET);
    let app_state = unavailable_app_state(Env::Local);

    let mut parts = get_request_parts(Method::GET, "/todos".parse().unwrap());
    parts.headers.insert(
        header::HeaderName::from_static(LOCAL_USER_HEADER),
        header::HeaderValue::from_str(&TEST_USER_ID.to_string()).unwrap(),
    );
    with_bearer(&mut parts, &token);

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(auth_user.unwrap_err(), StatusCode::INTERNAL_SERVER_ERROR);
}
