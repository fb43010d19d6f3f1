use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    models::User,
    repository::RepositoryState,
};

/// Header accepted in `Env::Local` in place of a bearer token.
pub const LOCAL_USER_HEADER: &str = "x-user-id";

/// Claims
///
/// Payload expected inside a bearer JWT. Tokens are issued elsewhere; this service
/// only verifies them.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's UUID, the key into the `users` table.
    pub sub: Uuid,
    /// Expiration Time (exp): tokens past this timestamp are rejected.
    pub exp: usize,
    /// Issued At (iat).
    pub iat: usize,
}

/// AuthUser
///
/// The resolved actor for one request. Every controller operation takes it as an
/// explicit argument; there is no ambient "current user".
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

/// AuthUser Extractor Implementation
///
/// Resolution order:
/// 1. Local bypass: in `Env::Local` only, a UUID in the `x-user-id` header.
/// 2. Token validation: `Authorization: Bearer <jwt>`, HS256, `exp` enforced.
/// 3. DB lookup: the subject must still exist in the repository.
///
/// Rejection: `StatusCode::UNAUTHORIZED` (401) when no actor can be resolved.
/// A repository failure during either user lookup is `INTERNAL_SERVER_ERROR` (500).
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        // A bad or unknown header falls through to the JWT flow. A failed lookup does not.
        if config.env == Env::Local {
            let header_id = parts
                .headers
                .get(LOCAL_USER_HEADER)
                .and_then(|value| value.to_str().ok())
                .and_then(|id_str| Uuid::parse_str(id_str).ok());

            if let Some(user_id) = header_id {
                if let Some(user) = lookup_user(&repo, user_id).await? {
                    return Ok(AuthUser {
                        id: user.id,
                        email: user.email,
                    });
                }
            }
        }

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => tracing::debug!("rejected expired token"),
                other => tracing::debug!("rejected token: {:?}", other),
            }
            StatusCode::UNAUTHORIZED
        })?;

        // A valid token for a deleted user is still rejected.
        let user = lookup_user(&repo, token_data.claims.sub)
            .await?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(AuthUser {
            id: user.id,
            email: user.email,
        })
    }
}

async fn lookup_user(repo: &RepositoryState, id: Uuid) -> Result<Option<User>, StatusCode> {
    repo.get_user(id).await.map_err(|e| {
        tracing::error!("auth lookup error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}
