//! Authentication middleware
//!
//! Requests carry `Authorization: Token <key>`. The middleware resolves the
//! key to a user and stores the result as a [`CurrentUser`] request
//! extension; handlers decide whether anonymous access is allowed.
//!
//! - No header: anonymous
//! - Malformed header or unknown key: 401

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use foodgram_common::api::auth::{parse_authorization, resolve_token, ApiAuthError};
use foodgram_common::db::User;
use tracing::{debug, warn};

use crate::db::users;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// The caller of the current request, if authenticated
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<User>);

impl CurrentUser {
    pub fn id(&self) -> Option<i64> {
        self.0.as_ref().map(|user| user.id)
    }

    /// The authenticated user, or 401 for anonymous callers
    pub fn require(&self) -> ApiResult<&User> {
        self.0.as_ref().ok_or_else(|| {
            ApiError::Unauthorized("Authentication credentials were not provided".to_string())
        })
    }
}

/// Resolve the `Authorization` header into a [`CurrentUser`] extension
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let header = match request.headers().get(AUTHORIZATION) {
        None => None,
        Some(value) => Some(value.to_str().map(str::to_owned).map_err(|_| {
            ApiError::Unauthorized("Authorization header is not valid text".to_string())
        })?),
    };

    let current = match header {
        None => CurrentUser(None),
        Some(header) => CurrentUser(Some(authenticate(&state, &header).await?)),
    };

    request.extensions_mut().insert(current);
    Ok(next.run(request).await)
}

async fn authenticate(state: &AppState, header: &str) -> ApiResult<User> {
    let key = parse_authorization(header).map_err(auth_error)?;
    let user_id = resolve_token(&state.db, key).await.map_err(auth_error)?;

    let user = users::get_user(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid token".to_string()))?;

    debug!(user_id = user.id, "Authenticated request");
    Ok(user)
}

fn auth_error(err: ApiAuthError) -> ApiError {
    match err {
        ApiAuthError::DatabaseError(msg) => ApiError::Internal(msg),
        other => {
            warn!("Authentication failed: {}", other);
            ApiError::Unauthorized(other.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_anonymous_is_unauthorized() {
        let anonymous = CurrentUser::default();
        assert_eq!(anonymous.id(), None);
        assert!(matches!(anonymous.require(), Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_require_authenticated() {
        let current = CurrentUser(Some(User {
            id: 7,
            username: "ann".into(),
            email: "ann@example.com".into(),
            first_name: "Ann".into(),
            last_name: "Cook".into(),
        }));
        assert_eq!(current.id(), Some(7));
        assert_eq!(current.require().unwrap().username, "ann");
    }

    #[test]
    fn test_database_failure_is_not_reported_as_401() {
        assert!(matches!(
            auth_error(ApiAuthError::DatabaseError("locked".into())),
            ApiError::Internal(_)
        ));
        assert!(matches!(auth_error(ApiAuthError::UnknownToken), ApiError::Unauthorized(_)));
    }
}
