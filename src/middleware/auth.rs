use axum::http::{header::AUTHORIZATION, HeaderMap};
use uuid::Uuid;

use crate::auth::{AuthorizationResolver, Subject};
use crate::error::ApiError;
use crate::realtime::ListenerId;
use crate::resources::Access;
use crate::types::Operation;

/// Realtime listener id a client sends to be left out of its own notifications
pub const LISTENER_ID_HEADER: &str = "x-listener-id";

/// Whether `operation` needs an admin under `access`
pub fn requires_admin(access: Access, operation: Operation) -> bool {
    match access {
        Access::PublicRead => operation.is_mutation(),
        Access::PublicCreate => operation != Operation::Create,
        Access::AdminOnly => true,
    }
}

/// Run the authorization resolver over the request's `Authorization` header
pub async fn require_admin(resolver: &AuthorizationResolver, headers: &HeaderMap) -> Result<Subject, ApiError> {
    let authorization = match headers.get(AUTHORIZATION) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| ApiError::unauthorized("Invalid Authorization header format"))?,
        ),
        None => None,
    };

    let decision = resolver.resolve(authorization).await;
    match (decision.allowed, decision.subject.clone()) {
        (true, Some(subject)) => Ok(subject),
        _ => Err(decision.into()),
    }
}

/// Listener id from `x-listener-id`, ignored when absent or not a UUID
pub fn listener_id(headers: &HeaderMap) -> Option<ListenerId> {
    headers
        .get(LISTENER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn access_policies() {
        assert!(!requires_admin(Access::PublicRead, Operation::List));
        assert!(!requires_admin(Access::PublicRead, Operation::Get));
        assert!(requires_admin(Access::PublicRead, Operation::Delete));

        assert!(!requires_admin(Access::PublicCreate, Operation::Create));
        assert!(requires_admin(Access::PublicCreate, Operation::List));
        assert!(requires_admin(Access::PublicCreate, Operation::Update));

        assert!(requires_admin(Access::AdminOnly, Operation::Get));
    }

    #[test]
    fn listener_header_must_be_a_uuid() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(LISTENER_ID_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
        assert_eq!(listener_id(&headers), Some(id));

        headers.insert(LISTENER_ID_HEADER, HeaderValue::from_static("me"));
        assert_eq!(listener_id(&headers), None);
    }
}
