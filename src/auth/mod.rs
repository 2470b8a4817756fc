pub mod directory;
pub mod resolver;
pub mod verifier;

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use directory::{EmailMatch, MemoryDirectory, PgDirectory, UserDirectory};
pub use resolver::{bearer_token, AuthDecision, AuthError, AuthorizationResolver, GrantSource};
pub use verifier::{IdentityVerifier, JwtVerifier, RemoteVerifier, VerifyError};

/// Role that grants administration of every resource
pub const ADMIN_ROLE: &str = "admin";

/// Authenticated caller, rebuilt from the bearer credential on every request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub email: Option<String>,
    pub roles: Vec<String>,
}

impl Subject {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }
}

/// Token claims. Roles may sit at the top level or inside either metadata bag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_metadata: Option<Value>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(sub: String, email: Option<String>, role: Option<String>, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub,
            email,
            app_metadata: role.map(|r| serde_json::json!({ "role": r })),
            role: None,
            user_metadata: None,
            exp,
            iat: now.timestamp(),
        }
    }

    pub fn into_subject(self) -> Subject {
        let roles = collect_roles(
            self.role.as_deref(),
            self.app_metadata.as_ref(),
            self.user_metadata.as_ref(),
        );
        Subject { id: self.sub, email: self.email, roles }
    }
}

/// Gather role claims from the top level and the two metadata bags, in that order
pub(crate) fn collect_roles(top: Option<&str>, app: Option<&Value>, user: Option<&Value>) -> Vec<String> {
    let mut roles: Vec<String> = Vec::new();
    let mut push = |role: &str| {
        if !role.is_empty() && !roles.iter().any(|r| r == role) {
            roles.push(role.to_string());
        }
    };

    if let Some(role) = top {
        push(role);
    }
    for bag in [app, user].into_iter().flatten() {
        match bag.get("role") {
            Some(Value::String(role)) => push(role.as_str()),
            Some(Value::Array(list)) => list.iter().filter_map(Value::as_str).for_each(&mut push),
            _ => {}
        }
        if let Some(Value::Array(list)) = bag.get("roles") {
            list.iter().filter_map(Value::as_str).for_each(&mut push);
        }
    }
    roles
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT secret")]
    InvalidSecret,
}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}
