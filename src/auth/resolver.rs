// Decides whether a caller may administer a resource.
//
// Signals are checked in a fixed order and the first grant wins: the role claim
// carried by the verified credential, then the user directory looked up by email,
// then (only in builds with the `dev-bypass` feature) the development bypass.

use axum::http::StatusCode;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::directory::{EmailMatch, UserDirectory};
use super::verifier::IdentityVerifier;
use super::{Subject, ADMIN_ROLE};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Missing authorization credential")]
    MissingCredential,
    #[error("Authorization header must use Bearer token format")]
    MalformedCredential,
}

/// Which signal granted access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantSource {
    Claim,
    Directory,
    DevelopmentBypass,
}

#[derive(Debug, Clone)]
pub struct AuthDecision {
    pub allowed: bool,
    pub status: StatusCode,
    pub message: String,
    pub subject: Option<Subject>,
    pub source: Option<GrantSource>,
}

impl AuthDecision {
    fn allow(subject: Subject, source: GrantSource) -> Self {
        Self {
            allowed: true,
            status: StatusCode::OK,
            message: "Authorized".to_string(),
            subject: Some(subject),
            source: Some(source),
        }
    }

    fn deny(status: StatusCode, message: impl Into<String>, subject: Option<Subject>) -> Self {
        Self {
            allowed: false,
            status,
            message: message.into(),
            subject,
            source: None,
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::MissingCredential)?;
    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or(AuthError::MalformedCredential)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MalformedCredential);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MalformedCredential);
    }
    Ok(token)
}

pub struct AuthorizationResolver {
    verifier: Arc<dyn IdentityVerifier>,
    directory: Arc<dyn UserDirectory>,
    #[cfg_attr(not(feature = "dev-bypass"), allow(dead_code))]
    development: bool,
}

impl AuthorizationResolver {
    pub fn new(verifier: Arc<dyn IdentityVerifier>, directory: Arc<dyn UserDirectory>) -> Self {
        Self { verifier, directory, development: false }
    }

    /// Enables the bypass in builds compiled with the `dev-bypass` feature
    pub fn with_development(mut self, development: bool) -> Self {
        self.development = development;
        self
    }

    /// Resolve the raw `Authorization` header value. Never errors: every
    /// failure becomes a denial carrying its status.
    pub async fn resolve(&self, authorization: Option<&str>) -> AuthDecision {
        let token = match bearer_token(authorization) {
            Ok(token) => token,
            Err(e) => {
                info!("Authorization denied: {}", e);
                return AuthDecision::deny(StatusCode::UNAUTHORIZED, e.to_string(), None);
            }
        };
        debug!("Bearer credential present");

        let subject = match self.verifier.verify(token).await {
            Ok(subject) => subject,
            Err(e) => {
                warn!("Credential verification failed: {}", e);
                return AuthDecision::deny(StatusCode::UNAUTHORIZED, "Invalid token", None);
            }
        };
        debug!("Verified subject {} with roles {:?}", subject.id, subject.roles);

        if subject.has_role(ADMIN_ROLE) {
            info!("Granted admin to {} by role claim", subject.id);
            return AuthDecision::allow(subject, GrantSource::Claim);
        }

        if self.directory_grants(&subject).await {
            info!("Granted admin to {} by user directory", subject.id);
            return AuthDecision::allow(subject, GrantSource::Directory);
        }

        #[cfg(feature = "dev-bypass")]
        if self.development {
            warn!("DEVELOPMENT BYPASS: granting admin to non-admin subject {}", subject.id);
            return AuthDecision::allow(subject, GrantSource::DevelopmentBypass);
        }

        info!("Authorization denied for {}: not an admin", subject.id);
        AuthDecision::deny(StatusCode::FORBIDDEN, "Forbidden: admin access required", Some(subject))
    }

    /// Case-insensitive lookup first; an exact lookup runs when that errors or
    /// finds no row.
    async fn directory_grants(&self, subject: &Subject) -> bool {
        let Some(email) = subject.email.as_deref().filter(|e| !e.is_empty()) else {
            debug!("Subject {} has no email, skipping directory lookup", subject.id);
            return false;
        };

        let role = match self.directory.role_for_email(email, EmailMatch::CaseInsensitive).await {
            Ok(Some(role)) => Some(role),
            Ok(None) => {
                debug!("No directory entry for {} (case-insensitive)", email);
                self.exact_lookup(email).await
            }
            Err(e) => {
                warn!("Directory lookup failed for {}: {}; retrying exact match", email, e);
                self.exact_lookup(email).await
            }
        };

        match role {
            Some(role) if role.eq_ignore_ascii_case(ADMIN_ROLE) => true,
            Some(role) => {
                debug!("Directory role for {} is '{}'", email, role);
                false
            }
            None => false,
        }
    }

    async fn exact_lookup(&self, email: &str) -> Option<String> {
        match self.directory.role_for_email(email, EmailMatch::Exact).await {
            Ok(role) => role,
            Err(e) => {
                warn!("Exact directory lookup failed for {}: {}", email, e);
                None
            }
        }
    }
}
