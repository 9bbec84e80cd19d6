use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::AppError,
    repository::RepositoryState,
    visibility::PageScope,
};

/// Claims
///
/// Payload expected inside a bearer JWT. Tokens are issued elsewhere; this service
/// only verifies them.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the profile UUID.
    pub sub: Uuid,
    pub exp: usize,
    pub iat: usize,
}

/// AuthUser
///
/// The resolved identity of an authenticated request.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub is_staff: bool,
}

/// Requester
///
/// Everything the visibility gate and plugin permission checks know about the
/// caller: an optional identity, the current site and the request time.
#[derive(Debug, Clone)]
pub struct Requester {
    pub user: Option<AuthUser>,
    pub site_id: i64,
    pub now: DateTime<Utc>,
}

impl Requester {
    pub fn anonymous(site_id: i64) -> Self {
        Self {
            user: None,
            site_id,
            now: Utc::now(),
        }
    }

    pub fn authenticated(user: AuthUser, site_id: i64) -> Self {
        Self {
            user: Some(user),
            site_id,
            now: Utc::now(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_staff(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_staff)
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user.as_ref().map(|u| u.id)
    }

    pub fn page_scope(&self) -> PageScope {
        PageScope {
            site_id: self.site_id,
            staff: self.is_staff(),
            authenticated: self.is_authenticated(),
            now: self.now,
        }
    }
}

/// Requester Extractor Implementation
///
/// Anonymous access is allowed everywhere, so a request without credentials
/// resolves to an anonymous requester. Credentials that are present but invalid
/// are rejected with 401 rather than silently downgraded.
///
/// 1. Local bypass: `x-user-id` naming an existing profile (Env::Local only). A
///    header that names no profile is rejected.
/// 2. Bearer JWT validation and profile lookup.
/// 3. Current site resolution from the Host header.
impl<S> FromRequestParts<S> for Requester
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let user = authenticate(parts, &repo, &config).await?;
        let site_id = resolve_site(parts, &repo, &config).await?;

        Ok(Requester {
            user,
            site_id,
            now: Utc::now(),
        })
    }
}

async fn authenticate(
    parts: &Parts,
    repo: &RepositoryState,
    config: &AppConfig,
) -> Result<Option<AuthUser>, AppError> {
    if config.env == Env::Local {
        if let Some(raw) = parts.headers.get("x-user-id") {
            // A bypass header that names no profile is a bad credential, not anonymity.
            let user_id = raw
                .to_str()
                .ok()
                .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
                .ok_or(AppError::Unauthorized)?;

            let user = repo
                .get_user(user_id)
                .await?
                .ok_or(AppError::Unauthorized)?;

            return Ok(Some(AuthUser {
                id: user.id,
                is_staff: user.is_staff,
            }));
        }
    }

    let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let token = auth_header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;

    let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;

    let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
        match e.kind() {
            ErrorKind::ExpiredSignature => tracing::debug!("rejected expired token"),
            other => tracing::debug!(kind = ?other, "rejected invalid token"),
        }
        AppError::Unauthorized
    })?;

    // A valid token for a deleted profile is still rejected.
    let user = repo
        .get_user(token_data.claims.sub)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(Some(AuthUser {
        id: user.id,
        is_staff: user.is_staff,
    }))
}

async fn resolve_site(
    parts: &Parts,
    repo: &RepositoryState,
    config: &AppConfig,
) -> Result<i64, AppError> {
    let host = parts
        .headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(strip_port);

    if let Some(host) = host {
        if let Some(site) = repo.get_site_by_domain(host).await? {
            return Ok(site.id);
        }
    }

    Ok(config.default_site_id)
}

fn strip_port(host: &str) -> &str {
    // Bracketed IPv6 literals keep their colons.
    if let Some(end) = host.strip_prefix('[').and_then(|rest| rest.find(']')) {
        return &host[..end + 2];
    }
    host.split(':').next().unwrap_or(host)
}
