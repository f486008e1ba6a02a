use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::collections::HashSet;
use std::sync::Arc;

use crate::config::{Config, Permission};
use crate::tracker::{Selector, SharedController};
use crate::web::api::error::ErrorResponse;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub controller: SharedController,
    pub selector: Arc<Selector>,
}

/// Caller identified by a bearer API key.
#[derive(Debug, Clone)]
pub struct Operator {
    pub name: String,
    pub permissions: HashSet<Permission>,
}

impl Operator {
    /// `control` implies `view`.
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
            || (permission == Permission::View && self.permissions.contains(&Permission::Control))
    }
}

#[derive(Debug, PartialEq)]
pub enum AuthError {
    MissingAuth,
    InvalidFormat,
    InvalidKey,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingAuth => "Missing Authorization header",
            AuthError::InvalidFormat => "Invalid Authorization format",
            AuthError::InvalidKey => "Invalid API key",
        };
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::with_message("unauthorized", message)),
        )
            .into_response()
    }
}

#[derive(Debug)]
pub struct PermissionError(pub Permission);

impl IntoResponse for PermissionError {
    fn into_response(self) -> Response {
        (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::with_message(
                "forbidden",
                &format!("{:?} permission required", self.0),
            )),
        )
            .into_response()
    }
}

impl FromRequestParts<AppState> for Operator {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuth)?
            .to_str()
            .map_err(|_| AuthError::InvalidFormat)?;
        authenticate(&state.config, header)
    }
}

fn authenticate(config: &Config, header: &str) -> Result<Operator, AuthError> {
    let key = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidFormat)?;

    let api_key = config.find_api_key(key.trim()).ok_or_else(|| {
        log::warn!("Rejected request with unknown API key");
        AuthError::InvalidKey
    })?;

    Ok(Operator {
        name: api_key.name.clone(),
        permissions: api_key.permissions.clone(),
    })
}

pub fn require_permission(operator: &Operator, permission: Permission) -> Result<(), PermissionError> {
    if operator.has_permission(permission) {
        Ok(())
    } else {
        log::warn!("{} lacks {:?} permission", operator.name, permission);
        Err(PermissionError(permission))
    }
}
