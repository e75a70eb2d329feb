//! Session identity and sign-out.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{error, warn};
use uuid::Uuid;

use super::jwt::AuthUser;
use crate::{error::ApiError, schema::User, state::AppState};

/// The logged-in practitioner, as every page sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    #[serde(skip)]
    pub session_id: Uuid,
}

impl Session {
    pub fn from_user(user: User, session_id: Uuid) -> Self {
        let name = user
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        Self {
            id: user.id,
            email: user.email,
            name,
            session_id,
        }
    }

    /// Identity as signed into the access token, for when the user row
    /// cannot be read.
    pub fn from_token(auth: AuthUser) -> Self {
        let name = auth
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        Self {
            id: auth.user_id,
            email: auth.email,
            name,
            session_id: auth.session_id,
        }
    }

    /// First word of the display name, if the user set one.
    pub fn first_name(&self) -> Option<&str> {
        self.name.as_deref().and_then(|n| n.split_whitespace().next())
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;
        match User::find_by_id(state.remote.as_ref(), auth.user_id).await {
            Ok(Some(user)) => Ok(Session::from_user(user, auth.session_id)),
            Ok(None) => {
                warn!(user_id = %auth.user_id, "token for unknown user");
                Err(ApiError::Unauthorized("User not found".into()))
            }
            Err(e) => {
                error!(error = %e, user_id = %auth.user_id, "session lookup failed; using token identity");
                Ok(Session::from_token(auth))
            }
        }
    }
}

/// Signed-out sessions, kept until their last token would have expired.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    revoked: Arc<RwLock<HashMap<Uuid, OffsetDateTime>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revoke(&self, session_id: Uuid, retain_for: Duration) {
        let now = OffsetDateTime::now_utc();
        let until = now + retain_for;
        let mut revoked = self.revoked.write().unwrap_or_else(|p| p.into_inner());
        revoked.retain(|_, expires| *expires > now);
        revoked.insert(session_id, until);
    }

    pub fn is_revoked(&self, session_id: Uuid) -> bool {
        self.revoked
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .contains_key(&session_id)
    }
}
