use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RefreshRequest, RegisterRequest},
        jwt::{AuthUser, JwtKeys, TokenKind},
        password::{self, PasswordError},
        session::Session,
    },
    error::{ApiError, RemoteError},
    schema::User,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(raw: &str) -> Result<String, ApiError> {
    let email = raw.trim().to_lowercase();
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::BadRequest("Invalid email".into()));
    }
    Ok(email)
}

/// A concurrent signup can win the insert after our lookup said the email
/// was free; the unique constraint decides.
fn creation_error(e: RemoteError) -> ApiError {
    match e {
        RemoteError::Duplicate(constraint) => {
            warn!(%constraint, "email registered concurrently");
            ApiError::Conflict("Email already registered".into())
        }
        e => {
            error!(error = %e, "create user failed");
            ApiError::from(e)
        }
    }
}

fn respond(keys: &JwtKeys, user: User, session_id: Uuid) -> Result<Json<AuthResponse>, ApiError> {
    let pair = keys.issue_pair(&user, session_id).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        ApiError::internal(e)
    })?;
    Ok(Json(AuthResponse {
        access_token: pair.access,
        refresh_token: pair.refresh,
        user: PublicUser {
            id: user.id,
            email: user.email,
            name: user.name,
        },
    }))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = normalize_email(&payload.email)?;

    if let Err(e) = password::check_strength(&payload.password) {
        warn!("password too short");
        return Err(ApiError::BadRequest(e.to_string()));
    }

    if User::find_by_email(state.remote.as_ref(), &email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let hash = password::hash_password(&payload.password).map_err(ApiError::internal)?;
    let name = payload
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let user = User::create(state.remote.as_ref(), &email, name, &hash)
        .await
        .map_err(creation_error)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    respond(&JwtKeys::from_ref(&state), user, Uuid::new_v4())
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = normalize_email(&payload.email)?;

    let user = match User::find_by_email(state.remote.as_ref(), &email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(email = %email, "login unknown email");
            return Err(ApiError::Unauthorized("Invalid credentials".into()));
        }
        Err(e) => {
            error!(error = %e, "find_by_email failed");
            return Err(e.into());
        }
    };

    match password::verify_password(&payload.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            warn!(email = %email, user_id = %user.id, "login invalid password");
            return Err(ApiError::Unauthorized("Invalid credentials".into()));
        }
        Err(e @ PasswordError::MalformedHash(_)) => {
            error!(error = %e, user_id = %user.id, "stored hash unusable");
            return Err(ApiError::internal(e));
        }
        Err(e) => return Err(ApiError::internal(e)),
    }

    info!(user_id = %user.id, email = %user.email, "user logged in");
    respond(&JwtKeys::from_ref(&state), user, Uuid::new_v4())
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify(&payload.refresh_token, TokenKind::Refresh)
        .map_err(|e| {
            warn!(error = %e, "rejected refresh token");
            ApiError::Unauthorized("Invalid or expired token".into())
        })?;

    if state.sessions.is_revoked(claims.sid) {
        warn!(user_id = %claims.sub, "refresh for signed-out session");
        return Err(ApiError::Unauthorized("Session ended".into()));
    }

    let user = User::find_by_id(state.remote.as_ref(), claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;

    respond(&keys, user, claims.sid)
}

/// Sign-out: every token of the current session stops working.
#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> StatusCode {
    let keys = JwtKeys::from_ref(&state);
    state.sessions.revoke(auth.session_id, keys.refresh_ttl);
    info!(user_id = %auth.user_id, session_id = %auth.session_id, "user signed out");
    StatusCode::NO_CONTENT
}

#[instrument(skip(session), fields(user_id = %session.id))]
pub async fn get_me(session: Session) -> Json<PublicUser> {
    Json(PublicUser {
        id: session.id,
        email: session.email,
        name: session.name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::memory::MemoryRemote;
    use std::sync::Arc;

    fn state() -> (AppState, Arc<MemoryRemote>) {
        let remote = Arc::new(MemoryRemote::new());
        (AppState::fake_with(remote.clone()), remote)
    }

    fn register_body(email: &str, password: &str) -> Json<RegisterRequest> {
        Json(RegisterRequest {
            email: email.into(),
            password: password.into(),
            name: Some("  Dra. Ana Souza ".into()),
        })
    }

    #[test]
    fn lost_insert_race_is_a_conflict() {
        let dup = creation_error(RemoteError::Duplicate("users_email_key".into()));
        assert!(matches!(dup, ApiError::Conflict(ref m) if m == "Email already registered"));
        let down = creation_error(RemoteError::Unavailable("down".into()));
        assert!(matches!(down, ApiError::Internal(_)));
    }

    #[tokio::test]
    async fn bad_refresh_token_gets_a_fixed_message() {
        let (state, _) = state();
        let res = refresh(
            State(state),
            Json(RefreshRequest {
                refresh_token: "not.a.jwt".into(),
            }),
        )
        .await;
        assert!(matches!(res, Err(ApiError::Unauthorized(ref m)) if m == "Invalid or expired token"));
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("ana@clinica.com.br"));
        assert!(!is_valid_email("ana@clinica"));
        assert!(!is_valid_email("ana clinica@x.com"));
    }

    #[tokio::test]
    async fn register_normalizes_and_rejects_duplicates() {
        let (state, _) = state();
        let Json(res) = register(State(state.clone()), register_body(" ANA@Clinica.com ", "segredo123"))
            .await
            .unwrap();
        assert_eq!(res.user.email, "ana@clinica.com");
        assert_eq!(res.user.name.as_deref(), Some("Dra. Ana Souza"));

        let dup = register(State(state), register_body("ana@clinica.com", "segredo123")).await;
        assert!(matches!(dup, Err(ApiError::Conflict(_))));
    }

    #[tokio::test]
    async fn register_rejects_short_password_and_bad_email() {
        let (state, _) = state();
        let short = register(State(state.clone()), register_body("ana@clinica.com", "123")).await;
        assert!(matches!(short, Err(ApiError::BadRequest(_))));
        let bad = register(State(state), register_body("ana", "segredo123")).await;
        assert!(matches!(bad, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn login_checks_password() {
        let (state, _) = state();
        register(State(state.clone()), register_body("ana@clinica.com", "segredo123"))
            .await
            .unwrap();

        let ok = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "Ana@clinica.com".into(),
                password: "segredo123".into(),
            }),
        )
        .await;
        assert!(ok.is_ok());

        let wrong = login(
            State(state),
            Json(LoginRequest {
                email: "ana@clinica.com".into(),
                password: "segredo124".into(),
            }),
        )
        .await;
        assert!(matches!(wrong, Err(ApiError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn logout_ends_refresh_too() {
        let (state, _) = state();
        let Json(res) = register(State(state.clone()), register_body("ana@clinica.com", "segredo123"))
            .await
            .unwrap();
        let keys = JwtKeys::from_ref(&state);
        let claims = keys.verify(&res.access_token, TokenKind::Access).unwrap();

        let refreshed = refresh(
            State(state.clone()),
            Json(RefreshRequest {
                refresh_token: res.refresh_token.clone(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(refreshed.0.user.id, res.user.id);

        let status = logout(
            State(state.clone()),
            AuthUser {
                user_id: claims.sub,
                session_id: claims.sid,
                email: claims.email.clone(),
                name: claims.name.clone(),
            },
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let after = refresh(
            State(state),
            Json(RefreshRequest {
                refresh_token: res.refresh_token,
            }),
        )
        .await;
        assert!(matches!(after, Err(ApiError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn remote_failure_on_login_is_internal() {
        let (state, remote) = state();
        remote.fail_all();
        let res = login(
            State(state),
            Json(LoginRequest {
                email: "ana@clinica.com".into(),
                password: "segredo123".into(),
            }),
        )
        .await;
        assert!(matches!(res, Err(ApiError::Internal(_))));
    }
}
