use axum::{
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{FormOutcome, PasswordForm, ProfileForm, SettingsView},
    services,
};
use crate::{auth::Session, state::AppState};

pub fn settings_routes() -> Router<AppState> {
    Router::new()
        .route("/settings", get(get_settings))
        .route("/settings/profile", post(post_profile))
        .route("/settings/password", post(post_password))
}

#[instrument(skip(session), fields(user_id = %session.id))]
pub async fn get_settings(session: Session) -> Json<SettingsView> {
    Json(services::initial_view(&session))
}

#[instrument(skip(session, form), fields(user_id = %session.id))]
pub async fn post_profile(
    session: Session,
    Json(form): Json<ProfileForm>,
) -> Json<FormOutcome<ProfileForm>> {
    info!("profile submitted");
    Json(services::save_profile(&session, form))
}

#[instrument(skip(session, form), fields(user_id = %session.id))]
pub async fn post_password(
    session: Session,
    Json(form): Json<PasswordForm>,
) -> Json<FormOutcome<PasswordForm>> {
    let out = services::change_password(form);
    info!(variant = ?out.notification.variant, "password form submitted");
    Json(out)
}
