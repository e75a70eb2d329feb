//! Header shown on every page: who is signed in.

use axum::{routing::get, Json, Router};
use serde::Serialize;
use tracing::instrument;

use crate::{auth::Session, state::AppState};

const ANONYMOUS: &str = "Usuário";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderView {
    pub display_name: String,
    pub greeting: String,
    pub initials: String,
    pub email: String,
}

pub fn display_name(session: &Session) -> &str {
    match session.name.as_deref() {
        Some(name) => name,
        None if !session.email.is_empty() => &session.email,
        None => ANONYMOUS,
    }
}

pub fn initials(session: &Session) -> String {
    if let Some(name) = session.name.as_deref() {
        return name
            .split_whitespace()
            .filter_map(|w| w.chars().next())
            .flat_map(char::to_uppercase)
            .collect();
    }
    let from_email: String = session.email.chars().take(2).flat_map(char::to_uppercase).collect();
    if from_email.is_empty() {
        "U".to_string()
    } else {
        from_email
    }
}

pub fn header(session: &Session) -> HeaderView {
    let display_name = display_name(session);
    let first = display_name.split_whitespace().next().unwrap_or(display_name);
    HeaderView {
        greeting: format!("Olá, {first}!"),
        display_name: display_name.to_string(),
        initials: initials(session),
        email: session.email.clone(),
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/shell", get(get_shell))
}

#[instrument(skip(session), fields(user_id = %session.id))]
pub async fn get_shell(session: Session) -> Json<HeaderView> {
    Json(header(&session))
}
