use axum::{extract::State, routing::get, Json, Router};
use time::OffsetDateTime;
use tracing::instrument;

use super::{dto::DashboardView, services};
use crate::{auth::Session, state::AppState, view::PageState};

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(get_dashboard))
}

#[instrument(skip(state, session), fields(user_id = %session.id))]
pub async fn get_dashboard(
    State(state): State<AppState>,
    session: Session,
) -> Json<PageState<DashboardView>> {
    let now = OffsetDateTime::now_utc();
    Json(services::build_dashboard(state.remote.as_ref(), &session, now).await)
}
