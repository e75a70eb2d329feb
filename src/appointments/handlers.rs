use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::instrument;

use super::{
    dto::{AppointmentsView, CalendarQuery},
    services,
};
use crate::{auth::Session, error::ApiError, state::AppState, view::PageState};

pub fn appointments_routes() -> Router<AppState> {
    Router::new().route("/appointments", get(calendar))
}

#[instrument(skip(state, session), fields(user_id = %session.id))]
pub async fn calendar(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<PageState<AppointmentsView>>, ApiError> {
    let selected = match query.date.as_deref().filter(|d| !d.trim().is_empty()) {
        Some(raw) => Some(
            services::parse_day(raw)
                .ok_or_else(|| ApiError::BadRequest("date must be YYYY-MM-DD".into()))?,
        ),
        None => None,
    };
    let page = services::build_appointments_page(
        state.remote.as_ref(),
        session.id,
        selected,
        OffsetDateTime::now_utc(),
    )
    .await;
    Ok(Json(page))
}
