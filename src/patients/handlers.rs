use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{PatientFilters, PatientsView},
    services,
};
use crate::{auth::Session, state::AppState, view::PageState};

pub fn patients_routes() -> Router<AppState> {
    Router::new().route("/patients", get(list_patients))
}

#[instrument(skip(state, session), fields(user_id = %session.id))]
pub async fn list_patients(
    State(state): State<AppState>,
    session: Session,
    Query(filters): Query<PatientFilters>,
) -> Json<PageState<PatientsView>> {
    Json(services::build_patients_page(state.remote.as_ref(), session.id, &filters).await)
}
