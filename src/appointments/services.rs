use time::{macros::format_description, Date, OffsetDateTime, UtcOffset};
use uuid::Uuid;

use super::dto::{AppointmentItem, AppointmentList, AppointmentsView};
use crate::error::RemoteError;
use crate::remote::{fetch_rows, Query, RemoteClient, Scope, SortOrder};
use crate::schema::{AppointmentWithPatient, Table};
use crate::view::PageState;

pub const UPCOMING_LIMIT: usize = 5;

const UNKNOWN_PATIENT: &str = "Paciente não identificado";
const NO_DATE: &str = "Data não definida";
const NO_TIME: &str = "--:--";
const NONE_ON_DAY: &str = "Nenhuma consulta agendada para este dia.";
const NONE_TODAY: &str = "Nenhuma consulta hoje.";
const NONE_UPCOMING: &str = "Nenhuma consulta agendada.";

pub async fn load_appointments(
    remote: &dyn RemoteClient,
    user_id: Uuid,
) -> Result<Vec<AppointmentWithPatient>, RemoteError> {
    let q = Query::table(Table::Appointments)
        .scoped(Scope::PatientOwner(user_id))
        .embed_patient()
        .order_by("datetime", SortOrder::Asc);
    fetch_rows(remote, &q).await
}

fn utc_date(t: OffsetDateTime) -> Date {
    t.to_offset(UtcOffset::UTC).date()
}

pub fn parse_day(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).ok()
}

/// Appointments on `day`, by UTC calendar date only.
pub fn appointments_for_date(
    appointments: &[AppointmentWithPatient],
    day: Date,
) -> Vec<&AppointmentWithPatient> {
    appointments
        .iter()
        .filter(|a| a.appointment.datetime.map(utc_date) == Some(day))
        .collect()
}

/// The next few appointments strictly after `now`, soonest first.
pub fn upcoming_appointments(
    appointments: &[AppointmentWithPatient],
    now: OffsetDateTime,
) -> Vec<&AppointmentWithPatient> {
    let mut future: Vec<_> = appointments
        .iter()
        .filter(|a| a.appointment.datetime.is_some_and(|t| t > now))
        .collect();
    future.sort_by_key(|a| a.appointment.datetime);
    future.truncate(UPCOMING_LIMIT);
    future
}

/// (`dd/mm/yyyy`, `HH:MM`) in UTC.
pub fn format_date_time(value: Option<OffsetDateTime>) -> (String, String) {
    let Some(value) = value.map(|v| v.to_offset(UtcOffset::UTC)) else {
        return (NO_DATE.to_string(), NO_TIME.to_string());
    };
    let date = value
        .format(format_description!("[day]/[month]/[year]"))
        .unwrap_or_else(|_| NO_DATE.to_string());
    let time = value
        .format(format_description!("[hour]:[minute]"))
        .unwrap_or_else(|_| NO_TIME.to_string());
    (date, time)
}

fn item(a: &AppointmentWithPatient) -> AppointmentItem {
    let (date, time) = format_date_time(a.appointment.datetime);
    AppointmentItem {
        id: a.appointment.id,
        patient_name: a
            .patients
            .as_ref()
            .and_then(|p| p.name.clone())
            .unwrap_or_else(|| UNKNOWN_PATIENT.to_string()),
        date,
        time,
    }
}

fn list(found: Vec<&AppointmentWithPatient>, empty: &'static str) -> AppointmentList {
    let items: Vec<AppointmentItem> = found.into_iter().map(item).collect();
    let empty_message = items.is_empty().then_some(empty);
    AppointmentList {
        items,
        empty_message,
    }
}

pub fn build_view(
    appointments: &[AppointmentWithPatient],
    selected: Date,
    now: OffsetDateTime,
) -> AppointmentsView {
    let selected_date = selected
        .format(format_description!("[day]/[month]/[year]"))
        .unwrap_or_default();
    AppointmentsView {
        selected_date,
        selected: list(appointments_for_date(appointments, selected), NONE_ON_DAY),
        today: list(appointments_for_date(appointments, utc_date(now)), NONE_TODAY),
        upcoming: list(upcoming_appointments(appointments, now), NONE_UPCOMING),
        total: appointments.len(),
    }
}

pub async fn build_appointments_page(
    remote: &dyn RemoteClient,
    user_id: Uuid,
    selected: Option<Date>,
    now: OffsetDateTime,
) -> PageState<AppointmentsView> {
    let selected = selected.unwrap_or_else(|| utc_date(now));
    PageState::Loading
        .settle("appointments", load_appointments(remote, user_id).await)
        .map(|rows| build_view(&rows, selected, now))
}
