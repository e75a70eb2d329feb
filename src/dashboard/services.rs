use time::{macros::time, Date, OffsetDateTime};
use uuid::Uuid;

use super::dto::{AdherencePoint, DashboardStats, DashboardView, EngagementEntry};
use crate::auth::Session;
use crate::remote::{fetch_count, Query, RemoteClient, Scope};
use crate::schema::{Direction, Table};
use crate::view::{recover, PageState};

// TODO: derive the chart series from the adherence and interactions tables
const WEEKLY_ADHERENCE: [(&str, u8); 7] = [
    ("Seg", 85),
    ("Ter", 92),
    ("Qua", 78),
    ("Qui", 88),
    ("Sex", 95),
    ("Sáb", 82),
    ("Dom", 90),
];

const ENGAGEMENT_RANKING: [(&str, u8); 5] = [
    ("Maria Silva", 95),
    ("João Santos", 88),
    ("Ana Costa", 82),
    ("Pedro Lima", 78),
    ("Carla Mendes", 75),
];

const ADHERENCE_RATE: u8 = 87;

const FALLBACK_NAME: &str = "Nutricionista";

/// Placeholder heuristic: 30% of all patients, rounded down.
pub fn active_patients_today(total_patients: u64) -> u64 {
    (total_patients / 10) * 3 + (total_patients % 10) * 3 / 10
}

/// `[{day}T00:00:00, {day}T23:59:59)` in UTC.
pub fn day_window(day: Date) -> (OffsetDateTime, OffsetDateTime) {
    (
        day.midnight().assume_utc(),
        day.with_time(time!(23:59:59)).assume_utc(),
    )
}

pub fn greeting(session: &Session, active_today: u64) -> String {
    let name = session.first_name().unwrap_or(FALLBACK_NAME);
    format!("Hoje a {name} cuidou de {active_today} pacientes para você!")
}

fn queries(user_id: Uuid, today: Date) -> [Query; 3] {
    let (start, end) = day_window(today);
    [
        Query::table(Table::Patients).scoped(Scope::Owner(user_id)),
        Query::table(Table::Appointments)
            .scoped(Scope::PatientOwner(user_id))
            .gte("datetime", start)
            .lt("datetime", end),
        Query::table(Table::Interactions)
            .scoped(Scope::PatientOwner(user_id))
            .eq("direction", Direction::In.as_str())
            .gte("timestamp", start),
    ]
}

/// Runs the three counts concurrently. Each failed count reads as zero.
pub async fn load_stats(
    remote: &dyn RemoteClient,
    user_id: Uuid,
    today: Date,
) -> (DashboardStats, bool) {
    let [patients, appointments, inbound] = queries(user_id, today);
    let (patients, appointments, inbound) = tokio::join!(
        fetch_count(remote, &patients),
        fetch_count(remote, &appointments),
        fetch_count(remote, &inbound),
    );

    let (total_patients, d1) = recover("dashboard.total_patients", patients);
    let (today_appointments, d2) = recover("dashboard.today_appointments", appointments);
    let (pending_messages, d3) = recover("dashboard.pending_messages", inbound);

    let stats = DashboardStats {
        active_patients_today: active_patients_today(total_patients),
        pending_messages,
        today_appointments,
        total_patients,
    };
    (stats, d1 || d2 || d3)
}

pub async fn build_dashboard(
    remote: &dyn RemoteClient,
    session: &Session,
    now: OffsetDateTime,
) -> PageState<DashboardView> {
    let today = now.to_offset(time::UtcOffset::UTC).date();
    let (stats, degraded) = load_stats(remote, session.id, today).await;

    let view = DashboardView {
        greeting: greeting(session, stats.active_patients_today),
        stats,
        adherence_rate: ADHERENCE_RATE,
        weekly_adherence: WEEKLY_ADHERENCE
            .iter()
            .map(|&(day, percentage)| AdherencePoint { day, percentage })
            .collect(),
        engagement_ranking: ENGAGEMENT_RANKING
            .iter()
            .map(|&(name, score)| EngagementEntry { name, score })
            .collect(),
    };
    PageState::Loading.resolve(view, degraded)
}
