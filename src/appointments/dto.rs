use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalendarQuery {
    /// `YYYY-MM-DD`; today (UTC) when absent.
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppointmentItem {
    pub id: Uuid,
    pub patient_name: String,
    pub date: String,
    pub time: String,
}

/// One panel of the calendar; `empty_message` is set only when `items` is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppointmentList {
    pub items: Vec<AppointmentItem>,
    pub empty_message: Option<&'static str>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AppointmentsView {
    pub selected_date: String,
    pub selected: AppointmentList,
    pub today: AppointmentList,
    pub upcoming: AppointmentList,
    pub total: usize,
}
