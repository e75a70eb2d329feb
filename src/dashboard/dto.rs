use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub active_patients_today: u64,
    pub pending_messages: u64,
    pub today_appointments: u64,
    pub total_patients: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdherencePoint {
    pub day: &'static str,
    pub percentage: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngagementEntry {
    pub name: &'static str,
    pub score: u8,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardView {
    pub greeting: String,
    pub stats: DashboardStats,
    /// Placeholder until adherence rows are wired in.
    pub adherence_rate: u8,
    pub weekly_adherence: Vec<AdherencePoint>,
    pub engagement_ranking: Vec<EngagementEntry>,
}
