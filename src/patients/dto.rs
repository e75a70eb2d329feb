use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Query string of `GET /patients`. Empty values disable a filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientFilters {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub tag: String,
}

impl PatientFilters {
    pub fn is_active(&self) -> bool {
        !self.search.is_empty() || !self.tag.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatientCard {
    pub id: Uuid,
    pub name: String,
    pub whatsapp: String,
    pub last_consultation: String,
    pub registered_at: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PatientsView {
    /// All patients of the practitioner, before filtering.
    pub total: usize,
    pub patients: Vec<PatientCard>,
    pub all_tags: Vec<String>,
    pub search: String,
    pub tag: String,
    pub empty_message: Option<&'static str>,
}
