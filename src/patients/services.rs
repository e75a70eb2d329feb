use lazy_static::lazy_static;
use regex::Regex;
use time::{macros::format_description, OffsetDateTime, UtcOffset};
use uuid::Uuid;

use super::dto::{PatientCard, PatientFilters, PatientsView};
use crate::error::RemoteError;
use crate::remote::{fetch_rows, Query, RemoteClient, Scope, SortOrder};
use crate::schema::{Patient, Table};
use crate::view::PageState;

const NO_NAME: &str = "Nome não informado";
const NO_NUMBER: &str = "N/A";
const NEVER: &str = "Nunca";
const NO_MATCHES: &str = "Nenhum paciente encontrado com os filtros aplicados.";
const NO_PATIENTS: &str =
    "Nenhum paciente cadastrado ainda. Comece adicionando seu primeiro paciente!";

pub async fn load_patients(
    remote: &dyn RemoteClient,
    user_id: Uuid,
) -> Result<Vec<Patient>, RemoteError> {
    let q = Query::table(Table::Patients)
        .scoped(Scope::Owner(user_id))
        .order_by("created_at", SortOrder::Desc);
    fetch_rows(remote, &q).await
}

fn matches_search(patient: &Patient, search: &str) -> bool {
    if search.is_empty() {
        return true;
    }
    let needle = search.to_lowercase();
    let by_name = patient
        .name
        .as_deref()
        .is_some_and(|n| n.to_lowercase().contains(&needle));
    let by_number = patient
        .whatsapp_number
        .as_deref()
        .is_some_and(|n| n.contains(search));
    by_name || by_number
}

fn matches_tag(patient: &Patient, tag: &str) -> bool {
    tag.is_empty() || patient.has_tag(tag)
}

/// Patients matching both the search text and the tag.
pub fn filter_patients<'a>(patients: &'a [Patient], search: &str, tag: &str) -> Vec<&'a Patient> {
    patients
        .iter()
        .filter(|p| matches_search(p, search) && matches_tag(p, tag))
        .collect()
}

/// Distinct tags in first-seen order.
pub fn all_tags(patients: &[Patient]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in patients.iter().filter_map(|p| p.tags.as_ref()).flatten() {
        if !tags.contains(tag) {
            tags.push(tag.clone());
        }
    }
    tags
}

/// `"11999999999"` → `"(11) 99999-9999"`; anything else is returned as is.
pub fn format_whatsapp(number: &str) -> String {
    lazy_static! {
        static ref BR_MOBILE: Regex = Regex::new(r"^(\d{2})(\d{5})(\d{4})$").unwrap();
    }
    BR_MOBILE.replace(number, "($1) $2-$3").into_owned()
}

/// `dd/mm/yyyy` of the UTC calendar date.
pub fn format_date(value: Option<OffsetDateTime>) -> String {
    let Some(value) = value else {
        return NEVER.to_string();
    };
    let fmt = format_description!("[day]/[month]/[year]");
    value
        .to_offset(UtcOffset::UTC)
        .format(fmt)
        .unwrap_or_else(|_| NEVER.to_string())
}

fn card(patient: &Patient) -> PatientCard {
    PatientCard {
        id: patient.id,
        name: patient.name.clone().unwrap_or_else(|| NO_NAME.to_string()),
        whatsapp: patient
            .whatsapp_number
            .as_deref()
            .map(format_whatsapp)
            .unwrap_or_else(|| NO_NUMBER.to_string()),
        last_consultation: format_date(patient.last_consultation),
        registered_at: format_date(patient.created_at),
        tags: patient.tags.clone().unwrap_or_default(),
    }
}

pub fn build_view(patients: &[Patient], filters: &PatientFilters) -> PatientsView {
    let cards: Vec<PatientCard> = filter_patients(patients, &filters.search, &filters.tag)
        .into_iter()
        .map(card)
        .collect();
    let empty_message = match (cards.is_empty(), filters.is_active()) {
        (false, _) => None,
        (true, true) => Some(NO_MATCHES),
        (true, false) => Some(NO_PATIENTS),
    };
    PatientsView {
        total: patients.len(),
        patients: cards,
        all_tags: all_tags(patients),
        search: filters.search.clone(),
        tag: filters.tag.clone(),
        empty_message,
    }
}

pub async fn build_patients_page(
    remote: &dyn RemoteClient,
    user_id: Uuid,
    filters: &PatientFilters,
) -> PageState<PatientsView> {
    PageState::Loading
        .settle("patients", load_patients(remote, user_id).await)
        .map(|patients| build_view(&patients, filters))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::memory::MemoryRemote;
    use serde_json::json;
    use time::macros::datetime;

    fn patient(name: Option<&str>, number: Option<&str>, tags: &[&str]) -> Patient {
        Patient {
            id: Uuid::new_v4(),
            user_id: None,
            name: name.map(str::to_string),
            whatsapp_number: number.map(str::to_string),
            tags: if tags.is_empty() {
                None
            } else {
                Some(tags.iter().map(|t| t.to_string()).collect())
            },
            last_consultation: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn roster() -> Vec<Patient> {
        vec![
            patient(Some("Maria Silva"), Some("11987654321"), &["diabetes", "vegano"]),
            patient(Some("João Santos"), Some("21912345678"), &["esportista"]),
            patient(Some("ana costa"), None, &["vegano"]),
            patient(None, Some("31999990000"), &[]),
            patient(None, None, &[]),
        ]
    }

    fn names(found: &[&Patient]) -> Vec<Option<String>> {
        found.iter().map(|p| p.name.clone()).collect()
    }

    #[test]
    fn empty_filters_keep_everyone() {
        let all = roster();
        assert_eq!(filter_patients(&all, "", "").len(), all.len());
    }

    #[test]
    fn search_is_case_insensitive_on_name_and_raw_on_number() {
        let all = roster();
        assert_eq!(
            names(&filter_patients(&all, "ANA", "")),
            vec![Some("ana costa".to_string())]
        );
        assert_eq!(
            names(&filter_patients(&all, "silva", "")),
            vec![Some("Maria Silva".to_string())]
        );
        let by_number = filter_patients(&all, "99990", "");
        assert_eq!(by_number.len(), 1);
        assert_eq!(by_number[0].whatsapp_number.as_deref(), Some("31999990000"));
        // formatted input does not match raw digits
        assert!(filter_patients(&all, "(11)", "").is_empty());
    }

    #[test]
    fn tag_is_exact_and_anded_with_search() {
        let all = roster();
        assert_eq!(filter_patients(&all, "", "vegano").len(), 2);
        assert!(filter_patients(&all, "", "vegan").is_empty());
        assert_eq!(
            names(&filter_patients(&all, "maria", "vegano")),
            vec![Some("Maria Silva".to_string())]
        );
        assert!(filter_patients(&all, "joão", "vegano").is_empty());
    }

    #[test]
    fn tags_are_distinct_in_first_seen_order() {
        assert_eq!(all_tags(&roster()), vec!["diabetes", "vegano", "esportista"]);
        assert!(all_tags(&[]).is_empty());
    }

    #[test]
    fn whatsapp_formatting() {
        assert_eq!(format_whatsapp("11999999999"), "(11) 99999-9999");
        assert_eq!(format_whatsapp("1199999999"), "1199999999");
        assert_eq!(format_whatsapp("5511999999999"), "5511999999999");
        assert_eq!(format_whatsapp("(11) 99999-9999"), "(11) 99999-9999");
    }

    #[test]
    fn dates_render_pt_br() {
        assert_eq!(format_date(Some(datetime!(2026-03-07 18:00 UTC))), "07/03/2026");
        assert_eq!(format_date(None), "Nunca");
    }

    #[test]
    fn view_uses_fallback_labels_and_empty_messages() {
        let all = roster();
        let view = build_view(&all, &PatientFilters::default());
        assert_eq!(view.total, 5);
        assert_eq!(view.patients[2].whatsapp, "N/A");
        assert_eq!(view.patients[3].name, "Nome não informado");
        assert_eq!(view.patients[0].whatsapp, "(11) 98765-4321");
        assert_eq!(view.patients[0].last_consultation, "Nunca");
        assert_eq!(view.empty_message, None);

        let filtered = build_view(
            &all,
            &PatientFilters {
                search: "ninguém".into(),
                tag: String::new(),
            },
        );
        assert_eq!(filtered.total, 5);
        assert_eq!(filtered.empty_message, Some(NO_MATCHES));

        let none = build_view(&[], &PatientFilters::default());
        assert_eq!(none.empty_message, Some(NO_PATIENTS));
    }

    #[tokio::test]
    async fn page_loads_newest_first_for_session_user() {
        let me = Uuid::new_v4();
        let remote = MemoryRemote::new();
        remote.seed(
            Table::Patients,
            vec![
                json!({"id": Uuid::new_v4(), "user_id": me, "name": "Antiga", "created_at": "2026-01-01T00:00:00Z"}),
                json!({"id": Uuid::new_v4(), "user_id": me, "name": "Nova", "created_at": "2026-09-01T00:00:00Z"}),
                json!({"id": Uuid::new_v4(), "user_id": Uuid::new_v4(), "name": "Alheia", "created_at": "2026-10-01T00:00:00Z"}),
            ],
        );
        let page = build_patients_page(&remote, me, &PatientFilters::default()).await;
        let view = page.data().unwrap();
        let shown: Vec<&str> = view.patients.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(shown, vec!["Nova", "Antiga"]);
        assert_eq!(view.patients[0].registered_at, "01/09/2026");
    }

    #[tokio::test]
    async fn failed_fetch_renders_empty_roster() {
        let remote = MemoryRemote::new();
        remote.fail_all();
        let page = build_patients_page(&remote, Uuid::new_v4(), &PatientFilters::default()).await;
        assert!(page.is_degraded());
        let view = page.data().unwrap();
        assert_eq!(view.total, 0);
        assert_eq!(view.empty_message, Some(NO_PATIENTS));
    }
}
