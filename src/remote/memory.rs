//! In-memory [`RemoteClient`] for tests. Evaluates the same scoping rules the
//! SQL renders.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::query::{Filter, Op, Query, Scope, SortOrder, Value};
use super::RemoteClient;
use crate::error::RemoteError;
use crate::schema::{ts, Table};

#[derive(Default)]
pub struct MemoryRemote {
    tables: RwLock<HashMap<Table, Vec<JsonValue>>>,
    failing: AtomicBool,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, table: Table, rows: Vec<JsonValue>) {
        self.tables
            .write()
            .unwrap()
            .entry(table)
            .or_default()
            .extend(rows);
    }

    /// Every subsequent call fails as if the database were unreachable.
    pub fn fail_all(&self) {
        self.failing.store(true, AtomicOrdering::SeqCst);
    }

    fn check_available(&self) -> Result<(), RemoteError> {
        if self.failing.load(AtomicOrdering::SeqCst) {
            return Err(RemoteError::Unavailable("memory remote set to fail".into()));
        }
        Ok(())
    }

    fn matching(&self, query: &Query) -> Result<Vec<JsonValue>, RemoteError> {
        self.check_available()?;
        query.validate()?;
        let tables = self.tables.read().unwrap();
        let patients = tables.get(&Table::Patients).cloned().unwrap_or_default();
        let rows = tables.get(&query.table).cloned().unwrap_or_default();
        drop(tables);

        let patient_of = |row: &JsonValue| -> Option<JsonValue> {
            let id = row.get("patient_id")?.as_str()?;
            patients
                .iter()
                .find(|p| p.get("id").and_then(JsonValue::as_str) == Some(id))
                .cloned()
        };

        let mut out = Vec::new();
        for row in rows {
            let in_scope = match query.scope {
                Scope::Unscoped => true,
                Scope::Owner(user) => owned_by(&row, user),
                Scope::PatientOwner(user) => patient_of(&row).is_some_and(|p| owned_by(&p, user)),
            };
            if !in_scope || !query.filters.iter().all(|f| passes(&row, f)) {
                continue;
            }
            let mut row = row;
            if query.embed_patient {
                let patient = patient_of(&row).unwrap_or(JsonValue::Null);
                if let Some(obj) = row.as_object_mut() {
                    obj.insert("patients".into(), patient);
                }
            }
            out.push(row);
        }

        if let Some((column, order)) = query.order {
            out.sort_by(|a, b| {
                let ord = compare_columns(a.get(column), b.get(column));
                match order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            });
        }
        Ok(out)
    }
}

fn owned_by(row: &JsonValue, user: Uuid) -> bool {
    row.get("user_id").and_then(JsonValue::as_str) == Some(user.to_string().as_str())
}

fn passes(row: &JsonValue, filter: &Filter) -> bool {
    let Some(cell) = row.get(filter.column).and_then(JsonValue::as_str) else {
        return false;
    };
    let ord = match &filter.value {
        Value::Text(v) => cell.cmp(v.as_str()),
        Value::Uuid(v) => match Uuid::parse_str(cell) {
            Ok(id) => id.cmp(v),
            Err(_) => return false,
        },
        Value::Timestamp(v) => match ts::parse(cell) {
            Some(t) => t.cmp(v),
            None => return false,
        },
    };
    match filter.op {
        Op::Eq => ord == Ordering::Equal,
        Op::Gte => ord != Ordering::Less,
        Op::Lt => ord == Ordering::Less,
    }
}

// nulls sort last, like Postgres ASC
fn compare_columns(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    let a = a.and_then(JsonValue::as_str);
    let b = b.and_then(JsonValue::as_str);
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match (ts::parse(a), ts::parse(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => a.cmp(b),
        },
    }
}

#[async_trait]
impl RemoteClient for MemoryRemote {
    async fn select(&self, query: &Query) -> Result<Vec<JsonValue>, RemoteError> {
        self.matching(query)
    }

    async fn count(&self, query: &Query) -> Result<i64, RemoteError> {
        Ok(self.matching(query)?.len() as i64)
    }

    async fn insert(&self, table: Table, row: JsonValue) -> Result<JsonValue, RemoteError> {
        self.check_available()?;
        // reuse the column check the SQL path applies
        super::query::insert_sql(table, row.clone())?;
        if table == Table::Users {
            let email = row.get("email");
            let tables = self.tables.read().unwrap();
            let taken = tables
                .get(&Table::Users)
                .is_some_and(|users| users.iter().any(|u| u.get("email") == email));
            if taken {
                return Err(RemoteError::Duplicate("users_email_key".into()));
            }
        }
        self.seed(table, vec![row.clone()]);
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{fetch_count, fetch_rows};
    use crate::schema::AppointmentWithPatient;
    use serde_json::json;

    #[tokio::test]
    async fn patient_owner_scope_hides_other_practitioners() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mine = Uuid::new_v4();
        let theirs = Uuid::new_v4();
        let remote = MemoryRemote::new();
        remote.seed(
            Table::Patients,
            vec![
                json!({"id": mine, "user_id": me, "name": "Ana"}),
                json!({"id": theirs, "user_id": other, "name": "Bia"}),
            ],
        );
        remote.seed(
            Table::Appointments,
            vec![
                json!({"id": Uuid::new_v4(), "patient_id": mine, "datetime": "2026-10-16T10:00:00Z"}),
                json!({"id": Uuid::new_v4(), "patient_id": theirs, "datetime": "2026-10-15T10:00:00Z"}),
                json!({"id": Uuid::new_v4(), "patient_id": null, "datetime": "2026-10-14T10:00:00Z"}),
            ],
        );

        let q = Query::table(Table::Appointments)
            .scoped(Scope::PatientOwner(me))
            .embed_patient()
            .order_by("datetime", SortOrder::Asc);
        let rows: Vec<AppointmentWithPatient> = fetch_rows(&remote, &q).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].patients.as_ref().unwrap().id, mine);
        assert_eq!(fetch_count(&remote, &q).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn failing_remote_reports_unavailable() {
        let remote = MemoryRemote::new();
        remote.fail_all();
        let q = Query::table(Table::Patients).scoped(Scope::Owner(Uuid::new_v4()));
        assert!(matches!(
            remote.select(&q).await,
            Err(RemoteError::Unavailable(_))
        ));
    }
}
