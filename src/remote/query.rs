use serde_json::Value as JsonValue;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::RemoteError;
use crate::schema::Table;

/// Filter operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Uuid(Uuid),
    Timestamp(OffsetDateTime),
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<OffsetDateTime> for Value {
    fn from(v: OffsetDateTime) -> Self {
        Value::Timestamp(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Gte,
    Lt,
}

impl Op {
    fn sql(self) -> &'static str {
        match self {
            Op::Eq => " = ",
            Op::Gte => " >= ",
            Op::Lt => " < ",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: &'static str,
    pub op: Op,
    pub value: Value,
}

/// Which rows the session user may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Only for identity lookups on `users`.
    Unscoped,
    /// The row's own `user_id` is the session user.
    Owner(Uuid),
    /// The row's patient belongs to the session user.
    PatientOwner(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// A read against one remote table.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: Table,
    pub scope: Scope,
    pub filters: Vec<Filter>,
    pub order: Option<(&'static str, SortOrder)>,
    pub embed_patient: bool,
}

impl Query {
    pub fn table(table: Table) -> Self {
        Self {
            table,
            scope: Scope::Unscoped,
            filters: Vec::new(),
            order: None,
            embed_patient: false,
        }
    }

    pub fn scoped(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn eq(self, column: &'static str, value: impl Into<Value>) -> Self {
        self.filter(column, Op::Eq, value.into())
    }

    pub fn gte(self, column: &'static str, value: impl Into<Value>) -> Self {
        self.filter(column, Op::Gte, value.into())
    }

    pub fn lt(self, column: &'static str, value: impl Into<Value>) -> Self {
        self.filter(column, Op::Lt, value.into())
    }

    fn filter(mut self, column: &'static str, op: Op, value: Value) -> Self {
        self.filters.push(Filter { column, op, value });
        self
    }

    pub fn order_by(mut self, column: &'static str, order: SortOrder) -> Self {
        self.order = Some((column, order));
        self
    }

    /// Include the related patient row under `patients`.
    pub fn embed_patient(mut self) -> Self {
        self.embed_patient = true;
        self
    }

    fn joins_patient(&self) -> bool {
        self.embed_patient || matches!(self.scope, Scope::PatientOwner(_))
    }

    pub fn validate(&self) -> Result<(), RemoteError> {
        let table = self.table;
        let ordered = self.order.iter().map(|(c, _)| *c);
        for column in self.filters.iter().map(|f| f.column).chain(ordered) {
            if !table.has_column(column) {
                return Err(RemoteError::UnknownColumn {
                    table: table.name(),
                    column,
                });
            }
        }
        match self.scope {
            Scope::Owner(_) if table.owner_column().is_none() => {
                return Err(RemoteError::InvalidQuery(format!(
                    "{} has no owner column",
                    table.name()
                )));
            }
            Scope::Unscoped if table != Table::Users => {
                return Err(RemoteError::InvalidQuery(format!(
                    "{} must be scoped to the session user",
                    table.name()
                )));
            }
            _ => {}
        }
        if self.joins_patient() && !table.is_patient_derived() {
            return Err(RemoteError::InvalidQuery(format!(
                "{} has no patient relation",
                table.name()
            )));
        }
        Ok(())
    }

    pub fn select_sql(&self) -> Result<QueryBuilder<'static, Postgres>, RemoteError> {
        self.validate()?;
        let mut qb = if self.embed_patient {
            QueryBuilder::new(
                "SELECT to_jsonb(t) || jsonb_build_object('patients', \
                 CASE WHEN p.\"id\" IS NULL THEN NULL ELSE to_jsonb(p) END)",
            )
        } else {
            QueryBuilder::new("SELECT to_jsonb(t)")
        };
        self.push_from_where(&mut qb);
        if let Some((column, order)) = self.order {
            qb.push(format!(" ORDER BY t.\"{column}\""));
            qb.push(match order {
                SortOrder::Asc => " ASC",
                SortOrder::Desc => " DESC",
            });
        }
        Ok(qb)
    }

    pub fn count_sql(&self) -> Result<QueryBuilder<'static, Postgres>, RemoteError> {
        self.validate()?;
        let mut qb = QueryBuilder::new("SELECT COUNT(*)");
        self.push_from_where(&mut qb);
        Ok(qb)
    }

    fn push_from_where(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        qb.push(format!(" FROM \"{}\" t", self.table.name()));
        if self.joins_patient() {
            qb.push(" LEFT JOIN \"patients\" p ON p.\"id\" = t.\"patient_id\"");
        }
        qb.push(" WHERE TRUE");
        match self.scope {
            Scope::Unscoped => {}
            Scope::Owner(user_id) => {
                qb.push(" AND t.\"user_id\" = ");
                qb.push_bind(user_id);
            }
            Scope::PatientOwner(user_id) => {
                qb.push(" AND p.\"user_id\" = ");
                qb.push_bind(user_id);
            }
        }
        for f in &self.filters {
            // text operands compare against the column's text form so enum columns work too
            match &f.value {
                Value::Text(v) => {
                    qb.push(format!(" AND t.\"{}\"::text", f.column));
                    qb.push(f.op.sql());
                    qb.push_bind(v.clone());
                }
                Value::Uuid(v) => {
                    qb.push(format!(" AND t.\"{}\"", f.column));
                    qb.push(f.op.sql());
                    qb.push_bind(*v);
                }
                Value::Timestamp(v) => {
                    qb.push(format!(" AND t.\"{}\"", f.column));
                    qb.push(f.op.sql());
                    qb.push_bind(*v);
                }
            }
        }
    }
}

/// Builds a single-row insert returning the stored row as JSON.
pub fn insert_sql(
    table: Table,
    row: JsonValue,
) -> Result<QueryBuilder<'static, Postgres>, RemoteError> {
    let Some(fields) = row.as_object() else {
        return Err(RemoteError::InvalidQuery("insert row must be an object".into()));
    };
    if let Some(column) = fields.keys().find(|k| !table.has_column(k)) {
        return Err(RemoteError::InvalidQuery(format!(
            "unknown column {column} on table {}",
            table.name()
        )));
    }
    let name = table.name();
    let mut qb = QueryBuilder::new(format!(
        "INSERT INTO \"{name}\" AS t SELECT * FROM jsonb_populate_record(NULL::\"{name}\", "
    ));
    qb.push_bind(row);
    qb.push(") RETURNING to_jsonb(t)");
    Ok(qb)
}
