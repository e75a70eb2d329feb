//! Typed mirror of the remote tables.
//!
//! The database owns the schema; these records only describe the row shapes
//! the service reads back. Every column the database declares nullable is an
//! `Option` here.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Remote tables the service knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Users,
    Patients,
    Appointments,
    Interactions,
    Payments,
    Plans,
    Uploads,
    Adherence,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Patients => "patients",
            Table::Appointments => "appointments",
            Table::Interactions => "interactions",
            Table::Payments => "payments",
            Table::Plans => "plans",
            Table::Uploads => "uploads",
            Table::Adherence => "adherence",
        }
    }

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Table::Users => &["id", "email", "name", "password_hash", "created_at"],
            Table::Patients => &[
                "id",
                "user_id",
                "name",
                "whatsapp_number",
                "tags",
                "last_consultation",
                "created_at",
                "updated_at",
            ],
            Table::Appointments => &["id", "patient_id", "datetime", "created_at"],
            Table::Interactions => &["id", "patient_id", "direction", "message", "timestamp"],
            Table::Payments => &["id", "user_id", "amount", "method", "status", "date"],
            Table::Plans => &[
                "id",
                "patient_id",
                "start_date",
                "end_date",
                "details",
                "created_at",
                "updated_at",
            ],
            Table::Uploads => &["id", "patient_id", "type", "file_url", "uploaded_at"],
            Table::Adherence => &["id", "patient_id", "date", "achieved"],
        }
    }

    pub fn has_column(self, column: &str) -> bool {
        self.columns().contains(&column)
    }

    /// Column linking the table to its owner, if rows are owned directly.
    pub fn owner_column(self) -> Option<&'static str> {
        match self {
            Table::Patients | Table::Payments => Some("user_id"),
            _ => None,
        }
    }

    /// Whether rows reach their owner through `patient_id`.
    pub fn is_patient_derived(self) -> bool {
        self.has_column("patient_id")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Stripe,
    Pix,
    Juno,
    Gerencianet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadType {
    Exam,
    Anamnesis,
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    #[serde(default, with = "ts")]
    pub created_at: Option<OffsetDateTime>,
}

/// Row written on signup. The table has no id default, so the id is ours.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub password_hash: String,
    #[serde(with = "ts")]
    pub created_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub whatsapp_number: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default, with = "ts")]
    pub last_consultation: Option<OffsetDateTime>,
    #[serde(default, with = "ts")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "ts")]
    pub updated_at: Option<OffsetDateTime>,
}

impl Patient {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags
            .as_deref()
            .is_some_and(|tags| tags.iter().any(|t| t == tag))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    #[serde(default)]
    pub patient_id: Option<Uuid>,
    #[serde(default, with = "ts")]
    pub datetime: Option<OffsetDateTime>,
    #[serde(default, with = "ts")]
    pub created_at: Option<OffsetDateTime>,
}

/// Appointment with its patient embedded under `patients`, as the join
/// returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentWithPatient {
    #[serde(flatten)]
    pub appointment: Appointment,
    #[serde(default)]
    pub patients: Option<Patient>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub id: Uuid,
    #[serde(default)]
    pub patient_id: Option<Uuid>,
    #[serde(default)]
    pub direction: Option<Direction>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, with = "ts")]
    pub timestamp: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub method: Option<PaymentMethod>,
    #[serde(default)]
    pub status: Option<PaymentStatus>,
    #[serde(default, with = "ts")]
    pub date: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: Uuid,
    #[serde(default)]
    pub patient_id: Option<Uuid>,
    #[serde(default, with = "ts")]
    pub start_date: Option<OffsetDateTime>,
    #[serde(default, with = "ts")]
    pub end_date: Option<OffsetDateTime>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default, with = "ts")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "ts")]
    pub updated_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Upload {
    pub id: Uuid,
    #[serde(default)]
    pub patient_id: Option<Uuid>,
    #[serde(default, rename = "type")]
    pub kind: Option<UploadType>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default, with = "ts")]
    pub uploaded_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Adherence {
    pub id: Uuid,
    #[serde(default)]
    pub patient_id: Option<Uuid>,
    #[serde(default, with = "ts")]
    pub date: Option<OffsetDateTime>,
    #[serde(default)]
    pub achieved: Option<bool>,
}

/// Lenient timestamp (de)serialization for nullable columns.
///
/// Accepts RFC 3339, offset-less ISO date-times (read as UTC) and plain
/// dates (midnight UTC). Anything else reads as `None`.
pub mod ts {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::format_description::well_known::Rfc3339;
    use time::macros::format_description;
    use time::{Date, OffsetDateTime, PrimitiveDateTime};

    pub fn parse(raw: &str) -> Option<OffsetDateTime> {
        let raw = raw.trim();
        if let Ok(t) = OffsetDateTime::parse(raw, &Rfc3339) {
            return Some(t);
        }
        // Postgres text output uses a space and a short offset: "2024-05-01 10:00:00+00"
        let normalized = raw.replacen(' ', "T", 1);
        if let Some(t) = with_short_offset(&normalized) {
            return Some(t);
        }
        let local = format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
        );
        if let Ok(t) = PrimitiveDateTime::parse(&normalized, local) {
            return Some(t.assume_utc());
        }
        let date = format_description!("[year]-[month]-[day]");
        Date::parse(raw, date).ok().map(|d| d.midnight().assume_utc())
    }

    fn with_short_offset(raw: &str) -> Option<OffsetDateTime> {
        let sign_at = raw.rfind(['+', '-'])?;
        let (head, offset) = raw.split_at(sign_at);
        if offset.len() != 3 || !head.contains('T') {
            return None;
        }
        OffsetDateTime::parse(&format!("{head}{offset}:00"), &Rfc3339).ok()
    }

    pub fn serialize<S>(value: &Option<OffsetDateTime>, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        time::serde::rfc3339::option::serialize(value, s)
    }

    pub fn deserialize<'de, D>(d: D) -> Result<Option<OffsetDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw.as_deref().and_then(parse))
    }
}
