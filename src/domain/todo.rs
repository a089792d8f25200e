use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use serde::{de::{value::StrDeserializer, IntoDeserializer}, Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TodoId(pub String);

impl From<Uuid> for TodoId {
    fn from(id: Uuid) -> Self { Self(id.to_string()) }
}

impl From<&str> for TodoId {
    fn from(id: &str) -> Self { Self(id.to_string()) }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(&self.0) }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TodoStatus { Pending, Late }

impl TodoStatus {
    /// Due strictly after `now` is pending; due at or before `now` is late.
    pub fn at(when: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if when > now { Self::Pending } else { Self::Late }
    }

    pub fn as_str(self) -> &'static str {
        match self { Self::Pending => "pending", Self::Late => "late" }
    }
}

impl std::str::FromStr for TodoStatus {
    type Err = serde::de::value::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let de: StrDeserializer<'_, Self::Err> = s.into_deserializer();
        Self::deserialize(de)
    }
}

/// A single task. `status` and `id` stay unset until the service fills them in.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    #[serde(default)]
    pub text: String,
    #[serde(default, with = "due_date")]
    pub when: Option<DateTime<Utc>>,
    #[serde(default, with = "status_field")]
    pub status: Option<TodoStatus>,
    #[serde(default)]
    pub id: TodoId,
}

impl Todo {
    pub fn new(text: impl Into<String>, when: Option<DateTime<Utc>>) -> Self {
        Self { text: text.into(), when, ..Self::default() }
    }

    /// Builds a todo from raw user input; an unparseable due date is left unset.
    pub fn from_input(text: impl Into<String>, raw_when: &str) -> Self {
        Self::new(text, parse_due(raw_when))
    }

    pub fn is_valid(&self) -> bool { !self.text.is_empty() && self.when.is_some() }
}

/// A todo as the repository hands it back, with whatever bookkeeping fields
/// the store attached. The metadata is never interpreted here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredTodo {
    #[serde(flatten)]
    pub todo: Todo,
    #[serde(flatten)]
    pub meta: Map<String, Value>,
}

impl StoredTodo {
    pub fn new(todo: Todo, meta: Map<String, Value>) -> Self { Self { todo, meta } }

    pub fn with_uppercase_text(mut self) -> Self {
        self.todo.text = self.todo.text.to_uppercase();
        self
    }
}

/// Due dates are kept at millisecond precision, the same precision they are
/// written out with.
pub fn due_instant(when: DateTime<Utc>) -> DateTime<Utc> { when.trunc_subsecs(3) }

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC) or `YYYY-MM-DD` (midnight UTC).
pub fn parse_due(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() { return None; }
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(due_instant(at.with_timezone(&Utc)));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub fn format_due(when: DateTime<Utc>) -> String {
    when.to_rfc3339_opts(SecondsFormat::Millis, true)
}

mod due_date {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(when: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
        match when {
            Some(at) => s.serialize_str(&super::format_due(*at)),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw.as_deref().and_then(super::parse_due))
    }
}

/// Unset status is written and read as `""`; set values go through the derive.
mod status_field {
    use serde::{de::{value::StrDeserializer, IntoDeserializer}, Deserialize, Deserializer, Serialize, Serializer};

    use super::TodoStatus;

    pub fn serialize<S: Serializer>(status: &Option<TodoStatus>, s: S) -> Result<S::Ok, S::Error> {
        match status {
            Some(status) => status.serialize(s),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<TodoStatus>, D::Error> {
        match Option::<String>::deserialize(d)?.as_deref() {
            None | Some("") => Ok(None),
            Some(s) => {
                let de: StrDeserializer<'_, D::Error> = s.into_deserializer();
                TodoStatus::deserialize(de).map(Some)
            }
        }
    }
}
