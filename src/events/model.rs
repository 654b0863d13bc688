//! The Event entity and its wire form.
//!
//! Documents carry epoch-millisecond timestamps; conversion to and from
//! calendar types happens here, at the repository boundary, and nowhere
//! else.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: Option<String>,
    pub title: String,
    pub date: NaiveDate,
    /// Start time as `HH:MM`; kept as entered, parsed only for the
    /// upcoming/past classification.
    pub time: String,
    pub location: String,
    pub description: String,
    /// Owner identity email; authorizes edits.
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// User-entered fields of a new event; owner and timestamps are stamped by
/// the repository.
#[derive(Debug, Clone)]
pub struct EventDraft {
    pub title: String,
    pub date: NaiveDate,
    pub time: String,
    pub location: String,
    pub description: String,
}

/// Partial update; only present fields are merged.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEvent {
    title: String,
    /// Calendar date at UTC midnight, epoch milliseconds.
    date: i64,
    time: String,
    location: String,
    description: String,
    created_by: String,
    created_at: i64,
    #[serde(default)]
    updated_at: Option<i64>,
}

fn date_to_millis(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

fn millis_to_date(ms: i64) -> AppResult<NaiveDate> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| AppError::unknown(format!("timestamp out of range: {ms}")))
}

fn millis_to_datetime(ms: i64) -> AppResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| AppError::unknown(format!("timestamp out of range: {ms}")))
}

impl Event {
    pub fn from_draft(draft: EventDraft, created_by: String, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            title: draft.title,
            date: draft.date,
            time: draft.time,
            location: draft.location,
            description: draft.description,
            created_by,
            created_at: now,
            updated_at: None,
        }
    }

    pub fn to_document(&self) -> JsonValue {
        let wire = WireEvent {
            title: self.title.clone(),
            date: date_to_millis(self.date),
            time: self.time.clone(),
            location: self.location.clone(),
            description: self.description.clone(),
            created_by: self.created_by.clone(),
            created_at: self.created_at.timestamp_millis(),
            updated_at: self.updated_at.map(|dt| dt.timestamp_millis()),
        };
        serde_json::to_value(wire).expect("wire event serializes")
    }

    pub fn from_document(id: String, doc: &JsonValue) -> AppResult<Self> {
        let wire: WireEvent = serde_json::from_value(doc.clone())
            .map_err(|e| AppError::unknown(format!("malformed event document {id}: {e}")))?;
        Ok(Self {
            id: Some(id),
            title: wire.title,
            date: millis_to_date(wire.date)?,
            time: wire.time,
            location: wire.location,
            description: wire.description,
            created_by: wire.created_by,
            created_at: millis_to_datetime(wire.created_at)?,
            updated_at: wire.updated_at.map(millis_to_datetime).transpose()?,
        })
    }

    /// The event's start instant. An unparseable time field degrades to
    /// midnight rather than erroring.
    pub fn starts_at(&self) -> DateTime<Utc> {
        let time = NaiveTime::parse_from_str(&self.time, "%H:%M").unwrap_or(NaiveTime::MIN);
        self.date.and_time(time).and_utc()
    }

    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.starts_at() > now
    }

    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        !self.is_upcoming(now)
    }

    pub fn formatted_date(&self) -> String {
        self.date.format("%A, %-d %B %Y").to_string()
    }

    pub fn short_date(&self) -> String {
        self.date.format("%d.%m.%Y").to_string()
    }
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.date.is_none()
            && self.time.is_none()
            && self.location.is_none()
            && self.description.is_none()
    }

    /// Wire form of the present fields plus the `updatedAt` stamp.
    pub fn into_fields(self, updated_at: DateTime<Utc>) -> JsonValue {
        let mut fields = serde_json::Map::new();
        if let Some(title) = self.title {
            fields.insert("title".into(), title.into());
        }
        if let Some(date) = self.date {
            fields.insert("date".into(), date_to_millis(date).into());
        }
        if let Some(time) = self.time {
            fields.insert("time".into(), time.into());
        }
        if let Some(location) = self.location {
            fields.insert("location".into(), location.into());
        }
        if let Some(description) = self.description {
            fields.insert("description".into(), description.into());
        }
        fields.insert("updatedAt".into(), updated_at.timestamp_millis().into());
        JsonValue::Object(fields)
    }
}

/// Dashboard grouping: split into (upcoming, past), preserving order.
pub fn partition_upcoming(events: Vec<Event>, now: DateTime<Utc>) -> (Vec<Event>, Vec<Event>) {
    events.into_iter().partition(|e| e.is_upcoming(now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(date: NaiveDate, time: &str) -> Event {
        Event {
            id: None,
            title: "Birthday".into(),
            date,
            time: time.into(),
            location: "Park".into(),
            description: "Bring cake".into(),
            created_by: "ana@example.com".into(),
            created_at: Utc.with_ymd_and_hms(2026, 1, 10, 9, 0, 0).unwrap(),
            updated_at: None,
        }
    }

    #[test]
    fn document_round_trip_preserves_fields() {
        let mut event = sample(NaiveDate::from_ymd_opt(2026, 8, 20).unwrap(), "18:30");
        event.updated_at = Some(Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap());
        let doc = event.to_document();
        let back = Event::from_document("e1".into(), &doc).unwrap();
        assert_eq!(back.id.as_deref(), Some("e1"));
        assert_eq!(back.title, event.title);
        assert_eq!(back.date, event.date);
        assert_eq!(back.time, event.time);
        assert_eq!(back.created_by, event.created_by);
        assert_eq!(back.created_at, event.created_at);
        assert_eq!(back.updated_at, event.updated_at);
    }

    #[test]
    fn wire_uses_camel_case_and_millis() {
        let event = sample(NaiveDate::from_ymd_opt(2026, 8, 20).unwrap(), "18:30");
        let doc = event.to_document();
        assert!(doc.get("createdBy").is_some());
        assert!(doc.get("createdAt").unwrap().is_i64());
        assert!(doc.get("date").unwrap().is_i64());
    }

    #[test]
    fn upcoming_compares_date_and_time() {
        let now = Utc.with_ymd_and_hms(2026, 8, 20, 12, 0, 0).unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 8, 20).unwrap();
        assert!(sample(date, "18:30").is_upcoming(now));
        assert!(sample(date, "09:00").is_past(now));
    }

    #[test]
    fn unparseable_time_degrades_to_midnight() {
        let now = Utc.with_ymd_and_hms(2026, 8, 20, 12, 0, 0).unwrap();
        let same_day = sample(NaiveDate::from_ymd_opt(2026, 8, 20).unwrap(), "whenever");
        assert!(same_day.is_past(now));
        let tomorrow = sample(NaiveDate::from_ymd_opt(2026, 8, 21).unwrap(), "whenever");
        assert!(tomorrow.is_upcoming(now));
    }

    #[test]
    fn partition_splits_and_preserves_order() {
        let now = Utc.with_ymd_and_hms(2026, 8, 20, 12, 0, 0).unwrap();
        let past1 = sample(NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(), "10:00");
        let up1 = sample(NaiveDate::from_ymd_opt(2026, 8, 25).unwrap(), "10:00");
        let past2 = sample(NaiveDate::from_ymd_opt(2026, 8, 2).unwrap(), "10:00");
        let (upcoming, past) = partition_upcoming(vec![past1.clone(), up1.clone(), past2.clone()], now);
        assert_eq!(upcoming, vec![up1]);
        assert_eq!(past, vec![past1, past2]);
    }

    #[test]
    fn patch_carries_only_present_fields_plus_stamp() {
        let patch = EventPatch { title: Some("New title".into()), ..Default::default() };
        let stamp = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let fields = patch.into_fields(stamp);
        assert_eq!(fields.get("title").unwrap(), "New title");
        assert_eq!(fields.get("updatedAt").unwrap(), &JsonValue::from(stamp.timestamp_millis()));
        assert!(fields.get("location").is_none());
        assert!(fields.get("date").is_none());
    }
}
