use chrono::NaiveDateTime;
use serde_derive::{Deserialize, Serialize};

/// A scheduled clown visit volunteers can sign up for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub date_time: NaiveDateTime,
    pub location: String,
    pub total_spots: u32,
    pub available_spots: u32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Event {
    pub fn is_full(&self) -> bool { self.available_spots == 0 }
}

/// The editable part of an [`Event`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub name: String,
    pub date_time: NaiveDateTime,
    pub location: String,
    pub total_spots: u32,
    pub available_spots: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Proof that a volunteer signed up for an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRegistration {
    pub id: i64,
    pub user_id: i64,
    pub event_id: i64,
    pub registered_at: NaiveDateTime,
}

/// One entry in a volunteer's event history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredEvent {
    pub event: EventSummary,
    pub registered_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    pub id: i64,
    pub name: String,
    pub date_time: NaiveDateTime,
    pub location: String,
    #[serde(default)]
    pub image_path: Option<String>,
}
