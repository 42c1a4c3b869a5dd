// file: src/models/reminder.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-medication alarm state kept by the reminder scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReminderState {
    Unscheduled,
    Armed(DateTime<Utc>),
}

impl ReminderState {
    pub fn armed_at(&self) -> Option<DateTime<Utc>> {
        match self {
            ReminderState::Armed(at) => Some(*at),
            ReminderState::Unscheduled => None,
        }
    }
}

/// Delivered by an alarm service when an armed alarm goes off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmFired {
    pub medication_id: String,
    pub medication_name: String,
    pub fired_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderNotification {
    pub medication_id: String,
    pub title: String,
    pub body: String,
}

impl ReminderNotification {
    pub fn for_alarm(alarm: &AlarmFired) -> Self {
        let name = match alarm.medication_name.trim() {
            "" => "Medication",
            name => name,
        };

        Self {
            medication_id: alarm.medication_id.clone(),
            title: "Medication Reminder".to_string(),
            body: format!("Time to take your medication: {}", name),
        }
    }

    /// Payload handed to the platform notification bridge.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
