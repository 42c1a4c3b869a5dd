// Declare modules
pub mod agenda;
pub mod medication;
pub mod prescription;
pub mod reminder;
pub mod settings;

// Flattened so callers can write `use crate::models::Medication`.
pub use agenda::DoseOccurrence;
pub use medication::{sample_medications, DoseFrequency, Medication};
pub use prescription::Prescription;
pub use reminder::{AlarmFired, ReminderNotification, ReminderState};
pub use settings::{Setting, Settings};
