// file: src/models/medication.rs
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Repeating dose schedule: a first dose time of day (`HH:mm`) and an
/// interval in hours. Stored as entered; validated when a schedule is
/// computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DoseFrequency {
    pub interval_hours: i32,
    pub first_dose_time: String,
}

impl DoseFrequency {
    pub fn new(interval_hours: i32, first_dose_time: impl Into<String>) -> Self {
        Self {
            interval_hours,
            first_dose_time: first_dose_time.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Medication {
    pub id: String,
    pub name: String,
    pub short_description: String,
    pub dosage: String,
    #[sqlx(flatten)]
    pub frequency: DoseFrequency,
    pub image_url: Option<String>,
    pub audio_url: Option<String>,
}

impl Medication {
    pub fn new(
        name: String,
        short_description: String,
        dosage: String,
        frequency: DoseFrequency,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            short_description,
            dosage,
            frequency,
            image_url: None,
            audio_url: None,
        }
    }

    /// Name shown in reminders; falls back to a generic label.
    pub fn display_name(&self) -> &str {
        let trimmed = self.name.trim();
        if trimmed.is_empty() {
            "Medication"
        } else {
            trimmed
        }
    }
}

/// Medications every fresh install starts with.
pub fn sample_medications() -> Vec<Medication> {
    vec![
        Medication {
            id: "med_001".to_string(),
            name: "Paracetamol".to_string(),
            short_description: "Pain and fever relief for mild to moderate pain.".to_string(),
            dosage: "500mg".to_string(),
            frequency: DoseFrequency::new(8, "09:00"),
            image_url: None,
            audio_url: None,
        },
        Medication {
            id: "med_002".to_string(),
            name: "Amoxicillin".to_string(),
            short_description: "Antibiotic for bacterial infections. Requires a prescription."
                .to_string(),
            dosage: "250mg".to_string(),
            frequency: DoseFrequency::new(12, "07:00"),
            image_url: None,
            audio_url: None,
        },
    ]
}
