// file: src/models/agenda.rs
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// One dose of one medication inside a day's agenda.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoseOccurrence {
    pub medication_id: String,
    pub medication_name: String,
    pub time_of_day: NaiveTime,
}

impl DoseOccurrence {
    pub fn display_time(&self) -> String {
        crate::schedule::format_dose_time(self.time_of_day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_time() {
        let occurrence = DoseOccurrence {
            medication_id: "med_001".to_string(),
            medication_name: "Paracetamol".to_string(),
            time_of_day: NaiveTime::from_hms_opt(7, 5, 0).unwrap(),
        };
        assert_eq!(occurrence.display_time(), "07:05");
    }
}
