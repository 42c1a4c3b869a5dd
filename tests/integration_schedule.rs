use autocare::{
    build_day_agenda, days_with_doses, doses_in_day, next_occurrence, DoseFrequency,
    InvalidFrequency, Medication,
};
use chrono::{Duration, NaiveDate, TimeZone, Utc};

fn medication(id: &str, name: &str, interval_hours: i32, first: &str) -> Medication {
    Medication {
        id: id.to_string(),
        name: name.to_string(),
        short_description: String::new(),
        dosage: "500mg".to_string(),
        frequency: DoseFrequency::new(interval_hours, first),
        image_url: None,
        audio_url: None,
    }
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

#[test]
fn test_next_occurrence_reference_example() {
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
    let next = next_occurrence(&DoseFrequency::new(8, "09:00"), &now).unwrap();
    assert_eq!(next, Utc.with_ymd_and_hms(2024, 1, 1, 17, 0, 0).unwrap());
}

#[test]
fn test_next_occurrence_within_one_interval_over_a_day() {
    let frequency = DoseFrequency::new(6, "00:30");
    let start = Utc.with_ymd_and_hms(2024, 5, 20, 0, 30, 0).unwrap();

    for minutes in (0..24 * 60).step_by(7) {
        let now = start + Duration::minutes(minutes);
        let next = next_occurrence(&frequency, &now).unwrap();
        assert!(next >= now);
        assert!(next < now + Duration::hours(6));
        assert_eq!(next, next_occurrence(&frequency, &now).unwrap());
    }
}

#[test]
fn test_day_agenda_reference_examples() {
    let eight = doses_in_day(&DoseFrequency::new(8, "09:00"), day()).unwrap();
    let rendered: Vec<String> = eight.iter().map(|t| t.format("%H:%M").to_string()).collect();
    assert_eq!(rendered, vec!["09:00", "17:00", "01:00"]);

    let daily = doses_in_day(&DoseFrequency::new(24, "07:00"), day()).unwrap();
    assert_eq!(daily.len(), 1);
    assert_eq!(daily[0].format("%H:%M").to_string(), "07:00");
}

#[test]
fn test_invalid_frequency_fails_and_agenda_continues() {
    assert_eq!(
        doses_in_day(&DoseFrequency::new(0, "09:00"), day()),
        Err(InvalidFrequency::NonPositiveInterval(0))
    );
    assert_eq!(
        doses_in_day(&DoseFrequency::new(8, ""), day()),
        Err(InvalidFrequency::BlankFirstDoseTime)
    );

    let medications = vec![
        medication("a", "Zero interval", 0, "09:00"),
        medication("b", "Paracetamol", 8, "09:00"),
        medication("c", "Blank", 8, ""),
        medication("d", "Amoxicillin", 24, "07:00"),
    ];

    let agenda = build_day_agenda(&medications, day());
    let rows: Vec<(String, String)> = agenda
        .iter()
        .map(|o| (o.display_time(), o.medication_name.clone()))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("01:00".to_string(), "Paracetamol".to_string()),
            ("07:00".to_string(), "Amoxicillin".to_string()),
            ("09:00".to_string(), "Paracetamol".to_string()),
            ("17:00".to_string(), "Paracetamol".to_string()),
        ]
    );

    assert_eq!(days_with_doses(&medications, 2024, 1).len(), 31);
}
