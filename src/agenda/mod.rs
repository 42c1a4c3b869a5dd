//! Day agenda builder
//!
//! Merges every medication's doses for one day into a single list ordered
//! by time of day. A medication with a broken frequency is logged and left
//! out; it never blanks the agenda for the others.

use crate::models::{DoseOccurrence, Medication};
use crate::schedule;
use chrono::{Datelike, NaiveDate};
use log::{debug, warn};
use std::collections::BTreeSet;

pub fn build_day_agenda(medications: &[Medication], day: NaiveDate) -> Vec<DoseOccurrence> {
    let mut agenda = Vec::new();

    for medication in medications {
        match schedule::doses_in_day(&medication.frequency, day) {
            Ok(times) => {
                agenda.extend(times.into_iter().map(|time_of_day| DoseOccurrence {
                    medication_id: medication.id.clone(),
                    medication_name: medication.name.clone(),
                    time_of_day,
                }));
            }
            Err(e) => {
                warn!(
                    "Skipping medication {} in agenda for {}: {}",
                    medication.id, day, e
                );
            }
        }
    }

    // Stable: equal times keep medication order.
    agenda.sort_by_key(|occurrence| occurrence.time_of_day);

    debug!("Built agenda for {} with {} doses", day, agenda.len());
    agenda
}

/// Days of a month that carry at least one dose, for calendar markers.
///
/// Returns an empty set for an invalid year/month.
pub fn days_with_doses(medications: &[Medication], year: i32, month: u32) -> BTreeSet<NaiveDate> {
    let mut days = BTreeSet::new();

    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        warn!("Invalid month requested for calendar markers: {}-{}", year, month);
        return days;
    };

    let mut day = first;
    while day.month() == month {
        if !build_day_agenda(medications, day).is_empty() {
            days.insert(day);
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }

    days
}
