//! Command handlers module
//!
//! Application operations that combine the stores with the reminder
//! scheduler: every change to a medication or to the notifications switch
//! keeps the armed alarms in step with what is stored.

use crate::agenda;
use crate::database::Database;
use crate::error::{AppError, AppResult};
use crate::models::{DoseOccurrence, Medication, Prescription, Settings};
use crate::reminders::{ReconcileSummary, ReminderScheduler};
use crate::utils::{normalize_name, normalize_optional};
use chrono::{NaiveDate, Utc};
use log::{error, info};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Medication and favorites operations
pub struct MedicationHandlers {
    pub db: Database,
    pub scheduler: Arc<ReminderScheduler>,
}

impl MedicationHandlers {
    pub fn new(db: Database, scheduler: Arc<ReminderScheduler>) -> Self {
        Self { db, scheduler }
    }

    pub async fn load_medications(&self) -> AppResult<Vec<Medication>> {
        let medications = self.db.get_medications().await?;
        info!("Loaded {} medications from database", medications.len());
        Ok(medications)
    }

    /// Stores the medication and arms its reminder. A medication whose
    /// frequency cannot be scheduled is still stored; it just gets no
    /// reminders.
    pub async fn add_medication(&self, medication: Medication) -> AppResult<Medication> {
        let medication = clean(medication)?;
        info!("Adding medication {}", medication.id);

        self.db.add_medication(&medication).await?;
        self.arm_reminder(&medication);

        Ok(medication)
    }

    pub async fn update_medication(&self, medication: Medication) -> AppResult<Medication> {
        let medication = clean(medication)?;
        info!("Updating medication {}", medication.id);

        if !self.db.update_medication(&medication).await? {
            return Err(AppError::not_found(format!("medication {}", medication.id)));
        }
        self.arm_reminder(&medication);

        Ok(medication)
    }

    // The row is already committed; a failed alarm only costs reminders.
    fn arm_reminder(&self, medication: &Medication) {
        if let Err(e) = self.scheduler.schedule(medication, Utc::now()) {
            error!("Failed to arm reminder for {}: {}", medication.id, e);
        }
    }

    /// Returns false when there was no such medication.
    pub async fn remove_medication(&self, medication_id: &str) -> AppResult<bool> {
        info!("Removing medication {}", medication_id);

        if let Err(e) = self.scheduler.cancel(medication_id) {
            error!("Failed to cancel reminder for {}: {}", medication_id, e);
        }
        Ok(self.db.delete_medication(medication_id).await?)
    }

    /// Returns false when it was already a favorite.
    pub async fn add_favorite(&self, medication_id: &str) -> AppResult<bool> {
        if self.db.get_medication(medication_id).await?.is_none() {
            return Err(AppError::not_found(format!("medication {}", medication_id)));
        }
        Ok(self.db.add_favorite(medication_id).await?)
    }

    pub async fn remove_favorite(&self, medication_id: &str) -> AppResult<()> {
        Ok(self.db.remove_favorite(medication_id).await?)
    }

    pub async fn is_favorite(&self, medication_id: &str) -> AppResult<bool> {
        Ok(self.db.is_favorite(medication_id).await?)
    }

    pub async fn favorites(&self) -> AppResult<Vec<Medication>> {
        Ok(self.db.get_favorites().await?)
    }

    pub async fn clear_favorites(&self) -> AppResult<()> {
        info!("Clearing favorites");
        Ok(self.db.clear_favorites().await?)
    }
}

fn clean(mut medication: Medication) -> AppResult<Medication> {
    medication.name = normalize_name(&medication.name);
    if medication.name.is_empty() {
        return Err(AppError::invalid_input("Medication name is required"));
    }
    medication.image_url = normalize_optional(medication.image_url);
    medication.audio_url = normalize_optional(medication.audio_url);
    Ok(medication)
}

/// Preference operations
pub struct SettingsHandlers {
    pub db: Database,
    pub scheduler: Arc<ReminderScheduler>,
}

impl SettingsHandlers {
    pub fn new(db: Database, scheduler: Arc<ReminderScheduler>) -> Self {
        Self { db, scheduler }
    }

    pub async fn get_settings(&self) -> AppResult<Settings> {
        Ok(self.db.get_settings().await?)
    }

    /// Flips the notifications switch: turning it on arms every
    /// medication, turning it off cancels every alarm.
    pub async fn toggle_notifications(&self) -> AppResult<bool> {
        let mut settings = self.db.get_settings().await?;
        settings.notifications_enabled = !settings.notifications_enabled;
        self.db.update_settings(&settings).await?;

        self.apply_notifications(settings.notifications_enabled).await?;
        Ok(settings.notifications_enabled)
    }

    pub async fn toggle_dark_mode(&self) -> AppResult<bool> {
        let mut settings = self.db.get_settings().await?;
        settings.dark_mode_enabled = !settings.dark_mode_enabled;
        self.db.update_settings(&settings).await?;

        info!("Dark mode {}", if settings.dark_mode_enabled { "enabled" } else { "disabled" });
        Ok(settings.dark_mode_enabled)
    }

    pub async fn reset_preferences(&self) -> AppResult<Settings> {
        let mut settings = self.db.get_settings().await?;
        let was_enabled = settings.notifications_enabled;

        settings.reset_preferences();
        self.db.update_settings(&settings).await?;

        if !was_enabled {
            self.apply_notifications(true).await?;
        }
        info!("Preferences reset");
        Ok(settings)
    }

    async fn apply_notifications(&self, enabled: bool) -> AppResult<()> {
        let medications = self.db.get_medications().await?;
        self.scheduler.set_enabled(enabled);

        if enabled {
            let summary: ReconcileSummary = self.scheduler.reconcile_all(&medications, Utc::now());
            info!("Notifications enabled, {} reminders armed", summary.armed);
        } else {
            let failed = self.scheduler.cancel_all(&medications);
            info!(
                "Notifications disabled, {} reminders cancelled",
                medications.len() - failed
            );
        }
        Ok(())
    }
}

/// Calendar operations
pub struct AgendaHandlers {
    pub db: Database,
    pub scheduler: Arc<ReminderScheduler>,
}

impl AgendaHandlers {
    pub fn new(db: Database, scheduler: Arc<ReminderScheduler>) -> Self {
        Self { db, scheduler }
    }

    /// Today's date in the user's timezone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.scheduler.timezone()).date_naive()
    }

    pub async fn day_agenda(&self, day: NaiveDate) -> AppResult<Vec<DoseOccurrence>> {
        let medications = self.db.get_medications().await?;
        Ok(agenda::build_day_agenda(&medications, day))
    }

    pub async fn month_markers(&self, year: i32, month: u32) -> AppResult<BTreeSet<NaiveDate>> {
        let medications = self.db.get_medications().await?;
        Ok(agenda::days_with_doses(&medications, year, month))
    }
}

/// Prescription operations
pub struct PrescriptionHandlers {
    pub db: Database,
}

impl PrescriptionHandlers {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn load_prescriptions(&self) -> AppResult<Vec<Prescription>> {
        Ok(self.db.get_prescriptions().await?)
    }

    pub async fn add_prescription(&self, prescription: Prescription) -> AppResult<Prescription> {
        let prescription = validate_prescription(prescription)?;
        info!("Adding prescription {}", prescription.id);
        self.db.add_prescription(&prescription).await?;
        Ok(prescription)
    }

    pub async fn update_prescription(&self, prescription: Prescription) -> AppResult<Prescription> {
        let prescription = validate_prescription(prescription)?;
        if !self.db.update_prescription(&prescription).await? {
            return Err(AppError::not_found(format!("prescription {}", prescription.id)));
        }
        Ok(prescription)
    }

    pub async fn delete_prescription(&self, prescription_id: &str) -> AppResult<bool> {
        info!("Deleting prescription {}", prescription_id);
        Ok(self.db.delete_prescription(prescription_id).await?)
    }

    pub async fn expired_prescriptions(&self, on: NaiveDate) -> AppResult<Vec<Prescription>> {
        let prescriptions = self.db.get_prescriptions().await?;
        Ok(prescriptions.into_iter().filter(|p| p.is_expired(on)).collect())
    }
}

fn validate_prescription(mut prescription: Prescription) -> AppResult<Prescription> {
    prescription.medication_name = normalize_name(&prescription.medication_name);
    if prescription.medication_name.is_empty() {
        return Err(AppError::invalid_input("Prescription medication name is required"));
    }
    if prescription.expiry_date < prescription.issue_date {
        return Err(AppError::invalid_input("Prescription expires before it was issued"));
    }
    prescription.image_url = normalize_optional(prescription.image_url);
    Ok(prescription)
}

/// Command handler factory
pub struct CommandHandlers {
    pub medications: MedicationHandlers,
    pub settings: SettingsHandlers,
    pub agenda: AgendaHandlers,
    pub prescriptions: PrescriptionHandlers,
}

impl CommandHandlers {
    pub fn new(db: &Arc<Database>, scheduler: &Arc<ReminderScheduler>) -> Self {
        Self {
            medications: MedicationHandlers::new(db.as_ref().clone(), scheduler.clone()),
            settings: SettingsHandlers::new(db.as_ref().clone(), scheduler.clone()),
            agenda: AgendaHandlers::new(db.as_ref().clone(), scheduler.clone()),
            prescriptions: PrescriptionHandlers::new(db.as_ref().clone()),
        }
    }
}
