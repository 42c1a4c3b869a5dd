//! Reminder scheduler
//!
//! Keeps one alarm per medication armed at its next dose. Alarms are
//! one-shot: when one fires, the next dose is computed and the alarm is
//! armed again. Nothing survives a restart, so [`ReminderScheduler::reconcile_all`]
//! must run on boot.

pub mod tokio_alarms;

use crate::error::AppResult;
use crate::models::{AlarmFired, Medication, ReminderNotification, ReminderState};
use crate::{schedule, AppState};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc::{Receiver, Sender};

pub use tokio_alarms::TokioAlarmService;

/// Platform alarm collaborator.
///
/// Arming a medication that already has an alarm replaces it.
#[cfg_attr(test, mockall::automock)]
pub trait AlarmService: Send + Sync {
    fn arm(&self, medication_id: &str, medication_name: &str, at: DateTime<Utc>) -> AppResult<()>;
    fn cancel(&self, medication_id: &str) -> AppResult<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub armed: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct ReminderScheduler {
    alarms: Arc<dyn AlarmService>,
    tz: Tz,
    enabled: AtomicBool,
    states: Mutex<HashMap<String, ReminderState>>,
}

impl ReminderScheduler {
    pub fn new(alarms: Arc<dyn AlarmService>, tz: Tz, enabled: bool) -> Self {
        Self {
            alarms,
            tz,
            enabled: AtomicBool::new(enabled),
            states: Mutex::new(HashMap::new()),
        }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Flips the gate only; callers re-arm or cancel through
    /// [`reconcile_all`](Self::reconcile_all) and [`cancel_all`](Self::cancel_all).
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn state(&self, medication_id: &str) -> ReminderState {
        self.states()
            .get(medication_id)
            .copied()
            .unwrap_or(ReminderState::Unscheduled)
    }

    pub fn armed_count(&self) -> usize {
        self.states()
            .values()
            .filter(|s| matches!(s, ReminderState::Armed(_)))
            .count()
    }

    /// Arms the medication's alarm at its next dose at or after `now`.
    ///
    /// Returns `Ok(None)` without arming when notifications are disabled or
    /// the frequency is invalid; an invalid frequency also drops any alarm
    /// left over from a previous, valid frequency.
    pub fn schedule(&self, medication: &Medication, now: DateTime<Utc>) -> AppResult<Option<DateTime<Utc>>> {
        if !self.is_enabled() {
            debug!("Notifications disabled, not scheduling {}", medication.id);
            return Ok(None);
        }

        let local_now = now.with_timezone(&self.tz);
        match schedule::next_occurrence(&medication.frequency, &local_now) {
            Ok(next) => self.arm(medication, next.with_timezone(&Utc)).map(Some),
            Err(e) => {
                warn!("Not scheduling reminder for medication {}: {}", medication.id, e);
                self.drop_stale_alarm(&medication.id)?;
                Ok(None)
            }
        }
    }

    /// Handles a delivered alarm: the fired dose is consumed and the alarm
    /// is armed for the following one.
    pub fn on_fired(
        &self,
        medication: &Medication,
        fired_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<Option<DateTime<Utc>>> {
        self.set_state(&medication.id, ReminderState::Unscheduled);

        if !self.is_enabled() {
            debug!("Notifications disabled, not re-arming {}", medication.id);
            return Ok(None);
        }

        let fired_local = fired_at.with_timezone(&self.tz);
        let now_local = now.with_timezone(&self.tz);
        match schedule::next_occurrence_after(&medication.frequency, &fired_local, &now_local) {
            Ok(next) => self.arm(medication, next.with_timezone(&Utc)).map(Some),
            Err(e) => {
                warn!("Not re-arming reminder for medication {}: {}", medication.id, e);
                Ok(None)
            }
        }
    }

    pub fn cancel(&self, medication_id: &str) -> AppResult<()> {
        self.alarms.cancel(medication_id)?;
        self.states().remove(medication_id);
        debug!("Cancelled reminder for medication {}", medication_id);
        Ok(())
    }

    /// Removes state for a medication whose alarm is already gone.
    pub fn forget(&self, medication_id: &str) {
        self.states().remove(medication_id);
    }

    /// Arms every medication. One failing medication does not stop the rest.
    pub fn reconcile_all(&self, medications: &[Medication], now: DateTime<Utc>) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();

        if !self.is_enabled() {
            info!("Notifications disabled, skipping reconcile of {} medications", medications.len());
            summary.skipped = medications.len();
            return summary;
        }

        for medication in medications {
            match self.schedule(medication, now) {
                Ok(Some(_)) => summary.armed += 1,
                Ok(None) => summary.skipped += 1,
                Err(e) => {
                    error!("Failed to arm reminder for medication {}: {}", medication.id, e);
                    summary.failed += 1;
                }
            }
        }

        info!(
            "Reconciled reminders: {} armed, {} skipped, {} failed",
            summary.armed, summary.skipped, summary.failed
        );
        summary
    }

    /// Cancels every medication's alarm, returning how many cancels failed.
    pub fn cancel_all(&self, medications: &[Medication]) -> usize {
        let mut failed = 0;
        for medication in medications {
            if let Err(e) = self.cancel(&medication.id) {
                error!("Failed to cancel reminder for medication {}: {}", medication.id, e);
                failed += 1;
            }
        }
        failed
    }

    fn arm(&self, medication: &Medication, at: DateTime<Utc>) -> AppResult<DateTime<Utc>> {
        self.alarms.arm(&medication.id, medication.display_name(), at)?;
        self.set_state(&medication.id, ReminderState::Armed(at));
        info!("Reminder armed for medication {} at {}", medication.id, at);
        Ok(at)
    }

    fn drop_stale_alarm(&self, medication_id: &str) -> AppResult<()> {
        if let ReminderState::Armed(_) = self.state(medication_id) {
            self.cancel(medication_id)?;
        }
        Ok(())
    }

    fn set_state(&self, medication_id: &str, state: ReminderState) {
        self.states().insert(medication_id.to_string(), state);
    }

    fn states(&self) -> MutexGuard<'_, HashMap<String, ReminderState>> {
        self.states.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug, Clone)]
pub enum ReminderEvent {
    DoseDue(ReminderNotification),
    Rearmed { medication_id: String, at: DateTime<Utc> },
    Error(String),
}

/// Consumes fired alarms until shutdown: delivers the notification, then
/// re-arms the medication for its next dose.
pub async fn run_reminder_loop(
    state: Arc<AppState>,
    mut fired: Receiver<AlarmFired>,
    sender: Option<Sender<ReminderEvent>>,
) {
    info!("Starting reminder loop");

    loop {
        tokio::select! {
            alarm = fired.recv() => {
                let Some(alarm) = alarm else {
                    info!("Alarm channel closed, stopping reminder loop");
                    break;
                };
                if let Err(e) = handle_alarm(&state, alarm, &sender).await {
                    error!("Error handling alarm: {}", e);
                    if let Some(tx) = &sender {
                        let _ = tx.send(ReminderEvent::Error(e.to_safe_string())).await;
                    }
                }
            }
            _ = state.shutdown.cancelled() => {
                info!("Shutdown signal received, stopping reminder loop");
                break;
            }
        }
    }

    info!("Reminder loop stopped gracefully");
}

async fn handle_alarm(
    state: &AppState,
    alarm: AlarmFired,
    sender: &Option<Sender<ReminderEvent>>,
) -> AppResult<()> {
    debug!("Alarm fired for medication {} at {}", alarm.medication_id, alarm.fired_at);

    if !state.scheduler.is_enabled() {
        info!("Notifications disabled, dropping alarm for {}", alarm.medication_id);
        state.scheduler.forget(&alarm.medication_id);
        return Ok(());
    }

    let Some(medication) = state.db.get_medication(&alarm.medication_id).await? else {
        warn!("Medication {} no longer exists, dropping alarm", alarm.medication_id);
        state.scheduler.forget(&alarm.medication_id);
        return Ok(());
    };

    // Deliver under the stored name; it may have been edited since arming.
    let current = AlarmFired {
        medication_name: medication.name.clone(),
        ..alarm
    };
    if let Some(tx) = sender {
        let _ = tx
            .send(ReminderEvent::DoseDue(ReminderNotification::for_alarm(&current)))
            .await;
    }

    if let Some(at) = state.scheduler.on_fired(&medication, current.fired_at, Utc::now())? {
        if let Some(tx) = sender {
            let _ = tx
                .send(ReminderEvent::Rearmed {
                    medication_id: medication.id.clone(),
                    at,
                })
                .await;
        }
    }

    Ok(())
}
