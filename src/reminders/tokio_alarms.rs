// file: src/reminders/tokio_alarms.rs
use super::AlarmService;
use crate::error::{AppError, AppResult};
use crate::models::AlarmFired;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// In-process alarm service: one sleeping task per armed medication,
/// delivering [`AlarmFired`] over a channel.
pub struct TokioAlarmService {
    runtime: Handle,
    sender: Sender<AlarmFired>,
    shutdown: CancellationToken,
    pending: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl TokioAlarmService {
    /// Must be called from inside a tokio runtime.
    pub fn new(sender: Sender<AlarmFired>, shutdown: CancellationToken) -> AppResult<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| AppError::alarm(format!("No async runtime for alarms: {}", e)))?;

        Ok(Self {
            runtime,
            sender,
            shutdown,
            pending: Mutex::new(HashMap::new()),
        })
    }

    pub fn channel(
        capacity: usize,
        shutdown: CancellationToken,
    ) -> AppResult<(Self, Receiver<AlarmFired>)> {
        let (tx, rx) = mpsc::channel(capacity);
        Ok((Self::new(tx, shutdown)?, rx))
    }

    /// Alarms armed and not yet delivered.
    pub fn pending_count(&self) -> usize {
        self.pending()
            .values()
            .filter(|task| !task.is_finished())
            .count()
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<String, JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AlarmService for TokioAlarmService {
    fn arm(&self, medication_id: &str, medication_name: &str, at: DateTime<Utc>) -> AppResult<()> {
        let delay = (at - Utc::now()).to_std().unwrap_or_default();
        let alarm = AlarmFired {
            medication_id: medication_id.to_string(),
            medication_name: medication_name.to_string(),
            fired_at: at,
        };
        let sender = self.sender.clone();
        let shutdown = self.shutdown.clone();

        let task = self.runtime.spawn(async move {
            tokio::select! {
                _ = sleep(delay) => {
                    debug!("Alarm due for medication {}", alarm.medication_id);
                    if let Err(e) = sender.send(alarm).await {
                        warn!("Alarm receiver dropped, reminder lost: {}", e);
                    }
                }
                _ = shutdown.cancelled() => {}
            }
        });

        if let Some(previous) = self.pending().insert(medication_id.to_string(), task) {
            previous.abort();
        }

        debug!("Alarm set for medication {} in {:?}", medication_id, delay);
        Ok(())
    }

    fn cancel(&self, medication_id: &str) -> AppResult<()> {
        if let Some(task) = self.pending().remove(medication_id) {
            task.abort();
        }
        Ok(())
    }
}

impl Drop for TokioAlarmService {
    fn drop(&mut self) {
        for (_, task) in self.pending().drain() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_alarm_fires_at_instant() {
        let (alarms, mut rx) = TokioAlarmService::channel(8, CancellationToken::new()).unwrap();
        let at = Utc::now() + Duration::milliseconds(50);

        alarms.arm("med_001", "Paracetamol", at).unwrap();
        assert_eq!(alarms.pending_count(), 1);

        let fired = timeout(std::time::Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fired.medication_id, "med_001");
        assert_eq!(fired.medication_name, "Paracetamol");
        assert_eq!(fired.fired_at, at);
    }

    #[tokio::test]
    async fn test_past_alarm_fires_immediately() {
        let (alarms, mut rx) = TokioAlarmService::channel(8, CancellationToken::new()).unwrap();
        alarms
            .arm("med_001", "Paracetamol", Utc::now() - Duration::minutes(5))
            .unwrap();

        let fired = timeout(std::time::Duration::from_secs(1), rx.recv()).await;
        assert!(fired.is_ok());
    }

    #[tokio::test]
    async fn test_cancel_prevents_delivery() {
        let (alarms, mut rx) = TokioAlarmService::channel(8, CancellationToken::new()).unwrap();
        alarms
            .arm("med_001", "Paracetamol", Utc::now() + Duration::milliseconds(200))
            .unwrap();
        alarms.cancel("med_001").unwrap();

        let fired = timeout(std::time::Duration::from_millis(500), rx.recv()).await;
        assert!(fired.is_err(), "cancelled alarm should not fire");
        assert_eq!(alarms.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_rearm_replaces_previous_alarm() {
        let (alarms, mut rx) = TokioAlarmService::channel(8, CancellationToken::new()).unwrap();
        let later = Utc::now() + Duration::milliseconds(150);

        alarms
            .arm("med_001", "Paracetamol", Utc::now() + Duration::milliseconds(50))
            .unwrap();
        alarms.arm("med_001", "Paracetamol", later).unwrap();
        assert_eq!(alarms.pending_count(), 1);

        let fired = timeout(std::time::Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fired.fired_at, later);

        let again = timeout(std::time::Duration::from_millis(300), rx.recv()).await;
        assert!(again.is_err());
    }

    #[tokio::test]
    async fn test_shutdown_stops_pending_alarms() {
        let shutdown = CancellationToken::new();
        let (alarms, mut rx) = TokioAlarmService::channel(8, shutdown.clone()).unwrap();
        alarms
            .arm("med_001", "Paracetamol", Utc::now() + Duration::milliseconds(200))
            .unwrap();

        shutdown.cancel();

        let fired = timeout(std::time::Duration::from_millis(500), rx.recv()).await;
        assert!(fired.is_err());
    }

    #[test]
    fn test_new_outside_runtime_fails() {
        let (tx, _rx) = mpsc::channel(1);
        let result = TokioAlarmService::new(tx, CancellationToken::new());
        assert!(matches!(result, Err(AppError::Alarm(_))));
    }
}
