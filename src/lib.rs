// AutoCare Library
// Medication reminders: dose scheduling, alarms and the day agenda

pub mod agenda;
pub mod command_handlers;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod reminders;
pub mod schedule;
pub mod utils;

// Re-export commonly used types
pub use models::*;
pub use database::Database;
pub use error::{AppError, AppResult};
pub use reminders::{
    run_reminder_loop, AlarmService, ReconcileSummary, ReminderEvent, ReminderScheduler,
    TokioAlarmService,
};
pub use schedule::{doses_in_day, next_occurrence, InvalidFrequency};
pub use agenda::{build_day_agenda, days_with_doses};

use std::sync::Arc;

/// Application state shared across the application
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub scheduler: Arc<ReminderScheduler>,
    pub shutdown: tokio_util::sync::CancellationToken,
}
