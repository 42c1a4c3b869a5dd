// AutoCare - medication reminder service
// Headless entry point: arms reminders and delivers them until Ctrl-C

use autocare::command_handlers::CommandHandlers;
use autocare::config::{validate_config, AppConfig};
use autocare::utils::logging::{init_logging, log_error_with_context, log_reminder_rearmed};
use autocare::{
    run_reminder_loop, AppState, Database, ReminderEvent, ReminderScheduler, TokioAlarmService,
};
use chrono::Utc;
use log::{error, info, warn};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    if let Err(e) = run().await {
        log_error_with_context(&e, "Startup");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    validate_config(&config)?;

    let db = Arc::new(Database::connect(&config.database_url()).await?);
    if !config.test_mode {
        db.seed_if_empty().await?;
    }

    let settings = db.get_settings().await?;
    let tz = settings.tz().unwrap_or_else(|e| {
        warn!("{}; falling back to UTC", e);
        chrono_tz::UTC
    });

    let shutdown = CancellationToken::new();
    let (alarms, fired) = TokioAlarmService::channel(64, shutdown.clone())?;
    let scheduler = Arc::new(ReminderScheduler::new(
        Arc::new(alarms),
        tz,
        settings.notifications_enabled,
    ));

    // Alarms do not survive a restart: arm everything again.
    let medications = db.get_medications().await?;
    scheduler.reconcile_all(&medications, Utc::now());

    let handlers = CommandHandlers::new(&db, &scheduler);
    let today = handlers.agenda.today();
    for dose in handlers.agenda.day_agenda(today).await? {
        info!("Today {} - {}", dose.display_time(), dose.medication_name);
    }

    if config.test_mode {
        info!("Test mode: boot completed, exiting");
        return Ok(());
    }

    let state = Arc::new(AppState {
        db: db.clone(),
        scheduler: scheduler.clone(),
        shutdown: shutdown.clone(),
    });

    let (events_tx, mut events_rx) = mpsc::channel(64);
    let reminder_loop = tokio::spawn(run_reminder_loop(state, fired, Some(events_tx)));

    let delivery = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            match event {
                ReminderEvent::DoseDue(notification) => match notification.to_json() {
                    Ok(payload) => println!("{}", payload),
                    Err(e) => error!("Failed to encode notification: {}", e),
                },
                ReminderEvent::Rearmed { medication_id, at } => {
                    log_reminder_rearmed(&medication_id, at);
                }
                ReminderEvent::Error(message) => warn!("Reminder error: {}", message),
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received, shutting down");
    shutdown.cancel();

    let _ = reminder_loop.await;
    let _ = delivery.await;

    info!("AutoCare stopped");
    Ok(())
}
