// file: src/database/settings.rs
use anyhow::Result;
use sqlx::SqlitePool;

pub async fn get(pool: &SqlitePool) -> Result<crate::models::Settings> {
    let settings = sqlx::query_as::<_, crate::models::Setting>("SELECT key, value FROM settings")
        .fetch_all(pool)
        .await?;

    // Convert to Settings struct
    let mut app_settings = crate::models::Settings::default();
    for setting in settings {
        match setting.key.as_str() {
            "notifications_enabled" => {
                app_settings.notifications_enabled = setting.value.parse().unwrap_or(true)
            }
            "dark_mode_enabled" => {
                app_settings.dark_mode_enabled = setting.value.parse().unwrap_or(false)
            }
            "timezone" => app_settings.timezone = setting.value,
            _ => {}
        }
    }

    Ok(app_settings)
}

pub async fn update(pool: &SqlitePool, settings: &crate::models::Settings) -> Result<()> {
    let notifications_enabled_str = settings.notifications_enabled.to_string();
    let dark_mode_enabled_str = settings.dark_mode_enabled.to_string();

    let updates = vec![
        ("notifications_enabled", notifications_enabled_str.as_str()),
        ("dark_mode_enabled", dark_mode_enabled_str.as_str()),
        ("timezone", settings.timezone.as_str()),
    ];

    for (key, value) in updates {
        sqlx::query("INSERT INTO settings (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value")
            .bind(key)
            .bind(value)
            .execute(pool)
            .await?;
    }

    Ok(())
}
