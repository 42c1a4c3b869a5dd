// file: src/database/favorites.rs
use crate::models::Medication;
use anyhow::Result;
use sqlx::SqlitePool;

/// Returns false when the medication was already a favorite.
pub async fn add(pool: &SqlitePool, medication_id: &str) -> Result<bool> {
    let result = sqlx::query("INSERT OR IGNORE INTO favorites (medication_id) VALUES (?)")
        .bind(medication_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn remove(pool: &SqlitePool, medication_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM favorites WHERE medication_id = ?")
        .bind(medication_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn contains(pool: &SqlitePool, medication_id: &str) -> Result<bool> {
    let found: Option<String> =
        sqlx::query_scalar("SELECT medication_id FROM favorites WHERE medication_id = ?")
            .bind(medication_id)
            .fetch_optional(pool)
            .await?;

    Ok(found.is_some())
}

pub async fn get_all(pool: &SqlitePool) -> Result<Vec<Medication>> {
    let medications = sqlx::query_as::<_, Medication>(
        r#"
        SELECT m.id, m.name, m.short_description, m.dosage, m.interval_hours,
               m.first_dose_time, m.image_url, m.audio_url
        FROM favorites f
        JOIN medications m ON m.id = f.medication_id
        ORDER BY f.rowid ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(medications)
}

pub async fn clear(pool: &SqlitePool) -> Result<()> {
    sqlx::query("DELETE FROM favorites").execute(pool).await?;
    Ok(())
}
