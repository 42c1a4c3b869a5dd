// file: src/database/medications.rs
use crate::models::Medication;
use anyhow::Result;
use sqlx::SqlitePool;

const COLUMNS: &str =
    "id, name, short_description, dosage, interval_hours, first_dose_time, image_url, audio_url";

pub async fn insert(pool: &SqlitePool, medication: &Medication) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO medications
            (id, name, short_description, dosage, interval_hours, first_dose_time, image_url, audio_url)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&medication.id)
    .bind(&medication.name)
    .bind(&medication.short_description)
    .bind(&medication.dosage)
    .bind(medication.frequency.interval_hours)
    .bind(&medication.frequency.first_dose_time)
    .bind(&medication.image_url)
    .bind(&medication.audio_url)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get(pool: &SqlitePool, id: &str) -> Result<Option<Medication>> {
    let medication = sqlx::query_as::<_, Medication>(&format!(
        "SELECT {} FROM medications WHERE id = ?",
        COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(medication)
}

pub async fn get_all(pool: &SqlitePool) -> Result<Vec<Medication>> {
    let medications = sqlx::query_as::<_, Medication>(&format!(
        "SELECT {} FROM medications ORDER BY created_at ASC, rowid ASC",
        COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(medications)
}

pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM medications")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Returns false when no medication has that id.
pub async fn update(pool: &SqlitePool, medication: &Medication) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE medications
        SET name = ?, short_description = ?, dosage = ?, interval_hours = ?,
            first_dose_time = ?, image_url = ?, audio_url = ?
        WHERE id = ?
        "#,
    )
    .bind(&medication.name)
    .bind(&medication.short_description)
    .bind(&medication.dosage)
    .bind(medication.frequency.interval_hours)
    .bind(&medication.frequency.first_dose_time)
    .bind(&medication.image_url)
    .bind(&medication.audio_url)
    .bind(&medication.id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Deletes the medication and its favorite entry.
pub async fn delete(pool: &SqlitePool, id: &str) -> Result<bool> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM favorites WHERE medication_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM medications WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}
