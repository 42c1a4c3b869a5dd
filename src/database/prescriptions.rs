// file: src/database/prescriptions.rs
use crate::models::Prescription;
use anyhow::Result;
use sqlx::SqlitePool;

pub async fn insert(pool: &SqlitePool, prescription: &Prescription) -> Result<()> {
    sqlx::query(
        "INSERT INTO prescriptions (id, medication_name, issue_date, expiry_date, image_url) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&prescription.id)
    .bind(&prescription.medication_name)
    .bind(prescription.issue_date)
    .bind(prescription.expiry_date)
    .bind(&prescription.image_url)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get(pool: &SqlitePool, id: &str) -> Result<Option<Prescription>> {
    let prescription = sqlx::query_as::<_, Prescription>(
        "SELECT id, medication_name, issue_date, expiry_date, image_url FROM prescriptions WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(prescription)
}

/// Soonest expiry first.
pub async fn get_all(pool: &SqlitePool) -> Result<Vec<Prescription>> {
    let prescriptions = sqlx::query_as::<_, Prescription>(
        "SELECT id, medication_name, issue_date, expiry_date, image_url FROM prescriptions ORDER BY expiry_date ASC, rowid ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(prescriptions)
}

pub async fn update(pool: &SqlitePool, prescription: &Prescription) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE prescriptions SET medication_name = ?, issue_date = ?, expiry_date = ?, image_url = ? WHERE id = ?",
    )
    .bind(&prescription.medication_name)
    .bind(prescription.issue_date)
    .bind(prescription.expiry_date)
    .bind(&prescription.image_url)
    .bind(&prescription.id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM prescriptions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
