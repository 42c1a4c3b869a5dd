// file: src/database/mod.rs

use anyhow::{Context, Result};
use log::info;
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePool, Row, Sqlite};

// Declare submodules
pub mod favorites;
pub mod medications;
pub mod prescriptions;
pub mod settings;

use crate::models::{Medication, Prescription, Settings};

#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn connect(db_url: &str) -> Result<Self> {
        // Create database if it doesn't exist
        let db_exists = Sqlite::database_exists(db_url)
            .await
            .context("Failed to check if database exists")?;
        if !db_exists {
            info!("Creating database");
            Sqlite::create_database(db_url)
                .await
                .context("Failed to create database")?;
        }

        let pool = SqlitePool::connect(db_url)
            .await
            .context("Failed to connect to database")?;

        run_schema(&pool).await.context("Failed to run database schema")?;
        ensure_migrations(&pool).await.context("Failed to ensure migrations")?;

        info!("Database initialized successfully");

        Ok(Database { pool })
    }

    /// Inserts the sample medications when the store is empty.
    pub async fn seed_if_empty(&self) -> Result<usize> {
        if medications::count(&self.pool).await? > 0 {
            return Ok(0);
        }

        let samples = crate::models::sample_medications();
        for medication in &samples {
            medications::insert(&self.pool, medication).await?;
        }
        info!("Seeded {} sample medications", samples.len());
        Ok(samples.len())
    }

    // --- Medication Delegates ---

    pub async fn add_medication(&self, medication: &Medication) -> Result<()> {
        medications::insert(&self.pool, medication).await
    }

    pub async fn get_medication(&self, id: &str) -> Result<Option<Medication>> {
        medications::get(&self.pool, id).await
    }

    pub async fn get_medications(&self) -> Result<Vec<Medication>> {
        medications::get_all(&self.pool).await
    }

    pub async fn update_medication(&self, medication: &Medication) -> Result<bool> {
        medications::update(&self.pool, medication).await
    }

    pub async fn delete_medication(&self, id: &str) -> Result<bool> {
        medications::delete(&self.pool, id).await
    }

    // --- Favorite Delegates ---

    pub async fn add_favorite(&self, medication_id: &str) -> Result<bool> {
        favorites::add(&self.pool, medication_id).await
    }

    pub async fn remove_favorite(&self, medication_id: &str) -> Result<()> {
        favorites::remove(&self.pool, medication_id).await
    }

    pub async fn is_favorite(&self, medication_id: &str) -> Result<bool> {
        favorites::contains(&self.pool, medication_id).await
    }

    pub async fn get_favorites(&self) -> Result<Vec<Medication>> {
        favorites::get_all(&self.pool).await
    }

    pub async fn clear_favorites(&self) -> Result<()> {
        favorites::clear(&self.pool).await
    }

    // --- Prescription Delegates ---

    pub async fn add_prescription(&self, prescription: &Prescription) -> Result<()> {
        prescriptions::insert(&self.pool, prescription).await
    }

    pub async fn get_prescription(&self, id: &str) -> Result<Option<Prescription>> {
        prescriptions::get(&self.pool, id).await
    }

    pub async fn get_prescriptions(&self) -> Result<Vec<Prescription>> {
        prescriptions::get_all(&self.pool).await
    }

    pub async fn update_prescription(&self, prescription: &Prescription) -> Result<bool> {
        prescriptions::update(&self.pool, prescription).await
    }

    pub async fn delete_prescription(&self, id: &str) -> Result<bool> {
        prescriptions::delete(&self.pool, id).await
    }

    // --- Settings Delegates ---

    pub async fn get_settings(&self) -> Result<Settings> {
        settings::get(&self.pool).await
    }

    pub async fn update_settings(&self, settings: &Settings) -> Result<()> {
        settings::update(&self.pool, settings).await
    }
}

async fn run_schema(pool: &SqlitePool) -> Result<()> {
    let schema = include_str!("schema.sql");

    let mut current_statement = String::new();
    let mut in_trigger = false;

    for line in schema.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") || trimmed.is_empty() {
            continue;
        }

        if trimmed.to_uppercase().starts_with("CREATE TRIGGER") {
            in_trigger = true;
        }

        current_statement.push_str(line);
        current_statement.push('\n');

        if trimmed.ends_with(';') {
            if in_trigger {
                if trimmed.to_uppercase() == "END;" {
                    in_trigger = false;
                    sqlx::query(&current_statement).execute(pool).await?;
                    current_statement.clear();
                }
            } else {
                sqlx::query(&current_statement).execute(pool).await?;
                current_statement.clear();
            }
        }
    }
    Ok(())
}

async fn ensure_migrations(pool: &SqlitePool) -> Result<()> {
    let rows = sqlx::query("PRAGMA table_info(medications)")
        .fetch_all(pool)
        .await
        .context("Failed to fetch table info")?;

    let columns: Vec<String> = rows
        .iter()
        .map(|row| row.get::<String, _>("name"))
        .collect();

    // Early installs stored neither media link.
    if !columns.contains(&"image_url".to_string()) {
        info!("Migrating: Adding image_url column to medications table");
        sqlx::query("ALTER TABLE medications ADD COLUMN image_url TEXT")
            .execute(pool)
            .await
            .context("Failed to add image_url column")?;
    }

    if !columns.contains(&"audio_url".to_string()) {
        info!("Migrating: Adding audio_url column to medications table");
        sqlx::query("ALTER TABLE medications ADD COLUMN audio_url TEXT")
            .execute(pool)
            .await
            .context("Failed to add audio_url column")?;
    }

    Ok(())
}

#[cfg(test)]
pub(crate) async fn test_database() -> Database {
    let temp_file = tempfile::NamedTempFile::new().unwrap();
    let (_, path) = temp_file.keep().unwrap();
    let db_path = format!("sqlite:{}", path.to_str().unwrap());

    let pool = SqlitePool::connect(&db_path).await.unwrap();
    run_schema(&pool).await.unwrap();

    Database { pool }
}
