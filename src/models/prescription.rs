// file: src/models/prescription.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Prescription {
    pub id: String,
    pub medication_name: String,
    pub issue_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub image_url: Option<String>,
}

impl Prescription {
    pub fn new(medication_name: String, issue_date: NaiveDate, expiry_date: NaiveDate) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            medication_name,
            issue_date,
            expiry_date,
            image_url: None,
        }
    }

    /// A prescription is still valid on its expiry date.
    pub fn is_expired(&self, on: NaiveDate) -> bool {
        on > self.expiry_date
    }

    pub fn days_until_expiry(&self, from: NaiveDate) -> i64 {
        (self.expiry_date - from).num_days()
    }
}
