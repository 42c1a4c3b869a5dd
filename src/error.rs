use crate::schedule::InvalidFrequency;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Error: {0}")]
    Anyhow(#[from] anyhow::Error),

    #[error("{0}")]
    Frequency(#[from] InvalidFrequency),

    #[error("Alarm error: {0}")]
    Alarm(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    pub fn alarm<S: Into<String>>(msg: S) -> Self {
        Self::Alarm(msg.into())
    }

    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Medication names and dosages are health data; only messages we build
    /// ourselves are shown verbatim.
    pub fn is_pii_safe(&self) -> bool {
        match self {
            Self::Database(_) | Self::Anyhow(_) => false,
            Self::Frequency(_)
            | Self::Alarm(_)
            | Self::InvalidInput(_)
            | Self::Config(_)
            | Self::NotFound(_) => true,
        }
    }

    pub fn to_safe_string(&self) -> String {
        if self.is_pii_safe() {
            self.to_string()
        } else {
            match self {
                Self::Database(_) => "Database operation failed".to_string(),
                Self::Anyhow(_) => "Operation failed".to_string(),
                _ => self.to_string(),
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_error_is_pii_safe() {
        let err: AppError = InvalidFrequency::NonPositiveInterval(0).into();
        assert!(err.is_pii_safe());
        assert!(err.to_safe_string().contains("interval"));
    }

    #[test]
    fn test_anyhow_error_is_masked() {
        let err: AppError = anyhow::anyhow!("row for Paracetamol 500mg missing").into();
        assert!(!err.is_pii_safe());
        assert_eq!(err.to_safe_string(), "Operation failed");
    }

    #[test]
    fn test_constructors() {
        assert!(matches!(AppError::not_found("med_001"), AppError::NotFound(_)));
        assert_eq!(
            AppError::invalid_input("name is empty").to_string(),
            "Invalid input: name is empty"
        );
    }
}
