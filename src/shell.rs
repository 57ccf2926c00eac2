// Interaction shell core - what each user action does, independent of how
// it is drawn. The terminal UI and the scripted commands both call into here.

use crate::db::{BmiRecord, RecordStore};
use crate::engine::{color_for, validate_measurement, ColorHint};
use crate::error::{BmiError, Field, Result};
use crate::history::History;
use tracing::{info, warn};

/// Raw text as typed into the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalculationForm {
    pub user: String,
    pub weight: String,
    pub height: String,
}

impl CalculationForm {
    pub fn new(user: impl Into<String>, weight: impl Into<String>, height: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            weight: weight.into(),
            height: height.into(),
        }
    }
}

/// Result of a successful calculation, already persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Calculation {
    pub record: BmiRecord,
    pub color: ColorHint,
}

impl Calculation {
    pub fn summary(&self) -> String {
        format!("BMI: {:.2} ({})", self.record.bmi, self.record.category)
    }
}

/// Validate, compute and persist. Nothing is stored unless validation passes.
pub fn calculate(store: &RecordStore, form: &CalculationForm) -> Result<Calculation> {
    let measurement = validate_measurement(&form.user, &form.weight, &form.height)
        .inspect_err(|e| warn!(error = %e, "rejected measurement"))?;

    let mut record = BmiRecord::now(&measurement)?;
    let id = store.append(&record)?;
    record.id = Some(id);

    info!(user = %record.user, bmi = record.bmi, category = %record.category, "calculated BMI");

    Ok(Calculation {
        color: color_for(record.category),
        record,
    })
}

/// History window contents for the username in the form.
pub fn show_history(store: &RecordStore, user: &str) -> Result<History> {
    let user = user.trim();
    if user.is_empty() {
        return Err(BmiError::invalid(
            Field::Username,
            "enter a username to view history",
        ));
    }

    History::load(store, user)
}

/// A blocking, user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

impl From<&BmiError> for Notice {
    fn from(err: &BmiError) -> Self {
        let (title, message) = match err {
            BmiError::InvalidInput { message, .. } => ("Input Error", capitalize(message) + "."),
            BmiError::OutOfPlausibleRange { .. } => (
                "Input Error",
                "Weight must be 20-300kg, Height 80-250cm.".to_string(),
            ),
            BmiError::StorageUnavailable { .. } => ("Storage Error", err.to_string()),
            BmiError::NoDataFound { .. } => {
                ("No Data", "No BMI records found for this user.".to_string())
            }
        };

        Notice {
            title: title.to_string(),
            message,
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
