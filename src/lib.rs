// BMI Tracker - Core Library
// Exposes the engine, record store and history view for the terminal UI,
// the scripted commands and tests.

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod export;
pub mod history;
pub mod logging;
pub mod shell;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use db::{
    BmiRecord, RecordStore,
    setup_database, insert_record, get_records_by_user, count_records,
};
pub use engine::{
    Category, CategoryRange, ColorHint, Measurement, CATEGORY_RANGES,
    classify, compute_bmi, validate_measurement,
};
pub use error::{BmiError, Field, StorageCause};
pub use history::{History, HistoryRow, TrendPoint, TREND_FALLBACK, trend};
pub use shell::{Calculation, CalculationForm, Notice, calculate, show_history};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
