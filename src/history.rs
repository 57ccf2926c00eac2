// 📈 History View - a user's records as table rows and a trend series

use crate::db::{BmiRecord, RecordStore, TIMESTAMP_FORMAT};
use crate::engine::Category;
use crate::error::{BmiError, Result};
use chrono::NaiveDateTime;
use serde::Serialize;

/// Shown in place of the chart when there is nothing to draw a line through.
pub const TREND_FALLBACK: &str = "Add more entries to view your BMI trend graph.";

/// Fewest records that make a meaningful trend line.
pub const MIN_TREND_POINTS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow {
    pub date: String,
    pub bmi: f64,
    pub category: Category,
}

impl From<&BmiRecord> for HistoryRow {
    fn from(record: &BmiRecord) -> Self {
        Self {
            date: record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            bmi: record.bmi,
            category: record.category,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendPoint {
    pub timestamp: NaiveDateTime,
    pub bmi: f64,
}

impl TrendPoint {
    /// Chart coordinates: seconds since the epoch against BMI.
    pub fn as_xy(&self) -> (f64, f64) {
        (self.timestamp.and_utc().timestamp() as f64, self.bmi)
    }
}

/// Chronological history for one user.
#[derive(Debug, Clone)]
pub struct History {
    pub user: String,
    records: Vec<BmiRecord>,
}

impl History {
    /// Load `user`'s records; `NoDataFound` if there are none.
    pub fn load(store: &RecordStore, user: &str) -> Result<Self> {
        let records = store.query_by_user(user)?;
        Self::from_records(user, records)
    }

    pub fn from_records(user: &str, records: Vec<BmiRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(BmiError::NoDataFound {
                user: user.to_string(),
            });
        }

        Ok(Self {
            user: user.to_string(),
            records,
        })
    }

    pub fn records(&self) -> &[BmiRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn rows(&self) -> Vec<HistoryRow> {
        self.records.iter().map(HistoryRow::from).collect()
    }

    pub fn has_trend(&self) -> bool {
        self.records.len() >= MIN_TREND_POINTS
    }

    /// `(timestamp, bmi)` series, empty when fewer than two records exist.
    pub fn trend(&self) -> Vec<TrendPoint> {
        trend_of(&self.records)
    }
}

fn trend_of(records: &[BmiRecord]) -> Vec<TrendPoint> {
    if records.len() < MIN_TREND_POINTS {
        return Vec::new();
    }

    records
        .iter()
        .map(|record| TrendPoint {
            timestamp: record.timestamp,
            bmi: record.bmi,
        })
        .collect()
}

/// Trend series for `user`. No records is an empty trend, not an error.
pub fn trend(store: &RecordStore, user: &str) -> Result<Vec<TrendPoint>> {
    let records = store.query_by_user(user)?;
    Ok(trend_of(&records))
}
