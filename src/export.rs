// History export - CSV and JSON renderings of a user's records

use crate::db::BmiRecord;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Write records as CSV with a header row.
pub fn write_csv<W: Write>(records: &[BmiRecord], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(record).context("Failed to serialize record")?;
    }
    wtr.flush().context("Failed to flush CSV output")?;
    Ok(())
}

pub fn export_csv(records: &[BmiRecord], path: &Path) -> Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_csv(records, file)?;
    Ok(records.len())
}

pub fn to_json(records: &[BmiRecord]) -> Result<String> {
    serde_json::to_string_pretty(records).context("Failed to serialize history")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Measurement;
    use chrono::NaiveDate;

    fn sample() -> Vec<BmiRecord> {
        let when = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(7, 45, 10)
            .unwrap();
        let measurement = Measurement {
            user: "frank".to_string(),
            weight: 50.0,
            height: 180.0,
        };
        let mut record = BmiRecord::from_measurement(&measurement, when).unwrap();
        record.id = Some(3);
        vec![record]
    }

    #[test]
    fn test_csv_layout() {
        let mut out = Vec::new();
        write_csv(&sample(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("id,user,weight,height,bmi,category,timestamp")
        );
        assert_eq!(
            lines.next(),
            Some("3,frank,50.0,180.0,15.43,Underweight,2024-01-15 07:45:10")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_export_csv_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        assert_eq!(export_csv(&sample(), &path).unwrap(), 1);
        assert!(std::fs::read_to_string(&path).unwrap().contains("frank"));
    }

    #[test]
    fn test_json_array() {
        let json: serde_json::Value = serde_json::from_str(&to_json(&sample()).unwrap()).unwrap();
        assert_eq!(json[0]["bmi"], 15.43);
        assert_eq!(json[0]["category"], "Underweight");
        assert_eq!(json[0]["timestamp"], "2024-01-15 07:45:10");
    }
}
