use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};
use crate::data::types::{MarketFrame, Observation, DAY_FIRST_FORMAT};
use crate::data::DataError;

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    price: String,
    #[serde(rename = "greedCoef")]
    greed_coef: String,
}

/// Load `data.csv` into a date-indexed frame.
///
/// A missing file is `FileNotFound`; any other read failure, or an empty,
/// header-only or malformed file, is `InvalidData`. Non-numeric greed values load as `None`.
pub fn load_frame(path: impl AsRef<Path>) -> Result<MarketFrame, DataError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DataError::FileNotFound(path.display().to_string()));
    }

    let invalid = |e: csv::Error| DataError::InvalidData(format!("{}: {}", path.display(), e));

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(invalid)?;

    let headers = reader.headers().map_err(invalid)?.clone();
    for column in ["date", "price", "greedCoef"] {
        if !headers.iter().any(|h| h == column) {
            return Err(DataError::InvalidData(format!(
                "missing column '{}' in {}",
                column,
                path.display()
            )));
        }
    }

    let mut frame = MarketFrame::new();
    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.map_err(invalid)?;

        let date = parse_date(&row.date).ok_or_else(|| {
            DataError::InvalidData(format!("row {}: unparseable date '{}'", line + 1, row.date))
        })?;
        let price: f64 = row.price.parse().map_err(|_| {
            DataError::InvalidData(format!("row {}: unparseable price '{}'", line + 1, row.price))
        })?;
        let greed_coef = row.greed_coef.parse::<f64>().ok().filter(|v| v.is_finite());

        if !frame.insert(date, Observation { price, greed_coef }) {
            warn!("Duplicate date {} in {}, keeping first row", date, path.display());
        }
    }

    if frame.is_empty() {
        return Err(DataError::InvalidData(format!(
            "no rows after loading {}",
            path.display()
        )));
    }

    let missing_greed = frame.greed_coefs().iter().filter(|g| g.is_none()).count();
    info!(
        "Loaded {} rows from {} ({} without a numeric greed coefficient)",
        frame.len(),
        path.display(),
        missing_greed
    );
    Ok(frame)
}

/// Day-first dates as written by the reconciler, ISO dates as a fallback.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, DAY_FIRST_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fixture(name: &str) -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
    }

    #[test]
    fn test_load_valid_csv_matches_fixture() {
        let frame = load_frame(fixture("valid_data.csv")).unwrap();

        let mut expected = MarketFrame::new();
        expected.insert(
            NaiveDate::from_ymd_opt(2024, 3, 20).unwrap(),
            Observation { price: 61924.02, greed_coef: Some(74.0) },
        );
        expected.insert(
            NaiveDate::from_ymd_opt(2024, 3, 21).unwrap(),
            Observation { price: 67857.3, greed_coef: Some(78.0) },
        );
        expected.insert(
            NaiveDate::from_ymd_opt(2024, 3, 22).unwrap(),
            Observation { price: 65493.22, greed_coef: Some(75.0) },
        );

        assert_eq!(frame, expected);
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let err = load_frame(fixture("notexist.csv")).unwrap_err();
        assert!(matches!(err, DataError::FileNotFound(_)));
    }

    #[test]
    fn test_load_invalid_file_is_invalid_data() {
        let err = load_frame(fixture("invalid.csv")).unwrap_err();
        assert!(matches!(err, DataError::InvalidData(_)));
    }

    #[test]
    fn test_load_unreadable_content_is_invalid_data() {
        let dir = tempfile::tempdir().unwrap();

        let binary = dir.path().join("binary.csv");
        std::fs::write(&binary, [0xff, 0xfe, 0x00, 0x9f, 0x92, 0x96, b'\n', 0xc3, 0x28]).unwrap();
        assert!(matches!(load_frame(&binary), Err(DataError::InvalidData(_))));

        // Exists, but is a directory
        assert!(matches!(load_frame(dir.path()), Err(DataError::InvalidData(_))));
    }

    #[test]
    fn test_load_empty_and_header_only_are_invalid() {
        let dir = tempfile::tempdir().unwrap();

        let empty = dir.path().join("empty.csv");
        std::fs::File::create(&empty).unwrap();
        assert!(matches!(load_frame(&empty), Err(DataError::InvalidData(_))));

        let header_only = dir.path().join("header.csv");
        std::fs::write(&header_only, "date,price,greedCoef\n").unwrap();
        assert!(matches!(load_frame(&header_only), Err(DataError::InvalidData(_))));
    }

    #[test]
    fn test_non_numeric_greed_is_coerced() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "date,price,greedCoef").unwrap();
        writeln!(file, "21-03-2024,67857.3,N/A").unwrap();
        writeln!(file, "20-03-2024,61924.02,74").unwrap();

        let frame = load_frame(file.path()).unwrap();
        assert_eq!(frame.greed_coefs(), vec![Some(74.0), None]);
        assert_eq!(frame.last().unwrap().1.price, 67857.3);
    }
}
