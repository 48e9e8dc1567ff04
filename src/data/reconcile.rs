use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};
use crate::data::types::{GreedRecord, PriceRecord, ReconciledRow, DAY_FIRST_FORMAT};
use crate::data::DataError;

/// Tolerance between a greed date and a price timestamp, in seconds.
pub const DEFAULT_TOLERANCE_SECS: i64 = 86_400;

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    date: String,
    price: f64,
    #[serde(rename = "greedCoef")]
    greed_coef: &'a str,
}

/// Join each greed record with the nearest price record within `tolerance_secs`.
///
/// Greed dates are taken as UTC midnight. Records with malformed dates are
/// skipped, unmatched ones are dropped, and the result is sorted ascending.
pub fn reconcile(
    greed: &[GreedRecord],
    prices: &[PriceRecord],
    tolerance_secs: i64,
) -> Result<Vec<ReconciledRow>, DataError> {
    let mut rows = Vec::new();
    let mut seen = HashSet::new();

    for item in greed {
        let date = match NaiveDate::parse_from_str(item.timestamp.trim(), DAY_FIRST_FORMAT) {
            Ok(date) => date,
            Err(e) => {
                warn!(
                    "Skipping item due to date parsing error: {} [{}] ({})",
                    item.timestamp,
                    item.label(),
                    e
                );
                continue;
            }
        };

        if !seen.insert(date) {
            continue;
        }

        let Some(unix_time) = date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp()) else {
            continue;
        };

        if let Some(price) = nearest_open(prices, unix_time, tolerance_secs) {
            rows.push(ReconciledRow {
                date,
                price,
                greed_coef: item.value.clone().unwrap_or_else(|| "N/A".to_string()),
            });
        } else {
            debug!("No BTC price near {} for greed reading {}", date, item.label());
        }
    }

    if rows.is_empty() {
        return Err(DataError::NoMatchingData);
    }

    rows.sort_by_key(|row| row.date);
    info!("Reconciled {} of {} greed records", rows.len(), greed.len());

    Ok(rows)
}

/// Open price of the closest record, ties going to the earliest timestamp.
fn nearest_open(prices: &[PriceRecord], unix_time: i64, tolerance_secs: i64) -> Option<f64> {
    let mut candidates: Vec<(i64, i64, usize)> = prices
        .iter()
        .enumerate()
        .map(|(idx, p)| ((p.time - unix_time).abs(), p.time, idx))
        .filter(|(distance, _, _)| *distance <= tolerance_secs)
        .collect();
    candidates.sort();

    for (_, _, idx) in candidates {
        match prices[idx].open {
            Some(open) => return Some(open),
            None => warn!("Skipping item due to missing BTC price at {}", prices[idx].time),
        }
    }

    None
}

/// Write `date,price,greedCoef` rows, replacing whatever was at `path`.
pub fn write_csv(rows: &[ReconciledRow], path: impl AsRef<Path>) -> Result<(), DataError> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)?;

    for row in rows {
        writer.serialize(CsvRow {
            date: row.date.format(DAY_FIRST_FORMAT).to_string(),
            price: row.price,
            greed_coef: &row.greed_coef,
        })?;
    }
    writer.flush()?;

    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}
