use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Date format used by the greed index API (`date_format=eu`) and by `data.csv`.
pub const DAY_FIRST_FORMAT: &str = "%d-%m-%Y";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GreedRecord {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub value_classification: Option<String>,
    pub timestamp: String,
}

impl GreedRecord {
    /// Value and classification for log lines, e.g. `74 (Greed)`.
    pub fn label(&self) -> String {
        let value = self.value.as_deref().unwrap_or("N/A");
        match self.value_classification.as_deref() {
            Some(class) => format!("{} ({})", value, class),
            None => value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRecord {
    pub time: i64,
    #[serde(default)]
    pub open: Option<f64>,
}

/// One greed reading joined with the price record closest to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledRow {
    pub date: NaiveDate,
    pub price: f64,
    pub greed_coef: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub price: f64,
    /// `None` when the CSV value is not numeric.
    pub greed_coef: Option<f64>,
}

/// Date-indexed view of `data.csv`, sorted ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketFrame {
    rows: BTreeMap<NaiveDate, Observation>,
}

impl MarketFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row; returns false and keeps the existing row if the date is taken.
    pub fn insert(&mut self, date: NaiveDate, observation: Observation) -> bool {
        if self.rows.contains_key(&date) {
            return false;
        }
        self.rows.insert(date, observation);
        true
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Most recent row ("today" in the report).
    pub fn last(&self) -> Option<(NaiveDate, Observation)> {
        self.rows.iter().next_back().map(|(d, o)| (*d, *o))
    }

    pub fn greed_coefs(&self) -> Vec<Option<f64>> {
        self.rows.values().map(|o| o.greed_coef).collect()
    }

    /// Rows with a numeric greed coefficient, as `(date, price, greed)`.
    pub fn complete(&self) -> Vec<(NaiveDate, f64, f64)> {
        self.rows
            .iter()
            .filter_map(|(date, o)| o.greed_coef.map(|g| (*date, o.price, g)))
            .collect()
    }
}
