use chrono::{Days, NaiveDate};

/// A named, date-indexed forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSeries {
    pub name: String,
    pub points: Vec<(NaiveDate, f64)>,
}

impl ForecastSeries {
    pub fn new(name: impl Into<String>, dates: &[NaiveDate], values: &[f64]) -> Option<Self> {
        if dates.len() != values.len() {
            return None;
        }

        Some(Self {
            name: name.into(),
            points: dates.iter().copied().zip(values.iter().copied()).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }

    /// Value `day` days ahead (1-based).
    pub fn day(&self, day: usize) -> Option<f64> {
        day.checked_sub(1).and_then(|i| self.points.get(i)).map(|(_, v)| *v)
    }
}

impl std::fmt::Display for ForecastSeries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.name)?;
        for (date, value) in &self.points {
            writeln!(f, "{}    {:.6}", date, value)?;
        }
        Ok(())
    }
}

/// `horizon` consecutive calendar days starting the day after `today`.
pub fn future_dates(today: NaiveDate, horizon: usize) -> Vec<NaiveDate> {
    (1..=horizon as u64)
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_future_dates_start_tomorrow() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 27).unwrap();
        let dates = future_dates(today, 4);

        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 2, 28).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            ]
        );
        assert!(future_dates(today, 0).is_empty());
    }

    #[test]
    fn test_series_requires_matching_lengths() {
        let dates = future_dates(NaiveDate::from_ymd_opt(2024, 3, 30).unwrap(), 3);
        assert!(ForecastSeries::new("x", &dates, &[1.0, 2.0]).is_none());

        let series = ForecastSeries::new("Predicted Prices", &dates, &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.day(1), Some(1.0));
        assert_eq!(series.day(3), Some(3.0));
        assert_eq!(series.day(0), None);
        assert_eq!(series.day(4), None);
    }
}
