use chrono::{NaiveDate, NaiveDateTime};
use crate::data::types::Observation;
use crate::forecast::ForecastSeries;

/// The forecast email's content, independent of delivery.
#[derive(Debug, Clone)]
pub struct ForecastReport {
    pub generated_at: NaiveDateTime,
    pub today: NaiveDate,
    pub today_price: f64,
    pub today_greed_coef: Option<f64>,
    pub greed: ForecastSeries,
    pub price: ForecastSeries,
    pub correction_threshold: f64,
    pub milestones: Vec<usize>,
}

impl ForecastReport {
    pub fn new(
        today: (NaiveDate, Observation),
        greed: ForecastSeries,
        price: ForecastSeries,
        generated_at: NaiveDateTime,
        correction_threshold: f64,
        milestones: Vec<usize>,
    ) -> Self {
        let (date, observation) = today;
        Self {
            generated_at,
            today: date,
            today_price: observation.price,
            today_greed_coef: observation.greed_coef,
            greed,
            price,
            correction_threshold,
            milestones,
        }
    }

    /// Any forecast greed value, truncated to an integer, above the threshold.
    pub fn correction_due(&self) -> bool {
        self.greed
            .values()
            .iter()
            .any(|v| v.trunc() > self.correction_threshold)
    }

    /// Percentage change from today's price to the forecast `day` days ahead.
    pub fn price_increase(&self, day: usize) -> Option<f64> {
        let forecast = self.price.day(day)?;
        Some((forecast - self.today_price) / self.today_price * 100.0)
    }

    pub fn render_html(&self) -> String {
        let warning = if self.correction_due() {
            "<span style='color: red;'>market due for a correction</span>"
        } else {
            ""
        };

        let increases: String = self.milestones
            .iter()
            .filter_map(|day| self.price_increase(*day).map(|pct| (day, pct)))
            .map(|(day, pct)| {
                format!("<p>price increase <strong>{} days: {:.2}%</strong></p>\n", day, pct)
            })
            .collect();

        let greed_today = self.today_greed_coef
            .map(|g| g.to_string())
            .unwrap_or_else(|| "N/A".to_string());

        format!(
            "<html>\n<body>\n\
             <p>{now}</p>\n\
             <p>Today open price: {price}</p>\n\
             <p>Today greed coef: {greed}</p>\n\
             \n<h1>AI PREDICTIONS</h1>\n\n\
             <p>{warning}</p>\n\
             {increases}\n\
             <p>next {price_days} days BTC price:<br>\n{price_table}\n</p>\n\
             <p>next {greed_days} days greed coef:<br>\n{greed_table}\n</p>\n\
             </body>\n</html>\n",
            now = self.generated_at.format("%Y-%m-%d %H:%M:%S%.6f"),
            price = self.today_price,
            greed = greed_today,
            warning = warning,
            increases = increases,
            price_days = self.price.len(),
            price_table = table(&self.price),
            greed_days = self.greed.len(),
            greed_table = table(&self.greed),
        )
    }
}

fn table(series: &ForecastSeries) -> String {
    series
        .points
        .iter()
        .map(|(date, value)| format!("{}: {:.2}", date.format("%Y-%m-%d"), value))
        .collect::<Vec<_>>()
        .join("<br>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::series::future_dates;

    fn sample_report(greed_values: &[f64]) -> ForecastReport {
        let today = NaiveDate::from_ymd_opt(2024, 3, 30).unwrap();
        let dates = future_dates(today, 10);
        let prices = [
            69548.069586, 72197.699044, 74413.108224, 72036.672749, 75101.292521,
            74523.191588, 73627.264214, 72439.338986, 75696.905369, 76878.914300,
        ];

        ForecastReport::new(
            (today, Observation { price: 69903.72, greed_coef: Some(75.0) }),
            ForecastSeries::new("Predicted GreedCoef", &dates, greed_values).unwrap(),
            ForecastSeries::new("Predicted Prices", &dates, &prices).unwrap(),
            today.and_hms_opt(13, 0, 0).unwrap(),
            100.0,
            vec![5, 10],
        )
    }

    const CALM_GREED: [f64; 10] = [
        76.505326, 77.065571, 77.357898, 76.293440, 75.369683,
        74.500068, 74.204432, 74.166510, 73.792948, 73.222712,
    ];

    #[test]
    fn test_render_includes_milestones_and_tables() {
        let html = sample_report(&CALM_GREED).render_html();

        assert!(html.contains("<p>Today open price: 69903.72</p>"));
        assert!(html.contains("<p>Today greed coef: 75</p>"));
        // (75101.292521 - 69903.72) / 69903.72 * 100
        assert!(html.contains("5 days: 7.44%"));
        // (76878.9143 - 69903.72) / 69903.72 * 100
        assert!(html.contains("10 days: 9.98%"));
        assert!(html.contains("2024-03-31: 69548.07<br>2024-04-01: 72197.70"));
        assert!(html.contains("2024-04-09: 73.22"));
        assert!(!html.contains("market due for a correction"));
    }

    #[test]
    fn test_correction_warning_above_threshold() {
        let mut greed = CALM_GREED;
        greed[6] = 101.2;
        let report = sample_report(&greed);

        assert!(report.correction_due());
        assert!(report.render_html().contains("market due for a correction"));
    }

    #[test]
    fn test_truncation_keeps_borderline_values_calm() {
        let mut greed = CALM_GREED;
        greed[0] = 100.9;
        assert!(!sample_report(&greed).correction_due());
    }

    #[test]
    fn test_milestones_beyond_horizon_are_omitted() {
        let mut report = sample_report(&CALM_GREED);
        report.milestones = vec![5, 30];

        let html = report.render_html();
        assert!(html.contains("5 days:"));
        assert!(!html.contains("30 days:"));
        assert_eq!(report.price_increase(30), None);
    }
}
