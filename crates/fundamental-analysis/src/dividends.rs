use chrono::{Duration, NaiveDate, Utc};
use fundamentals_core::DividendRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::fiscal::DATE_FORMAT;

/// Payments older than this say nothing about the current schedule.
const LOOKBACK_DAYS: i64 = 730;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DividendFrequency {
    Monthly,
    Quarterly,
    #[serde(rename = "semi-annual")]
    SemiAnnual,
    Annual,
    Irregular,
    Unknown,
}

impl DividendFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            DividendFrequency::Monthly => "monthly",
            DividendFrequency::Quarterly => "quarterly",
            DividendFrequency::SemiAnnual => "semi-annual",
            DividendFrequency::Annual => "annual",
            DividendFrequency::Irregular => "irregular",
            DividendFrequency::Unknown => "unknown",
        }
    }

    fn from_median_gap(days: i64) -> Self {
        match days {
            d if d <= 45 => DividendFrequency::Monthly,
            d if d <= 135 => DividendFrequency::Quarterly,
            d if d <= 270 => DividendFrequency::SemiAnnual,
            d if d <= 500 => DividendFrequency::Annual,
            _ => DividendFrequency::Irregular,
        }
    }
}

impl std::fmt::Display for DividendFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Length of the unbroken run of calendar years with a payment, counted back
/// from the most recent year. Dates without a 4-digit year prefix are ignored.
pub fn count_consecutive_dividend_years(dividends: &[DividendRecord]) -> u32 {
    let years: BTreeSet<i32> = dividends
        .iter()
        .filter_map(|d| d.date.get(..4)?.parse().ok())
        .collect();

    let mut run = 0;
    let mut expected = None;
    for year in years.into_iter().rev() {
        match expected {
            Some(e) if year != e => break,
            _ => {
                run += 1;
                expected = Some(year - 1);
            }
        }
    }
    run
}

pub fn estimate_dividend_frequency(dividends: &[DividendRecord]) -> DividendFrequency {
    estimate_dividend_frequency_as_of(dividends, Utc::now().date_naive())
}

/// Classify the payment schedule from the median gap between recent payments.
pub fn estimate_dividend_frequency_as_of(dividends: &[DividendRecord], today: NaiveDate) -> DividendFrequency {
    let dates: BTreeSet<NaiveDate> = dividends
        .iter()
        .filter_map(|d| NaiveDate::parse_from_str(&d.date, DATE_FORMAT).ok())
        .collect();

    if dates.len() < 2 {
        return DividendFrequency::Unknown;
    }

    let cutoff = today - Duration::days(LOOKBACK_DAYS);
    let recent: Vec<NaiveDate> = dates.into_iter().filter(|d| *d >= cutoff).collect();
    if recent.len() < 2 {
        return DividendFrequency::Irregular;
    }

    let mut gaps: Vec<i64> = recent
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_days())
        .collect();
    gaps.sort_unstable();

    let mid = gaps.len() / 2;
    let median = if gaps.len() % 2 == 0 {
        (gaps[mid - 1] + gaps[mid]) / 2
    } else {
        gaps[mid]
    };

    DividendFrequency::from_median_gap(median)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Months;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()
    }

    /// `count` payments, newest first, `step_months` apart, the newest `offset_months` ago.
    fn schedule(count: u32, step_months: u32, offset_months: u32) -> Vec<DividendRecord> {
        (0..count)
            .map(|i| {
                let date = today() - Months::new(offset_months + i * step_months);
                DividendRecord::on(date.format(DATE_FORMAT).to_string())
            })
            .collect()
    }

    #[test]
    fn test_frequency_quarterly() {
        let divs = schedule(4, 3, 0);
        assert_eq!(estimate_dividend_frequency_as_of(&divs, today()), DividendFrequency::Quarterly);
    }

    #[test]
    fn test_frequency_monthly() {
        let divs = schedule(12, 1, 0);
        assert_eq!(estimate_dividend_frequency_as_of(&divs, today()), DividendFrequency::Monthly);
    }

    #[test]
    fn test_frequency_annual() {
        let divs = schedule(2, 15, 3);
        assert_eq!(estimate_dividend_frequency_as_of(&divs, today()), DividendFrequency::Annual);
    }

    #[test]
    fn test_frequency_semi_annual() {
        let divs = schedule(4, 6, 1);
        assert_eq!(estimate_dividend_frequency_as_of(&divs, today()), DividendFrequency::SemiAnnual);
    }

    #[test]
    fn test_frequency_labels_match_serialized_form() {
        assert_eq!(DividendFrequency::SemiAnnual.to_string(), "semi-annual");
        assert_eq!(
            serde_json::to_value(DividendFrequency::SemiAnnual).unwrap(),
            serde_json::json!("semi-annual")
        );
        assert_eq!(
            serde_json::to_value(DividendFrequency::Irregular).unwrap(),
            serde_json::json!("irregular")
        );
    }

    #[test]
    fn test_frequency_stale_is_irregular() {
        let divs = schedule(8, 3, 36);
        assert_eq!(estimate_dividend_frequency_as_of(&divs, today()), DividendFrequency::Irregular);
    }

    #[test]
    fn test_frequency_unknown_with_too_few_dates() {
        assert_eq!(estimate_dividend_frequency_as_of(&[], today()), DividendFrequency::Unknown);
        let divs = vec![DividendRecord::on("2026-03-01"), DividendRecord::on("garbage")];
        assert_eq!(estimate_dividend_frequency_as_of(&divs, today()), DividendFrequency::Unknown);
    }

    #[test]
    fn test_consecutive_years_stops_at_gap() {
        let divs: Vec<_> = ["2026-03-01", "2025-12-01", "2025-03-01", "2024-06-01", "2022-06-01", "2021-06-01"]
            .into_iter()
            .map(DividendRecord::on)
            .collect();
        assert_eq!(count_consecutive_dividend_years(&divs), 3);
    }

    #[test]
    fn test_consecutive_years_ignores_short_dates() {
        let divs = vec![DividendRecord::on("20"), DividendRecord::on("")];
        assert_eq!(count_consecutive_dividend_years(&divs), 0);

        let divs = vec![DividendRecord::on("abc"), DividendRecord::on("2019-01-01")];
        assert_eq!(count_consecutive_dividend_years(&divs), 1);
    }
}
