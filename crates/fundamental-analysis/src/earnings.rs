use chrono::{Datelike, Duration, NaiveDate, Utc};
use fundamentals_core::{EarningsRecord, FundamentalsError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::fiscal::{to_fiscal_quarter, DATE_FORMAT};
use crate::numeric::round_to;

/// Beat rate looks back at most this many qualifying quarters.
const BEAT_RATE_QUARTERS: u32 = 8;
const MAX_CALENDAR_DAYS: i64 = 14;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsResult {
    pub symbol: String,
    pub date: String,
    pub fiscal_quarter: String,
    pub eps_estimated: Option<f64>,
    pub eps_actual: Option<f64>,
    pub eps_surprise_percent: Option<f64>,
    pub eps_beat: Option<bool>,
    pub revenue_estimated: Option<f64>,
    pub revenue_actual: Option<f64>,
    pub revenue_surprise_percent: Option<f64>,
    pub revenue_beat: Option<bool>,
    pub is_upcoming: bool,
}

impl EarningsResult {
    /// Enrich one raw record. `today` is an ISO date.
    pub fn from_record(record: &EarningsRecord, today: &str) -> Self {
        Self {
            symbol: record.symbol.clone(),
            date: record.date.clone(),
            fiscal_quarter: to_fiscal_quarter(&record.date),
            eps_estimated: record.eps_estimated,
            eps_actual: record.eps_actual,
            eps_surprise_percent: compute_surprise_percent(record.eps_actual, record.eps_estimated),
            eps_beat: compute_beat(record.eps_actual, record.eps_estimated),
            revenue_estimated: record.revenue_estimated,
            revenue_actual: record.revenue_actual,
            revenue_surprise_percent: compute_surprise_percent(record.revenue_actual, record.revenue_estimated),
            revenue_beat: compute_beat(record.revenue_actual, record.revenue_estimated),
            // ISO dates order lexicographically
            is_upcoming: record.date.as_str() > today,
        }
    }
}

/// EPS and revenue beats over the most recent qualifying quarters.
/// The two counters have independent denominators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeatRate {
    pub eps_beats: u32,
    pub revenue_beats: u32,
    pub total_quarters: u32,
    pub total_revenue_quarters: u32,
}

impl BeatRate {
    fn is_empty(&self) -> bool {
        self.total_quarters == 0 && self.total_revenue_quarters == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsResponse {
    pub earnings: Vec<EarningsResult>,
    pub next_earnings: Option<EarningsResult>,
    pub most_recent_earnings: Option<EarningsResult>,
    pub beat_rate: Option<BeatRate>,
}

/// Enriched calendar window plus the number of reports per date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsCalendar {
    pub earnings: Vec<EarningsResult>,
    pub earnings_counts: BTreeMap<String, u32>,
}

/// Percent surprise rounded to 2 decimals. `None` when either side is
/// missing or the estimate is zero.
pub fn compute_surprise_percent(actual: Option<f64>, estimated: Option<f64>) -> Option<f64> {
    let (actual, estimated) = (actual?, estimated?);
    if estimated == 0.0 {
        return None;
    }
    Some(round_to((actual - estimated) / estimated.abs() * 100.0, 2))
}

pub fn compute_beat(actual: Option<f64>, estimated: Option<f64>) -> Option<bool> {
    Some(actual? > estimated?)
}

pub fn transform_earnings(records: &[EarningsRecord]) -> EarningsResponse {
    transform_earnings_as_of(records, Utc::now().date_naive())
}

/// Enrich a ticker's earnings history, in input order.
///
/// The first upcoming record becomes `next_earnings` and the first past one
/// `most_recent_earnings`. Past records feed the beat rate.
pub fn transform_earnings_as_of(records: &[EarningsRecord], today: NaiveDate) -> EarningsResponse {
    let today = today.format(DATE_FORMAT).to_string();
    let mut response = EarningsResponse {
        earnings: Vec::with_capacity(records.len()),
        ..Default::default()
    };
    let mut beat_rate = BeatRate::default();

    for record in records {
        let result = EarningsResult::from_record(record, &today);

        if result.is_upcoming {
            if response.next_earnings.is_none() {
                response.next_earnings = Some(result.clone());
            }
        } else {
            if response.most_recent_earnings.is_none() {
                response.most_recent_earnings = Some(result.clone());
            }

            if let Some(beat) = result.eps_beat {
                if beat_rate.total_quarters < BEAT_RATE_QUARTERS {
                    beat_rate.total_quarters += 1;
                    beat_rate.eps_beats += u32::from(beat);
                }
            }
            if let Some(beat) = result.revenue_beat {
                if beat_rate.total_revenue_quarters < BEAT_RATE_QUARTERS {
                    beat_rate.total_revenue_quarters += 1;
                    beat_rate.revenue_beats += u32::from(beat);
                }
            }
        }

        response.earnings.push(result);
    }

    if !beat_rate.is_empty() {
        response.beat_rate = Some(beat_rate);
    }
    tracing::debug!(
        "Transformed {} earnings records (next: {:?})",
        response.earnings.len(),
        response.next_earnings.as_ref().map(|e| e.date.as_str())
    );
    response
}

/// Enrich a multi-ticker calendar window with the same per-record rules.
pub fn transform_earnings_calendar(records: &[EarningsRecord], today: NaiveDate) -> EarningsCalendar {
    let today = today.format(DATE_FORMAT).to_string();
    let mut calendar = EarningsCalendar {
        earnings: Vec::with_capacity(records.len()),
        ..Default::default()
    };

    for record in records {
        calendar.earnings.push(EarningsResult::from_record(record, &today));
        *calendar.earnings_counts.entry(record.date.clone()).or_insert(0) += 1;
    }
    calendar
}

/// Monday of this week through Friday of next week.
pub fn default_calendar_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
    (monday, monday + Duration::days(11))
}

/// Parse a `from`/`to` pair and enforce the 14-day limit.
pub fn validate_calendar_window(from: &str, to: &str) -> Result<(NaiveDate, NaiveDate), FundamentalsError> {
    let from_date = NaiveDate::parse_from_str(from, DATE_FORMAT).map_err(|e| FundamentalsError::parse("from date", e))?;
    let to_date = NaiveDate::parse_from_str(to, DATE_FORMAT).map_err(|e| FundamentalsError::parse("to date", e))?;

    let span = (to_date - from_date).num_days();
    if span < 0 {
        return Err(FundamentalsError::parse("date range", "end precedes start"));
    }
    if span > MAX_CALENDAR_DAYS {
        return Err(FundamentalsError::parse(
            "date range",
            format!("must not exceed {} days, got {}", MAX_CALENDAR_DAYS, span),
        ));
    }
    Ok((from_date, to_date))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    fn record(date: &str, eps: (Option<f64>, Option<f64>), revenue: (Option<f64>, Option<f64>)) -> EarningsRecord {
        EarningsRecord {
            symbol: "AAPL".to_string(),
            date: date.to_string(),
            eps_actual: eps.0,
            eps_estimated: eps.1,
            revenue_actual: revenue.0,
            revenue_estimated: revenue.1,
            ..Default::default()
        }
    }

    #[test]
    fn test_surprise_percent() {
        assert_eq!(compute_surprise_percent(Some(5.0), Some(4.0)), Some(25.0));
        assert_eq!(compute_surprise_percent(Some(1.0), Some(-2.0)), Some(150.0));
        assert_eq!(compute_surprise_percent(Some(2.0), Some(3.0)), Some(-33.33));
        assert_eq!(compute_surprise_percent(Some(2.0), Some(0.0)), None);
        assert_eq!(compute_surprise_percent(None, Some(1.0)), None);
        assert_eq!(compute_surprise_percent(Some(1.0), None), None);
    }

    #[test]
    fn test_compute_beat() {
        assert_eq!(compute_beat(Some(5.0), Some(4.0)), Some(true));
        assert_eq!(compute_beat(Some(4.0), Some(4.0)), Some(false));
        assert_eq!(compute_beat(None, Some(4.0)), None);
    }

    #[test]
    fn test_next_and_most_recent() {
        let records = vec![
            record("2026-04-30", (None, Some(1.6)), (None, None)),
            record("2026-01-29", (Some(5.0), Some(4.0)), (None, None)),
        ];
        let response = transform_earnings_as_of(&records, today());

        let next = response.next_earnings.unwrap();
        assert_eq!(next.date, "2026-04-30");
        assert!(next.is_upcoming);
        assert_eq!(next.fiscal_quarter, "Q2 '26");

        let recent = response.most_recent_earnings.unwrap();
        assert_eq!(recent.date, "2026-01-29");
        assert_eq!(recent.eps_beat, Some(true));
        assert_eq!(response.earnings.len(), 2);
    }

    #[test]
    fn test_report_today_is_not_upcoming() {
        let records = vec![record("2026-03-10", (None, Some(1.0)), (None, None))];
        let response = transform_earnings_as_of(&records, today());
        assert!(response.next_earnings.is_none());
        assert!(response.most_recent_earnings.is_some());
        assert!(response.beat_rate.is_none());
    }

    #[test]
    fn test_beat_rate_independent_denominators() {
        let records = vec![
            record("2025-10-30", (Some(1.5), Some(1.4)), (Some(100.0), Some(90.0))),
            record("2025-07-30", (Some(1.2), Some(1.3)), (None, Some(80.0))),
            record("2025-04-30", (Some(1.1), Some(1.0)), (Some(70.0), Some(75.0))),
        ];
        let rate = transform_earnings_as_of(&records, today()).beat_rate.unwrap();

        assert_eq!(rate.total_quarters, 3);
        assert_eq!(rate.eps_beats, 2);
        assert_eq!(rate.total_revenue_quarters, 2);
        assert_eq!(rate.revenue_beats, 1);
    }

    #[test]
    fn test_beat_rate_capped_at_eight() {
        let records: Vec<_> = (0..12)
            .map(|i| record(&format!("20{:02}-01-15", 10 + i), (Some(2.0), Some(1.0)), (None, None)))
            .collect();
        let rate = transform_earnings_as_of(&records, today()).beat_rate.unwrap();

        assert_eq!(rate.total_quarters, 8);
        assert_eq!(rate.eps_beats, 8);
        assert_eq!(rate.total_revenue_quarters, 0);
    }

    #[test]
    fn test_empty_input() {
        let response = transform_earnings_as_of(&[], today());
        assert!(response.earnings.is_empty());
        assert!(response.next_earnings.is_none());
        assert!(response.beat_rate.is_none());
    }

    #[test]
    fn test_response_serializes_camel_case() {
        let records = vec![record("2026-01-29", (Some(5.0), Some(4.0)), (None, None))];
        let json = serde_json::to_value(transform_earnings_as_of(&records, today())).unwrap();
        assert_eq!(json["mostRecentEarnings"]["epsSurprisePercent"], 25.0);
        assert_eq!(json["beatRate"]["totalRevenueQuarters"], 0);
    }

    #[test]
    fn test_calendar_counts_and_upcoming_by_date() {
        let records = vec![
            record("2026-03-09", (Some(1.0), Some(0.9)), (None, None)),
            record("2026-03-12", (None, Some(2.0)), (None, None)),
            record("2026-03-12", (Some(3.0), Some(3.1)), (None, None)),
        ];
        let calendar = transform_earnings_calendar(&records, today());

        assert_eq!(calendar.earnings_counts["2026-03-12"], 2);
        assert_eq!(calendar.earnings_counts["2026-03-09"], 1);
        assert!(!calendar.earnings[0].is_upcoming);
        assert!(calendar.earnings[1].is_upcoming);
        assert!(calendar.earnings[2].is_upcoming);
        assert_eq!(calendar.earnings[2].eps_beat, Some(false));
    }

    #[test]
    fn test_default_calendar_window() {
        // 2026-03-10 is a Tuesday
        let (from, to) = default_calendar_window(today());
        assert_eq!(from, NaiveDate::from_ymd_opt(2026, 3, 9).unwrap());
        assert_eq!(to, NaiveDate::from_ymd_opt(2026, 3, 20).unwrap());

        let sunday = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        assert_eq!(default_calendar_window(sunday).0, NaiveDate::from_ymd_opt(2026, 3, 9).unwrap());
    }

    #[test]
    fn test_validate_calendar_window() {
        assert!(validate_calendar_window("2026-03-01", "2026-03-15").is_ok());

        let err = validate_calendar_window("2026-03-01", "2026-03-16").unwrap_err();
        assert!(err.to_string().contains("date range"));

        let err = validate_calendar_window("03/01/2026", "2026-03-05").unwrap_err();
        assert!(matches!(err, FundamentalsError::Parse { field: "from date", .. }));

        assert!(validate_calendar_window("2026-03-10", "2026-03-01").is_err());
    }
}
