use chrono::{Datelike, NaiveDate};
use fundamentals_core::{FiscalPeriod, Timeframe};

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// "Q1".."Q4" to 1..4. FY, TTM and anything else carry no quarter.
pub fn parse_fiscal_period(label: &str) -> Option<u8> {
    match label {
        "Q1" => Some(1),
        "Q2" => Some(2),
        "Q3" => Some(3),
        "Q4" => Some(4),
        _ => None,
    }
}

/// Unrecognized labels default to quarterly.
pub fn parse_timeframe(label: &str) -> Timeframe {
    match label {
        "Q1" | "Q2" | "Q3" | "Q4" => Timeframe::Quarterly,
        "FY" => Timeframe::Annual,
        "TTM" => Timeframe::Ttm,
        _ => Timeframe::Quarterly,
    }
}

pub fn fiscal_period_for(label: &str, fiscal_year: i32) -> FiscalPeriod {
    FiscalPeriod {
        timeframe: parse_timeframe(label),
        fiscal_year,
        fiscal_quarter: parse_fiscal_period(label),
    }
}

/// Calendar quarter label for an ISO date, e.g. "2026-02-14" -> "Q1 '26".
/// Returns the input unchanged when it is not a date.
pub fn to_fiscal_quarter(date: &str) -> String {
    match NaiveDate::parse_from_str(date, DATE_FORMAT) {
        Ok(d) => {
            let quarter = (d.month() - 1) / 3 + 1;
            format!("Q{} '{:02}", quarter, d.year().rem_euclid(100))
        }
        Err(_) => date.to_string(),
    }
}
