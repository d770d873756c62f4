use fundamentals_core::{is_metadata_key, FinancialData};
use std::collections::BTreeMap;

/// Provider fraction to percentage (0.25 -> 25.0).
pub fn convert_to_percentage(value: Option<f64>) -> Option<f64> {
    value.map(|v| v * 100.0)
}

/// Compound annual growth rate in percent.
///
/// Undefined for a non-positive base or duration. A negative end value has no
/// real root and also yields `None`.
pub fn calculate_cagr(start: f64, end: f64, years: i32) -> Option<f64> {
    if start <= 0.0 || years <= 0 {
        return None;
    }
    let cagr = ((end / start).powf(1.0 / years as f64) - 1.0) * 100.0;
    cagr.is_finite().then_some(cagr)
}

/// Fractional year-over-year change. The base is taken as an absolute value
/// so a loss turning into a profit reads as growth.
pub fn calculate_yoy_change(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    Some((current - previous) / previous.abs())
}

/// Per-key YoY change between two flattened statements.
/// Keys that are metadata, missing from `previous`, or non-numeric are skipped.
pub fn calculate_yoy_changes(current: &FinancialData, previous: &FinancialData) -> BTreeMap<String, f64> {
    current
        .iter()
        .filter(|(key, _)| !is_metadata_key(key))
        .filter_map(|(key, value)| {
            let cur = value.as_f64()?;
            let prev = previous.get(key)?.as_f64()?;
            calculate_yoy_change(cur, prev).map(|change| (key.clone(), change))
        })
        .collect()
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
