//! Reconciliation, derivation and classification of fundamentals data.
//!
//! Everything here is synchronous and works on values already fetched by a
//! collaborator. Functions that depend on "today" have an `_as_of` variant.

pub mod coalesce;
pub mod dividends;
pub mod earnings;
pub mod fiscal;
pub mod interpret;
pub mod numeric;
pub mod reconcile;
pub mod statements;

pub use coalesce::{coalesce, coalesce_with_source, source_for};
pub use dividends::{
    count_consecutive_dividend_years, estimate_dividend_frequency, estimate_dividend_frequency_as_of,
    DividendFrequency,
};
pub use earnings::{
    compute_beat, compute_surprise_percent, default_calendar_window, transform_earnings,
    transform_earnings_as_of, transform_earnings_calendar, validate_calendar_window, BeatRate,
    EarningsCalendar, EarningsResponse, EarningsResult,
};
pub use fiscal::{fiscal_period_for, parse_fiscal_period, parse_timeframe, to_fiscal_quarter};
pub use interpret::{
    f_score_interpretation, payout_ratio_interpretation, peg_interpretation, z_score_interpretation,
    FScoreZone, PayoutZone, PegZone, ZScoreZone,
};
pub use numeric::{calculate_cagr, calculate_yoy_change, calculate_yoy_changes, convert_to_percentage};
pub use reconcile::{merge_with_db_data, reconcile_metrics, reconcile_metrics_as_of, DatabaseMetrics, MergedMetrics};
pub use statements::{
    calculate_free_cash_flow, convert_polygon_to_financial_statement, enrich_cash_flow_data,
    financial_periods_with_yoy, normalize_filing,
};
