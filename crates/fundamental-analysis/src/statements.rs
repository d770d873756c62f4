use chrono::NaiveDate;
use fundamentals_core::{
    FinancialData, FinancialPeriod, FinancialStatement, FundamentalsError, LineItem, RawFinancialRecord, StatementType,
};
use std::collections::BTreeMap;

use crate::fiscal::{fiscal_period_for, DATE_FORMAT};
use crate::numeric::calculate_yoy_changes;

const OPERATING_CASH_FLOW: &str = "net_cash_flow_from_operating_activities";
const CAPITAL_EXPENDITURE: &str = "capital_expenditure";
pub const FREE_CASH_FLOW: &str = "free_cash_flow";

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn optional_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

/// Normalize one raw filing into the statement of the given type.
///
/// Fails on an unparseable end date or a non-numeric fiscal year. Optional
/// dates that do not parse are dropped.
pub fn convert_polygon_to_financial_statement(
    raw: &RawFinancialRecord,
    ticker_id: i64,
    statement_type: StatementType,
) -> Result<FinancialStatement, FundamentalsError> {
    let period_end =
        NaiveDate::parse_from_str(&raw.end_date, DATE_FORMAT).map_err(|e| FundamentalsError::parse("end date", e))?;
    let fiscal_year: i32 = raw
        .fiscal_year
        .parse()
        .map_err(|e| FundamentalsError::parse("fiscal year", e))?;

    let line_items: BTreeMap<String, LineItem> = raw
        .financials
        .section(statement_type)
        .iter()
        .map(|(key, item)| {
            (
                key.clone(),
                LineItem {
                    value: item.value,
                    label: item.label.clone(),
                    unit: item.unit.clone(),
                },
            )
        })
        .collect();

    let period = fiscal_period_for(&raw.fiscal_period, fiscal_year);
    Ok(FinancialStatement {
        ticker_id,
        cik: non_empty(&raw.cik),
        statement_type,
        timeframe: period.timeframe,
        fiscal_year,
        fiscal_quarter: period.fiscal_quarter,
        period_start: optional_date(&raw.start_date),
        period_end,
        filed_date: optional_date(&raw.filing_date),
        source_filing_url: non_empty(&raw.source_filing_url),
        source_filing_type: non_empty(&raw.source_filing_type),
        line_items,
    })
}

/// Every statement type present in one filing. Empty sections are skipped.
pub fn normalize_filing(raw: &RawFinancialRecord, ticker_id: i64) -> Result<Vec<FinancialStatement>, FundamentalsError> {
    let mut statements = Vec::with_capacity(StatementType::ALL.len());
    for statement_type in StatementType::ALL {
        let statement = convert_polygon_to_financial_statement(raw, ticker_id, statement_type)?;
        if statement.line_items.is_empty() {
            tracing::debug!(
                "No {} data in filing ending {}",
                statement_type.as_str(),
                raw.end_date
            );
            continue;
        }
        statements.push(statement);
    }
    Ok(statements)
}

/// Operating cash flow plus capex (capex is reported negative).
pub fn calculate_free_cash_flow(data: &FinancialData) -> Option<f64> {
    let operating = data.get(OPERATING_CASH_FLOW)?.as_f64()?;
    let capex = data.get(CAPITAL_EXPENDITURE).and_then(|v| v.as_f64()).unwrap_or(0.0);
    Some(operating + capex)
}

pub fn enrich_cash_flow_data(data: &FinancialData) -> FinancialData {
    let mut enriched = data.clone();
    if let Some(fcf) = calculate_free_cash_flow(data) {
        enriched.insert(FREE_CASH_FLOW.to_string(), serde_json::Value::from(fcf));
    }
    enriched
}

fn display_data(statement: &FinancialStatement) -> FinancialData {
    let data = statement.data();
    match statement.statement_type {
        StatementType::CashFlow => enrich_cash_flow_data(&data),
        _ => data,
    }
}

/// Display periods in input order, each compared against the same quarter
/// and timeframe of the previous fiscal year when that statement is present.
pub fn financial_periods_with_yoy(statements: &[FinancialStatement]) -> Vec<FinancialPeriod> {
    statements
        .iter()
        .map(|current| {
            let data = display_data(current);
            let yoy_change = statements
                .iter()
                .find(|prior| {
                    prior.statement_type == current.statement_type
                        && prior.timeframe == current.timeframe
                        && prior.fiscal_quarter == current.fiscal_quarter
                        && prior.fiscal_year == current.fiscal_year - 1
                })
                .map(|prior| calculate_yoy_changes(&data, &display_data(prior)))
                .unwrap_or_default();

            FinancialPeriod {
                fiscal_year: current.fiscal_year,
                fiscal_quarter: current.fiscal_quarter,
                period_end: current.period_end.format(DATE_FORMAT).to_string(),
                filed_date: current.filed_date.map(|d| d.format(DATE_FORMAT).to_string()),
                data,
                yoy_change,
            }
        })
        .collect()
}
