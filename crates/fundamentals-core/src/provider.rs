//! Raw payloads as the upstream providers return them.
//!
//! The fundamentals provider reports ratios as fractions (0.47 for 47%); the
//! reconciliation layer converts them. Field names follow the provider JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::StatementType;

/// Trailing-twelve-month ratios
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatiosTtm {
    pub symbol: String,

    // Profitability (fractions)
    #[serde(rename = "grossProfitMarginTTM")]
    pub gross_profit_margin_ttm: Option<f64>,
    #[serde(rename = "operatingProfitMarginTTM")]
    pub operating_profit_margin_ttm: Option<f64>,
    #[serde(rename = "netProfitMarginTTM")]
    pub net_profit_margin_ttm: Option<f64>,
    #[serde(rename = "ebitdaMarginTTM")]
    pub ebitda_margin_ttm: Option<f64>,
    #[serde(rename = "ebitMarginTTM")]
    pub ebit_margin_ttm: Option<f64>,
    #[serde(rename = "freeCashFlowMarginTTM")]
    pub fcf_margin_ttm: Option<f64>,
    #[serde(rename = "pretaxProfitMarginTTM")]
    pub pretax_margin_ttm: Option<f64>,

    // Returns (fractions)
    #[serde(rename = "returnOnEquityTTM")]
    pub return_on_equity_ttm: Option<f64>,
    #[serde(rename = "returnOnAssetsTTM")]
    pub return_on_assets_ttm: Option<f64>,
    #[serde(rename = "returnOnInvestedCapitalTTM")]
    pub return_on_invested_capital_ttm: Option<f64>,
    #[serde(rename = "returnOnCapitalEmployedTTM")]
    pub return_on_capital_employed_ttm: Option<f64>,

    // Liquidity
    #[serde(rename = "currentRatioTTM")]
    pub current_ratio_ttm: Option<f64>,
    #[serde(rename = "quickRatioTTM")]
    pub quick_ratio_ttm: Option<f64>,
    #[serde(rename = "cashRatioTTM")]
    pub cash_ratio_ttm: Option<f64>,

    // Leverage
    #[serde(rename = "debtEquityRatioTTM")]
    pub debt_equity_ratio_ttm: Option<f64>,
    #[serde(rename = "debtToAssetsRatioTTM")]
    pub debt_to_assets_ratio_ttm: Option<f64>,
    #[serde(rename = "debtToEbitdaTTM")]
    pub debt_to_ebitda_ttm: Option<f64>,
    #[serde(rename = "debtToCapitalTTM")]
    pub debt_to_capital_ttm: Option<f64>,
    #[serde(rename = "interestCoverageTTM")]
    pub interest_coverage_ttm: Option<f64>,
    #[serde(rename = "netDebtToEbitdaTTM")]
    pub net_debt_to_ebitda_ttm: Option<f64>,

    // Valuation
    #[serde(rename = "priceToEarningsRatioTTM")]
    pub price_to_earnings_ratio_ttm: Option<f64>,
    #[serde(rename = "priceToBookRatioTTM")]
    pub price_to_book_ratio_ttm: Option<f64>,
    #[serde(rename = "priceToSalesRatioTTM")]
    pub price_to_sales_ratio_ttm: Option<f64>,
    #[serde(rename = "priceToFreeCashFlowRatioTTM")]
    pub price_to_free_cash_flow_ttm: Option<f64>,
    #[serde(rename = "priceToOperatingCashFlowRatioTTM")]
    pub price_to_operating_cash_flow_ttm: Option<f64>,
    #[serde(rename = "pegRatioTTM")]
    pub peg_ratio_ttm: Option<f64>,
    #[serde(rename = "earningsYieldTTM")]
    pub earnings_yield_ttm: Option<f64>,
    #[serde(rename = "freeCashFlowYieldTTM")]
    pub fcf_yield_ttm: Option<f64>,

    // Enterprise value
    #[serde(rename = "enterpriseValueTTM")]
    pub enterprise_value_ttm: Option<f64>,
    #[serde(rename = "evToSalesTTM")]
    pub ev_to_sales_ttm: Option<f64>,
    #[serde(rename = "evToEbitdaTTM")]
    pub ev_to_ebitda_ttm: Option<f64>,
    #[serde(rename = "evToEbitTTM")]
    pub ev_to_ebit_ttm: Option<f64>,
    #[serde(rename = "evToFreeCashFlowTTM")]
    pub ev_to_fcf_ttm: Option<f64>,

    // Efficiency
    #[serde(rename = "assetTurnoverTTM")]
    pub asset_turnover_ttm: Option<f64>,
    #[serde(rename = "inventoryTurnoverTTM")]
    pub inventory_turnover_ttm: Option<f64>,
    #[serde(rename = "receivablesTurnoverTTM")]
    pub receivables_turnover_ttm: Option<f64>,
    #[serde(rename = "payablesTurnoverTTM")]
    pub payables_turnover_ttm: Option<f64>,
    #[serde(rename = "fixedAssetTurnoverTTM")]
    pub fixed_asset_turnover_ttm: Option<f64>,
    #[serde(rename = "daysOfSalesOutstandingTTM")]
    pub days_of_sales_outstanding_ttm: Option<f64>,
    #[serde(rename = "daysOfInventoryOutstandingTTM")]
    pub days_of_inventory_outstanding_ttm: Option<f64>,
    #[serde(rename = "daysOfPayablesOutstandingTTM")]
    pub days_of_payables_outstanding_ttm: Option<f64>,
    #[serde(rename = "cashConversionCycleTTM")]
    pub cash_conversion_cycle_ttm: Option<f64>,

    // Dividends
    #[serde(rename = "dividendYieldTTM")]
    pub dividend_yield_ttm: Option<f64>,
    #[serde(rename = "payoutRatioTTM")]
    pub payout_ratio_ttm: Option<f64>,
    #[serde(rename = "dividendPerShareTTM")]
    pub dividend_per_share_ttm: Option<f64>,

    // Per share
    #[serde(rename = "operatingCashFlowPerShareTTM")]
    pub operating_cash_flow_per_share_ttm: Option<f64>,
    #[serde(rename = "freeCashFlowPerShareTTM")]
    pub free_cash_flow_per_share_ttm: Option<f64>,
    #[serde(rename = "cashPerShareTTM")]
    pub cash_per_share_ttm: Option<f64>,
    #[serde(rename = "revenuePerShareTTM")]
    pub revenue_per_share_ttm: Option<f64>,
    #[serde(rename = "netIncomePerShareTTM")]
    pub net_income_per_share_ttm: Option<f64>,
    #[serde(rename = "bookValuePerShareTTM")]
    pub book_value_per_share_ttm: Option<f64>,
    #[serde(rename = "tangibleBookValuePerShareTTM")]
    pub tangible_book_value_per_share_ttm: Option<f64>,
    #[serde(rename = "grahamNumberTTM")]
    pub graham_number_ttm: Option<f64>,
}

/// Trailing-twelve-month key metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyMetricsTtm {
    pub symbol: String,
    #[serde(rename = "marketCapTTM")]
    pub market_cap_ttm: Option<f64>,
    #[serde(rename = "workingCapitalTTM")]
    pub working_capital_ttm: Option<f64>,
    #[serde(rename = "netDebtTTM")]
    pub net_debt_ttm: Option<f64>,
    #[serde(rename = "investedCapitalTTM")]
    pub invested_capital_ttm: Option<f64>,
    #[serde(rename = "revenuePerShareTTM")]
    pub revenue_per_share_ttm: Option<f64>,
    #[serde(rename = "operatingCashFlowPerShareTTM")]
    pub operating_cash_flow_per_share_ttm: Option<f64>,
    #[serde(rename = "freeCashFlowPerShareTTM")]
    pub free_cash_flow_per_share_ttm: Option<f64>,
    #[serde(rename = "cashPerShareTTM")]
    pub cash_per_share_ttm: Option<f64>,
    #[serde(rename = "bookValuePerShareTTM")]
    pub book_value_per_share_ttm: Option<f64>,
    #[serde(rename = "tangibleBookValuePerShareTTM")]
    pub tangible_book_value_per_share_ttm: Option<f64>,
    #[serde(rename = "grahamNumberTTM")]
    pub graham_number_ttm: Option<f64>,
    #[serde(rename = "interestDebtPerShareTTM")]
    pub interest_debt_per_share_ttm: Option<f64>,
    #[serde(rename = "roeTTM")]
    pub roe_ttm: Option<f64>,
}

/// One annual growth record (fractions)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialGrowth {
    pub symbol: String,
    pub date: String,
    pub period: String,
    #[serde(rename = "revenueGrowth")]
    pub revenue_growth: Option<f64>,
    #[serde(rename = "grossProfitGrowth")]
    pub gross_profit_growth: Option<f64>,
    #[serde(rename = "operatingIncomeGrowth")]
    pub operating_income_growth: Option<f64>,
    #[serde(rename = "netIncomeGrowth")]
    pub net_income_growth: Option<f64>,
    #[serde(rename = "epsgrowth")]
    pub eps_growth: Option<f64>,
    #[serde(rename = "freeCashFlowGrowth")]
    pub free_cash_flow_growth: Option<f64>,
    #[serde(rename = "bookValueperShareGrowth")]
    pub book_value_per_share_growth: Option<f64>,
    #[serde(rename = "threeYRevenueGrowthPerShare")]
    pub three_y_revenue_growth_per_share: Option<f64>,
    #[serde(rename = "fiveYRevenueGrowthPerShare")]
    pub five_y_revenue_growth_per_share: Option<f64>,
    #[serde(rename = "threeYNetIncomeGrowthPerShare")]
    pub three_y_net_income_growth_per_share: Option<f64>,
    #[serde(rename = "fiveYNetIncomeGrowthPerShare")]
    pub five_y_net_income_growth_per_share: Option<f64>,
    #[serde(rename = "fiveYDividendperShareGrowthPerShare")]
    pub five_y_dividend_per_share_growth_per_share: Option<f64>,
}

/// Analyst consensus estimate for one future period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalystEstimate {
    pub symbol: String,
    pub date: String,
    #[serde(rename = "estimatedRevenueAvg")]
    pub estimated_revenue_avg: Option<f64>,
    #[serde(rename = "estimatedEpsLow")]
    pub estimated_eps_low: Option<f64>,
    #[serde(rename = "estimatedEpsHigh")]
    pub estimated_eps_high: Option<f64>,
    #[serde(rename = "estimatedEpsAvg")]
    pub estimated_eps_avg: Option<f64>,
    #[serde(rename = "estimatedEbitdaAvg")]
    pub estimated_ebitda_avg: Option<f64>,
    #[serde(rename = "estimatedNetIncomeAvg")]
    pub estimated_net_income_avg: Option<f64>,
    #[serde(rename = "numberAnalystsEstimatedRevenue")]
    pub number_analysts_estimated_revenue: Option<i32>,
    #[serde(rename = "numberAnalystsEstimatedEps")]
    pub number_analysts_estimated_eps: Option<i32>,
}

/// Altman Z and Piotroski F scores
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorePayload {
    pub symbol: String,
    #[serde(rename = "altmanZScore")]
    pub altman_z_score: Option<f64>,
    #[serde(rename = "piotroskiScore")]
    pub piotroski_score: Option<i32>,
}

/// One historical dividend payment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DividendRecord {
    pub symbol: String,
    /// Ex-dividend date, `YYYY-MM-DD`
    pub date: String,
    pub label: String,
    pub adj_dividend: f64,
    pub dividend: f64,
    pub record_date: String,
    pub payment_date: String,
    pub declaration_date: String,
}

impl DividendRecord {
    pub fn on(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            ..Default::default()
        }
    }
}

/// Analyst rating bucket counts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GradesSummary {
    pub symbol: String,
    pub strong_buy: i32,
    pub buy: i32,
    pub hold: i32,
    pub sell: i32,
    pub strong_sell: i32,
    pub consensus: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PriceTargetConsensus {
    pub symbol: String,
    pub target_high: Option<f64>,
    pub target_low: Option<f64>,
    pub target_consensus: Option<f64>,
    pub target_median: Option<f64>,
}

/// Everything the fundamentals provider returned for one ticker.
/// Any part may be missing when its endpoint failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderFinancials {
    pub ratios_ttm: Option<RatiosTtm>,
    pub key_metrics_ttm: Option<KeyMetricsTtm>,
    /// Newest first
    pub growth: Vec<FinancialGrowth>,
    /// Nearest period first
    pub estimates: Vec<AnalystEstimate>,
    pub score: Option<ScorePayload>,
    /// Newest first
    pub dividends: Vec<DividendRecord>,
    pub grades: Option<GradesSummary>,
    pub price_target: Option<PriceTargetConsensus>,
}

impl ProviderFinancials {
    pub fn is_empty(&self) -> bool {
        self.ratios_ttm.is_none()
            && self.key_metrics_ttm.is_none()
            && self.growth.is_empty()
            && self.estimates.is_empty()
            && self.score.is_none()
            && self.dividends.is_empty()
            && self.grades.is_none()
            && self.price_target.is_none()
    }
}

/// Raw earnings calendar / history record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EarningsRecord {
    pub symbol: String,
    /// Report date, `YYYY-MM-DD`
    pub date: String,
    pub eps_actual: Option<f64>,
    pub eps_estimated: Option<f64>,
    pub revenue_actual: Option<f64>,
    pub revenue_estimated: Option<f64>,
    pub last_updated: String,
}

/// One page of the statements endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawFinancialsPage {
    pub status: String,
    pub request_id: String,
    pub count: u32,
    pub results: Vec<RawFinancialRecord>,
    pub next_url: Option<String>,
}

/// One filing period as the statements provider returns it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawFinancialRecord {
    pub tickers: Vec<String>,
    pub cik: String,
    pub company_name: String,
    pub start_date: String,
    pub end_date: String,
    pub filing_date: String,
    /// "Q1".."Q4", "FY" or "TTM"
    pub fiscal_period: String,
    pub fiscal_year: String,
    pub source_filing_url: String,
    pub source_filing_type: String,
    pub financials: RawFinancialSections,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawFinancialSections {
    pub income_statement: BTreeMap<String, RawLineItem>,
    pub balance_sheet: BTreeMap<String, RawLineItem>,
    pub cash_flow_statement: BTreeMap<String, RawLineItem>,
    pub comprehensive_income: BTreeMap<String, RawLineItem>,
}

impl RawFinancialSections {
    /// The section backing a statement type.
    pub fn section(&self, statement_type: StatementType) -> &BTreeMap<String, RawLineItem> {
        match statement_type {
            StatementType::Income => &self.income_statement,
            StatementType::BalanceSheet => &self.balance_sheet,
            StatementType::CashFlow => &self.cash_flow_statement,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawLineItem {
    pub value: f64,
    pub unit: String,
    pub label: String,
    pub order: i32,
}
