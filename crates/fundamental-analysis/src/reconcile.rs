//! Provider/database metric reconciliation.
//!
//! Provider values win over database values; database values win over
//! nothing. Values derived here are always tagged `calculated`. The provider
//! reports ratios as fractions, the database stores percentages, so
//! percentage fields are converted before they are coalesced.

use chrono::{NaiveDate, Utc};
use fundamentals_core::{
    AnalystEstimate, DividendRecord, FinancialGrowth, GradesSummary, KeyMetricsTtm, PriceTargetConsensus,
    ProviderFinancials, RatiosTtm, ScorePayload, Source, Sourced,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::coalesce::{coalesce, coalesce_with_source};
use crate::dividends::{count_consecutive_dividend_years, estimate_dividend_frequency_as_of, DividendFrequency};
use crate::interpret::{
    f_score_interpretation, payout_ratio_interpretation, peg_interpretation, z_score_interpretation, FScoreZone,
    PayoutZone, PegZone, ZScoreZone,
};
use crate::numeric::convert_to_percentage;

/// Streaks are only meaningful with a few years of history.
const MIN_RECORDS_FOR_STREAK: usize = 4;

/// Internally maintained fallback values, already in display units.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseMetrics {
    pub pe_ratio: Option<f64>,
    pub pb_ratio: Option<f64>,
    pub ps_ratio: Option<f64>,
    pub gross_margin: Option<f64>,
    pub operating_margin: Option<f64>,
    pub net_margin: Option<f64>,
    pub roe: Option<f64>,
    pub roa: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    pub quick_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub payout_ratio: Option<f64>,
    pub market_cap: Option<f64>,
    pub revenue_growth_yoy: Option<f64>,
    pub eps_growth_yoy: Option<f64>,
    pub eps_diluted: Option<f64>,
}

/// Reconciled metrics for one ticker. Percent fields hold percentages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedMetrics {
    // Valuation
    pub pe_ratio: Option<f64>,
    pub forward_pe: Option<f64>,
    pub pb_ratio: Option<f64>,
    pub ps_ratio: Option<f64>,
    pub price_to_fcf: Option<f64>,
    pub price_to_ocf: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub enterprise_value: Option<f64>,
    pub ev_to_sales: Option<f64>,
    pub ev_to_ebitda: Option<f64>,
    pub ev_to_ebit: Option<f64>,
    pub ev_to_fcf: Option<f64>,
    pub earnings_yield: Option<f64>,
    pub fcf_yield: Option<f64>,
    pub market_cap: Option<f64>,

    // Profitability
    pub gross_margin: Option<f64>,
    pub operating_margin: Option<f64>,
    pub net_margin: Option<f64>,
    pub ebitda_margin: Option<f64>,
    pub ebit_margin: Option<f64>,
    pub fcf_margin: Option<f64>,
    pub pretax_margin: Option<f64>,
    pub roe: Option<f64>,
    pub roa: Option<f64>,
    pub roic: Option<f64>,
    pub roce: Option<f64>,

    // Liquidity
    pub current_ratio: Option<f64>,
    pub quick_ratio: Option<f64>,
    pub cash_ratio: Option<f64>,
    pub working_capital: Option<f64>,

    // Leverage
    pub debt_to_equity: Option<f64>,
    pub debt_to_assets: Option<f64>,
    pub debt_to_ebitda: Option<f64>,
    pub debt_to_capital: Option<f64>,
    pub interest_coverage: Option<f64>,
    pub net_debt_to_ebitda: Option<f64>,
    pub net_debt: Option<f64>,
    pub invested_capital: Option<f64>,

    // Efficiency
    pub asset_turnover: Option<f64>,
    pub inventory_turnover: Option<f64>,
    pub receivables_turnover: Option<f64>,
    pub payables_turnover: Option<f64>,
    pub fixed_asset_turnover: Option<f64>,
    pub days_sales_outstanding: Option<f64>,
    pub days_inventory_outstanding: Option<f64>,
    pub days_payables_outstanding: Option<f64>,
    pub cash_conversion_cycle: Option<f64>,

    // Growth
    pub revenue_growth_yoy: Option<f64>,
    pub gross_profit_growth_yoy: Option<f64>,
    pub operating_income_growth_yoy: Option<f64>,
    pub net_income_growth_yoy: Option<f64>,
    pub eps_growth_yoy: Option<f64>,
    pub fcf_growth_yoy: Option<f64>,
    pub book_value_growth_yoy: Option<f64>,
    pub revenue_growth_3y_cagr: Option<f64>,
    pub revenue_growth_5y_cagr: Option<f64>,
    pub eps_growth_3y_cagr: Option<f64>,
    pub eps_growth_5y_cagr: Option<f64>,
    pub dividend_growth_5y_cagr: Option<f64>,

    // Per share
    pub eps_diluted: Option<f64>,
    pub book_value_per_share: Option<f64>,
    pub tangible_book_per_share: Option<f64>,
    pub revenue_per_share: Option<f64>,
    pub operating_cf_per_share: Option<f64>,
    pub fcf_per_share: Option<f64>,
    pub cash_per_share: Option<f64>,
    pub dividend_per_share: Option<f64>,
    pub graham_number: Option<f64>,
    pub interest_debt_per_share: Option<f64>,

    // Dividends
    pub dividend_yield: Option<f64>,
    pub forward_dividend_yield: Option<f64>,
    pub payout_ratio: Option<f64>,
    pub fcf_payout_ratio: Option<f64>,
    pub consecutive_dividend_years: Option<u32>,
    pub ex_dividend_date: Option<String>,
    pub payment_date: Option<String>,
    pub dividend_frequency: Option<DividendFrequency>,

    // Quality scores
    pub altman_z_score: Option<f64>,
    pub altman_z_zone: Option<ZScoreZone>,
    pub altman_z_description: Option<String>,
    pub piotroski_f_score: Option<i32>,
    pub piotroski_f_zone: Option<FScoreZone>,
    pub piotroski_f_description: Option<String>,

    // Forward estimates
    pub forward_eps: Option<f64>,
    pub forward_eps_high: Option<f64>,
    pub forward_eps_low: Option<f64>,
    pub forward_revenue: Option<f64>,
    pub forward_ebitda: Option<f64>,
    pub forward_net_income: Option<f64>,
    pub num_analysts_eps: Option<i32>,
    pub num_analysts_revenue: Option<i32>,

    // Analyst consensus
    pub analyst_rating_strong_buy: Option<i32>,
    pub analyst_rating_buy: Option<i32>,
    pub analyst_rating_hold: Option<i32>,
    pub analyst_rating_sell: Option<i32>,
    pub analyst_rating_strong_sell: Option<i32>,
    pub analyst_consensus: Option<String>,
    pub target_high: Option<f64>,
    pub target_low: Option<f64>,
    pub target_consensus: Option<f64>,
    pub target_median: Option<f64>,

    // Interpretations
    pub peg_interpretation: Option<PegZone>,
    pub payout_interpretation: Option<PayoutZone>,

    pub provider_available: bool,
    /// Winning source per populated field
    pub sources: BTreeMap<String, Source>,
}

impl MergedMetrics {
    /// Source of a field by name; `Source::None` when the field is empty.
    pub fn source(&self, field: &str) -> Source {
        self.sources.get(field).copied().unwrap_or_default()
    }

    fn record(&mut self, field: &'static str, source: Source) {
        if source == Source::None {
            self.sources.remove(field);
        } else {
            self.sources.insert(field.to_string(), source);
        }
    }
}

/// Assign a `Sourced` value to a field and record its source under the field name.
macro_rules! set_sourced {
    ($m:ident . $field:ident, $sourced:expr) => {{
        let sourced = $sourced;
        $m.$field = sourced.value;
        $m.record(stringify!($field), sourced.source);
    }};
}

pub fn reconcile_metrics(provider: Option<&ProviderFinancials>, db: &DatabaseMetrics, price: f64) -> MergedMetrics {
    reconcile_metrics_as_of(provider, db, price, Utc::now().date_naive())
}

/// Reconcile with an explicit "today" for the dividend-frequency window.
pub fn reconcile_metrics_as_of(
    provider: Option<&ProviderFinancials>,
    db: &DatabaseMetrics,
    price: f64,
    today: NaiveDate,
) -> MergedMetrics {
    let empty = ProviderFinancials::default();
    let payload = provider.unwrap_or(&empty);

    let mut m = MergedMetrics {
        provider_available: payload.ratios_ttm.is_some(),
        ..Default::default()
    };

    if payload.is_empty() {
        tracing::debug!("No provider payload, reconciling from database values only");
    }

    merge_ratio_sections(&mut m, payload.ratios_ttm.as_ref(), payload.key_metrics_ttm.as_ref(), db);
    merge_growth(&mut m, payload.growth.first(), db);
    merge_estimates(&mut m, payload.estimates.first());
    merge_score(&mut m, payload.score.as_ref());
    merge_dividends(&mut m, &payload.dividends, today);
    merge_analyst(&mut m, payload.grades.as_ref(), payload.price_target.as_ref());
    derive_calculated(&mut m, price);
    attach_interpretations(&mut m);

    m
}

/// Legacy merge over the TTM ratios and flattened database scalars.
/// Precedence is identical to [`reconcile_metrics`].
#[allow(clippy::too_many_arguments)]
pub fn merge_with_db_data(
    provider: Option<&RatiosTtm>,
    db_gross_margin: Option<f64>,
    db_operating_margin: Option<f64>,
    db_net_margin: Option<f64>,
    db_roe: Option<f64>,
    db_roa: Option<f64>,
    db_debt_to_equity: Option<f64>,
    db_current_ratio: Option<f64>,
    db_quick_ratio: Option<f64>,
    db_pe_ratio: Option<f64>,
    db_pb_ratio: Option<f64>,
    db_ps_ratio: Option<f64>,
) -> MergedMetrics {
    let db = DatabaseMetrics {
        gross_margin: db_gross_margin,
        operating_margin: db_operating_margin,
        net_margin: db_net_margin,
        roe: db_roe,
        roa: db_roa,
        debt_to_equity: db_debt_to_equity,
        current_ratio: db_current_ratio,
        quick_ratio: db_quick_ratio,
        pe_ratio: db_pe_ratio,
        pb_ratio: db_pb_ratio,
        ps_ratio: db_ps_ratio,
        ..Default::default()
    };

    let mut m = MergedMetrics {
        provider_available: provider.is_some(),
        ..Default::default()
    };
    merge_ratio_sections(&mut m, provider, None, &db);
    m
}

fn merge_ratio_sections(
    m: &mut MergedMetrics,
    r: Option<&RatiosTtm>,
    k: Option<&KeyMetricsTtm>,
    db: &DatabaseMetrics,
) {
    let ratio = |f: fn(&RatiosTtm) -> Option<f64>| r.and_then(f);
    let pct = |f: fn(&RatiosTtm) -> Option<f64>| convert_to_percentage(r.and_then(f));
    let key = |f: fn(&KeyMetricsTtm) -> Option<f64>| k.and_then(f);

    // Valuation
    set_sourced!(m.pe_ratio, coalesce_with_source(ratio(|r| r.price_to_earnings_ratio_ttm), db.pe_ratio));
    set_sourced!(m.pb_ratio, coalesce_with_source(ratio(|r| r.price_to_book_ratio_ttm), db.pb_ratio));
    set_sourced!(m.ps_ratio, coalesce_with_source(ratio(|r| r.price_to_sales_ratio_ttm), db.ps_ratio));
    set_sourced!(m.price_to_fcf, Sourced::provider(ratio(|r| r.price_to_free_cash_flow_ttm)));
    set_sourced!(m.price_to_ocf, Sourced::provider(ratio(|r| r.price_to_operating_cash_flow_ttm)));
    set_sourced!(m.peg_ratio, Sourced::provider(ratio(|r| r.peg_ratio_ttm)));
    set_sourced!(m.enterprise_value, Sourced::provider(ratio(|r| r.enterprise_value_ttm)));
    set_sourced!(m.ev_to_sales, Sourced::provider(ratio(|r| r.ev_to_sales_ttm)));
    set_sourced!(m.ev_to_ebitda, Sourced::provider(ratio(|r| r.ev_to_ebitda_ttm)));
    set_sourced!(m.ev_to_ebit, Sourced::provider(ratio(|r| r.ev_to_ebit_ttm)));
    set_sourced!(m.ev_to_fcf, Sourced::provider(ratio(|r| r.ev_to_fcf_ttm)));
    set_sourced!(m.earnings_yield, Sourced::provider(pct(|r| r.earnings_yield_ttm)));
    set_sourced!(m.fcf_yield, Sourced::provider(pct(|r| r.fcf_yield_ttm)));
    set_sourced!(m.market_cap, coalesce_with_source(key(|k| k.market_cap_ttm), db.market_cap));

    // Profitability
    set_sourced!(m.gross_margin, coalesce_with_source(pct(|r| r.gross_profit_margin_ttm), db.gross_margin));
    set_sourced!(m.operating_margin, coalesce_with_source(pct(|r| r.operating_profit_margin_ttm), db.operating_margin));
    set_sourced!(m.net_margin, coalesce_with_source(pct(|r| r.net_profit_margin_ttm), db.net_margin));
    set_sourced!(m.ebitda_margin, Sourced::provider(pct(|r| r.ebitda_margin_ttm)));
    set_sourced!(m.ebit_margin, Sourced::provider(pct(|r| r.ebit_margin_ttm)));
    set_sourced!(m.fcf_margin, Sourced::provider(pct(|r| r.fcf_margin_ttm)));
    set_sourced!(m.pretax_margin, Sourced::provider(pct(|r| r.pretax_margin_ttm)));
    let provider_roe = coalesce([pct(|r| r.return_on_equity_ttm), convert_to_percentage(key(|k| k.roe_ttm))]);
    set_sourced!(m.roe, coalesce_with_source(provider_roe, db.roe));
    set_sourced!(m.roa, coalesce_with_source(pct(|r| r.return_on_assets_ttm), db.roa));
    set_sourced!(m.roic, Sourced::provider(pct(|r| r.return_on_invested_capital_ttm)));
    set_sourced!(m.roce, Sourced::provider(pct(|r| r.return_on_capital_employed_ttm)));

    // Liquidity
    set_sourced!(m.current_ratio, coalesce_with_source(ratio(|r| r.current_ratio_ttm), db.current_ratio));
    set_sourced!(m.quick_ratio, coalesce_with_source(ratio(|r| r.quick_ratio_ttm), db.quick_ratio));
    set_sourced!(m.cash_ratio, Sourced::provider(ratio(|r| r.cash_ratio_ttm)));
    set_sourced!(m.working_capital, Sourced::provider(key(|k| k.working_capital_ttm)));

    // Leverage
    set_sourced!(m.debt_to_equity, coalesce_with_source(ratio(|r| r.debt_equity_ratio_ttm), db.debt_to_equity));
    set_sourced!(m.debt_to_assets, Sourced::provider(ratio(|r| r.debt_to_assets_ratio_ttm)));
    set_sourced!(m.debt_to_ebitda, Sourced::provider(ratio(|r| r.debt_to_ebitda_ttm)));
    set_sourced!(m.debt_to_capital, Sourced::provider(ratio(|r| r.debt_to_capital_ttm)));
    set_sourced!(m.interest_coverage, Sourced::provider(ratio(|r| r.interest_coverage_ttm)));
    set_sourced!(m.net_debt_to_ebitda, Sourced::provider(ratio(|r| r.net_debt_to_ebitda_ttm)));
    set_sourced!(m.net_debt, Sourced::provider(key(|k| k.net_debt_ttm)));
    set_sourced!(m.invested_capital, Sourced::provider(key(|k| k.invested_capital_ttm)));

    // Efficiency
    set_sourced!(m.asset_turnover, Sourced::provider(ratio(|r| r.asset_turnover_ttm)));
    set_sourced!(m.inventory_turnover, Sourced::provider(ratio(|r| r.inventory_turnover_ttm)));
    set_sourced!(m.receivables_turnover, Sourced::provider(ratio(|r| r.receivables_turnover_ttm)));
    set_sourced!(m.payables_turnover, Sourced::provider(ratio(|r| r.payables_turnover_ttm)));
    set_sourced!(m.fixed_asset_turnover, Sourced::provider(ratio(|r| r.fixed_asset_turnover_ttm)));
    set_sourced!(m.days_sales_outstanding, Sourced::provider(ratio(|r| r.days_of_sales_outstanding_ttm)));
    set_sourced!(m.days_inventory_outstanding, Sourced::provider(ratio(|r| r.days_of_inventory_outstanding_ttm)));
    set_sourced!(m.days_payables_outstanding, Sourced::provider(ratio(|r| r.days_of_payables_outstanding_ttm)));
    set_sourced!(m.cash_conversion_cycle, Sourced::provider(ratio(|r| r.cash_conversion_cycle_ttm)));

    // Dividends
    set_sourced!(m.dividend_yield, coalesce_with_source(pct(|r| r.dividend_yield_ttm), db.dividend_yield));
    set_sourced!(m.payout_ratio, coalesce_with_source(pct(|r| r.payout_ratio_ttm), db.payout_ratio));
    set_sourced!(m.dividend_per_share, Sourced::provider(ratio(|r| r.dividend_per_share_ttm)));

    // Per share: TTM ratios first, key metrics fill the gaps
    set_sourced!(m.eps_diluted, coalesce_with_source(ratio(|r| r.net_income_per_share_ttm), db.eps_diluted));
    set_sourced!(
        m.revenue_per_share,
        Sourced::provider(coalesce([ratio(|r| r.revenue_per_share_ttm), key(|k| k.revenue_per_share_ttm)]))
    );
    set_sourced!(
        m.book_value_per_share,
        Sourced::provider(coalesce([ratio(|r| r.book_value_per_share_ttm), key(|k| k.book_value_per_share_ttm)]))
    );
    set_sourced!(
        m.tangible_book_per_share,
        Sourced::provider(coalesce([
            ratio(|r| r.tangible_book_value_per_share_ttm),
            key(|k| k.tangible_book_value_per_share_ttm),
        ]))
    );
    set_sourced!(
        m.operating_cf_per_share,
        Sourced::provider(coalesce([
            ratio(|r| r.operating_cash_flow_per_share_ttm),
            key(|k| k.operating_cash_flow_per_share_ttm),
        ]))
    );
    set_sourced!(
        m.fcf_per_share,
        Sourced::provider(coalesce([
            ratio(|r| r.free_cash_flow_per_share_ttm),
            key(|k| k.free_cash_flow_per_share_ttm),
        ]))
    );
    set_sourced!(
        m.cash_per_share,
        Sourced::provider(coalesce([ratio(|r| r.cash_per_share_ttm), key(|k| k.cash_per_share_ttm)]))
    );
    set_sourced!(
        m.graham_number,
        Sourced::provider(coalesce([ratio(|r| r.graham_number_ttm), key(|k| k.graham_number_ttm)]))
    );
    set_sourced!(m.interest_debt_per_share, Sourced::provider(key(|k| k.interest_debt_per_share_ttm)));
}

/// Most recent annual growth record.
fn merge_growth(m: &mut MergedMetrics, g: Option<&FinancialGrowth>, db: &DatabaseMetrics) {
    let pct = |f: fn(&FinancialGrowth) -> Option<f64>| convert_to_percentage(g.and_then(f));

    set_sourced!(m.revenue_growth_yoy, coalesce_with_source(pct(|g| g.revenue_growth), db.revenue_growth_yoy));
    set_sourced!(m.eps_growth_yoy, coalesce_with_source(pct(|g| g.eps_growth), db.eps_growth_yoy));
    set_sourced!(m.gross_profit_growth_yoy, Sourced::provider(pct(|g| g.gross_profit_growth)));
    set_sourced!(m.operating_income_growth_yoy, Sourced::provider(pct(|g| g.operating_income_growth)));
    set_sourced!(m.net_income_growth_yoy, Sourced::provider(pct(|g| g.net_income_growth)));
    set_sourced!(m.fcf_growth_yoy, Sourced::provider(pct(|g| g.free_cash_flow_growth)));
    set_sourced!(m.book_value_growth_yoy, Sourced::provider(pct(|g| g.book_value_per_share_growth)));

    // The provider publishes multi-year CAGRs per share
    set_sourced!(m.revenue_growth_3y_cagr, Sourced::provider(pct(|g| g.three_y_revenue_growth_per_share)));
    set_sourced!(m.revenue_growth_5y_cagr, Sourced::provider(pct(|g| g.five_y_revenue_growth_per_share)));
    set_sourced!(m.eps_growth_3y_cagr, Sourced::provider(pct(|g| g.three_y_net_income_growth_per_share)));
    set_sourced!(m.eps_growth_5y_cagr, Sourced::provider(pct(|g| g.five_y_net_income_growth_per_share)));
    set_sourced!(
        m.dividend_growth_5y_cagr,
        Sourced::provider(pct(|g| g.five_y_dividend_per_share_growth_per_share))
    );
}

fn merge_estimates(m: &mut MergedMetrics, e: Option<&AnalystEstimate>) {
    let Some(e) = e else { return };

    set_sourced!(m.forward_eps, Sourced::provider(e.estimated_eps_avg));
    set_sourced!(m.forward_eps_high, Sourced::provider(e.estimated_eps_high));
    set_sourced!(m.forward_eps_low, Sourced::provider(e.estimated_eps_low));
    set_sourced!(m.forward_revenue, Sourced::provider(e.estimated_revenue_avg));
    set_sourced!(m.forward_ebitda, Sourced::provider(e.estimated_ebitda_avg));
    set_sourced!(m.forward_net_income, Sourced::provider(e.estimated_net_income_avg));
    set_sourced!(m.num_analysts_eps, Sourced::provider(e.number_analysts_estimated_eps));
    set_sourced!(m.num_analysts_revenue, Sourced::provider(e.number_analysts_estimated_revenue));
}

/// Raw scores pass through; their bands are attached alongside.
fn merge_score(m: &mut MergedMetrics, s: Option<&ScorePayload>) {
    let Some(s) = s else { return };

    set_sourced!(m.altman_z_score, Sourced::provider(s.altman_z_score));
    set_sourced!(m.piotroski_f_score, Sourced::provider(s.piotroski_score));

    let z = s.altman_z_score.map(z_score_interpretation);
    set_sourced!(m.altman_z_zone, Sourced::calculated(z.map(|(zone, _)| zone)));
    set_sourced!(m.altman_z_description, Sourced::calculated(z.map(|(_, desc)| desc.to_string())));

    let f = s.piotroski_score.map(f_score_interpretation);
    set_sourced!(m.piotroski_f_zone, Sourced::calculated(f.map(|(zone, _)| zone)));
    set_sourced!(m.piotroski_f_description, Sourced::calculated(f.map(|(_, desc)| desc.to_string())));
}

/// `dividends` is newest first.
fn merge_dividends(m: &mut MergedMetrics, dividends: &[DividendRecord], today: NaiveDate) {
    let Some(latest) = dividends.first() else { return };

    let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
    set_sourced!(m.ex_dividend_date, Sourced::provider(non_empty(&latest.date)));
    set_sourced!(m.payment_date, Sourced::provider(non_empty(&latest.payment_date)));

    let streak = (dividends.len() >= MIN_RECORDS_FOR_STREAK).then(|| count_consecutive_dividend_years(dividends));
    set_sourced!(m.consecutive_dividend_years, Sourced::calculated(streak));
    set_sourced!(
        m.dividend_frequency,
        Sourced::calculated(Some(estimate_dividend_frequency_as_of(dividends, today)))
    );
}

/// Rating counts and price targets have no database fallback.
fn merge_analyst(m: &mut MergedMetrics, grades: Option<&GradesSummary>, target: Option<&PriceTargetConsensus>) {
    if let Some(g) = grades {
        set_sourced!(m.analyst_rating_strong_buy, Sourced::provider(Some(g.strong_buy)));
        set_sourced!(m.analyst_rating_buy, Sourced::provider(Some(g.buy)));
        set_sourced!(m.analyst_rating_hold, Sourced::provider(Some(g.hold)));
        set_sourced!(m.analyst_rating_sell, Sourced::provider(Some(g.sell)));
        set_sourced!(m.analyst_rating_strong_sell, Sourced::provider(Some(g.strong_sell)));
        let consensus = (!g.consensus.is_empty()).then(|| g.consensus.clone());
        set_sourced!(m.analyst_consensus, Sourced::provider(consensus));
    }

    if let Some(p) = target {
        set_sourced!(m.target_high, Sourced::provider(p.target_high));
        set_sourced!(m.target_low, Sourced::provider(p.target_low));
        set_sourced!(m.target_consensus, Sourced::provider(p.target_consensus));
        set_sourced!(m.target_median, Sourced::provider(p.target_median));
    }
}

/// Values computed from already-reconciled fields.
fn derive_calculated(m: &mut MergedMetrics, price: f64) {
    let has_price = price > 0.0;

    let forward_pe = m
        .forward_eps
        .filter(|eps| *eps > 0.0 && has_price)
        .map(|eps| price / eps);
    set_sourced!(m.forward_pe, Sourced::calculated(forward_pe));

    let forward_yield = m
        .dividend_per_share
        .filter(|_| has_price)
        .map(|dps| dps / price * 100.0);
    set_sourced!(m.forward_dividend_yield, Sourced::calculated(forward_yield));

    let fcf_payout = match (m.dividend_per_share, m.fcf_per_share) {
        (Some(dps), Some(fcf)) if fcf > 0.0 => Some(dps / fcf * 100.0),
        _ => None,
    };
    set_sourced!(m.fcf_payout_ratio, Sourced::calculated(fcf_payout));

    // Per-share values cancel shares outstanding, so this equals FCF / revenue
    if m.fcf_margin.is_none() {
        let fallback = match (m.fcf_per_share, m.revenue_per_share) {
            (Some(fcf), Some(rev)) if rev > 0.0 => Some(fcf / rev * 100.0),
            _ => None,
        };
        set_sourced!(m.fcf_margin, Sourced::calculated(fallback));
    }
}

fn attach_interpretations(m: &mut MergedMetrics) {
    let peg = m.peg_ratio.map(|peg| peg_interpretation(peg).0);
    set_sourced!(m.peg_interpretation, Sourced::calculated(peg));

    let payout = m.payout_ratio.map(|ratio| payout_ratio_interpretation(ratio).0);
    set_sourced!(m.payout_interpretation, Sourced::calculated(payout));
}
