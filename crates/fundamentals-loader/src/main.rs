//! fundamentals-loader: fetch, normalize and reconcile fundamentals for a set of tickers.
//!
//! Statement pages come from Polygon through the rate-gated client. Earnings
//! and provider-metric payloads are read from JSON files produced elsewhere.
//! Output is JSON on stdout.
//!
//! Usage:
//!   cargo run -p fundamentals-loader -- --tickers AAPL MSFT --timeframe annual
//!   cargo run -p fundamentals-loader -- --tickers AAPL --all-pages --limit 40
//!   cargo run -p fundamentals-loader -- --from-file filings.json --ticker-id 7
//!   cargo run -p fundamentals-loader -- --earnings-file aapl_earnings.json
//!   cargo run -p fundamentals-loader -- --earnings-file calendar.json --calendar --from 2026-03-09 --to 2026-03-20
//!   cargo run -p fundamentals-loader -- --metrics-file aapl_metrics.json --price 212.5

use anyhow::anyhow;
use chrono::Utc;
use fundamental_analysis::{
    default_calendar_window, financial_periods_with_yoy, normalize_filing, reconcile_metrics, transform_earnings,
    transform_earnings_calendar, validate_calendar_window, DatabaseMetrics,
};
use fundamentals_core::{
    EarningsRecord, FinancialStatement, FinancialsFetcher, FinancialsRequestParams, FundamentalsError,
    ProviderFinancials, RawFinancialRecord, RawFinancialsPage, StatementType, Timeframe,
};
use polygon_client::PolygonFinancialsClient;
use serde_json::json;
use std::future::Future;
use std::path::Path;

/// Rate-limited requests are deferred and retried at most this many times.
const MAX_ATTEMPTS: u32 = 3;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fundamentals_loader=info,polygon_client=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if let Some(path) = arg_value(&args, "--earnings-file") {
        let records: Vec<EarningsRecord> = read_json(path)?;
        let output = if has_flag(&args, "--calendar") {
            earnings_calendar(&records, arg_value(&args, "--from"), arg_value(&args, "--to"))?
        } else {
            serde_json::to_value(transform_earnings(&records))?
        };
        return print_json(&output);
    }

    if let Some(path) = arg_value(&args, "--metrics-file") {
        let input: MetricsInput = read_json(path)?;
        let price = arg_value(&args, "--price")
            .map(|p| p.parse::<f64>())
            .transpose()
            .map_err(|e| anyhow!("invalid --price: {}", e))?
            .unwrap_or(0.0);
        let merged = reconcile_metrics(input.provider.as_ref(), &input.database, price);
        return print_json(&serde_json::to_value(merged)?);
    }

    let ticker_id: i64 = arg_value(&args, "--ticker-id").and_then(|v| v.parse().ok()).unwrap_or(0);

    if let Some(path) = arg_value(&args, "--from-file") {
        let page: RawFinancialsPage = read_json(path)?;
        let ticker = page
            .results
            .first()
            .and_then(|r| r.tickers.first().cloned())
            .unwrap_or_default();
        return print_json(&statements_output(&ticker, &page.results, ticker_id));
    }

    let tickers = arg_list(&args, "--tickers");
    if tickers.is_empty() {
        print_usage();
        std::process::exit(1);
    }

    let timeframe = match arg_value(&args, "--timeframe") {
        Some(tf) => Some(parse_timeframe_arg(tf)?),
        None => None,
    };
    let limit: Option<u32> = arg_value(&args, "--limit").and_then(|v| v.parse().ok());
    let all_pages = has_flag(&args, "--all-pages");

    let client = PolygonFinancialsClient::from_env()?;
    let mut output = Vec::with_capacity(tickers.len());

    for (i, ticker) in tickers.iter().enumerate() {
        let mut params = FinancialsRequestParams::for_ticker(ticker.as_str());
        params.timeframe = timeframe;
        params.limit = limit;

        let fetched = if all_pages {
            with_deferral(ticker, || client.fetch_all_financials(&params)).await
        } else {
            fetch_page(&client, &params).await
        };

        match fetched {
            Ok(page) => {
                tracing::info!("{}: {} filings", ticker, page.results.len());
                let id = if ticker_id > 0 { ticker_id } else { i as i64 + 1 };
                output.push(statements_output(ticker, &page.results, id));
            }
            Err(e) => {
                tracing::error!("{}: {}", ticker, e);
                output.push(json!({ "ticker": ticker, "error": e.to_string() }));
            }
        }
    }

    print_json(&serde_json::Value::Array(output))
}

#[derive(Debug, serde::Deserialize)]
struct MetricsInput {
    #[serde(default)]
    provider: Option<ProviderFinancials>,
    #[serde(default)]
    database: DatabaseMetrics,
}

/// One page through any fetcher, deferring on rate limits.
async fn fetch_page<F>(fetcher: &F, params: &FinancialsRequestParams) -> Result<RawFinancialsPage, FundamentalsError>
where
    F: FinancialsFetcher + ?Sized,
{
    with_deferral(&params.ticker, || fetcher.fetch_financials_page(params)).await
}

/// Run `op`, sleeping out `RateLimited` rejections up to `MAX_ATTEMPTS` times.
async fn with_deferral<T, F, Fut>(ticker: &str, mut op: F) -> Result<T, FundamentalsError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FundamentalsError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Err(e) if attempt < MAX_ATTEMPTS && e.is_rate_limited() => {
                let wait = e.retry_after().unwrap_or_default();
                tracing::warn!(
                    "{}: rate limited, deferring {:.1}s (attempt {}/{})",
                    ticker,
                    wait.as_secs_f64(),
                    attempt,
                    MAX_ATTEMPTS
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// Normalize filings and group display periods by statement type.
/// Filings that fail to parse are skipped with a warning.
fn statements_output(ticker: &str, filings: &[RawFinancialRecord], ticker_id: i64) -> serde_json::Value {
    let mut statements: Vec<FinancialStatement> = Vec::new();
    let mut skipped = 0;

    for filing in filings {
        match normalize_filing(filing, ticker_id) {
            Ok(mut normalized) => statements.append(&mut normalized),
            Err(e) => {
                tracing::warn!("{}: skipping filing ending {:?}: {}", ticker, filing.end_date, e);
                skipped += 1;
            }
        }
    }

    let mut by_type = serde_json::Map::new();
    for statement_type in StatementType::ALL {
        let of_type: Vec<FinancialStatement> = statements
            .iter()
            .filter(|s| s.statement_type == statement_type)
            .cloned()
            .collect();
        if of_type.is_empty() {
            continue;
        }
        by_type.insert(
            statement_type.as_str().to_string(),
            json!(financial_periods_with_yoy(&of_type)),
        );
    }

    json!({
        "ticker": ticker,
        "filings": filings.len(),
        "skipped": skipped,
        "statements": by_type,
    })
}

fn earnings_calendar(
    records: &[EarningsRecord],
    from: Option<&str>,
    to: Option<&str>,
) -> anyhow::Result<serde_json::Value> {
    let today = Utc::now().date_naive();
    let (from, to) = match (from, to) {
        (Some(from), Some(to)) => validate_calendar_window(from, to)?,
        _ => default_calendar_window(today),
    };

    let (from_s, to_s) = (from.format("%Y-%m-%d").to_string(), to.format("%Y-%m-%d").to_string());
    let in_window: Vec<EarningsRecord> = records
        .iter()
        .filter(|r| r.date >= from_s && r.date <= to_s)
        .cloned()
        .collect();

    let calendar = transform_earnings_calendar(&in_window, today);
    Ok(json!({
        "data": calendar,
        "meta": { "from": from_s, "to": to_s, "total": calendar.earnings.len() },
    }))
}

fn parse_timeframe_arg(value: &str) -> anyhow::Result<Timeframe> {
    serde_json::from_value(serde_json::Value::String(value.to_lowercase()))
        .map_err(|_| anyhow!("invalid --timeframe {:?}, expected quarterly, annual or ttm", value))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let text = std::fs::read_to_string(Path::new(path)).map_err(|e| anyhow!("failed to read {}: {}", path, e))?;
    serde_json::from_str(&text).map_err(|e| anyhow!("failed to decode {}: {}", path, e))
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .filter(|v| !v.starts_with("--"))
        .map(|s| s.as_str())
}

fn arg_list(args: &[String], flag: &str) -> Vec<String> {
    match args.iter().position(|a| a == flag) {
        Some(idx) => args[idx + 1..]
            .iter()
            .take_while(|a| !a.starts_with("--"))
            .cloned()
            .collect(),
        None => Vec::new(),
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  fundamentals-loader --tickers AAPL MSFT ...       Fetch and normalize statements");
    eprintln!("  fundamentals-loader --from-file PATH              Normalize a saved statements page");
    eprintln!("  fundamentals-loader --earnings-file PATH          Enrich an earnings history");
    eprintln!("  fundamentals-loader --metrics-file PATH           Reconcile provider and database metrics");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --timeframe T      quarterly, annual or ttm");
    eprintln!("  --limit N          Results per page (default 100)");
    eprintln!("  --all-pages        Follow pagination");
    eprintln!("  --ticker-id N      Internal ticker id stamped on statements");
    eprintln!("  --calendar         Treat the earnings file as a calendar (with --from/--to)");
    eprintln!("  --price P          Current price for price-based ratios");
}
