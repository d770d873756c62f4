use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::time::Duration;

/// Which upstream system supplied a value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Provider,
    Database,
    Calculated,
    #[default]
    None,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Provider => "provider",
            Source::Database => "database",
            Source::Calculated => "calculated",
            Source::None => "none",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An optional value tagged with the source that produced it.
///
/// An absent value always carries `Source::None`; the constructors enforce this
/// so a zero from the provider is never confused with "no data".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sourced<T> {
    pub value: Option<T>,
    pub source: Source,
}

impl<T> Sourced<T> {
    pub fn new(value: Option<T>, source: Source) -> Self {
        let source = if value.is_some() { source } else { Source::None };
        Self { value, source }
    }

    pub fn none() -> Self {
        Self {
            value: None,
            source: Source::None,
        }
    }

    pub fn provider(value: Option<T>) -> Self {
        Self::new(value, Source::Provider)
    }

    pub fn database(value: Option<T>) -> Self {
        Self::new(value, Source::Database)
    }

    pub fn calculated(value: Option<T>) -> Self {
        Self::new(value, Source::Calculated)
    }

    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }
}

impl<T> Default for Sourced<T> {
    fn default() -> Self {
        Self::none()
    }
}

/// A ratio or metric with provenance
pub type RatioValue = Sourced<f64>;

/// Reporting period type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    #[default]
    Quarterly,
    Annual,
    #[serde(alias = "trailing_twelve_months")]
    Ttm,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Quarterly => "quarterly",
            Timeframe::Annual => "annual",
            Timeframe::Ttm => "ttm",
        }
    }
}

/// Financial statement kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementType {
    Income,
    BalanceSheet,
    CashFlow,
}

impl StatementType {
    pub const ALL: [StatementType; 3] = [
        StatementType::Income,
        StatementType::BalanceSheet,
        StatementType::CashFlow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatementType::Income => "income",
            StatementType::BalanceSheet => "balance_sheet",
            StatementType::CashFlow => "cash_flow",
        }
    }
}

impl std::str::FromStr for StatementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(StatementType::Income),
            "balance_sheet" => Ok(StatementType::BalanceSheet),
            "cash_flow" => Ok(StatementType::CashFlow),
            other => Err(format!("unknown statement type: {}", other)),
        }
    }
}

/// Normalized fiscal period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalPeriod {
    pub timeframe: Timeframe,
    pub fiscal_year: i32,
    /// 1-4 for quarterly periods, absent for FY/TTM
    pub fiscal_quarter: Option<u8>,
}

/// One statement line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub value: f64,
    pub label: String,
    pub unit: String,
}

/// Flattened line-item storage: each key `k` is stored as `k`, `k_label`, `k_unit`.
pub type FinancialData = BTreeMap<String, serde_json::Value>;

pub const LABEL_SUFFIX: &str = "_label";
pub const UNIT_SUFFIX: &str = "_unit";

/// True for the synthetic `_label` / `_unit` companion keys of a flattened map.
pub fn is_metadata_key(key: &str) -> bool {
    key.ends_with(LABEL_SUFFIX) || key.ends_with(UNIT_SUFFIX)
}

pub fn flatten_line_items(items: &BTreeMap<String, LineItem>) -> FinancialData {
    let mut data = FinancialData::new();
    for (key, item) in items {
        data.insert(key.clone(), serde_json::Value::from(item.value));
        data.insert(
            format!("{}{}", key, LABEL_SUFFIX),
            serde_json::Value::from(item.label.clone()),
        );
        data.insert(
            format!("{}{}", key, UNIT_SUFFIX),
            serde_json::Value::from(item.unit.clone()),
        );
    }
    data
}

/// Inverse of [`flatten_line_items`]. Non-numeric base keys are dropped.
pub fn unflatten_line_items(data: &FinancialData) -> BTreeMap<String, LineItem> {
    let text = |key: String| {
        data.get(&key)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };

    data.iter()
        .filter(|(key, _)| !is_metadata_key(key))
        .filter_map(|(key, value)| {
            let value = value.as_f64()?;
            Some((
                key.clone(),
                LineItem {
                    value,
                    label: text(format!("{}{}", key, LABEL_SUFFIX)),
                    unit: text(format!("{}{}", key, UNIT_SUFFIX)),
                },
            ))
        })
        .collect()
}

fn serialize_line_items<S>(items: &BTreeMap<String, LineItem>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    flatten_line_items(items).serialize(serializer)
}

fn deserialize_line_items<'de, D>(deserializer: D) -> Result<BTreeMap<String, LineItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let data = FinancialData::deserialize(deserializer)?;
    Ok(unflatten_line_items(&data))
}

/// Normalized financial statement for one period and one statement type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialStatement {
    pub ticker_id: i64,
    pub cik: Option<String>,
    pub statement_type: StatementType,
    pub timeframe: Timeframe,
    pub fiscal_year: i32,
    pub fiscal_quarter: Option<u8>,
    pub period_start: Option<NaiveDate>,
    pub period_end: NaiveDate,
    pub filed_date: Option<NaiveDate>,
    pub source_filing_url: Option<String>,
    pub source_filing_type: Option<String>,
    /// Serialized under `data` in flattened form
    #[serde(
        rename = "data",
        serialize_with = "serialize_line_items",
        deserialize_with = "deserialize_line_items"
    )]
    pub line_items: BTreeMap<String, LineItem>,
}

impl FinancialStatement {
    /// Flattened view of the line items.
    pub fn data(&self) -> FinancialData {
        flatten_line_items(&self.line_items)
    }

    pub fn fiscal_period(&self) -> FiscalPeriod {
        FiscalPeriod {
            timeframe: self.timeframe,
            fiscal_year: self.fiscal_year,
            fiscal_quarter: self.fiscal_quarter,
        }
    }
}

/// Display-ready period with year-over-year changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialPeriod {
    pub fiscal_year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiscal_quarter: Option<u8>,
    pub period_end: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filed_date: Option<String>,
    pub data: FinancialData,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub yoy_change: BTreeMap<String, f64>,
}

/// Query for one page of provider financial statements
#[derive(Debug, Clone, Default)]
pub struct FinancialsRequestParams {
    pub ticker: String,
    pub timeframe: Option<Timeframe>,
    pub fiscal_year: Option<i32>,
    pub fiscal_quarter: Option<u8>,
    /// Defaults to 100 when unset
    pub limit: Option<u32>,
    /// Custom sort; when unset the request sorts by report date descending
    pub sort: Option<String>,
    /// Per-call deadline overriding the client default
    pub timeout: Option<Duration>,
}

impl FinancialsRequestParams {
    pub fn for_ticker(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            ..Default::default()
        }
    }

    pub fn with_timeframe(mut self, timeframe: Timeframe) -> Self {
        self.timeframe = Some(timeframe);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
