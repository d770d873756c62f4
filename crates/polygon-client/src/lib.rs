use async_trait::async_trait;
use fundamentals_core::{FinancialsFetcher, FinancialsRequestParams, FundamentalsError, RawFinancialsPage};
use reqwest::{header::RETRY_AFTER, Client, StatusCode, Url};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub const DEFAULT_BASE_URL: &str = "https://api.polygon.io";
const FINANCIALS_PATH: &str = "/vX/reference/financials";
const DEFAULT_LIMIT: u32 = 100;
const DEFAULT_SORT: &str = "period_of_report_date";

/// Client settings. `from_env` reads them from `POLYGON_*` variables.
#[derive(Debug, Clone)]
pub struct PolygonConfig {
    pub api_key: String,
    pub base_url: String,
    pub rate_limit: usize,
    pub rate_window: Duration,
    pub timeout: Duration,
}

impl PolygonConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            // Free tier allows 5 requests per minute on the financials endpoint
            rate_limit: 5,
            rate_window: Duration::from_secs(60),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_env() -> Result<Self, FundamentalsError> {
        let api_key = std::env::var("POLYGON_API_KEY")
            .map_err(|_| FundamentalsError::Config("POLYGON_API_KEY is not set".to_string()))?;

        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("POLYGON_BASE_URL") {
            config.base_url = base_url;
        }
        config.rate_limit = env_parse("POLYGON_FINANCIALS_RATE_LIMIT").unwrap_or(config.rate_limit);
        if let Some(secs) = env_parse("POLYGON_FINANCIALS_RATE_WINDOW_SECS") {
            config.rate_window = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parse("POLYGON_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), FundamentalsError> {
        if self.api_key.trim().is_empty() {
            return Err(FundamentalsError::Config("Polygon API key is empty".to_string()));
        }
        if self.rate_limit == 0 {
            return Err(FundamentalsError::Config("rate limit must be at least 1 request".to_string()));
        }
        if self.rate_window.is_zero() {
            return Err(FundamentalsError::Config("rate window must be non-zero".to_string()));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[derive(Debug)]
struct Window {
    started: Instant,
    count: usize,
}

/// Fixed-window rate limiter: at most `max_requests` per `window`.
/// The window restarts once `window` has elapsed since it opened.
#[derive(Clone)]
pub struct RateLimiter {
    state: Arc<Mutex<Window>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(Window {
                started: Instant::now(),
                count: 0,
            })),
            max_requests,
            window,
        }
    }

    /// Take a slot in the current window or fail with `RateLimited`.
    /// Check and increment happen under one lock.
    pub async fn try_acquire(&self) -> Result<(), FundamentalsError> {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        if now.saturating_duration_since(state.started) >= self.window {
            state.started = now;
            state.count = 0;
        }

        if state.count < self.max_requests {
            state.count += 1;
            return Ok(());
        }

        let elapsed = now.saturating_duration_since(state.started);
        Err(FundamentalsError::RateLimited {
            retry_after: self.window.saturating_sub(elapsed),
        })
    }

    /// Wait until a slot opens, then take it.
    pub async fn acquire(&self) {
        loop {
            match self.try_acquire().await {
                Ok(()) => return,
                Err(e) => {
                    let wait = e.retry_after().unwrap_or(self.window);
                    tracing::debug!("Rate limiter: waiting {:.1}s for a financials slot", wait.as_secs_f64());
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Slots left in the current window.
    pub async fn remaining(&self) -> usize {
        let state = self.state.lock().await;
        if Instant::now().saturating_duration_since(state.started) >= self.window {
            self.max_requests
        } else {
            self.max_requests.saturating_sub(state.count)
        }
    }
}

/// Build the statements URL for one page.
pub fn build_financials_url(
    base_url: &str,
    api_key: &str,
    params: &FinancialsRequestParams,
) -> Result<Url, FundamentalsError> {
    let endpoint = format!("{}{}", base_url.trim_end_matches('/'), FINANCIALS_PATH);
    let mut url = Url::parse(&endpoint)
        .map_err(|e| FundamentalsError::Config(format!("invalid base URL {}: {}", base_url, e)))?;

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("apiKey", api_key);

        if !params.ticker.is_empty() {
            query.append_pair("ticker", &params.ticker.to_uppercase());
        }
        if let Some(timeframe) = params.timeframe {
            query.append_pair("timeframe", timeframe.as_str());
        }
        if let Some(year) = params.fiscal_year {
            query.append_pair("fiscal_year", &year.to_string());
        }
        if let Some(quarter) = params.fiscal_quarter {
            query.append_pair("fiscal_period", &format!("Q{}", quarter));
        }

        let limit = params.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIMIT);
        query.append_pair("limit", &limit.to_string());

        match params.sort.as_deref().filter(|s| !s.is_empty()) {
            Some(sort) => {
                query.append_pair("sort", sort);
            }
            None => {
                query.append_pair("sort", DEFAULT_SORT);
                query.append_pair("order", "desc");
            }
        }
    }

    Ok(url)
}

/// Rate-gated client for the financial statements endpoint.
#[derive(Clone)]
pub struct PolygonFinancialsClient {
    config: PolygonConfig,
    client: Client,
    rate_limiter: RateLimiter,
}

impl PolygonFinancialsClient {
    pub fn new(config: PolygonConfig) -> Result<Self, FundamentalsError> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FundamentalsError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            rate_limiter: RateLimiter::new(config.rate_limit, config.rate_window),
            config,
            client,
        })
    }

    pub fn from_env() -> Result<Self, FundamentalsError> {
        Self::new(PolygonConfig::from_env()?)
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    pub fn financials_url(&self, params: &FinancialsRequestParams) -> Result<Url, FundamentalsError> {
        build_financials_url(&self.config.base_url, &self.config.api_key, params)
    }

    /// Fetch one page. Fails with `RateLimited` when the window is used up.
    pub async fn fetch_financials_page(
        &self,
        params: &FinancialsRequestParams,
    ) -> Result<RawFinancialsPage, FundamentalsError> {
        self.gate().await?;
        let url = self.financials_url(params)?;
        self.get_page(url, params.timeout).await
    }

    /// Fetch every page, following `next_url`. Each page takes a slot.
    /// Only the first page can fail with `RateLimited`; follow-up pages wait
    /// for the next window so pages already fetched are kept.
    pub async fn fetch_all_financials(
        &self,
        params: &FinancialsRequestParams,
    ) -> Result<RawFinancialsPage, FundamentalsError> {
        let mut page = self.fetch_financials_page(params).await?;
        let mut pages = 1;

        while let Some(next_url) = page.next_url.take().filter(|u| !u.is_empty()) {
            self.rate_limiter.acquire().await;

            let mut url = Url::parse(&next_url)
                .map_err(|e| FundamentalsError::Api(format!("invalid next_url: {}", e)))?;
            url.query_pairs_mut().append_pair("apiKey", &self.config.api_key);

            let next = self.get_page(url, params.timeout).await?;
            page.results.extend(next.results);
            page.next_url = next.next_url;
            pages += 1;
        }

        page.count = page.results.len() as u32;
        tracing::info!(
            "Fetched {} financial records for {} across {} page(s)",
            page.results.len(),
            params.ticker,
            pages
        );
        Ok(page)
    }

    async fn gate(&self) -> Result<(), FundamentalsError> {
        self.rate_limiter.try_acquire().await.map_err(|e| {
            tracing::warn!("Financials rate limit reached: {}", e);
            e
        })
    }

    async fn get_page(
        &self,
        url: Url,
        timeout: Option<Duration>,
    ) -> Result<RawFinancialsPage, FundamentalsError> {
        let timeout = timeout.unwrap_or(self.config.timeout);
        tracing::debug!("Fetching financials from: {}", self.redact(url.as_str()));

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FundamentalsError::Timeout(timeout)
                } else {
                    FundamentalsError::Api(self.redact(&e.to_string()))
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(self.config.rate_window);
            tracing::warn!("Polygon 429 rate limited, retry after {}s", retry_after.as_secs());
            return Err(FundamentalsError::RateLimited { retry_after });
        }

        if !status.is_success() {
            return Err(FundamentalsError::Api(format!(
                "HTTP {}: {}",
                status,
                response.text().await.unwrap_or_default()
            )));
        }

        response.json::<RawFinancialsPage>().await.map_err(|e| {
            if e.is_timeout() {
                FundamentalsError::Timeout(timeout)
            } else {
                FundamentalsError::Api(self.redact(&e.to_string()))
            }
        })
    }

    fn redact(&self, text: &str) -> String {
        redact_key(text, &self.config.api_key)
    }
}

fn redact_key(text: &str, api_key: &str) -> String {
    if api_key.is_empty() {
        text.to_string()
    } else {
        text.replace(api_key, "***")
    }
}

#[async_trait]
impl FinancialsFetcher for PolygonFinancialsClient {
    async fn fetch_financials_page(
        &self,
        params: &FinancialsRequestParams,
    ) -> Result<RawFinancialsPage, FundamentalsError> {
        PolygonFinancialsClient::fetch_financials_page(self, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundamentals_core::Timeframe;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio_test::{assert_err, assert_ok};

    fn query(url: &Url) -> HashMap<String, String> {
        url.query_pairs().into_owned().collect()
    }

    struct StubResponse {
        status: u16,
        headers: Vec<(&'static str, String)>,
        body: String,
        delay: Duration,
    }

    impl StubResponse {
        fn new(status: u16, body: impl Into<String>) -> Self {
            Self {
                status,
                headers: Vec::new(),
                body: body.into(),
                delay: Duration::ZERO,
            }
        }

        fn with_header(mut self, name: &'static str, value: &str) -> Self {
            self.headers.push((name, value.to_string()));
            self
        }

        fn delayed(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    /// Minimal HTTP/1.1 server on a local port. The handler gets the request
    /// target and the server's base URL. Returns the base URL and every
    /// request target seen so far.
    async fn stub_server<H>(handler: H) -> (String, Arc<StdMutex<Vec<String>>>)
    where
        H: Fn(&str, &str) -> StubResponse + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let handler = Arc::new(handler);

        let (server_base, server_seen) = (base.clone(), seen.clone());
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let (handler, base, seen) = (handler.clone(), server_base.clone(), server_seen.clone());
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&chunk[..n]),
                        }
                    }

                    let target = String::from_utf8_lossy(&request)
                        .split_whitespace()
                        .nth(1)
                        .unwrap_or_default()
                        .to_string();
                    seen.lock().unwrap().push(target.clone());

                    let response = handler.as_ref()(&target, &base);
                    tokio::time::sleep(response.delay).await;

                    let mut head = format!(
                        "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
                        response.status,
                        response.body.len()
                    );
                    for (name, value) in &response.headers {
                        head.push_str(&format!("{}: {}\r\n", name, value));
                    }
                    head.push_str("\r\n");

                    let _ = socket.write_all(head.as_bytes()).await;
                    let _ = socket.write_all(response.body.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        (base, seen)
    }

    fn stub_client(base: &str, rate_limit: usize, rate_window: Duration) -> PolygonFinancialsClient {
        let mut config = PolygonConfig::new("test-key");
        config.base_url = base.to_string();
        config.rate_limit = rate_limit;
        config.rate_window = rate_window;
        config.timeout = Duration::from_secs(5);
        PolygonFinancialsClient::new(config).unwrap()
    }

    fn page_body(end_date: &str, next_url: Option<String>) -> String {
        serde_json::json!({
            "status": "OK",
            "results": [{ "fiscal_year": "2024", "fiscal_period": "Q1", "end_date": end_date }],
            "next_url": next_url,
        })
        .to_string()
    }

    /// Three chained pages: the first request, then cursors p2 and p3.
    fn chained_pages(target: &str, base: &str) -> StubResponse {
        let next = |cursor: &str| Some(format!("{}/vX/reference/financials?cursor={}", base, cursor));
        if target.contains("cursor=p2") {
            StubResponse::new(200, page_body("2023-12-30", next("p3")))
        } else if target.contains("cursor=p3") {
            StubResponse::new(200, page_body("2023-09-30", None))
        } else {
            StubResponse::new(200, page_body("2024-03-30", next("p2")))
        }
    }

    #[test]
    fn test_url_defaults() {
        let params = FinancialsRequestParams::for_ticker("aapl");
        let url = build_financials_url(DEFAULT_BASE_URL, "secret", &params).unwrap();
        let q = query(&url);

        assert_eq!(url.path(), "/vX/reference/financials");
        assert_eq!(q["ticker"], "AAPL");
        assert_eq!(q["limit"], "100");
        assert_eq!(q["sort"], "period_of_report_date");
        assert_eq!(q["order"], "desc");
        assert_eq!(q["apiKey"], "secret");
        assert!(!q.contains_key("timeframe"));
        assert!(!q.contains_key("fiscal_period"));
    }

    #[test]
    fn test_custom_sort_has_no_default_order() {
        let params = FinancialsRequestParams::for_ticker("msft").with_sort("filing_date");
        let url = build_financials_url(DEFAULT_BASE_URL, "k", &params).unwrap();
        let q = query(&url);

        assert_eq!(q["sort"], "filing_date");
        assert!(!q.contains_key("order"));
    }

    #[test]
    fn test_empty_ticker_omitted() {
        let params = FinancialsRequestParams::default().with_limit(10);
        let url = build_financials_url(DEFAULT_BASE_URL, "k", &params).unwrap();
        let q = query(&url);

        assert!(!q.contains_key("ticker"));
        assert_eq!(q["limit"], "10");
    }

    #[test]
    fn test_optional_period_filters() {
        let mut params = FinancialsRequestParams::for_ticker("nvda").with_timeframe(Timeframe::Quarterly);
        params.fiscal_year = Some(2024);
        params.fiscal_quarter = Some(3);
        let url = build_financials_url("https://example.test/", "k", &params).unwrap();
        let q = query(&url);

        assert_eq!(url.host_str(), Some("example.test"));
        assert_eq!(q["timeframe"], "quarterly");
        assert_eq!(q["fiscal_year"], "2024");
        assert_eq!(q["fiscal_period"], "Q3");
    }

    #[test]
    fn test_zero_limit_and_empty_sort_use_defaults() {
        let mut params = FinancialsRequestParams::for_ticker("aapl").with_limit(0);
        params.sort = Some(String::new());
        let url = build_financials_url(DEFAULT_BASE_URL, "k", &params).unwrap();
        let q = query(&url);

        assert_eq!(q["limit"], "100");
        assert_eq!(q["sort"], "period_of_report_date");
        assert_eq!(q["order"], "desc");
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let params = FinancialsRequestParams::for_ticker("aapl");
        let err = build_financials_url("not a url", "k", &params).unwrap_err();
        assert!(matches!(err, FundamentalsError::Config(_)));
    }

    #[test]
    fn test_redact_key() {
        let url = "https://api.polygon.io/vX/reference/financials?apiKey=abc123&ticker=AAPL";
        let redacted = redact_key(url, "abc123");
        assert!(!redacted.contains("abc123"));
        assert!(redacted.contains("apiKey=***"));
        assert_eq!(redact_key("plain", ""), "plain");
    }

    #[test]
    fn test_config_validation() {
        assert!(PolygonConfig::new("key").validate().is_ok());

        let err = PolygonConfig::new("  ").validate().unwrap_err();
        assert!(matches!(err, FundamentalsError::Config(_)));

        let mut config = PolygonConfig::new("key");
        config.rate_limit = 0;
        assert!(matches!(config.validate(), Err(FundamentalsError::Config(_))));

        let mut config = PolygonConfig::new("key");
        config.rate_window = Duration::ZERO;
        assert!(matches!(config.validate(), Err(FundamentalsError::Config(_))));
    }

    #[test]
    fn test_client_rejects_missing_key() {
        let result = PolygonFinancialsClient::new(PolygonConfig::new(""));
        assert!(matches!(result, Err(FundamentalsError::Config(_))));
    }

    #[test]
    fn test_page_decodes_without_optional_fields() {
        let page: RawFinancialsPage =
            serde_json::from_str(r#"{"status":"OK","results":[],"next_url":"https://api.polygon.io/vX/reference/financials?cursor=abc"}"#)
                .unwrap();
        assert!(page.results.is_empty());
        assert!(page.next_url.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_limiter_rejects_over_limit() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        assert_ok!(limiter.try_acquire().await);
        assert_ok!(limiter.try_acquire().await);

        let err = assert_err!(limiter.try_acquire().await);
        assert!(err.is_rate_limited());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(60)));
        assert_eq!(limiter.remaining().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_limiter_window_resets_with_time() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert_ok!(limiter.try_acquire().await);

        tokio::time::advance(Duration::from_secs(20)).await;
        let err = assert_err!(limiter.try_acquire().await);
        assert_eq!(err.retry_after(), Some(Duration::from_secs(40)));

        tokio::time::advance(Duration::from_secs(40)).await;
        assert_eq!(limiter.remaining().await, 1);
        assert_ok!(limiter.try_acquire().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_waits_for_next_window() {
        let limiter = RateLimiter::new(1, Duration::from_secs(10));
        let start = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;

        assert!(Instant::now().duration_since(start) >= Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_concurrent_callers_never_exceed_limit() {
        let limiter = RateLimiter::new(3, Duration::from_secs(3600));
        let handles: Vec<_> = (0..10)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.try_acquire().await.is_ok() })
            })
            .collect();

        let mut granted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                granted += 1;
            }
        }
        assert_eq!(granted, 3);
    }

    #[tokio::test]
    async fn test_fetch_all_follows_next_url_and_reappends_key() {
        let (base, seen) = stub_server(chained_pages).await;
        let client = stub_client(&base, 10, Duration::from_secs(60));

        let page = assert_ok!(client.fetch_all_financials(&FinancialsRequestParams::for_ticker("aapl")).await);

        let ends: Vec<_> = page.results.iter().map(|r| r.end_date.as_str()).collect();
        assert_eq!(ends, vec!["2024-03-30", "2023-12-30", "2023-09-30"]);
        assert_eq!(page.count, 3);
        assert!(page.next_url.is_none());

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 3);
        assert!(seen[0].contains("ticker=AAPL"));
        assert!(seen[1].contains("cursor=p2") && seen[1].contains("apiKey=test-key"));
        assert!(seen[2].contains("cursor=p3") && seen[2].contains("apiKey=test-key"));
    }

    #[tokio::test]
    async fn test_fetch_all_with_more_pages_than_limit_waits_for_window() {
        let (base, seen) = stub_server(chained_pages).await;
        let client = stub_client(&base, 2, Duration::from_millis(300));
        let start = Instant::now();

        let page = assert_ok!(client.fetch_all_financials(&FinancialsRequestParams::for_ticker("aapl")).await);

        assert_eq!(page.results.len(), 3);
        assert_eq!(seen.lock().unwrap().len(), 3);
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_first_page_over_limit_is_rate_limited() {
        let (base, seen) = stub_server(chained_pages).await;
        let client = stub_client(&base, 1, Duration::from_secs(60));
        let params = FinancialsRequestParams::for_ticker("aapl");

        assert_ok!(client.fetch_financials_page(&params).await);
        let err = assert_err!(client.fetch_all_financials(&params).await);
        assert!(err.is_rate_limited());
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_http_429_uses_retry_after_header() {
        let (base, _) = stub_server(|_: &str, _: &str| {
            StubResponse::new(429, r#"{"status":"ERROR"}"#).with_header("Retry-After", "7")
        })
        .await;
        let client = stub_client(&base, 10, Duration::from_secs(60));

        let err = assert_err!(client.fetch_financials_page(&FinancialsRequestParams::for_ticker("aapl")).await);
        assert!(err.is_rate_limited());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
    }

    #[tokio::test]
    async fn test_http_429_without_header_falls_back_to_window() {
        let (base, _) = stub_server(|_: &str, _: &str| StubResponse::new(429, "")).await;
        let client = stub_client(&base, 10, Duration::from_secs(45));

        let err = assert_err!(client.fetch_financials_page(&FinancialsRequestParams::for_ticker("aapl")).await);
        assert_eq!(err.retry_after(), Some(Duration::from_secs(45)));
    }

    #[tokio::test]
    async fn test_server_error_maps_to_api_error() {
        let (base, _) = stub_server(|_: &str, _: &str| StubResponse::new(500, "upstream exploded")).await;
        let client = stub_client(&base, 10, Duration::from_secs(60));

        let err = assert_err!(client.fetch_financials_page(&FinancialsRequestParams::for_ticker("aapl")).await);
        match err {
            FundamentalsError::Api(message) => {
                assert!(message.contains("500"));
                assert!(message.contains("upstream exploded"));
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_undecodable_body_maps_to_api_error() {
        let (base, _) = stub_server(|_: &str, _: &str| StubResponse::new(200, "not json")).await;
        let client = stub_client(&base, 10, Duration::from_secs(60));

        let err = assert_err!(client.fetch_financials_page(&FinancialsRequestParams::for_ticker("aapl")).await);
        assert!(matches!(err, FundamentalsError::Api(_)));
    }

    #[tokio::test]
    async fn test_per_call_timeout_maps_to_timeout() {
        let (base, _) = stub_server(|_: &str, _: &str| {
            StubResponse::new(200, page_body("2024-03-30", None)).delayed(Duration::from_secs(2))
        })
        .await;
        let client = stub_client(&base, 10, Duration::from_secs(60));
        let params = FinancialsRequestParams::for_ticker("aapl").with_timeout(Duration::from_millis(100));

        let err = assert_err!(client.fetch_financials_page(&params).await);
        assert!(matches!(err, FundamentalsError::Timeout(t) if t == Duration::from_millis(100)));
    }
}
