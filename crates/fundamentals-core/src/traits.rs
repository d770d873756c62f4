use async_trait::async_trait;
use crate::{FinancialsRequestParams, FundamentalsError, RawFinancialsPage};

/// Source of provider financial-statement pages
#[async_trait]
pub trait FinancialsFetcher: Send + Sync {
    async fn fetch_financials_page(
        &self,
        params: &FinancialsRequestParams,
    ) -> Result<RawFinancialsPage, FundamentalsError>;
}
