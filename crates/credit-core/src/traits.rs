use async_trait::async_trait;
use crate::{CompanyFinancials, CreditError};

/// Source of statement line items and market data for a ticker
#[async_trait]
pub trait FinancialDataProvider: Send + Sync {
    /// Fetch the most recent reporting periods and the current quote.
    ///
    /// Unknown tickers and unreachable upstreams are reported as
    /// `CreditError::DataRetrieval`.
    async fn fetch_financials(&self, ticker: &str) -> Result<CompanyFinancials, CreditError>;
}
