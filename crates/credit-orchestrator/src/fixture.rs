//! Offline data provider backed by in-memory company data.
//!
//! The JSON form is an object keyed by ticker:
//!
//! ```json
//! { "AAA": { "statement": { "total_assets": 1000.0, ... }, "market": { "price": 10.0, "shares_outstanding": 50.0 } } }
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use credit_core::{CompanyFinancials, CreditError, FinancialDataProvider};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct FixtureProvider {
    companies: HashMap<String, CompanyFinancials>,
}

impl FixtureProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_company(mut self, ticker: &str, data: CompanyFinancials) -> Self {
        self.companies.insert(ticker.trim().to_uppercase(), data);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: HashMap<String, CompanyFinancials> =
            serde_json::from_str(json).context("Invalid fixture JSON")?;

        Ok(raw
            .into_iter()
            .fold(Self::new(), |provider, (ticker, data)| {
                provider.with_company(&ticker, data)
            }))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixtures from {}", path.display()))?;
        Self::from_json_str(&contents)
    }

    pub fn len(&self) -> usize {
        self.companies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }
}

#[async_trait]
impl FinancialDataProvider for FixtureProvider {
    async fn fetch_financials(&self, ticker: &str) -> Result<CompanyFinancials, CreditError> {
        self.companies
            .get(&ticker.to_uppercase())
            .cloned()
            .ok_or_else(|| CreditError::data_retrieval(ticker, "no data available"))
    }
}
