use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use credit_core::{
    CompanyFinancials, CreditError, FinancialDataProvider, FinancialStatement, LineItem,
    MarketSnapshot, MAX_REPORTING_PERIODS,
};
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

const BASE_URL: &str = "https://query2.finance.yahoo.com";
const TIMESERIES_PATH: &str = "/ws/fundamentals-timeseries/v1/finance/timeseries";
const CHART_PATH: &str = "/v8/finance/chart";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Years of annual filings requested; enough to cover four fiscal years.
const LOOKBACK_YEARS: i64 = 5;

/// Bounds on the spacing of consecutive annual filings, allowing for
/// fiscal year-end shifts.
const MIN_PERIOD_GAP_DAYS: i64 = 300;
const MAX_PERIOD_GAP_DAYS: i64 = 430;

/// Annual fundamentals series and the line item each one fills.
const ANNUAL_SERIES: [(&str, LineItem); 9] = [
    ("annualTotalAssets", LineItem::TotalAssets),
    ("annualWorkingCapital", LineItem::WorkingCapital),
    ("annualRetainedEarnings", LineItem::RetainedEarnings),
    ("annualTotalLiabilitiesNetMinorityInterest", LineItem::TotalLiabilities),
    ("annualCurrentLiabilities", LineItem::CurrentLiabilities),
    ("annualStockholdersEquity", LineItem::StockholdersEquity),
    ("annualEBIT", LineItem::Ebit),
    ("annualTotalRevenue", LineItem::TotalRevenue),
    ("annualOrdinarySharesNumber", LineItem::SharesOutstanding),
];

#[derive(Clone)]
pub struct YahooFinanceClient {
    client: Client,
    base_url: String,
}

impl YahooFinanceClient {
    /// `timeout` bounds every request made by this client.
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get_json(
        &self,
        ticker: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Value, CreditError> {
        tracing::debug!("GET {} for {}", url, ticker);

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| CreditError::data_retrieval(ticker, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CreditError::data_retrieval(
                ticker,
                format!(
                    "HTTP {}: {}",
                    status,
                    response.text().await.unwrap_or_default()
                ),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| CreditError::data_retrieval(ticker, e.to_string()))
    }

    /// Get annual balance-sheet and income-statement series
    pub async fn get_annual_fundamentals(
        &self,
        ticker: &str,
    ) -> Result<AnnualFundamentals, CreditError> {
        let url = format!("{}{}/{}", self.base_url, TIMESERIES_PATH, ticker);
        let now = Utc::now();
        let start = now - ChronoDuration::days(365 * LOOKBACK_YEARS);
        let types = ANNUAL_SERIES
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(",");

        let json = self
            .get_json(
                ticker,
                &url,
                &[
                    ("symbol", ticker.to_string()),
                    ("type", types),
                    ("period1", start.timestamp().to_string()),
                    ("period2", now.timestamp().to_string()),
                ],
            )
            .await?;

        AnnualFundamentals::parse(ticker, &json)
    }

    /// Get the latest traded price
    pub async fn get_current_price(&self, ticker: &str) -> Result<f64, CreditError> {
        let url = format!("{}{}/{}", self.base_url, CHART_PATH, ticker);

        let json = self
            .get_json(
                ticker,
                &url,
                &[("range", "1d".to_string()), ("interval", "1d".to_string())],
            )
            .await?;

        parse_chart_price(ticker, &json)
    }
}

#[async_trait]
impl FinancialDataProvider for YahooFinanceClient {
    async fn fetch_financials(&self, ticker: &str) -> Result<CompanyFinancials, CreditError> {
        let (fundamentals, price) = tokio::join!(
            self.get_annual_fundamentals(ticker),
            self.get_current_price(ticker),
        );

        fundamentals?.into_company_financials(ticker, price?)
    }
}

/// Reported annual observations per line item, newest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnualFundamentals {
    series: HashMap<LineItem, Vec<(NaiveDate, f64)>>,
}

impl AnnualFundamentals {
    pub fn parse(ticker: &str, json: &Value) -> Result<Self, CreditError> {
        let timeseries = json
            .get("timeseries")
            .ok_or_else(|| CreditError::data_retrieval(ticker, "malformed fundamentals response"))?;

        if let Some(error) = timeseries.get("error").filter(|e| !e.is_null()) {
            return Err(CreditError::data_retrieval(ticker, describe_error(error)));
        }

        let results = timeseries
            .get("result")
            .and_then(|v| v.as_array())
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut series = HashMap::new();
        for result in results {
            let Some(type_name) = result
                .get("meta")
                .and_then(|m| m.get("type"))
                .and_then(|t| t.as_array())
                .and_then(|t| t.first())
                .and_then(|t| t.as_str())
            else {
                continue;
            };
            let Some((_, item)) = ANNUAL_SERIES.iter().find(|(name, _)| *name == type_name) else {
                continue;
            };

            let mut observations: Vec<(NaiveDate, f64)> = result
                .get(type_name)
                .and_then(|v| v.as_array())
                .map(|entries| entries.iter().filter_map(parse_observation).collect())
                .unwrap_or_default();
            if observations.is_empty() {
                continue;
            }

            observations.sort_by(|a, b| b.0.cmp(&a.0));
            observations.dedup_by_key(|(date, _)| *date);
            series.insert(*item, observations);
        }

        if series.is_empty() {
            return Err(CreditError::data_retrieval(ticker, "no fundamentals data available"));
        }

        tracing::debug!("Parsed {} fundamentals series for {}", series.len(), ticker);
        Ok(Self { series })
    }

    /// Fiscal year end of the most recent total assets figure.
    pub fn latest_period(&self) -> Option<NaiveDate> {
        self.observations(LineItem::TotalAssets).first().map(|(date, _)| *date)
    }

    pub fn value_at(&self, item: LineItem, period: NaiveDate) -> Option<f64> {
        self.observations(item)
            .iter()
            .find(|(date, _)| *date == period)
            .map(|(_, value)| *value)
    }

    /// Total assets for the latest run of consecutive fiscal years, newest
    /// first, capped at four periods. A missing year ends the run.
    pub fn asset_history(&self) -> Vec<f64> {
        let observations = self.observations(LineItem::TotalAssets);
        let mut history = Vec::with_capacity(MAX_REPORTING_PERIODS);
        let mut previous: Option<NaiveDate> = None;

        for (date, value) in observations.iter().take(MAX_REPORTING_PERIODS) {
            if let Some(newer) = previous {
                let gap = (newer - *date).num_days();
                if !(MIN_PERIOD_GAP_DAYS..=MAX_PERIOD_GAP_DAYS).contains(&gap) {
                    break;
                }
            }
            history.push(*value);
            previous = Some(*date);
        }
        history
    }

    fn observations(&self, item: LineItem) -> &[(NaiveDate, f64)] {
        self.series.get(&item).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every line item must be reported for the same fiscal year as total assets.
    pub fn into_company_financials(
        self,
        ticker: &str,
        price: f64,
    ) -> Result<CompanyFinancials, CreditError> {
        let period = self.latest_period().ok_or_else(|| {
            CreditError::data_retrieval(
                ticker,
                format!("required line item '{}' is missing", LineItem::TotalAssets),
            )
        })?;
        let require = |item: LineItem| {
            self.value_at(item, period).ok_or_else(|| {
                CreditError::data_retrieval(
                    ticker,
                    format!(
                        "required line item '{}' is missing for fiscal year ending {}",
                        item, period
                    ),
                )
            })
        };

        let statement = FinancialStatement {
            total_assets: require(LineItem::TotalAssets)?,
            working_capital: require(LineItem::WorkingCapital)?,
            retained_earnings: require(LineItem::RetainedEarnings)?,
            total_liabilities: require(LineItem::TotalLiabilities)?,
            current_liabilities: require(LineItem::CurrentLiabilities)?,
            stockholders_equity: require(LineItem::StockholdersEquity)?,
            ebit: require(LineItem::Ebit)?,
            total_revenue: require(LineItem::TotalRevenue)?,
            total_assets_history: self.asset_history(),
        };
        let market = MarketSnapshot {
            price,
            shares_outstanding: require(LineItem::SharesOutstanding)?,
        };

        Ok(CompanyFinancials { statement, market })
    }
}

fn parse_observation(entry: &Value) -> Option<(NaiveDate, f64)> {
    let date = entry.get("asOfDate")?.as_str()?;
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let value = entry.get("reportedValue")?.get("raw")?.as_f64()?;
    Some((date, value))
}

fn describe_error(error: &Value) -> String {
    error
        .get("description")
        .and_then(|d| d.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string())
}

/// Extract the current price from a chart response.
///
/// Prefers `regularMarketPrice`, falling back to the last non-null close.
pub fn parse_chart_price(ticker: &str, json: &Value) -> Result<f64, CreditError> {
    let chart = json
        .get("chart")
        .ok_or_else(|| CreditError::data_retrieval(ticker, "malformed chart response"))?;

    if let Some(error) = chart.get("error").filter(|e| !e.is_null()) {
        return Err(CreditError::data_retrieval(ticker, describe_error(error)));
    }

    let result = chart
        .get("result")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| CreditError::data_retrieval(ticker, "no chart data found"))?;

    let market_price = result
        .get("meta")
        .and_then(|m| m.get("regularMarketPrice"))
        .and_then(|p| p.as_f64());

    let last_close = || {
        result
            .get("indicators")
            .and_then(|i| i.get("quote"))
            .and_then(|q| q.as_array())
            .and_then(|q| q.first())
            .and_then(|q| q.get("close"))
            .and_then(|c| c.as_array())
            .and_then(|closes| closes.iter().rev().find_map(|c| c.as_f64()))
    };

    market_price
        .or_else(last_close)
        .ok_or_else(|| CreditError::data_retrieval(ticker, "current price not found"))
}
