use serde::{Deserialize, Serialize};
use std::fmt;

use crate::CreditError;

/// Maximum number of reporting periods the models look at.
pub const MAX_REPORTING_PERIODS: usize = 4;

/// Statement and market line items read by the models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineItem {
    TotalAssets,
    WorkingCapital,
    RetainedEarnings,
    TotalLiabilities,
    CurrentLiabilities,
    StockholdersEquity,
    Ebit,
    TotalRevenue,
    SharePrice,
    SharesOutstanding,
}

impl LineItem {
    pub fn to_label(&self) -> &'static str {
        match self {
            LineItem::TotalAssets => "Total Assets",
            LineItem::WorkingCapital => "Working Capital",
            LineItem::RetainedEarnings => "Retained Earnings",
            LineItem::TotalLiabilities => "Total Liabilities",
            LineItem::CurrentLiabilities => "Current Liabilities",
            LineItem::StockholdersEquity => "Stockholders Equity",
            LineItem::Ebit => "EBIT",
            LineItem::TotalRevenue => "Total Revenue",
            LineItem::SharePrice => "Share Price",
            LineItem::SharesOutstanding => "Shares Outstanding",
        }
    }
}

impl fmt::Display for LineItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_label())
    }
}

/// Latest annual statement figures for one company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialStatement {
    pub total_assets: f64,
    pub working_capital: f64,
    pub retained_earnings: f64,
    pub total_liabilities: f64,
    pub current_liabilities: f64,
    pub stockholders_equity: f64,
    pub ebit: f64,
    pub total_revenue: f64,
    /// Total assets for up to four reporting periods, newest first.
    #[serde(default)]
    pub total_assets_history: Vec<f64>,
}

impl FinancialStatement {
    /// Asset history as reported (newest first), capped to the most recent periods.
    pub fn recent_assets(&self) -> &[f64] {
        let len = self.total_assets_history.len().min(MAX_REPORTING_PERIODS);
        &self.total_assets_history[..len]
    }
}

/// Current quote used to derive market equity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub price: f64,
    pub shares_outstanding: f64,
}

impl MarketSnapshot {
    pub fn market_equity(&self) -> f64 {
        self.price * self.shares_outstanding
    }
}

/// Everything a provider returns for one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyFinancials {
    pub statement: FinancialStatement,
    pub market: MarketSnapshot,
}

/// Risk tier shared by both models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    #[serde(rename = "Safe Zone")]
    Safe,
    #[serde(rename = "Grey Zone")]
    Grey,
    #[serde(rename = "Distress Zone")]
    Distress,
}

impl Zone {
    pub fn to_label(&self) -> &'static str {
        match self {
            Zone::Safe => "Safe Zone",
            Zone::Grey => "Grey Zone",
            Zone::Distress => "Distress Zone",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_label())
    }
}

/// Advisory credit decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    Approved,
    #[serde(rename = "Approved with Caution")]
    ApprovedWithCaution,
    #[serde(rename = "Analysis Required")]
    AnalysisRequired,
    Dismissed,
}

impl Decision {
    pub fn to_label(&self) -> &'static str {
        match self {
            Decision::Approved => "Approved",
            Decision::ApprovedWithCaution => "Approved with Caution",
            Decision::AnalysisRequired => "Analysis Required",
            Decision::Dismissed => "Dismissed",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_label())
    }
}

/// Altman Z-Score family member, selected by industry code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AltmanVariant {
    /// Public manufacturing firms (code 1)
    Classic,
    /// Private or non-manufacturing firms, Z' (code 2)
    Prime,
    /// Emerging market firms, Z'' (code 3)
    EmergingMarkets,
}

impl AltmanVariant {
    pub const ALL: [AltmanVariant; 3] = [
        AltmanVariant::Classic,
        AltmanVariant::Prime,
        AltmanVariant::EmergingMarkets,
    ];

    pub fn from_industry_code(code: i64) -> Result<Self, CreditError> {
        match code {
            1 => Ok(AltmanVariant::Classic),
            2 => Ok(AltmanVariant::Prime),
            3 => Ok(AltmanVariant::EmergingMarkets),
            other => Err(CreditError::validation(format!(
                "Invalid industry type: {}. Must be 1, 2, or 3.",
                other
            ))),
        }
    }

    pub fn industry_code(&self) -> i64 {
        match self {
            AltmanVariant::Classic => 1,
            AltmanVariant::Prime => 2,
            AltmanVariant::EmergingMarkets => 3,
        }
    }

    pub fn model_name(&self) -> &'static str {
        match self {
            AltmanVariant::Classic => "AltmanClassic",
            AltmanVariant::Prime => "AltmanPrime",
            AltmanVariant::EmergingMarkets => "AltmanEmergingMarkets",
        }
    }
}

/// Evaluation request as received from callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub ticker: String,
    pub industry_type: i64,
}

/// Request after normalization; the ticker is trimmed and uppercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub ticker: String,
    pub variant: AltmanVariant,
}

impl EvaluationRequest {
    pub fn new(ticker: impl Into<String>, industry_type: i64) -> Self {
        Self {
            ticker: ticker.into(),
            industry_type,
        }
    }

    /// Ticker as it will be reported back, valid or not.
    pub fn normalized_ticker(&self) -> String {
        self.ticker.trim().to_uppercase()
    }

    pub fn validate(&self) -> Result<ValidatedRequest, CreditError> {
        let ticker = self.normalized_ticker();
        if ticker.is_empty() {
            return Err(CreditError::validation("ticker must not be empty."));
        }
        let variant = AltmanVariant::from_industry_code(self.industry_type)?;
        Ok(ValidatedRequest { ticker, variant })
    }
}

/// Ratios as reported, rounded to six decimals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportedRatios {
    pub x1: f64,
    pub x2: f64,
    pub x3: f64,
    pub x4: f64,
    pub x5: f64,
}

/// Merton section of an evaluation response.
///
/// The numeric fields are `None` when the model fell back to its degenerate
/// result; they serialize as JSON `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MertonDetail {
    pub distance_to_default: Option<f64>,
    pub default_probability: Option<f64>,
    pub asset_volatility: Option<f64>,
    pub classification: Zone,
}

/// Full result of evaluating one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResponse {
    pub ticker: String,
    pub model_name: String,
    pub z_score: f64,
    pub classification: Zone,
    pub ratios: ReportedRatios,
    pub merton: MertonDetail,
    pub combined_decision: Decision,
}

/// Per-ticker failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationFailure {
    pub ticker: String,
    pub error: String,
}

/// Outcome of evaluating several tickers; both lists keep request order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchEvaluation {
    pub results: Vec<EvaluationResponse>,
    pub errors: Vec<EvaluationFailure>,
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_industry_code_selects_exactly_one_variant() {
        for variant in AltmanVariant::ALL {
            let code = variant.industry_code();
            assert_eq!(AltmanVariant::from_industry_code(code).unwrap(), variant);
        }
    }

    #[test]
    fn test_invalid_industry_codes_rejected() {
        for code in [0, 4, -1, 99] {
            let err = AltmanVariant::from_industry_code(code).unwrap_err();
            assert!(matches!(err, CreditError::Validation(_)));
        }
    }

    #[test]
    fn test_request_ticker_is_normalized() {
        let request = EvaluationRequest::new("  aapl ", 2);
        let validated = request.validate().unwrap();
        assert_eq!(validated.ticker, "AAPL");
        assert_eq!(validated.variant, AltmanVariant::Prime);
    }

    #[test]
    fn test_blank_ticker_rejected() {
        let err = EvaluationRequest::new("   ", 1).validate().unwrap_err();
        assert!(matches!(err, CreditError::Validation(_)));
    }

    #[test]
    fn test_zone_and_decision_labels_on_the_wire() {
        assert_eq!(serde_json::to_value(Zone::Grey).unwrap(), "Grey Zone");
        assert_eq!(
            serde_json::to_value(Decision::ApprovedWithCaution).unwrap(),
            "Approved with Caution"
        );
        assert_eq!(
            serde_json::from_str::<Decision>("\"Analysis Required\"").unwrap(),
            Decision::AnalysisRequired
        );
    }

    #[test]
    fn test_recent_assets_keeps_latest_four_newest_first() {
        let statement = FinancialStatement {
            total_assets: 500.0,
            working_capital: 0.0,
            retained_earnings: 0.0,
            total_liabilities: 1.0,
            current_liabilities: 1.0,
            stockholders_equity: 0.0,
            ebit: 0.0,
            total_revenue: 0.0,
            total_assets_history: vec![500.0, 400.0, 300.0, 200.0, 100.0],
        };
        assert_eq!(statement.recent_assets(), &[500.0, 400.0, 300.0, 200.0]);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(2.68549, 4), 2.6855);
        assert_eq!(round_to(0.1234564, 6), 0.123456);
        assert_eq!(round_to(-2.5, 0), -3.0);
    }
}
