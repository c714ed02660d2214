//! Altman ratio engine.
//!
//! Turns raw statement figures into the five standardized ratios. Every
//! denominator is guarded so a malformed statement surfaces as an error that
//! names the offending line item instead of an infinite ratio.

use credit_core::{CreditError, FinancialStatement, LineItem, MarketSnapshot};
use serde::Serialize;

/// The five Altman ratios plus the book-equity form of x4
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatioSet {
    /// Working capital / total assets
    pub x1: f64,
    /// Retained earnings / total assets
    pub x2: f64,
    /// EBIT / total assets
    pub x3: f64,
    /// Market equity / total liabilities
    pub x4: f64,
    /// Book equity / total liabilities
    pub x4_mod: f64,
    /// Total revenue / total assets
    pub x5: f64,
}

impl RatioSet {
    pub fn compute(
        statement: &FinancialStatement,
        market: &MarketSnapshot,
    ) -> Result<Self, CreditError> {
        let total_assets = positive(LineItem::TotalAssets, statement.total_assets)?;
        let total_liabilities = non_zero(LineItem::TotalLiabilities, statement.total_liabilities)?;

        let working_capital = finite(LineItem::WorkingCapital, statement.working_capital)?;
        let retained_earnings = finite(LineItem::RetainedEarnings, statement.retained_earnings)?;
        let ebit = finite(LineItem::Ebit, statement.ebit)?;
        let book_equity = finite(LineItem::StockholdersEquity, statement.stockholders_equity)?;
        let total_revenue = finite(LineItem::TotalRevenue, statement.total_revenue)?;

        positive(LineItem::SharePrice, market.price)?;
        positive(LineItem::SharesOutstanding, market.shares_outstanding)?;
        let market_equity = market.market_equity();

        Ok(Self {
            x1: ratio(LineItem::WorkingCapital, working_capital, total_assets)?,
            x2: ratio(LineItem::RetainedEarnings, retained_earnings, total_assets)?,
            x3: ratio(LineItem::Ebit, ebit, total_assets)?,
            x4: ratio(LineItem::TotalLiabilities, market_equity, total_liabilities)?,
            x4_mod: ratio(LineItem::StockholdersEquity, book_equity, total_liabilities)?,
            x5: ratio(LineItem::TotalRevenue, total_revenue, total_assets)?,
        })
    }
}

fn finite(item: LineItem, value: f64) -> Result<f64, CreditError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CreditError::invalid_line_item(item, format!("value {} is not finite", value)))
    }
}

fn positive(item: LineItem, value: f64) -> Result<f64, CreditError> {
    let value = finite(item, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(CreditError::invalid_line_item(item, format!("must be positive, got {}", value)))
    }
}

fn non_zero(item: LineItem, value: f64) -> Result<f64, CreditError> {
    let value = finite(item, value)?;
    if value != 0.0 {
        Ok(value)
    } else {
        Err(CreditError::invalid_line_item(item, "is zero"))
    }
}

fn ratio(item: LineItem, numerator: f64, denominator: f64) -> Result<f64, CreditError> {
    let value = numerator / denominator;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CreditError::invalid_line_item(item, "ratio is not a finite number"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_statement() -> FinancialStatement {
        FinancialStatement {
            total_assets: 1000.0,
            working_capital: 300.0,
            retained_earnings: 200.0,
            total_liabilities: 400.0,
            current_liabilities: 100.0,
            stockholders_equity: 500.0,
            ebit: 150.0,
            total_revenue: 800.0,
            total_assets_history: vec![1000.0, 900.0, 850.0, 800.0],
        }
    }

    fn sample_market() -> MarketSnapshot {
        MarketSnapshot {
            price: 10.0,
            shares_outstanding: 50.0,
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-12, "{} != {}", actual, expected);
    }

    #[test]
    fn test_ratios_from_statement() {
        let ratios = RatioSet::compute(&sample_statement(), &sample_market()).unwrap();

        assert_close(ratios.x1, 0.3);
        assert_close(ratios.x2, 0.2);
        assert_close(ratios.x3, 0.15);
        assert_close(ratios.x4, 1.25);
        assert_close(ratios.x4_mod, 1.25);
        assert_close(ratios.x5, 0.8);
    }

    #[test]
    fn test_book_and_market_equity_are_separate() {
        let mut statement = sample_statement();
        statement.stockholders_equity = 200.0;

        let ratios = RatioSet::compute(&statement, &sample_market()).unwrap();

        assert_close(ratios.x4, 1.25);
        assert_close(ratios.x4_mod, 0.5);
    }

    #[test]
    fn test_negative_figures_are_allowed() {
        let mut statement = sample_statement();
        statement.working_capital = -250.0;
        statement.retained_earnings = -100.0;

        let ratios = RatioSet::compute(&statement, &sample_market()).unwrap();

        assert_close(ratios.x1, -0.25);
        assert_close(ratios.x2, -0.1);
    }

    #[test]
    fn test_zero_total_assets_names_line_item() {
        let mut statement = sample_statement();
        statement.total_assets = 0.0;

        let err = RatioSet::compute(&statement, &sample_market()).unwrap_err();

        assert!(matches!(
            err,
            CreditError::InvalidLineItem { item: LineItem::TotalAssets, .. }
        ));
    }

    #[test]
    fn test_zero_total_liabilities_is_rejected() {
        let mut statement = sample_statement();
        statement.total_liabilities = 0.0;

        let err = RatioSet::compute(&statement, &sample_market()).unwrap_err();

        assert!(matches!(
            err,
            CreditError::InvalidLineItem { item: LineItem::TotalLiabilities, .. }
        ));
    }

    #[test]
    fn test_overflowing_equity_ratio_names_liabilities() {
        let mut statement = sample_statement();
        statement.total_liabilities = 1e-320;

        let err = RatioSet::compute(&statement, &sample_market()).unwrap_err();

        assert!(matches!(
            err,
            CreditError::InvalidLineItem { item: LineItem::TotalLiabilities, .. }
        ));
    }

    #[test]
    fn test_nan_line_item_is_rejected() {
        let mut statement = sample_statement();
        statement.ebit = f64::NAN;

        let err = RatioSet::compute(&statement, &sample_market()).unwrap_err();

        assert!(matches!(err, CreditError::InvalidLineItem { item: LineItem::Ebit, .. }));
    }

    #[test]
    fn test_missing_share_count_is_rejected() {
        let market = MarketSnapshot {
            price: 10.0,
            shares_outstanding: 0.0,
        };

        let err = RatioSet::compute(&sample_statement(), &market).unwrap_err();

        assert!(matches!(
            err,
            CreditError::InvalidLineItem { item: LineItem::SharesOutstanding, .. }
        ));
    }
}
