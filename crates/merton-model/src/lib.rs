//! Merton structural credit model.
//!
//! Asset volatility is estimated from the period-over-period change in
//! reported total assets. Current liabilities act as the default boundary.

use credit_core::{FinancialStatement, MertonDetail, Zone};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use statrs::statistics::Statistics;

pub const RISK_FREE_RATE: f64 = 0.04;
pub const HORIZON_YEARS: f64 = 2.0;

/// Default probabilities below this are safe.
pub const SAFE_PROBABILITY: f64 = 0.01;
/// Default probabilities at or above this are distressed.
pub const DISTRESS_PROBABILITY: f64 = 0.15;

/// Minimum asset observations needed for a sample standard deviation of changes.
const MIN_ASSET_OBSERVATIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MertonResult {
    /// `None` when the model fell back to its degenerate result.
    pub distance_to_default: Option<f64>,
    /// NaN when the model fell back to its degenerate result.
    pub default_probability: f64,
    pub asset_volatility: Option<f64>,
    pub zone: Zone,
}

impl MertonResult {
    /// Insufficient signal: no probability, classified grey.
    pub fn degenerate(asset_volatility: Option<f64>) -> Self {
        Self {
            distance_to_default: None,
            default_probability: f64::NAN,
            asset_volatility,
            zone: Zone::Grey,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.distance_to_default.is_none()
    }

    pub fn to_detail(&self) -> MertonDetail {
        MertonDetail {
            distance_to_default: self.distance_to_default,
            default_probability: Some(self.default_probability).filter(|p| p.is_finite()),
            asset_volatility: self.asset_volatility.filter(|s| s.is_finite()),
            classification: self.zone,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MertonModel {
    risk_free_rate: f64,
    horizon_years: f64,
}

impl Default for MertonModel {
    fn default() -> Self {
        Self::new(RISK_FREE_RATE, HORIZON_YEARS)
    }
}

impl MertonModel {
    pub fn new(risk_free_rate: f64, horizon_years: f64) -> Self {
        Self {
            risk_free_rate,
            horizon_years,
        }
    }

    pub fn evaluate(&self, statement: &FinancialStatement) -> MertonResult {
        let sigma = asset_volatility(statement.recent_assets());
        self.evaluate_with_volatility(statement.total_assets, statement.current_liabilities, sigma)
    }

    /// Evaluate with asset value `assets`, default boundary `debt` and an
    /// already estimated asset volatility.
    pub fn evaluate_with_volatility(
        &self,
        assets: f64,
        debt: f64,
        sigma: Option<f64>,
    ) -> MertonResult {
        let sigma_value = match sigma {
            Some(s) if s > 0.0 && assets > 0.0 && debt > 0.0 => s,
            _ => {
                tracing::warn!(
                    "Merton inputs degenerate (sigma={:?}, V={}, D={}); falling back to Grey Zone",
                    sigma,
                    assets,
                    debt
                );
                return MertonResult::degenerate(sigma);
            }
        };

        let dd = self.distance_to_default(assets, debt, sigma_value);
        let probability = default_probability(dd);

        MertonResult {
            distance_to_default: Some(dd),
            default_probability: probability,
            asset_volatility: Some(sigma_value),
            zone: classify(probability),
        }
    }

    /// dd = [ln(V/D) + (r - sigma^2/2) t] / (sigma sqrt(t))
    pub fn distance_to_default(&self, assets: f64, debt: f64, sigma: f64) -> f64 {
        let drift = (self.risk_free_rate - 0.5 * sigma.powi(2)) * self.horizon_years;
        ((assets / debt).ln() + drift) / (sigma * self.horizon_years.sqrt())
    }
}

/// Sample standard deviation of period-over-period asset changes.
///
/// Changes run in the order given, each relative to the entry before it; for
/// reported history (newest first) that is `(older - newer) / newer`.
/// Returns `None` when fewer than three observations are available or a
/// change cannot be computed.
pub fn asset_volatility(assets: &[f64]) -> Option<f64> {
    if assets.len() < MIN_ASSET_OBSERVATIONS {
        return None;
    }
    if assets.iter().any(|a| !a.is_finite() || *a <= 0.0) {
        return None;
    }

    let changes: Vec<f64> = assets.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect();
    let sigma = changes.std_dev();
    sigma.is_finite().then_some(sigma)
}

pub fn default_probability(distance_to_default: f64) -> f64 {
    1.0 - standard_normal_cdf(distance_to_default)
}

pub fn classify(default_probability: f64) -> Zone {
    if default_probability < SAFE_PROBABILITY {
        Zone::Safe
    } else if default_probability < DISTRESS_PROBABILITY {
        Zone::Grey
    } else {
        Zone::Distress
    }
}

fn standard_normal_cdf(x: f64) -> f64 {
    Normal::new(0.0, 1.0).map(|n| n.cdf(x)).unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement(total_assets: f64, current_liabilities: f64, history: Vec<f64>) -> FinancialStatement {
        FinancialStatement {
            total_assets,
            working_capital: 0.0,
            retained_earnings: 0.0,
            total_liabilities: current_liabilities * 2.0,
            current_liabilities,
            stockholders_equity: 0.0,
            ebit: 0.0,
            total_revenue: 0.0,
            total_assets_history: history,
        }
    }

    #[test]
    fn test_reference_inputs_are_reproducible() {
        let model = MertonModel::default();
        let first = model.evaluate_with_volatility(1000.0, 500.0, Some(0.2));
        let second = model.evaluate_with_volatility(1000.0, 500.0, Some(0.2));

        let dd = first.distance_to_default.unwrap();
        assert!((dd - 2.592061).abs() < 1e-5, "dd = {}", dd);
        assert!((first.default_probability - 0.004771).abs() < 1e-4);
        assert_eq!(first.zone, Zone::Safe);
        assert_eq!(first, second);
    }

    #[test]
    fn test_grey_and_distress_probabilities() {
        let model = MertonModel::default();

        let grey = model.evaluate_with_volatility(1000.0, 500.0, Some(0.35));
        assert_eq!(grey.zone, Zone::Grey);

        let distress = model.evaluate_with_volatility(120.0, 100.0, Some(0.3));
        assert!(distress.default_probability >= DISTRESS_PROBABILITY);
        assert_eq!(distress.zone, Zone::Distress);
    }

    #[test]
    fn test_zero_volatility_is_degenerate_for_any_balance_sheet() {
        let model = MertonModel::default();
        for (assets, debt) in [(1000.0, 500.0), (10.0, 5000.0), (1.0, 1.0)] {
            let result = model.evaluate_with_volatility(assets, debt, Some(0.0));
            assert!(result.is_degenerate());
            assert!(result.default_probability.is_nan());
            assert_eq!(result.zone, Zone::Grey);
        }
    }

    #[test]
    fn test_flat_asset_history_is_degenerate() {
        let model = MertonModel::default();
        let result = model.evaluate(&statement(100.0, 40.0, vec![100.0, 100.0, 100.0, 100.0]));

        assert_eq!(result.asset_volatility, Some(0.0));
        assert!(result.is_degenerate());
        assert_eq!(result.zone, Zone::Grey);
    }

    #[test]
    fn test_non_positive_inputs_are_degenerate() {
        let model = MertonModel::default();
        assert!(model.evaluate_with_volatility(0.0, 500.0, Some(0.2)).is_degenerate());
        assert!(model.evaluate_with_volatility(1000.0, 0.0, Some(0.2)).is_degenerate());
        assert!(model.evaluate_with_volatility(1000.0, -5.0, Some(0.2)).is_degenerate());
        assert!(model.evaluate_with_volatility(1000.0, 500.0, None).is_degenerate());
    }

    #[test]
    fn test_sample_volatility_of_asset_changes() {
        // changes: +10%, -10%
        let sigma = asset_volatility(&[100.0, 110.0, 99.0]).unwrap();
        assert!((sigma - 0.02_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_volatility_needs_three_observations() {
        assert_eq!(asset_volatility(&[100.0, 110.0]), None);
        assert_eq!(asset_volatility(&[]), None);
        assert_eq!(asset_volatility(&[100.0, 0.0, 110.0]), None);
    }

    #[test]
    fn test_evaluate_uses_history_as_reported() {
        let model = MertonModel::default();
        let result = model.evaluate(&statement(100.0, 10.0, vec![100.0, 110.0, 99.0]));

        assert!((result.asset_volatility.unwrap() - 0.02_f64.sqrt()).abs() < 1e-9);
        assert!(!result.is_degenerate());
    }

    #[test]
    fn test_volatility_of_four_period_history() {
        // changes: -10%, -5.5556%, -5.8824%
        let result = MertonModel::default()
            .evaluate(&statement(1000.0, 100.0, vec![1000.0, 900.0, 850.0, 800.0]));
        let sigma = result.asset_volatility.unwrap();
        assert!((sigma - 0.0247705808).abs() < 1e-9, "sigma = {}", sigma);

        let fifth_period_ignored = MertonModel::default()
            .evaluate(&statement(1000.0, 100.0, vec![1000.0, 900.0, 850.0, 800.0, 10.0]));
        assert_eq!(fifth_period_ignored.asset_volatility, Some(sigma));
    }

    #[test]
    fn test_higher_leverage_increases_probability() {
        let model = MertonModel::default();
        let low = model.evaluate_with_volatility(1000.0, 300.0, Some(0.25));
        let high = model.evaluate_with_volatility(1000.0, 800.0, Some(0.25));
        assert!(high.default_probability > low.default_probability);
    }

    #[test]
    fn test_probability_thresholds() {
        assert_eq!(classify(0.0099), Zone::Safe);
        assert_eq!(classify(0.01), Zone::Grey);
        assert_eq!(classify(0.1499), Zone::Grey);
        assert_eq!(classify(0.15), Zone::Distress);
    }

    #[test]
    fn test_degenerate_detail_serializes_nulls() {
        let detail = MertonResult::degenerate(None).to_detail();
        assert_eq!(detail.distance_to_default, None);
        assert_eq!(detail.default_probability, None);
        assert_eq!(detail.classification, Zone::Grey);
    }
}
