use credit_core::{
    round_to, AltmanVariant, CompanyFinancials, CreditError, ReportedRatios, Zone,
};

pub mod ratios;
pub use ratios::RatioSet;

/// Which equity figure feeds the x4 term
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquityBasis {
    /// Share price times shares outstanding
    Market,
    /// Stockholders' equity from the balance sheet
    Book,
}

/// Weights and zone thresholds for one Altman variant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Formula {
    /// Weights for x1..x4
    pub weights: [f64; 4],
    /// Weight for x5; `None` when the variant has no sales term.
    pub sales_weight: Option<f64>,
    pub equity_basis: EquityBasis,
    pub safe_threshold: f64,
    pub distress_threshold: f64,
}

pub const CLASSIC: Formula = Formula {
    weights: [1.2, 1.4, 3.3, 0.6],
    sales_weight: Some(1.0),
    equity_basis: EquityBasis::Market,
    safe_threshold: 2.99,
    distress_threshold: 1.81,
};

pub const PRIME: Formula = Formula {
    weights: [0.717, 0.847, 3.107, 0.420],
    sales_weight: Some(0.998),
    equity_basis: EquityBasis::Book,
    safe_threshold: 2.6,
    distress_threshold: 1.1,
};

pub const EMERGING_MARKETS: Formula = Formula {
    weights: [6.56, 3.26, 6.72, 1.05],
    sales_weight: None,
    equity_basis: EquityBasis::Book,
    safe_threshold: 2.6,
    distress_threshold: 1.1,
};

pub fn formula(variant: AltmanVariant) -> &'static Formula {
    match variant {
        AltmanVariant::Classic => &CLASSIC,
        AltmanVariant::Prime => &PRIME,
        AltmanVariant::EmergingMarkets => &EMERGING_MARKETS,
    }
}

impl Formula {
    /// The x4 ratio this formula scores with.
    pub fn x4(&self, ratios: &RatioSet) -> f64 {
        match self.equity_basis {
            EquityBasis::Market => ratios.x4,
            EquityBasis::Book => ratios.x4_mod,
        }
    }

    pub fn score(&self, ratios: &RatioSet) -> f64 {
        let [w1, w2, w3, w4] = self.weights;
        let z = w1 * ratios.x1 + w2 * ratios.x2 + w3 * ratios.x3 + w4 * self.x4(ratios);
        match self.sales_weight {
            Some(w5) => z + w5 * ratios.x5,
            None => z,
        }
    }

    /// Safe above the safe threshold, distress below the distress threshold,
    /// grey on and between both boundaries.
    pub fn classify(&self, z_score: f64) -> Zone {
        if z_score > self.safe_threshold {
            Zone::Safe
        } else if z_score >= self.distress_threshold {
            Zone::Grey
        } else {
            Zone::Distress
        }
    }
}

/// Unrounded Altman evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AltmanResult {
    pub variant: AltmanVariant,
    pub z_score: f64,
    pub zone: Zone,
    pub ratios: RatioSet,
}

impl AltmanResult {
    pub fn model_name(&self) -> &'static str {
        self.variant.model_name()
    }

    pub fn reported_z_score(&self) -> f64 {
        round_to(self.z_score, 4)
    }

    /// Ratios rounded for reporting; `x4` is whichever form the variant scored.
    pub fn reported_ratios(&self) -> ReportedRatios {
        let formula = formula(self.variant);
        ReportedRatios {
            x1: round_to(self.ratios.x1, 6),
            x2: round_to(self.ratios.x2, 6),
            x3: round_to(self.ratios.x3, 6),
            x4: round_to(formula.x4(&self.ratios), 6),
            x5: round_to(self.ratios.x5, 6),
        }
    }
}

/// Altman Z-Score model bound to one variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AltmanModel {
    variant: AltmanVariant,
}

impl AltmanModel {
    pub fn new(variant: AltmanVariant) -> Self {
        Self { variant }
    }

    pub fn for_industry_type(industry_type: i64) -> Result<Self, CreditError> {
        AltmanVariant::from_industry_code(industry_type).map(Self::new)
    }

    pub fn variant(&self) -> AltmanVariant {
        self.variant
    }

    pub fn evaluate(&self, data: &CompanyFinancials) -> Result<AltmanResult, CreditError> {
        let ratios = RatioSet::compute(&data.statement, &data.market)?;
        let result = self.score(ratios);
        tracing::debug!(
            "{} z-score {:.4} ({})",
            result.model_name(),
            result.z_score,
            result.zone
        );
        Ok(result)
    }

    pub fn score(&self, ratios: RatioSet) -> AltmanResult {
        let formula = formula(self.variant);
        let z_score = formula.score(&ratios);
        AltmanResult {
            variant: self.variant,
            z_score,
            zone: formula.classify(z_score),
            ratios,
        }
    }
}
