use altman_model::AltmanModel;
use credit_core::{
    BatchEvaluation, CompanyFinancials, CreditError, Decision, EvaluationFailure,
    EvaluationRequest, EvaluationResponse, FinancialDataProvider, ValidatedRequest,
};
use merton_model::MertonModel;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

pub mod fixture;
pub use fixture::FixtureProvider;

/// Default bound on a single provider call.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub struct CreditEvaluator {
    provider: Arc<dyn FinancialDataProvider>,
    merton: MertonModel,
    fetch_timeout: Duration,
}

impl CreditEvaluator {
    pub fn new(provider: Arc<dyn FinancialDataProvider>) -> Self {
        Self {
            provider,
            merton: MertonModel::default(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    /// Evaluate one ticker end to end.
    ///
    /// The request is validated before the provider is called; any failure
    /// aborts the evaluation without a partial result.
    pub async fn evaluate(
        &self,
        request: &EvaluationRequest,
    ) -> Result<EvaluationResponse, CreditError> {
        let ValidatedRequest { ticker, variant } = request.validate()?;
        tracing::info!("Starting credit evaluation for {} ({})", ticker, variant.model_name());

        let data = self.fetch(&ticker).await?;

        let altman = AltmanModel::new(variant).evaluate(&data)?;
        let merton = self.merton.evaluate(&data.statement);
        let decision = Decision::from_zones(altman.zone, merton.zone);

        tracing::info!(
            "{}: z-score {:.4} ({}), Merton {}, decision {}",
            ticker,
            altman.z_score,
            altman.zone,
            merton.zone,
            decision
        );

        Ok(EvaluationResponse {
            model_name: altman.model_name().to_string(),
            z_score: altman.reported_z_score(),
            classification: altman.zone,
            ratios: altman.reported_ratios(),
            merton: merton.to_detail(),
            combined_decision: decision,
            ticker,
        })
    }

    async fn fetch(&self, ticker: &str) -> Result<CompanyFinancials, CreditError> {
        match tokio::time::timeout(self.fetch_timeout, self.provider.fetch_financials(ticker)).await {
            Ok(result) => result,
            Err(_) => Err(CreditError::data_retrieval(
                ticker,
                format!(
                    "data provider did not respond within {:.1}s",
                    self.fetch_timeout.as_secs_f64()
                ),
            )),
        }
    }

    /// Evaluate several tickers concurrently.
    ///
    /// Each ticker runs in its own task; a failure (or panic) in one task is
    /// recorded against that ticker only. Results and errors keep request order.
    pub async fn evaluate_batch(self: &Arc<Self>, requests: Vec<EvaluationRequest>) -> BatchEvaluation {
        tracing::info!("Starting batch evaluation of {} tickers", requests.len());

        let mut tasks = JoinSet::new();
        for (index, request) in requests.iter().cloned().enumerate() {
            let evaluator = Arc::clone(self);
            tasks.spawn(async move {
                let result = evaluator.evaluate(&request).await;
                (index, result)
            });
        }

        let mut outcomes: BTreeMap<usize, Result<EvaluationResponse, String>> = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => {
                    outcomes.insert(index, result.map_err(|e| e.to_string()));
                }
                Err(e) => {
                    tracing::error!("Evaluation task error: {}", e);
                }
            }
        }

        let mut batch = BatchEvaluation::default();
        for (index, request) in requests.iter().enumerate() {
            match outcomes.remove(&index) {
                Some(Ok(response)) => batch.results.push(response),
                Some(Err(error)) => {
                    tracing::warn!("Failed to evaluate {}: {}", request.normalized_ticker(), error);
                    batch.errors.push(EvaluationFailure {
                        ticker: request.normalized_ticker(),
                        error,
                    });
                }
                None => batch.errors.push(EvaluationFailure {
                    ticker: request.normalized_ticker(),
                    error: "evaluation task failed unexpectedly".to_string(),
                }),
            }
        }

        tracing::info!(
            "Batch evaluation finished: {} succeeded, {} failed",
            batch.results.len(),
            batch.errors.len()
        );
        batch
    }
}
