//! Credit-gated narrative insights on top of the projection engine.

mod gemini;
mod ledger;
mod prompt;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::core::{CalculationResult, CalculatorType, EngineError, ParameterSet, calculate};

pub use gemini::{DEFAULT_ENDPOINT, DEFAULT_MODEL, GeminiConfig, GeminiNarrativeGenerator};
pub use ledger::{CreditLedger, InMemoryCreditLedger, LedgerError, STARTER_CREDITS};
pub use prompt::build_prompt;

/// Shown in place of the narrative whenever generation fails for any reason.
pub const FALLBACK_INSIGHT: &str = "Our intelligence engine is currently refreshing. \
Please recalculate in a few moments to receive your personalized wealth analysis.";

#[derive(Debug, Error)]
pub enum InsightError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("no credits remaining; upgrade your plan to unlock more insights")]
    CreditsExhausted,

    #[error(transparent)]
    Ledger(LedgerError),

    #[error("narrative API error: {0}")]
    Api(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid narrative response: {0}")]
    InvalidResponse(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<LedgerError> for InsightError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Exhausted(_) => InsightError::CreditsExhausted,
            other => InsightError::Ledger(other),
        }
    }
}

impl From<reqwest::Error> for InsightError {
    fn from(err: reqwest::Error) -> Self {
        InsightError::Network(err.to_string())
    }
}

#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn generate(
        &self,
        kind: CalculatorType,
        params: &ParameterSet,
        result: &CalculationResult,
    ) -> Result<String, InsightError>;

    fn name(&self) -> &str;
}

/// Generator used when no API key is configured; every request falls back.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledNarrativeGenerator;

#[async_trait]
impl NarrativeGenerator for DisabledNarrativeGenerator {
    async fn generate(
        &self,
        _kind: CalculatorType,
        _params: &ParameterSet,
        _result: &CalculationResult,
    ) -> Result<String, InsightError> {
        Err(InsightError::Configuration(
            "narrative generation is not configured".to_string(),
        ))
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightOutcome {
    pub calculator: CalculatorType,
    pub result: CalculationResult,
    pub insight: String,
    /// True when `insight` is the fallback text rather than generated output.
    pub fallback: bool,
    pub credits_remaining: u32,
}

#[derive(Clone)]
pub struct InsightService {
    ledger: Arc<dyn CreditLedger>,
    generator: Arc<dyn NarrativeGenerator>,
}

impl InsightService {
    pub fn new(ledger: Arc<dyn CreditLedger>, generator: Arc<dyn NarrativeGenerator>) -> Self {
        Self { ledger, generator }
    }

    pub async fn credits(&self, user_id: &str) -> Result<u32, InsightError> {
        Ok(self.ledger.balance(user_id).await?)
    }

    /// Runs the projection, spends one credit and asks the generator for a
    /// narrative. Invalid input fails before any credit is spent; generator
    /// failures are replaced by [`FALLBACK_INSIGHT`] and never retried.
    pub async fn request_insight(
        &self,
        user_id: &str,
        kind: CalculatorType,
        params: &ParameterSet,
    ) -> Result<InsightOutcome, InsightError> {
        let result = calculate(kind, params)?;

        if self.ledger.balance(user_id).await? == 0 {
            tracing::info!(user_id, calculator = %kind, "insight refused: no credits");
            return Err(InsightError::CreditsExhausted);
        }
        let credits_remaining = self.ledger.decrement(user_id).await?;

        let (insight, fallback) = match self.generator.generate(kind, params, &result).await {
            Ok(text) => (text, false),
            Err(e) => {
                tracing::warn!(
                    user_id,
                    calculator = %kind,
                    generator = self.generator.name(),
                    error = %e,
                    "narrative generation failed; serving fallback"
                );
                (FALLBACK_INSIGHT.to_string(), true)
            }
        };

        tracing::info!(user_id, calculator = %kind, credits_remaining, fallback, "insight served");
        Ok(InsightOutcome {
            calculator: kind,
            result,
            insight,
            fallback,
            credits_remaining,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CannedGenerator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl NarrativeGenerator for CannedGenerator {
        async fn generate(
            &self,
            kind: CalculatorType,
            _params: &ParameterSet,
            result: &CalculationResult,
        ) -> Result<String, InsightError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("{kind} reaches {}", result.total_value))
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    fn service(credits: u32, generator: Arc<dyn NarrativeGenerator>) -> InsightService {
        InsightService::new(Arc::new(InMemoryCreditLedger::new(credits)), generator)
    }

    fn canned() -> Arc<CannedGenerator> {
        Arc::new(CannedGenerator {
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn successful_insight_spends_one_credit() {
        let generator = canned();
        let service = service(2, generator.clone());

        let outcome = service
            .request_insight("u1", CalculatorType::Fd, &ParameterSet::default())
            .await
            .expect("insight");

        assert_eq!(outcome.insight, "FD reaches 3106");
        assert!(!outcome.fallback);
        assert_eq!(outcome.credits_remaining, 1);
        assert_eq!(outcome.result.total_value, 3_106.0);
        assert_eq!(service.credits("u1").await.expect("balance"), 1);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausted_credits_refuse_before_generating() {
        let generator = canned();
        let service = service(0, generator.clone());

        let err = service
            .request_insight("u2", CalculatorType::Sip, &ParameterSet::default())
            .await
            .expect_err("must refuse");

        assert!(matches!(err, InsightError::CreditsExhausted));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn generator_failure_serves_fallback_and_still_charges() {
        let service = service(1, Arc::new(DisabledNarrativeGenerator));

        let outcome = service
            .request_insight("u3", CalculatorType::NetWorth, &ParameterSet::default())
            .await
            .expect("fallback outcome");

        assert_eq!(outcome.insight, FALLBACK_INSIGHT);
        assert!(outcome.fallback);
        assert_eq!(outcome.credits_remaining, 0);
        assert_eq!(outcome.result.total_value, 800_000.0);
    }

    #[tokio::test]
    async fn invalid_input_does_not_spend_credit() {
        let generator = canned();
        let service = service(3, generator.clone());
        let params = ParameterSet {
            monthly_expense: -1.0,
            ..ParameterSet::default()
        };

        let err = service
            .request_insight("u4", CalculatorType::Retirement, &params)
            .await
            .expect_err("must reject");

        assert!(matches!(err, InsightError::Engine(EngineError::InvalidInput { .. })));
        assert_eq!(service.credits("u4").await.expect("balance"), 3);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn ledger_exhaustion_maps_to_upgrade_error() {
        let err: InsightError = LedgerError::Exhausted("u5".to_string()).into();
        assert!(matches!(err, InsightError::CreditsExhausted));
        assert!(err.to_string().contains("upgrade"));
    }
}
