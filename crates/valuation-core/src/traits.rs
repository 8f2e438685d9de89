use crate::{AnalysisError, AnalyzerResult, Bar, CompanyData, SignalKind};
use async_trait::async_trait;

/// Trait implemented by every signal engine feeding the composite scorer.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Which of the six signal families this engine produces.
    fn kind(&self) -> SignalKind;

    /// Engine name used in logs and degradation warnings.
    fn name(&self) -> &'static str;

    async fn analyze(&self, data: &CompanyData) -> Result<AnalyzerResult, AnalysisError>;
}

/// Trait for market data sources feeding the pipeline.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Statements, snapshot, peers and price history for one ticker.
    async fn fetch_company(&self, ticker: &str) -> Result<CompanyData, AnalysisError>;

    /// Broad-index bars used for regime detection and beta.
    async fn fetch_benchmark(&self) -> Result<Vec<Bar>, AnalysisError>;
}
