use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use composite_scorer::{CompositeScore, CompositeScorer, RegimeDetector, RegimeReading};
use dcf_engine::DcfAnalyzer;
use fundamental_analysis::FundamentalAnalyzer;
use futures_util::future::join_all;
use futures_util::stream::{self, StreamExt};
use risk_analysis::RiskAnalyzer;
use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use valuation_core::{
    AnalysisError, Analyzer, AnalyzerResult, Bar, CompanyData, MarketDataProvider, TtlCache,
};

const BENCHMARK_CACHE_KEY: &str = "benchmark";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Wall-clock budget per analyzer before it degrades to neutral.
    pub analyzer_timeout: Duration,
    /// Upstream responses are reused for this long.
    pub cache_ttl_secs: i64,
    /// Tickers analyzed at once in a batch run.
    pub batch_concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            analyzer_timeout: Duration::from_secs(10),
            cache_ttl_secs: 300,
            batch_concurrency: 4,
        }
    }
}

/// Everything one full run produces for a ticker.
#[derive(Debug, Clone, Serialize)]
pub struct TickerReport {
    pub ticker: String,
    pub timestamp: DateTime<Utc>,
    pub regime: RegimeReading,
    pub analyzer_results: Vec<AnalyzerResult>,
    pub composite: CompositeScore,
}

/// Orchestrates data fetches, the analyzer stack, regime detection and the
/// composite scorer for one or many tickers.
///
/// An analyzer that errors or overruns its timeout never sinks the run: its
/// signal family enters the composite as the standard neutral degrade while
/// the rest proceed.
pub struct AnalysisPipeline {
    provider: Arc<dyn MarketDataProvider>,
    analyzers: Vec<Arc<dyn Analyzer>>,
    scorer: CompositeScorer,
    detector: RegimeDetector,
    config: PipelineConfig,
    company_cache: TtlCache<String, CompanyData>,
    benchmark_cache: TtlCache<String, Vec<Bar>>,
}

impl AnalysisPipeline {
    /// Default stack: DCF valuation, fundamental quality, price risk.
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self::with_config(provider, PipelineConfig::default())
    }

    pub fn with_config(provider: Arc<dyn MarketDataProvider>, config: PipelineConfig) -> Self {
        let analyzers: Vec<Arc<dyn Analyzer>> = vec![
            Arc::new(DcfAnalyzer::new()),
            Arc::new(FundamentalAnalyzer::new()),
            Arc::new(RiskAnalyzer::new()),
        ];
        Self {
            provider,
            analyzers,
            scorer: CompositeScorer::new(),
            detector: RegimeDetector::new(),
            company_cache: TtlCache::new(config.cache_ttl_secs),
            benchmark_cache: TtlCache::new(config.cache_ttl_secs),
            config,
        }
    }

    /// Replace the default analyzer set.
    pub fn with_analyzers(mut self, analyzers: Vec<Arc<dyn Analyzer>>) -> Self {
        self.analyzers = analyzers;
        self
    }

    pub fn with_scorer(mut self, scorer: CompositeScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// Full analysis of one ticker: concurrent company and benchmark fetches,
    /// regime detection, every analyzer under its own timeout, then the
    /// composite blend.
    pub async fn analyze_ticker(&self, ticker: &str) -> Result<TickerReport, AnalysisError> {
        info!(ticker, "starting full analysis");

        let (company, benchmark) =
            tokio::join!(self.cached_company(ticker), self.cached_benchmark());
        let mut company = company?;
        let benchmark = match benchmark {
            Ok(bars) => bars,
            Err(err) => {
                warn!(ticker, error = %err, "benchmark fetch failed; regime defaults to normal");
                Vec::new()
            }
        };

        let regime = self.detector.detect(&benchmark);
        debug!(
            ticker,
            regime = regime.regime.name(),
            trend = regime.trend,
            "regime read"
        );

        // Analyzers that regress against the index see the shared benchmark
        if company.benchmark_history.is_empty() {
            company.benchmark_history = benchmark;
        }

        let company_ref = &company;
        let runs = self.analyzers.iter().map(|analyzer| async move {
            match timeout(self.config.analyzer_timeout, analyzer.analyze(company_ref)).await {
                Ok(Ok(result)) => result,
                Ok(Err(err)) => {
                    warn!(
                        ticker = %company_ref.ticker,
                        engine = analyzer.name(),
                        error = %err,
                        "analyzer failed; scoring neutral"
                    );
                    AnalyzerResult::neutral(
                        &company_ref.ticker,
                        analyzer.kind(),
                        &format!("{} failed: {}", analyzer.name(), err),
                    )
                }
                Err(_) => {
                    warn!(
                        ticker = %company_ref.ticker,
                        engine = analyzer.name(),
                        "analyzer timed out; scoring neutral"
                    );
                    AnalyzerResult::neutral(
                        &company_ref.ticker,
                        analyzer.kind(),
                        &format!(
                            "{} timed out after {:?}",
                            analyzer.name(),
                            self.config.analyzer_timeout
                        ),
                    )
                }
            }
        });
        let analyzer_results: Vec<AnalyzerResult> = join_all(runs).await;

        let composite = self.scorer.score(ticker, &analyzer_results, regime.regime);

        Ok(TickerReport {
            ticker: ticker.to_string(),
            timestamp: Utc::now(),
            regime,
            analyzer_results,
            composite,
        })
    }

    /// Batch run with bounded concurrency. One ticker failing leaves the
    /// others untouched; each outcome is returned alongside its ticker.
    pub async fn analyze_many(
        &self,
        tickers: &[String],
    ) -> Vec<(String, Result<TickerReport, AnalysisError>)> {
        info!(count = tickers.len(), "starting batch analysis");
        stream::iter(tickers.to_vec())
            .map(|ticker| async move {
                let report = self.analyze_ticker(&ticker).await;
                if let Err(err) = &report {
                    warn!(ticker = %ticker, error = %err, "ticker analysis failed");
                }
                (ticker, report)
            })
            .buffer_unordered(self.config.batch_concurrency)
            .collect()
            .await
    }

    async fn cached_company(&self, ticker: &str) -> Result<CompanyData, AnalysisError> {
        if let Some(hit) = self.company_cache.get(&ticker.to_string()) {
            debug!(ticker, "company bundle served from cache");
            return Ok(hit);
        }
        let company = self.provider.fetch_company(ticker).await?;
        self.company_cache.insert(ticker.to_string(), company.clone());
        Ok(company)
    }

    async fn cached_benchmark(&self) -> Result<Vec<Bar>, AnalysisError> {
        let key = BENCHMARK_CACHE_KEY.to_string();
        if let Some(hit) = self.benchmark_cache.get(&key) {
            debug!("benchmark bars served from cache");
            return Ok(hit);
        }
        let bars = self.provider.fetch_benchmark().await?;
        self.benchmark_cache.insert(key, bars.clone());
        Ok(bars)
    }
}
