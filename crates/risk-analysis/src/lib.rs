use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tracing::debug;
use valuation_core::{
    std_dev, AnalysisError, Analyzer, AnalyzerResult, Bar, CompanyData, SignalKind,
};

/// Price-history risk profile condensed to one 0-100 score, higher meaning safer.
///
/// Annualized volatility, maximum drawdown, 95% value-at-risk, and downside
/// deviation are each banded into a sub-score and blended; beta against the
/// benchmark joins the blend when benchmark history is available.
pub struct RiskAnalyzer;

impl RiskAnalyzer {
    /// Fewer daily bars than this and the estimates are not worth reporting.
    pub const MIN_BARS: usize = 30;

    pub fn new() -> Self {
        Self
    }

    fn daily_returns(&self, bars: &[Bar]) -> Vec<f64> {
        bars.windows(2)
            .filter(|w| w[0].close > 0.0)
            .map(|w| w[1].close / w[0].close - 1.0)
            .collect()
    }

    fn max_drawdown_pct(&self, bars: &[Bar]) -> f64 {
        let mut peak = f64::MIN;
        let mut max_dd = 0.0;
        for bar in bars {
            if bar.close > peak {
                peak = bar.close;
            }
            if peak > 0.0 {
                let drawdown = (peak - bar.close) / peak;
                if drawdown > max_dd {
                    max_dd = drawdown;
                }
            }
        }
        max_dd * 100.0
    }

    /// Loss magnitude at the 5th percentile of daily returns, as a positive
    /// percentage. Zero when even the bad days were gains.
    fn var_95_pct(&self, returns: &[f64]) -> f64 {
        let mut sorted = returns.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let index = (sorted.len() as f64 * 0.05) as usize;
        (-sorted[index.min(sorted.len() - 1)] * 100.0).max(0.0)
    }

    /// Annualized deviation of the losing days only, squared against a zero
    /// target but averaged over the full sample.
    fn downside_deviation_pct(&self, returns: &[f64]) -> f64 {
        let squared_losses: f64 = returns.iter().filter(|r| **r < 0.0).map(|r| r * r).sum();
        (squared_losses / returns.len() as f64).sqrt() * 252f64.sqrt() * 100.0
    }

    /// Covariance with benchmark returns over benchmark variance, aligned on
    /// the most recent overlapping span. None when the benchmark is flat or
    /// too short to regress against.
    fn beta(&self, stock_returns: &[f64], benchmark_returns: &[f64]) -> Option<f64> {
        let n = stock_returns.len().min(benchmark_returns.len());
        if n < 2 {
            return None;
        }
        let stock = &stock_returns[stock_returns.len() - n..];
        let bench = &benchmark_returns[benchmark_returns.len() - n..];

        let stock_mean = stock.iter().sum::<f64>() / n as f64;
        let bench_mean = bench.iter().sum::<f64>() / n as f64;

        let mut covariance = 0.0;
        let mut bench_variance = 0.0;
        for i in 0..n {
            let stock_diff = stock[i] - stock_mean;
            let bench_diff = bench[i] - bench_mean;
            covariance += stock_diff * bench_diff;
            bench_variance += bench_diff * bench_diff;
        }

        if bench_variance == 0.0 {
            return None;
        }
        Some(covariance / bench_variance)
    }

    fn volatility_score(&self, vol_pct: f64) -> f64 {
        if vol_pct < 15.0 {
            90.0
        } else if vol_pct < 25.0 {
            75.0
        } else if vol_pct < 35.0 {
            60.0
        } else if vol_pct < 50.0 {
            40.0
        } else if vol_pct < 70.0 {
            25.0
        } else {
            10.0
        }
    }

    fn drawdown_score(&self, dd_pct: f64) -> f64 {
        if dd_pct < 10.0 {
            90.0
        } else if dd_pct < 20.0 {
            75.0
        } else if dd_pct < 35.0 {
            55.0
        } else if dd_pct < 50.0 {
            35.0
        } else {
            15.0
        }
    }

    fn var_score(&self, var_pct: f64) -> f64 {
        if var_pct < 1.5 {
            90.0
        } else if var_pct < 2.5 {
            75.0
        } else if var_pct < 4.0 {
            55.0
        } else if var_pct < 6.0 {
            35.0
        } else {
            15.0
        }
    }

    fn downside_score(&self, downside_pct: f64) -> f64 {
        if downside_pct < 10.0 {
            90.0
        } else if downside_pct < 20.0 {
            70.0
        } else if downside_pct < 30.0 {
            50.0
        } else {
            25.0
        }
    }

    fn beta_score(&self, beta: f64) -> f64 {
        if beta < 0.0 {
            // Moves against the market; diversifying but unusual enough
            // to keep off the top band
            70.0
        } else if beta < 0.8 {
            85.0
        } else if beta < 1.1 {
            70.0
        } else if beta < 1.4 {
            50.0
        } else if beta < 1.8 {
            35.0
        } else {
            20.0
        }
    }

    /// Synchronous core of the analyzer. Bars arrive oldest first.
    pub fn evaluate(&self, data: &CompanyData) -> Result<AnalyzerResult, AnalysisError> {
        if data.price_history.len() < Self::MIN_BARS {
            return Err(AnalysisError::MissingData(format!(
                "{}: need at least {} daily bars, have {}",
                data.ticker,
                Self::MIN_BARS,
                data.price_history.len()
            )));
        }

        let returns = self.daily_returns(&data.price_history);
        if returns.is_empty() {
            return Err(AnalysisError::DegenerateInput(format!(
                "{}: price history has no usable closes",
                data.ticker
            )));
        }

        let mut warnings: Vec<String> = Vec::new();
        if returns.len() < 60 {
            warnings.push(format!(
                "only {} daily returns; risk estimates are noisy under 60",
                returns.len()
            ));
        }

        let vol_pct = std_dev(&returns) * 252f64.sqrt() * 100.0;
        let dd_pct = self.max_drawdown_pct(&data.price_history);
        let var_pct = self.var_95_pct(&returns);
        let downside_pct = self.downside_deviation_pct(&returns);

        let beta = if data.benchmark_history.is_empty() {
            warnings.push("no benchmark history; beta omitted from the risk blend".to_string());
            None
        } else {
            let benchmark_returns = self.daily_returns(&data.benchmark_history);
            let beta = self.beta(&returns, &benchmark_returns);
            if beta.is_none() {
                warnings.push(
                    "benchmark history too flat or short to regress; beta omitted".to_string(),
                );
            }
            beta
        };

        let vol_score = self.volatility_score(vol_pct);
        let dd_score = self.drawdown_score(dd_pct);
        let var_score = self.var_score(var_pct);
        let downside_score = self.downside_score(downside_pct);
        let beta_component = beta.map(|b| self.beta_score(b));

        // Beta drops out of the blend entirely when absent; the remaining
        // weights are renormalized rather than padded with a neutral stand-in
        let mut components = vec![
            (vol_score, 0.30),
            (dd_score, 0.25),
            (var_score, 0.20),
            (downside_score, 0.10),
        ];
        if let Some(beta_score) = beta_component {
            components.push((beta_score, 0.15));
        }
        let weight_sum: f64 = components.iter().map(|(_, w)| w).sum();
        let score = components.iter().map(|(s, w)| s * w).sum::<f64>() / weight_sum;

        let tier = if score >= 75.0 {
            "low"
        } else if score >= 55.0 {
            "moderate"
        } else if score >= 35.0 {
            "elevated"
        } else {
            "high"
        };
        let summary = format!(
            "{}: {} risk; {:.1}% annualized volatility, {:.1}% max drawdown, {:.1}% daily VaR(95)",
            data.ticker, tier, vol_pct, dd_pct, var_pct
        );

        // A year of history earns full sample credit
        let sample_cover = (returns.len() as f64 / 252.0).min(1.0);
        let beta_penalty = if beta.is_none() { 0.05 } else { 0.0 };
        let confidence = (0.4 + 0.5 * sample_cover - beta_penalty).clamp(0.3, 0.95);

        let detail = json!({
            "annualized_volatility_pct": vol_pct,
            "max_drawdown_pct": dd_pct,
            "var_95_pct": var_pct,
            "downside_deviation_pct": downside_pct,
            "beta": beta,
            "component_scores": {
                "volatility": vol_score,
                "drawdown": dd_score,
                "var": var_score,
                "downside": downside_score,
                "beta": beta_component,
            },
            "sample_days": returns.len(),
        });

        debug!(ticker = %data.ticker, score, vol_pct, dd_pct, "price risk scored");

        Ok(AnalyzerResult {
            ticker: data.ticker.clone(),
            engine: "price-risk".to_string(),
            kind: SignalKind::Risk,
            timestamp: Utc::now(),
            score,
            confidence,
            summary,
            warnings,
            detail,
        })
    }
}

impl Default for RiskAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Analyzer for RiskAnalyzer {
    fn kind(&self) -> SignalKind {
        SignalKind::Risk
    }

    fn name(&self) -> &'static str {
        "price-risk"
    }

    async fn analyze(&self, data: &CompanyData) -> Result<AnalyzerResult, AnalysisError> {
        self.evaluate(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use valuation_core::MarketSnapshot;

    fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .map(|&close| Bar {
                timestamp: Utc::now(),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000.0,
                vwap: None,
            })
            .collect()
    }

    fn compounding_closes(count: usize, daily_return: f64) -> Vec<f64> {
        let mut closes = Vec::with_capacity(count);
        let mut price = 100.0;
        for _ in 0..count {
            closes.push(price);
            price *= 1.0 + daily_return;
        }
        closes
    }

    fn company(price_history: Vec<Bar>, benchmark_history: Vec<Bar>) -> CompanyData {
        CompanyData {
            ticker: "RISK".to_string(),
            snapshot: MarketSnapshot {
                price: 100.0,
                shares_outstanding: 1_000_000.0,
                market_cap: None,
                beta: None,
                country: None,
                sector: None,
            },
            financials: Vec::new(),
            peers: Vec::new(),
            price_history,
            benchmark_history,
        }
    }

    #[tokio::test]
    async fn test_calm_uptrend_scores_near_the_top() {
        // Steady +0.1% a day: no drawdown, no losing days, negligible beta
        // against a wobbling benchmark
        let stock = bars_from_closes(&compounding_closes(253, 0.001));
        let benchmark: Vec<f64> = {
            let mut closes = Vec::with_capacity(253);
            let mut price = 100.0;
            for i in 0..253 {
                closes.push(price);
                price *= if i % 2 == 0 { 1.002 } else { 0.999 };
            }
            closes
        };
        let data = company(stock, bars_from_closes(&benchmark));

        let analyzer = RiskAnalyzer::new();
        let result = analyzer.analyze(&data).await.unwrap();

        // All four price metrics band at 90, beta near zero bands at 85
        assert!((result.score - 89.25).abs() < 1e-9);
        assert_eq!(result.kind, SignalKind::Risk);
        assert_eq!(result.engine, "price-risk");
        assert!(result.warnings.is_empty());
        assert!(result.summary.contains("low risk"));
        assert_eq!(result.detail["max_drawdown_pct"], 0.0);
        assert_eq!(result.detail["var_95_pct"], 0.0);
        // 252 returns is a full sample year with beta present
        assert!((result.confidence - 0.90).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_crash_history_scores_risky_without_benchmark() {
        // Sixty days grinding up 0.5%, then sixty days down 3% a day
        let mut closes = compounding_closes(60, 0.005);
        let mut price = closes[59] * 1.005;
        for _ in 0..60 {
            closes.push(price);
            price *= 0.97;
        }
        let data = company(bars_from_closes(&closes), Vec::new());

        let analyzer = RiskAnalyzer::new();
        let result = analyzer.analyze(&data).await.unwrap();

        // vol 60, drawdown 15, VaR 55, downside 25 over weight 0.85
        assert!((result.score - 41.47).abs() < 0.01);
        assert!(result.summary.contains("elevated risk"));
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("no benchmark history")));
        assert!(result.detail["beta"].is_null());
        assert!(result.detail["max_drawdown_pct"].as_f64().unwrap() > 80.0);
    }

    #[tokio::test]
    async fn test_beta_is_covariance_over_variance() {
        let analyzer = RiskAnalyzer::new();

        // Stock doubles every benchmark move: beta 2
        let benchmark: Vec<f64> = {
            let mut closes = Vec::with_capacity(101);
            let mut price = 100.0;
            for i in 0..101 {
                closes.push(price);
                price *= if i % 2 == 0 { 1.01 } else { 0.99 };
            }
            closes
        };
        let amplified: Vec<f64> = {
            let mut closes = Vec::with_capacity(101);
            let mut price = 100.0;
            for i in 0..101 {
                closes.push(price);
                price *= if i % 2 == 0 { 1.02 } else { 0.98 };
            }
            closes
        };
        let data = company(bars_from_closes(&amplified), bars_from_closes(&benchmark));
        let result = analyzer.analyze(&data).await.unwrap();
        assert!((result.detail["beta"].as_f64().unwrap() - 2.0).abs() < 1e-6);
        assert_eq!(result.detail["component_scores"]["beta"], 20.0);

        // Stock at half the benchmark move: beta 0.5 lands the defensive band
        let damped: Vec<f64> = {
            let mut closes = Vec::with_capacity(101);
            let mut price = 100.0;
            for i in 0..101 {
                closes.push(price);
                price *= if i % 2 == 0 { 1.005 } else { 0.995 };
            }
            closes
        };
        let data = company(bars_from_closes(&damped), bars_from_closes(&benchmark));
        let result = analyzer.analyze(&data).await.unwrap();
        assert!((result.detail["beta"].as_f64().unwrap() - 0.5).abs() < 1e-6);
        assert_eq!(result.detail["component_scores"]["beta"], 85.0);
    }

    #[tokio::test]
    async fn test_short_sample_warns_but_still_scores() {
        let data = company(bars_from_closes(&compounding_closes(40, 0.001)), Vec::new());
        let analyzer = RiskAnalyzer::new();
        let result = analyzer.analyze(&data).await.unwrap();

        // Four clean 90s renormalized over 0.85 come back to 90
        assert!((result.score - 90.0).abs() < 1e-9);
        assert_eq!(result.warnings.len(), 2);
        assert!(result.warnings.iter().any(|w| w.contains("under 60")));
    }

    #[tokio::test]
    async fn test_too_few_bars_is_an_error() {
        let data = company(bars_from_closes(&compounding_closes(29, 0.001)), Vec::new());
        let analyzer = RiskAnalyzer::new();
        assert!(matches!(
            analyzer.analyze(&data).await,
            Err(AnalysisError::MissingData(_))
        ));
    }

    #[tokio::test]
    async fn test_flat_benchmark_omits_beta() {
        let stock = bars_from_closes(&compounding_closes(100, 0.002));
        let flat = bars_from_closes(&vec![100.0; 100]);
        let data = company(stock, flat);

        let analyzer = RiskAnalyzer::new();
        let result = analyzer.analyze(&data).await.unwrap();
        assert!(result.detail["beta"].is_null());
        assert!(result.warnings.iter().any(|w| w.contains("too flat")));
    }
}
