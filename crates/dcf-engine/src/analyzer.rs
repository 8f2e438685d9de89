use crate::assembler::ValuationEngine;
use crate::config::ValuationConfig;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use valuation_core::{
    finite_or_none, AnalysisError, Analyzer, AnalyzerResult, CompanyData, SignalKind,
};

/// Valuation signal for the composite scorer, backed by the DCF engine.
///
/// Margin of safety maps onto the 0-100 score scale: fair value scores 50,
/// each percentage point of margin moves the score one point, clamped at
/// the ends. A non-positive intrinsic value scores 0.
pub struct DcfAnalyzer {
    engine: ValuationEngine,
}

impl DcfAnalyzer {
    pub fn new() -> Self {
        Self {
            engine: ValuationEngine::new(),
        }
    }

    pub fn with_config(config: ValuationConfig) -> Self {
        Self {
            engine: ValuationEngine::with_config(config),
        }
    }
}

impl Default for DcfAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Analyzer for DcfAnalyzer {
    fn kind(&self) -> SignalKind {
        SignalKind::Valuation
    }

    fn name(&self) -> &'static str {
        "dcf-valuation"
    }

    async fn analyze(&self, data: &CompanyData) -> Result<AnalyzerResult, AnalysisError> {
        let result = self.engine.value_company(data)?;

        let (score, summary) = match result.margin_of_safety_pct {
            Some(margin) => (
                (50.0 + margin).clamp(0.0, 100.0),
                format!(
                    "{}: intrinsic {:.2} vs price {:.2} ({}, margin of safety {:.1}%)",
                    result.ticker,
                    result.intrinsic_per_share,
                    result.current_price,
                    result.verdict.label(),
                    margin
                ),
            ),
            None => (
                0.0,
                format!(
                    "{}: intrinsic value is not positive at {:.2} per share",
                    result.ticker, result.intrinsic_per_share
                ),
            ),
        };

        // More statement history means better growth and tax estimates;
        // every repair warning chips away at that
        let history_cover = (data.financials.len() as f64 / 4.0).min(1.0);
        let warning_penalty = (result.warnings.len() as f64 * 0.05).min(0.4);
        let confidence = (0.35 + 0.6 * history_cover - warning_penalty).clamp(0.2, 0.95);

        let detail = json!({
            "intrinsic_per_share": result.intrinsic_per_share,
            "current_price": result.current_price,
            "margin_of_safety_pct": result.margin_of_safety_pct,
            "verdict": result.verdict.label(),
            "wacc": result.wacc_breakdown.wacc,
            "terminal_growth": result.wacc_breakdown.terminal_growth,
            "growth_rate": result.growth.rate,
            "probability_weighted_fair_value": result.probability_weighted_fair_value,
            "risk_reward_ratio": finite_or_none(result.risk_reward_ratio),
            "implied_growth": result.reverse_dcf_result.implied_growth,
            "terminal_share_of_ev": result.terminal_share_of_ev,
        });

        Ok(AnalyzerResult {
            ticker: result.ticker.clone(),
            engine: self.name().to_string(),
            kind: SignalKind::Valuation,
            timestamp: Utc::now(),
            score,
            confidence,
            summary,
            warnings: result.warnings,
            detail,
        })
    }
}
