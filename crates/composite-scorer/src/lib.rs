pub mod interaction;
pub mod recommendation;
pub mod regime;
pub mod weights;

pub use interaction::{detect_interactions, InteractionFlag};
pub use recommendation::{assess_conviction, Conviction, Recommendation};
pub use regime::{MarketRegime, RegimeDetector, RegimeReading};
pub use weights::ScoringWeights;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use valuation_core::{mean, std_dev, AnalysisError, AnalyzerResult, SignalKind};

/// Blended recommendation for one ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeScore {
    pub ticker: String,
    pub timestamp: DateTime<Utc>,
    /// Weighted blend before interaction adjustments.
    pub raw_composite: f64,
    /// Blend after interaction adjustments, clamped to [0, 100].
    pub composite: f64,
    pub component_scores: HashMap<String, f64>,
    /// Effective weight used per signal: base x regime multiplier x confidence.
    pub confidence_weights: HashMap<String, f64>,
    pub regime: MarketRegime,
    pub interaction_flags: Vec<InteractionFlag>,
    pub recommendation: Recommendation,
    pub conviction: Conviction,
    pub warnings: Vec<String>,
}

/// Confidence-weighted, regime-adjusted blender over the six signal engines.
pub struct CompositeScorer {
    weights: ScoringWeights,
}

impl Default for CompositeScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositeScorer {
    pub fn new() -> Self {
        Self {
            weights: ScoringWeights::default(),
        }
    }

    pub fn with_weights(weights: ScoringWeights) -> Result<Self, AnalysisError> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Blend per-engine results into one graded recommendation.
    ///
    /// A missing signal family enters as a neutral 50 at confidence 0.2, so
    /// a gap dilutes the blend instead of zeroing it. Before interaction
    /// adjustments the composite equals sum(score x weight) / sum(weight)
    /// over exactly the effective weights reported in `confidence_weights`.
    pub fn score(
        &self,
        ticker: &str,
        results: &[AnalyzerResult],
        regime: MarketRegime,
    ) -> CompositeScore {
        let mut warnings = Vec::new();
        let mut component_scores = HashMap::new();
        let mut confidence_weights = HashMap::new();
        let mut kind_scores = HashMap::new();
        let mut confidences = Vec::with_capacity(SignalKind::ALL.len());
        let mut scores = Vec::with_capacity(SignalKind::ALL.len());

        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;

        for kind in SignalKind::ALL {
            let (score, confidence) = match results.iter().find(|r| r.kind == kind) {
                Some(r) => (r.score.clamp(0.0, 100.0), r.confidence.clamp(0.0, 1.0)),
                None => {
                    warnings.push(format!(
                        "no {} signal; scored neutral at low confidence",
                        kind.as_str()
                    ));
                    (50.0, 0.2)
                }
            };

            let effective = self.weights.get(kind) * regime.multiplier(kind) * confidence;
            weighted_sum += score * effective;
            weight_total += effective;

            component_scores.insert(kind.as_str().to_string(), score);
            confidence_weights.insert(kind.as_str().to_string(), effective);
            kind_scores.insert(kind, score);
            confidences.push(confidence);
            scores.push(score);
        }

        let raw_composite = if weight_total > 1e-9 {
            (weighted_sum / weight_total).clamp(0.0, 100.0)
        } else {
            warnings.push(
                "all signal weights are zero; composite defaults to neutral".to_string(),
            );
            50.0
        };

        let interaction_flags = detect_interactions(&kind_scores);
        let adjustment: f64 = interaction_flags.iter().map(|f| f.adjustment).sum();
        let composite = (raw_composite + adjustment).clamp(0.0, 100.0);

        // A flag pulling against the blend's own tilt undercuts conviction
        let contradicted = interaction_flags.iter().any(|f| {
            (f.adjustment < 0.0 && raw_composite >= 55.0)
                || (f.adjustment > 0.0 && raw_composite <= 45.0)
        });
        let recommendation = Recommendation::from_score(composite);
        let conviction = assess_conviction(mean(&confidences), std_dev(&scores), contradicted);

        debug!(
            ticker,
            composite,
            regime = regime.name(),
            flags = interaction_flags.len(),
            recommendation = recommendation.label(),
            "composite blend complete"
        );

        CompositeScore {
            ticker: ticker.to_string(),
            timestamp: Utc::now(),
            raw_composite,
            composite,
            component_scores,
            confidence_weights,
            regime,
            interaction_flags,
            recommendation,
            conviction,
            warnings,
        }
    }
}
