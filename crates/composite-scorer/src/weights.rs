use serde::{Deserialize, Serialize};
use valuation_core::{AnalysisError, SignalKind};

/// Base blend weights for the six signal families.
///
/// These are heuristic starting points rather than fitted parameters;
/// callers may override any of them before building a scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub fundamental: f64,
    pub valuation: f64,
    pub technical: f64,
    pub sentiment: f64,
    pub risk: f64,
    pub moat: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            fundamental: 0.25,
            valuation: 0.20,
            technical: 0.15,
            sentiment: 0.10,
            risk: 0.15,
            moat: 0.15,
        }
    }
}

impl ScoringWeights {
    pub fn get(&self, kind: SignalKind) -> f64 {
        match kind {
            SignalKind::Fundamental => self.fundamental,
            SignalKind::Valuation => self.valuation,
            SignalKind::Technical => self.technical,
            SignalKind::Sentiment => self.sentiment,
            SignalKind::Risk => self.risk,
            SignalKind::Moat => self.moat,
        }
    }

    /// Reject weight sets the blend cannot use.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let all = [
            self.fundamental,
            self.valuation,
            self.technical,
            self.sentiment,
            self.risk,
            self.moat,
        ];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(AnalysisError::DegenerateInput(
                "scoring weights must be finite and non-negative".to_string(),
            ));
        }
        if all.iter().sum::<f64>() <= 0.0 {
            return Err(AnalysisError::DegenerateInput(
                "scoring weights must carry some mass".to_string(),
            ));
        }
        Ok(())
    }
}
