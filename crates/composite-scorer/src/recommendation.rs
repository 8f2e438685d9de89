use serde::{Deserialize, Serialize};

/// Six-level graded recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    StrongBuy,
    Buy,
    Hold,
    Reduce,
    Sell,
    StrongSell,
}

impl Recommendation {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Recommendation::StrongBuy
        } else if score >= 65.0 {
            Recommendation::Buy
        } else if score >= 45.0 {
            Recommendation::Hold
        } else if score >= 35.0 {
            Recommendation::Reduce
        } else if score >= 20.0 {
            Recommendation::Sell
        } else {
            Recommendation::StrongSell
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Recommendation::StrongBuy => "STRONG BUY",
            Recommendation::Buy => "BUY",
            Recommendation::Hold => "HOLD",
            Recommendation::Reduce => "REDUCE",
            Recommendation::Sell => "SELL",
            Recommendation::StrongSell => "STRONG SELL",
        }
    }
}

/// Confidence tier attached to a recommendation, separate from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Conviction {
    High,
    Medium,
    Low,
}

impl Conviction {
    pub fn label(&self) -> &'static str {
        match self {
            Conviction::High => "HIGH",
            Conviction::Medium => "MEDIUM",
            Conviction::Low => "LOW",
        }
    }

    fn downgraded(self) -> Self {
        match self {
            Conviction::High => Conviction::Medium,
            _ => Conviction::Low,
        }
    }
}

/// Tier the signal agreement behind a recommendation.
///
/// High conviction needs confident engines that broadly agree; thin
/// confidence or widely scattered scores read as low. A contradictory
/// interaction flag costs one tier regardless.
pub fn assess_conviction(
    mean_confidence: f64,
    score_dispersion: f64,
    contradicted: bool,
) -> Conviction {
    let base = if mean_confidence < 0.4 || score_dispersion > 30.0 {
        Conviction::Low
    } else if mean_confidence >= 0.7 && score_dispersion <= 15.0 {
        Conviction::High
    } else {
        Conviction::Medium
    };
    if contradicted {
        base.downgraded()
    } else {
        base
    }
}
