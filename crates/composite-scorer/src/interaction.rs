use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use valuation_core::SignalKind;

/// A cross-signal pattern worth surfacing, with the score adjustment it
/// carries into the composite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionFlag {
    pub name: String,
    pub description: String,
    /// Points added to the composite before grading (negative for risks).
    pub adjustment: f64,
}

impl InteractionFlag {
    fn new(name: &str, description: String, adjustment: f64) -> Self {
        Self {
            name: name.to_string(),
            description,
            adjustment,
        }
    }
}

/// Scan the collected per-family scores for combinations that mean more
/// than their weighted average.
///
/// Single-signal rules belong in the engines themselves; everything here
/// needs at least two families to read together.
pub fn detect_interactions(scores: &HashMap<SignalKind, f64>) -> Vec<InteractionFlag> {
    let score = |kind: SignalKind| scores.get(&kind).copied().unwrap_or(50.0);

    let fundamental = score(SignalKind::Fundamental);
    let valuation = score(SignalKind::Valuation);
    let technical = score(SignalKind::Technical);
    let risk = score(SignalKind::Risk);

    let mut flags = Vec::new();

    if valuation >= 70.0 && fundamental <= 35.0 {
        flags.push(InteractionFlag::new(
            "value_trap",
            format!(
                "screens cheap (valuation {:.0}) on weak fundamentals ({:.0}); possible value trap",
                valuation, fundamental
            ),
            -8.0,
        ));
    }

    if technical >= 70.0 && fundamental <= 40.0 {
        flags.push(InteractionFlag::new(
            "momentum_divergence",
            format!(
                "price momentum ({:.0}) is running ahead of fundamentals ({:.0})",
                technical, fundamental
            ),
            -4.0,
        ));
    }

    if fundamental >= 80.0 && valuation <= 30.0 {
        flags.push(InteractionFlag::new(
            "quality_at_any_price",
            format!(
                "strong business (fundamental {:.0}) but the price leaves no margin (valuation {:.0})",
                fundamental, valuation
            ),
            -3.0,
        ));
    }

    let weak_families = SignalKind::ALL
        .iter()
        .filter(|kind| score(**kind) <= 40.0)
        .count();
    if weak_families >= 4 {
        flags.push(InteractionFlag::new(
            "broad_weakness",
            format!("{} of six signal families score 40 or below", weak_families),
            -5.0,
        ));
    }

    if fundamental >= 65.0 && valuation >= 65.0 && risk >= 55.0 {
        flags.push(InteractionFlag::new(
            "confirmation",
            "quality, price and risk profile confirm each other".to_string(),
            5.0,
        ));
    }

    flags
}
