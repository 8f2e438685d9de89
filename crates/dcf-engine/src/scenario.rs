use crate::assembler::{price_case, PricingInputs};
use crate::config::ValuationConfig;
use crate::models::{ScenarioOutcome, ScenarioSet};
use crate::wacc::guard_wacc;

/// Reprice the base assumptions under bull and bear perturbations.
///
/// Bull compounds faster growth with cheaper capital and bear the reverse,
/// so the spread brackets the base case. Each perturbed WACC is re-guarded
/// against its shifted terminal growth before pricing; a bull case can
/// otherwise discount below the validity line.
pub fn run_scenarios(inputs: &PricingInputs, config: &ValuationConfig) -> ScenarioSet {
    let reprice = |name: &str, probability: f64, growth_rate: f64, wacc: f64, tg: f64| {
        let (wacc, _) = guard_wacc(wacc, tg, config.min_wacc_spread);
        let case = PricingInputs {
            growth_rate,
            wacc,
            terminal_growth: tg,
            ..*inputs
        };
        let value_per_share = price_case(&case, config)
            .map(|c| c.intrinsic_per_share)
            .unwrap_or(0.0);
        ScenarioOutcome {
            name: name.to_string(),
            probability,
            growth_rate,
            wacc,
            terminal_growth: tg,
            value_per_share,
        }
    };

    let bull = reprice(
        "bull",
        config.bull_probability,
        inputs.growth_rate * config.bull_growth_multiplier,
        inputs.wacc * config.bull_wacc_multiplier,
        inputs.terminal_growth + config.bull_terminal_shift,
    );
    let base = reprice(
        "base",
        config.base_probability,
        inputs.growth_rate,
        inputs.wacc,
        inputs.terminal_growth,
    );
    let bear = reprice(
        "bear",
        config.bear_probability,
        inputs.growth_rate * config.bear_growth_multiplier,
        inputs.wacc * config.bear_wacc_multiplier,
        inputs.terminal_growth + config.bear_terminal_shift,
    );

    let probability_weighted_fair_value = bull.probability * bull.value_per_share
        + base.probability * base.value_per_share
        + bear.probability * bear.value_per_share;

    ScenarioSet {
        bull,
        base,
        bear,
        probability_weighted_fair_value,
    }
}

/// Upside to the bull case per unit of downside to the bear case.
///
/// Returns the 99.0 downside-free sentinel when the bear case still prices
/// at or above the market, where the ratio has no meaningful denominator.
pub fn risk_reward_ratio(scenarios: &ScenarioSet, price: f64) -> f64 {
    let upside = scenarios.bull.value_per_share - price;
    let downside = price - scenarios.bear.value_per_share;
    if downside > 0.0 {
        upside / downside
    } else {
        99.0
    }
}
