use crate::assembler::{price_case, PricingInputs};
use crate::config::ValuationConfig;
use crate::models::MonteCarloSummary;
use crate::wacc::guard_wacc;
use rand::distributions::Distribution;
use rand::thread_rng;
use rayon::prelude::*;
use statrs::distribution::Normal;

/// Sweep the base assumptions under joint normal perturbations of growth,
/// WACC and terminal growth, repricing every draw through the standard path.
///
/// Each draw re-applies the WACC guard against its own terminal growth, so
/// no trial discounts below the validity line. Draws that still fail to
/// price are dropped rather than zeroed. Returns `None` when the sweep is
/// disabled (zero trials) or a sigma is not a usable spread.
pub fn run_monte_carlo(
    inputs: &PricingInputs,
    price: f64,
    config: &ValuationConfig,
) -> Option<MonteCarloSummary> {
    if config.monte_carlo_trials == 0 {
        return None;
    }
    let growth_noise = Normal::new(0.0, config.growth_sigma).ok()?;
    let wacc_noise = Normal::new(0.0, config.wacc_sigma).ok()?;
    let terminal_noise = Normal::new(0.0, config.terminal_growth_sigma).ok()?;

    let mut values: Vec<f64> = (0..config.monte_carlo_trials)
        .into_par_iter()
        .filter_map(|_| {
            let mut rng = thread_rng();
            let terminal_growth = inputs.terminal_growth + terminal_noise.sample(&mut rng);
            let (wacc, _) = guard_wacc(
                inputs.wacc + wacc_noise.sample(&mut rng),
                terminal_growth,
                config.min_wacc_spread,
            );
            let draw = PricingInputs {
                growth_rate: inputs.growth_rate + growth_noise.sample(&mut rng),
                wacc,
                terminal_growth,
                ..*inputs
            };
            price_case(&draw, config).map(|case| case.intrinsic_per_share)
        })
        .collect();

    if values.is_empty() {
        return None;
    }

    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let percentile = |sorted: &[f64], p: f64| -> f64 {
        let idx = ((p / 100.0) * (sorted.len() - 1) as f64).round() as usize;
        sorted[idx.min(sorted.len() - 1)]
    };

    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let undervalued = values.iter().filter(|&&v| v > price).count();

    Some(MonteCarloSummary {
        trials: n,
        mean,
        median: percentile(&values, 50.0),
        percentile_5: percentile(&values, 5.0),
        percentile_25: percentile(&values, 25.0),
        percentile_75: percentile(&values, 75.0),
        percentile_95: percentile(&values, 95.0),
        probability_undervalued: undervalued as f64 / n as f64,
    })
}
