use serde::{Deserialize, Serialize};

/// Tunable assumptions for the valuation engine.
///
/// Defaults reflect common long-run US market assumptions. None of these are
/// read from the environment; callers construct a config and pass it in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationConfig {
    /// Risk-free rate (10-year treasury proxy)
    pub risk_free_rate: f64,
    /// Equity risk premium over the risk-free rate
    pub equity_risk_premium: f64,

    /// Years of constant stage-1 growth
    pub stage1_years: usize,
    /// Years of stage-2 fade toward terminal growth
    pub stage2_years: usize,

    /// Bounds applied to the historical growth estimate
    pub growth_floor: f64,
    pub growth_cap: f64,
    /// Growth assumption when history supports no estimate
    pub default_growth: f64,

    /// Effective tax rate bounds and fallback
    pub tax_rate_floor: f64,
    pub tax_rate_cap: f64,
    pub default_tax_rate: f64,

    /// Plausible range for the implied cost of debt
    pub cost_of_debt_floor: f64,
    pub cost_of_debt_cap: f64,

    /// Plausible beta range; missing betas fall back to the default
    pub beta_floor: f64,
    pub beta_cap: f64,
    pub default_beta: f64,

    /// Terminal growth when the country lookup has no entry
    pub default_terminal_growth: f64,
    /// Minimum spread of WACC over terminal growth after the guard
    pub min_wacc_spread: f64,

    /// EV/EBITDA multiple when neither peers nor sector provide one
    pub default_exit_multiple: f64,
    /// Assumed FCF-to-EBITDA conversion for the exit-multiple proxy
    pub fcf_to_ebitda_ratio: f64,
    /// Warn when discounted terminal value exceeds this share of EV
    pub terminal_dominance_threshold: f64,

    /// Sensitivity grid step sizes
    pub wacc_step: f64,
    pub terminal_growth_step: f64,

    /// Margin-of-safety verdict thresholds, in percent
    pub undervalued_threshold: f64,
    pub overvalued_threshold: f64,

    /// Scenario perturbations and probabilities
    pub bull_growth_multiplier: f64,
    pub bear_growth_multiplier: f64,
    pub bull_wacc_multiplier: f64,
    pub bear_wacc_multiplier: f64,
    pub bull_terminal_shift: f64,
    pub bear_terminal_shift: f64,
    pub bull_probability: f64,
    pub base_probability: f64,
    pub bear_probability: f64,

    /// Monte Carlo trial count (0 disables the sweep)
    pub monte_carlo_trials: usize,
    /// Per-trial perturbation sigmas
    pub growth_sigma: f64,
    pub wacc_sigma: f64,
    pub terminal_growth_sigma: f64,

    /// Reverse-DCF bisection bracket over stage-1 growth
    pub reverse_growth_min: f64,
    pub reverse_growth_max: f64,
    /// Convergence tolerance on the growth rate
    pub reverse_tolerance: f64,
    pub reverse_max_iterations: usize,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.045,
            equity_risk_premium: 0.055,
            stage1_years: 5,
            stage2_years: 5,
            growth_floor: -0.05,
            growth_cap: 0.30,
            default_growth: 0.08,
            tax_rate_floor: 0.0,
            tax_rate_cap: 0.40,
            default_tax_rate: 0.21,
            cost_of_debt_floor: 0.01,
            cost_of_debt_cap: 0.15,
            beta_floor: 0.5,
            beta_cap: 2.5,
            default_beta: 1.0,
            default_terminal_growth: 0.025,
            min_wacc_spread: 0.02,
            default_exit_multiple: 13.0,
            fcf_to_ebitda_ratio: 0.60,
            terminal_dominance_threshold: 0.75,
            wacc_step: 0.005,
            terminal_growth_step: 0.0025,
            undervalued_threshold: 15.0,
            overvalued_threshold: -10.0,
            bull_growth_multiplier: 1.30,
            bear_growth_multiplier: 0.70,
            bull_wacc_multiplier: 0.95,
            bear_wacc_multiplier: 1.05,
            bull_terminal_shift: 0.005,
            bear_terminal_shift: -0.005,
            bull_probability: 0.25,
            base_probability: 0.50,
            bear_probability: 0.25,
            monte_carlo_trials: 2000,
            growth_sigma: 0.02,
            wacc_sigma: 0.01,
            terminal_growth_sigma: 0.005,
            reverse_growth_min: -0.30,
            reverse_growth_max: 0.60,
            reverse_tolerance: 1e-4,
            reverse_max_iterations: 200,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scenario_probabilities_sum_to_one() {
        let config = ValuationConfig::default();
        let total = config.bull_probability + config.base_probability + config.bear_probability;
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_default_thresholds_are_ordered() {
        let config = ValuationConfig::default();
        assert!(config.undervalued_threshold > config.overvalued_threshold);
        assert!(config.growth_floor < config.growth_cap);
        assert!(config.beta_floor < config.beta_cap);
        assert!(config.cost_of_debt_floor < config.cost_of_debt_cap);
        assert!(config.min_wacc_spread > 0.0);
    }
}
