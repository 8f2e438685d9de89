use crate::config::ValuationConfig;
use crate::models::{DcfResult, PricedCase, Verdict};
use crate::{growth, monte_carlo, projection, reverse, scenario, sensitivity, terminal, wacc};
use tracing::debug;
use valuation_core::{AnalysisError, CompanyData};

/// Assumption bundle repriced by every valuation variant. The sensitivity
/// grid, scenarios, Monte Carlo draws and reverse solve all perturb one of
/// these fields and reprice through the same path.
#[derive(Debug, Clone, Copy)]
pub struct PricingInputs {
    pub current_fcf: f64,
    pub growth_rate: f64,
    pub wacc: f64,
    pub terminal_growth: f64,
    pub exit_multiple: f64,
    pub net_debt: f64,
    pub shares_outstanding: f64,
}

/// Discount a full assumption set down to a per-share value.
///
/// Returns `None` when the inputs cannot produce a finite value: WACC at or
/// below terminal growth, non-positive share count, or an empty projection
/// horizon. The base-case caller treats that as a degenerate input; the
/// sensitivity grid treats it as an empty cell.
pub fn price_case(inputs: &PricingInputs, config: &ValuationConfig) -> Option<PricedCase> {
    if inputs.wacc <= inputs.terminal_growth || inputs.shares_outstanding <= 0.0 {
        return None;
    }

    let projection = projection::project_fcf(
        inputs.current_fcf,
        inputs.growth_rate,
        inputs.terminal_growth,
        config.stage1_years,
        config.stage2_years,
    );
    if projection.is_empty() {
        return None;
    }

    let mut pv_stage1 = 0.0;
    let mut pv_stage2 = 0.0;
    for p in &projection {
        let pv = p.fcf / (1.0 + inputs.wacc).powi(p.year as i32);
        if p.stage == 1 {
            pv_stage1 += pv;
        } else {
            pv_stage2 += pv;
        }
    }

    let final_fcf = projection.last().map(|p| p.fcf)?;
    let terminal = terminal::estimate_terminal_value(
        final_fcf,
        inputs.wacc,
        inputs.terminal_growth,
        inputs.exit_multiple,
        config,
    );
    let horizon = projection.len() as i32;
    let pv_terminal = terminal.averaged_value / (1.0 + inputs.wacc).powi(horizon);

    let enterprise_value = pv_stage1 + pv_stage2 + pv_terminal;
    let equity_value = enterprise_value - inputs.net_debt;
    let intrinsic_per_share = equity_value / inputs.shares_outstanding;
    if !intrinsic_per_share.is_finite() {
        return None;
    }

    Some(PricedCase {
        projection,
        terminal,
        pv_stage1,
        pv_stage2,
        pv_terminal,
        enterprise_value,
        equity_value,
        intrinsic_per_share,
    })
}

/// Multi-stage DCF valuation engine.
pub struct ValuationEngine {
    config: ValuationConfig,
}

impl Default for ValuationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ValuationEngine {
    pub fn new() -> Self {
        Self {
            config: ValuationConfig::default(),
        }
    }

    pub fn with_config(config: ValuationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValuationConfig {
        &self.config
    }

    /// Run the full valuation for one company: estimate growth and the
    /// discount rate from the statement history, project and discount cash
    /// flows, bridge to equity value, then attach the sensitivity grid,
    /// scenario spread, Monte Carlo sweep and reverse solve.
    pub fn value_company(&self, data: &CompanyData) -> Result<DcfResult, AnalysisError> {
        let config = &self.config;
        let snapshot = &data.snapshot;

        if snapshot.shares_outstanding <= 0.0 {
            return Err(AnalysisError::DegenerateInput(format!(
                "{}: shares outstanding must be positive",
                data.ticker
            )));
        }
        if data.financials.is_empty() {
            return Err(AnalysisError::MissingData(format!(
                "{}: no financial statements provided",
                data.ticker
            )));
        }

        let mut warnings = Vec::new();

        let (current_fcf, seed_warnings) = growth::seed_fcf(&data.financials)?;
        warnings.extend(seed_warnings);

        let growth = growth::estimate_growth(&data.financials, config);
        warnings.extend(growth.warnings.iter().cloned());

        let (tax_rate, tax_warning) = growth::effective_tax_rate(&data.financials, config);
        warnings.extend(tax_warning);

        let terminal_growth =
            wacc::terminal_growth_for_country(snapshot.country.as_deref(), config);
        let wacc_breakdown = wacc::compute_wacc(
            snapshot,
            data.financials.first(),
            tax_rate,
            terminal_growth,
            config,
        );
        warnings.extend(wacc_breakdown.warnings.iter().cloned());

        let (exit_multiple, _) =
            terminal::resolve_exit_multiple(&data.peers, snapshot.sector.as_deref(), config);

        let net_debt = data
            .financials
            .first()
            .map(|p| p.net_debt())
            .unwrap_or(0.0);

        let inputs = PricingInputs {
            current_fcf,
            growth_rate: growth.rate,
            wacc: wacc_breakdown.wacc,
            terminal_growth: wacc_breakdown.terminal_growth,
            exit_multiple,
            net_debt,
            shares_outstanding: snapshot.shares_outstanding,
        };

        let base = price_case(&inputs, config).ok_or_else(|| {
            AnalysisError::DegenerateInput(format!(
                "{}: base case produced no finite per-share value",
                data.ticker
            ))
        })?;

        let price = snapshot.price;
        let margin_of_safety_pct = if base.intrinsic_per_share > 0.0 {
            Some((base.intrinsic_per_share - price) / base.intrinsic_per_share * 100.0)
        } else {
            warnings
                .push("intrinsic value is not positive; margin of safety undefined".to_string());
            None
        };
        let verdict = Verdict::from_margin_of_safety(
            margin_of_safety_pct,
            config.undervalued_threshold,
            config.overvalued_threshold,
        );

        let terminal_share_of_ev = if base.enterprise_value.abs() > f64::EPSILON {
            base.pv_terminal / base.enterprise_value
        } else {
            0.0
        };
        if terminal_share_of_ev > config.terminal_dominance_threshold {
            warnings.push(format!(
                "terminal value is {:.0}% of enterprise value; result dominated by terminal assumptions",
                terminal_share_of_ev * 100.0
            ));
        }

        let sensitivity_grid = sensitivity::build_grid(&inputs, config);
        let scenarios = scenario::run_scenarios(&inputs, config);
        let probability_weighted_fair_value = scenarios.probability_weighted_fair_value;
        let risk_reward_ratio = scenario::risk_reward_ratio(&scenarios, price);
        let reverse_dcf_result =
            reverse::solve_implied_growth(&inputs, price, growth.rate, config);
        let monte_carlo = monte_carlo::run_monte_carlo(&inputs, price, config);

        debug!(
            ticker = %data.ticker,
            intrinsic = base.intrinsic_per_share,
            price,
            "DCF valuation complete"
        );

        Ok(DcfResult {
            ticker: data.ticker.clone(),
            enterprise_value: base.enterprise_value,
            net_debt,
            equity_value: base.equity_value,
            shares_outstanding: snapshot.shares_outstanding,
            intrinsic_per_share: base.intrinsic_per_share,
            current_price: price,
            margin_of_safety_pct,
            verdict,
            pv_stage1: base.pv_stage1,
            pv_stage2: base.pv_stage2,
            pv_terminal: base.pv_terminal,
            terminal_share_of_ev,
            growth,
            wacc_breakdown,
            projection: base.projection,
            terminal: base.terminal,
            sensitivity_grid,
            scenarios,
            probability_weighted_fair_value,
            risk_reward_ratio,
            reverse_dcf_result,
            monte_carlo,
            warnings,
        })
    }
}
