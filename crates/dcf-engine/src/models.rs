use serde::{Deserialize, Serialize};

/// Cost-of-capital decomposition returned with every valuation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaccBreakdown {
    pub risk_free_rate: f64,
    pub beta: f64,
    pub equity_risk_premium: f64,
    pub country_premium: f64,
    pub cost_of_equity: f64,
    pub cost_of_debt: f64,
    pub tax_rate: f64,
    pub equity_weight: f64,
    pub debt_weight: f64,
    /// Discount rate actually used, post-guard: always > terminal_growth.
    pub wacc: f64,
    pub terminal_growth: f64,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// How the stage-1 growth assumption was derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthEstimate {
    /// Clamped rate fed into the projection.
    pub rate: f64,
    pub fcf_cagr: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub earnings_growth: Option<f64>,
    pub basis: String,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// One projected year of free cash flow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProjectedYear {
    pub year: usize,
    /// 1 = constant growth, 2 = fade toward terminal growth.
    pub stage: u8,
    pub growth_rate: f64,
    pub fcf: f64,
}

/// Terminal value by both methods and their blend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalValueEstimate {
    pub gordon_growth_value: f64,
    /// Absent when terminal-year FCF is not positive.
    pub exit_multiple_value: Option<f64>,
    pub exit_multiple_used: Option<f64>,
    /// Mean of both methods when both exist, Gordon growth alone otherwise.
    pub averaged_value: f64,
}

/// Discounted components of one pricing run, before the margin-of-safety
/// read. Intermediate output of the pricing primitive.
#[derive(Debug, Clone)]
pub struct PricedCase {
    pub projection: Vec<ProjectedYear>,
    pub terminal: TerminalValueEstimate,
    pub pv_stage1: f64,
    pub pv_stage2: f64,
    pub pv_terminal: f64,
    pub enterprise_value: f64,
    pub equity_value: f64,
    pub intrinsic_per_share: f64,
}

/// Where the intrinsic value sits relative to the market price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Undervalued,
    Fair,
    Overvalued,
}

impl Verdict {
    /// Classify a margin of safety (percent). `None` means the intrinsic
    /// value was not positive, which always reads as overvalued.
    pub fn from_margin_of_safety(
        margin_pct: Option<f64>,
        undervalued_threshold: f64,
        overvalued_threshold: f64,
    ) -> Self {
        match margin_pct {
            Some(m) if m > undervalued_threshold => Verdict::Undervalued,
            Some(m) if m > overvalued_threshold => Verdict::Fair,
            _ => Verdict::Overvalued,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Undervalued => "UNDERVALUED",
            Verdict::Fair => "FAIR",
            Verdict::Overvalued => "OVERVALUED",
        }
    }
}

/// One leg of the bull/base/bear scenario spread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub probability: f64,
    pub growth_rate: f64,
    pub wacc: f64,
    pub terminal_growth: f64,
    pub value_per_share: f64,
}

/// Probability-weighted scenario spread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSet {
    pub bull: ScenarioOutcome,
    pub base: ScenarioOutcome,
    pub bear: ScenarioOutcome,
    pub probability_weighted_fair_value: f64,
}

/// Per-share values over a WACC x terminal-growth sweep.
///
/// `values[i][j]` prices the company at `wacc_values[i]` and
/// `terminal_growth_values[j]`; cells where WACC does not exceed terminal
/// growth hold `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityGrid {
    pub wacc_values: Vec<f64>,
    pub terminal_growth_values: Vec<f64>,
    pub values: Vec<Vec<Option<f64>>>,
}

/// Distribution summary from the Monte Carlo sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloSummary {
    /// Trials that produced a finite per-share value.
    pub trials: usize,
    pub mean: f64,
    pub median: f64,
    pub percentile_5: f64,
    pub percentile_25: f64,
    pub percentile_75: f64,
    pub percentile_95: f64,
    /// Share of trials pricing the company above the current market price.
    pub probability_undervalued: f64,
}

/// Growth rate the market price implies under the base-case discounting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReverseDcfResult {
    /// Solved stage-1 growth; absent when no root exists in the bracket.
    pub implied_growth: Option<f64>,
    pub estimated_growth: f64,
    pub iterations: usize,
    pub converged: bool,
    pub assessment: String,
}

/// Full output of one valuation run. Constructed fresh per (ticker, run),
/// never mutated after return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcfResult {
    pub ticker: String,
    pub enterprise_value: f64,
    pub net_debt: f64,
    pub equity_value: f64,
    pub shares_outstanding: f64,
    pub intrinsic_per_share: f64,
    pub current_price: f64,
    /// (intrinsic - price) / intrinsic x 100; absent when intrinsic <= 0.
    pub margin_of_safety_pct: Option<f64>,
    pub verdict: Verdict,
    pub pv_stage1: f64,
    pub pv_stage2: f64,
    pub pv_terminal: f64,
    /// Discounted terminal value as a fraction of enterprise value.
    pub terminal_share_of_ev: f64,
    pub growth: GrowthEstimate,
    pub wacc_breakdown: WaccBreakdown,
    pub projection: Vec<ProjectedYear>,
    pub terminal: TerminalValueEstimate,
    pub sensitivity_grid: SensitivityGrid,
    pub scenarios: ScenarioSet,
    pub probability_weighted_fair_value: f64,
    /// (bull - price) / (price - bear); 99.0 when the bear case still
    /// prices at or above the market.
    pub risk_reward_ratio: f64,
    pub reverse_dcf_result: ReverseDcfResult,
    pub monte_carlo: Option<MonteCarloSummary>,
    pub warnings: Vec<String>,
}
