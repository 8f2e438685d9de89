use crate::assembler::{price_case, PricingInputs};
use crate::config::ValuationConfig;
use crate::models::ReverseDcfResult;

/// Solve for the stage-1 growth rate at which the standard pricing path
/// reproduces the market price, holding WACC and terminal growth fixed.
///
/// Bisection over the configured growth bracket. When the bracket does not
/// straddle the price, the market is pricing growth outside anything the
/// model considers plausible and the result carries an explicit extreme
/// decline/growth assessment instead of a rate.
pub fn solve_implied_growth(
    inputs: &PricingInputs,
    price: f64,
    estimated_growth: f64,
    config: &ValuationConfig,
) -> ReverseDcfResult {
    let value_at = |growth: f64| -> Option<f64> {
        let case = PricingInputs {
            growth_rate: growth,
            ..*inputs
        };
        price_case(&case, config).map(|c| c.intrinsic_per_share)
    };

    let mut lo = config.reverse_growth_min;
    let mut hi = config.reverse_growth_max;
    let (value_lo, value_hi) = match (value_at(lo), value_at(hi)) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            return ReverseDcfResult {
                implied_growth: None,
                estimated_growth,
                iterations: 0,
                converged: false,
                assessment: "bracket endpoints cannot be priced; implied growth unavailable"
                    .to_string(),
            }
        }
    };

    let mut f_lo = value_lo - price;
    let f_hi = value_hi - price;
    if f_lo * f_hi > 0.0 {
        let assessment = if price > value_lo.max(value_hi) {
            "no growth rate in range reaches the market price; market prices in extreme growth"
                .to_string()
        } else {
            "every growth rate in range exceeds the market price; market prices in extreme decline"
                .to_string()
        };
        return ReverseDcfResult {
            implied_growth: None,
            estimated_growth,
            iterations: 0,
            converged: false,
            assessment,
        };
    }

    let mut iterations = 0;
    let mut converged = false;
    while iterations < config.reverse_max_iterations {
        iterations += 1;
        let mid = 0.5 * (lo + hi);
        let f_mid = match value_at(mid) {
            Some(v) => v - price,
            None => break,
        };
        if f_mid * f_lo <= 0.0 {
            hi = mid;
        } else {
            lo = mid;
            f_lo = f_mid;
        }
        if 0.5 * (hi - lo) < config.reverse_tolerance {
            converged = true;
            break;
        }
    }

    let implied = 0.5 * (lo + hi);
    ReverseDcfResult {
        implied_growth: Some(implied),
        estimated_growth,
        iterations,
        converged,
        assessment: gap_assessment(implied, estimated_growth),
    }
}

/// Qualitative read of implied vs independently estimated growth.
fn gap_assessment(implied: f64, estimated: f64) -> String {
    let gap = implied - estimated;
    if gap.abs() <= 0.02 {
        "market growth expectations are roughly in line with fundamentals".to_string()
    } else if gap > 0.05 {
        format!(
            "market prices in {:.1}pp more annual growth than fundamentals support",
            gap * 100.0
        )
    } else if gap > 0.0 {
        "market prices in modestly more growth than estimated".to_string()
    } else if gap < -0.05 {
        format!(
            "market prices in {:.1}pp less annual growth than fundamentals suggest",
            -gap * 100.0
        )
    } else {
        "market prices in modestly less growth than estimated".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_inputs() -> PricingInputs {
        PricingInputs {
            current_fcf: 20_000_000.0,
            growth_rate: 0.08,
            wacc: 0.10,
            terminal_growth: 0.025,
            exit_multiple: 13.0,
            net_debt: 25_000_000.0,
            shares_outstanding: 10_000_000.0,
        }
    }

    #[test]
    fn test_round_trip_recovers_the_growth_rate() {
        let config = ValuationConfig::default();
        let inputs = reference_inputs();
        let price = price_case(&inputs, &config).unwrap().intrinsic_per_share;

        let result = solve_implied_growth(&inputs, price, 0.08, &config);
        assert!(result.converged);
        assert!(result.iterations <= 20);
        let implied = result.implied_growth.unwrap();
        assert!((implied - 0.08).abs() < 1e-3);
        assert!(result.assessment.contains("in line"));
    }

    #[test]
    fn test_implied_growth_rises_with_price() {
        let config = ValuationConfig::default();
        let inputs = reference_inputs();

        let cheap = solve_implied_growth(&inputs, 30.0, 0.08, &config);
        let rich = solve_implied_growth(&inputs, 50.0, 0.08, &config);
        assert!(cheap.converged);
        assert!(rich.converged);
        assert!(cheap.implied_growth.unwrap() < 0.08);
        assert!(rich.implied_growth.unwrap() > 0.08);
    }

    #[test]
    fn test_price_above_bracket_reads_extreme_growth() {
        // Even 60% growth prices this company near 573 per share
        let config = ValuationConfig::default();
        let result = solve_implied_growth(&reference_inputs(), 800.0, 0.08, &config);
        assert!(result.implied_growth.is_none());
        assert!(!result.converged);
        assert!(result.assessment.contains("extreme growth"));
    }

    #[test]
    fn test_price_below_bracket_reads_extreme_decline() {
        // A 30% annual decline still leaves about 2.41 per share
        let config = ValuationConfig::default();
        let result = solve_implied_growth(&reference_inputs(), 1.0, 0.08, &config);
        assert!(result.implied_growth.is_none());
        assert!(!result.converged);
        assert!(result.assessment.contains("extreme decline"));
    }

    #[test]
    fn test_gap_assessment_names_the_direction() {
        assert!(gap_assessment(0.15, 0.08).contains("more annual growth"));
        assert!(gap_assessment(0.02, 0.08).contains("less annual growth"));
        assert!(gap_assessment(0.113, 0.08).contains("modestly more"));
        assert!(gap_assessment(0.05, 0.08).contains("modestly less"));
        assert!(gap_assessment(0.09, 0.08).contains("in line"));
    }
}
