use crate::config::ValuationConfig;
use crate::models::WaccBreakdown;
use tracing::warn;
use valuation_core::{FinancialPeriod, MarketSnapshot};

/// Sovereign risk premium added on top of CAPM, by country of domicile.
/// Unknown countries carry a generic 1% premium.
pub fn country_risk_premium(country: Option<&str>) -> f64 {
    match country {
        Some("US") | Some("USA") | Some("United States") => 0.0,
        Some("CA") | Some("Canada") => 0.0,
        Some("GB") | Some("UK") | Some("United Kingdom") => 0.005,
        Some("DE") | Some("Germany") => 0.0,
        Some("FR") | Some("France") => 0.005,
        Some("CH") | Some("Switzerland") => 0.0,
        Some("NL") | Some("Netherlands") => 0.0,
        Some("SE") | Some("Sweden") => 0.005,
        Some("JP") | Some("Japan") => 0.005,
        Some("AU") | Some("Australia") => 0.005,
        Some("KR") | Some("South Korea") => 0.01,
        Some("TW") | Some("Taiwan") => 0.01,
        Some("CN") | Some("China") => 0.012,
        Some("IN") | Some("India") => 0.02,
        Some("MX") | Some("Mexico") => 0.025,
        Some("BR") | Some("Brazil") => 0.03,
        _ => 0.01,
    }
}

/// Long-run nominal growth assumption by country of domicile, defaulting to
/// 2.5% where the table has no entry.
pub fn terminal_growth_for_country(country: Option<&str>, config: &ValuationConfig) -> f64 {
    match country {
        Some("US") | Some("USA") | Some("United States") => 0.025,
        Some("CA") | Some("Canada") => 0.022,
        Some("GB") | Some("UK") | Some("United Kingdom") => 0.02,
        Some("DE") | Some("Germany") => 0.018,
        Some("FR") | Some("France") => 0.018,
        Some("CH") | Some("Switzerland") => 0.018,
        Some("JP") | Some("Japan") => 0.012,
        Some("AU") | Some("Australia") => 0.023,
        Some("CN") | Some("China") => 0.03,
        Some("IN") | Some("India") => 0.03,
        Some("BR") | Some("Brazil") => 0.03,
        _ => config.default_terminal_growth,
    }
}

/// Keep the discount rate strictly above terminal growth. Returns the rate
/// to use and whether it was bumped.
pub fn guard_wacc(wacc: f64, terminal_growth: f64, min_spread: f64) -> (f64, bool) {
    if wacc < terminal_growth + min_spread {
        (terminal_growth + min_spread, true)
    } else {
        (wacc, false)
    }
}

/// CAPM cost of equity plus debt-weighted cost of capital.
///
/// Falls back to all-equity weighting when the capital structure is not
/// observable, and guards the result against terminal-growth degeneracy so
/// downstream Gordon-growth math stays defined.
pub fn compute_wacc(
    snapshot: &MarketSnapshot,
    latest: Option<&FinancialPeriod>,
    tax_rate: f64,
    terminal_growth: f64,
    config: &ValuationConfig,
) -> WaccBreakdown {
    let mut warnings = Vec::new();

    let beta = match snapshot.beta {
        Some(b) if b.is_finite() => {
            let clamped = b.clamp(config.beta_floor, config.beta_cap);
            if (clamped - b).abs() > 1e-12 {
                warnings.push(format!(
                    "beta {:.2} outside [{:.1}, {:.1}]; clamped to {:.2}",
                    b, config.beta_floor, config.beta_cap, clamped
                ));
            }
            clamped
        }
        _ => {
            warnings.push(format!(
                "beta unavailable; assuming {:.1}",
                config.default_beta
            ));
            config.default_beta
        }
    };

    let country_premium = country_risk_premium(snapshot.country.as_deref());
    let cost_of_equity =
        config.risk_free_rate + beta * config.equity_risk_premium + country_premium;

    let debt = latest.and_then(|p| p.total_debt).filter(|d| *d > 0.0);
    let interest = latest.and_then(|p| p.interest_expense).filter(|i| *i > 0.0);
    let cost_of_debt = match (interest, debt) {
        (Some(i), Some(d)) => {
            let implied = i / d;
            let clamped = implied.clamp(config.cost_of_debt_floor, config.cost_of_debt_cap);
            if (clamped - implied).abs() > 1e-12 {
                warnings.push(format!(
                    "implied cost of debt {:.1}% outside [{:.0}%, {:.0}%]; clamped",
                    implied * 100.0,
                    config.cost_of_debt_floor * 100.0,
                    config.cost_of_debt_cap * 100.0
                ));
            }
            clamped
        }
        _ => config.risk_free_rate + 0.02,
    };

    let market_cap = snapshot.effective_market_cap();
    let debt_value = debt.unwrap_or(0.0);
    let total_capital = market_cap + debt_value;
    let (equity_weight, debt_weight) = if market_cap > 0.0 && total_capital > 0.0 {
        (market_cap / total_capital, debt_value / total_capital)
    } else {
        warnings.push("capital structure unobservable; assuming all-equity financing".to_string());
        (1.0, 0.0)
    };

    let raw_wacc =
        cost_of_equity * equity_weight + cost_of_debt * (1.0 - tax_rate) * debt_weight;
    let (wacc, bumped) = guard_wacc(raw_wacc, terminal_growth, config.min_wacc_spread);
    if bumped {
        warnings.push(format!(
            "WACC {:.2}% does not clear terminal growth {:.2}%; adjusted to {:.2}%",
            raw_wacc * 100.0,
            terminal_growth * 100.0,
            wacc * 100.0
        ));
        warn!(
            raw_wacc,
            terminal_growth, wacc, "discount rate bumped above terminal growth"
        );
    }

    WaccBreakdown {
        risk_free_rate: config.risk_free_rate,
        beta,
        equity_risk_premium: config.equity_risk_premium,
        country_premium,
        cost_of_equity,
        cost_of_debt,
        tax_rate,
        equity_weight,
        debt_weight,
        wacc,
        terminal_growth,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(beta: Option<f64>, country: Option<&str>) -> MarketSnapshot {
        MarketSnapshot {
            price: 50.0,
            shares_outstanding: 10_000_000.0,
            market_cap: Some(500_000_000.0),
            beta,
            country: country.map(|c| c.to_string()),
            sector: None,
        }
    }

    fn leveraged_period() -> FinancialPeriod {
        FinancialPeriod {
            fiscal_year: 2024,
            total_debt: Some(200_000_000.0),
            interest_expense: Some(10_000_000.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_weights_sum_to_one_and_wacc_is_bounded() {
        let config = ValuationConfig::default();
        let period = leveraged_period();
        let breakdown = compute_wacc(
            &snapshot(Some(1.2), Some("US")),
            Some(&period),
            0.21,
            0.025,
            &config,
        );
        assert!((breakdown.equity_weight + breakdown.debt_weight - 1.0).abs() < 1e-6);
        let after_tax_debt = breakdown.cost_of_debt * (1.0 - breakdown.tax_rate);
        let lo = after_tax_debt.min(breakdown.cost_of_equity);
        let hi = after_tax_debt.max(breakdown.cost_of_equity);
        assert!(breakdown.wacc >= lo && breakdown.wacc <= hi);
    }

    #[test]
    fn test_all_equity_capm() {
        // rf 4.5% + beta 1.0 x ERP 5.5% + US premium 0 = 10%
        let config = ValuationConfig::default();
        let breakdown = compute_wacc(&snapshot(Some(1.0), Some("US")), None, 0.21, 0.025, &config);
        assert!((breakdown.cost_of_equity - 0.10).abs() < 1e-12);
        assert!((breakdown.wacc - 0.10).abs() < 1e-12);
        assert!((breakdown.equity_weight - 1.0).abs() < 1e-12);
        assert_eq!(breakdown.debt_weight, 0.0);
    }

    #[test]
    fn test_degenerate_wacc_bumped_above_terminal_growth() {
        // beta 9/11 puts the all-equity WACC at exactly 9%; terminal growth
        // of 9.5% forces the guard to 11.5%
        let config = ValuationConfig::default();
        let breakdown = compute_wacc(
            &snapshot(Some(9.0 / 11.0), Some("US")),
            None,
            0.21,
            0.095,
            &config,
        );
        assert!((breakdown.wacc - 0.115).abs() < 1e-9);
        assert!(breakdown.wacc > breakdown.terminal_growth);
        assert!(breakdown.warnings.iter().any(|w| w.contains("adjusted")));
    }

    #[test]
    fn test_missing_beta_falls_back_with_warning() {
        let config = ValuationConfig::default();
        let breakdown = compute_wacc(&snapshot(None, Some("US")), None, 0.21, 0.025, &config);
        assert!((breakdown.beta - 1.0).abs() < 1e-12);
        assert!(breakdown.warnings.iter().any(|w| w.contains("beta")));
    }

    #[test]
    fn test_extreme_beta_clamped() {
        let config = ValuationConfig::default();
        let breakdown = compute_wacc(&snapshot(Some(4.0), Some("US")), None, 0.21, 0.025, &config);
        assert!((breakdown.beta - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_country_gets_generic_premium() {
        assert!((country_risk_premium(Some("Atlantis")) - 0.01).abs() < 1e-12);
        assert!((country_risk_premium(None) - 0.01).abs() < 1e-12);
        assert_eq!(country_risk_premium(Some("US")), 0.0);
    }

    #[test]
    fn test_terminal_growth_lookup_defaults() {
        let config = ValuationConfig::default();
        assert!((terminal_growth_for_country(Some("JP"), &config) - 0.012).abs() < 1e-12);
        assert!((terminal_growth_for_country(Some("Atlantis"), &config) - 0.025).abs() < 1e-12);
    }

    #[test]
    fn test_implied_cost_of_debt_clamped() {
        let config = ValuationConfig::default();
        let period = FinancialPeriod {
            fiscal_year: 2024,
            total_debt: Some(10_000_000.0),
            interest_expense: Some(3_000_000.0), // 30% implied
            ..Default::default()
        };
        let breakdown = compute_wacc(
            &snapshot(Some(1.0), Some("US")),
            Some(&period),
            0.21,
            0.025,
            &config,
        );
        assert!((breakdown.cost_of_debt - 0.15).abs() < 1e-12);
        assert!(breakdown.warnings.iter().any(|w| w.contains("cost of debt")));
    }
}
