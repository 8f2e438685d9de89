use crate::config::ValuationConfig;
use crate::models::GrowthEstimate;
use tracing::warn;
use valuation_core::{mean, median, AnalysisError, FinancialPeriod};

/// Pick the FCF base year for the projection, smoothing away a depressed or
/// negative latest reading.
///
/// Rules, in order: a negative latest FCF is replaced by the most recent
/// positive year; a latest FCF below 40% of a positive prior average is
/// replaced by the average of up to three recent positive years; a history
/// with no positive year at all is used as-is so the run completes, with the
/// result flagged as economically meaningless.
pub fn seed_fcf(financials: &[FinancialPeriod]) -> Result<(f64, Vec<String>), AnalysisError> {
    let series: Vec<f64> = financials.iter().filter_map(|p| p.fcf()).collect();
    if series.is_empty() {
        return Err(AnalysisError::MissingData(
            "no free cash flow derivable from any period".to_string(),
        ));
    }

    let mut warnings = Vec::new();
    let latest = series[0];
    let prior = &series[1..];

    if latest <= 0.0 {
        if let Some(&recovery) = prior.iter().find(|&&f| f > 0.0) {
            warnings.push(format!(
                "latest FCF {latest:.0} is not positive; seeding projection from most recent positive year ({recovery:.0})"
            ));
            warn!(latest, recovery, "negative latest FCF, substituting prior positive year");
            return Ok((recovery, warnings));
        }
        warnings.push(
            "no positive FCF in history; projecting from a negative base".to_string(),
        );
        warn!(latest, "no positive FCF anywhere in history");
        return Ok((latest, warnings));
    }

    if !prior.is_empty() {
        let prior_avg = mean(prior);
        if prior_avg > 0.0 && latest < 0.4 * prior_avg {
            let recent_positive: Vec<f64> =
                prior.iter().copied().filter(|f| *f > 0.0).take(3).collect();
            if !recent_positive.is_empty() {
                let smoothed = mean(&recent_positive);
                warnings.push(format!(
                    "latest FCF {latest:.0} is below 40% of the prior average {prior_avg:.0}; using {}-year positive average ({smoothed:.0})",
                    recent_positive.len()
                ));
                return Ok((smoothed, warnings));
            }
        }
    }

    Ok((latest, warnings))
}

/// Median of up to three independent growth signals, clamped to the
/// configured range. Falls back to the default rate when nothing in the
/// history is usable.
pub fn estimate_growth(financials: &[FinancialPeriod], config: &ValuationConfig) -> GrowthEstimate {
    let mut warnings = Vec::new();

    let fcf_cagr = fcf_cagr(financials);
    let revenue_growth = trailing_growth(financials, |p| p.revenue);
    let earnings_growth = trailing_growth(financials, |p| p.net_income);

    let components: Vec<f64> = [fcf_cagr, revenue_growth, earnings_growth]
        .iter()
        .flatten()
        .copied()
        .collect();

    let (raw, basis) = match median(&components) {
        Some(m) => (
            m,
            format!("median of {} historical growth signals", components.len()),
        ),
        None => {
            warnings.push(format!(
                "no usable growth history; assuming {:.0}% growth",
                config.default_growth * 100.0
            ));
            (config.default_growth, "default assumption".to_string())
        }
    };

    let rate = raw.clamp(config.growth_floor, config.growth_cap);
    if (rate - raw).abs() > 1e-12 {
        warnings.push(format!(
            "growth estimate {:.1}% clamped to {:.1}%",
            raw * 100.0,
            rate * 100.0
        ));
    }

    GrowthEstimate {
        rate,
        fcf_cagr,
        revenue_growth,
        earnings_growth,
        basis,
        warnings,
    }
}

/// Effective tax rate from the latest statement, clamped to a plausible
/// range. Returns the configured default with a warning when the statement
/// does not support the calculation.
pub fn effective_tax_rate(
    financials: &[FinancialPeriod],
    config: &ValuationConfig,
) -> (f64, Option<String>) {
    if let Some(latest) = financials.first() {
        if let (Some(tax), Some(pretax)) = (latest.tax_paid, latest.pretax_income) {
            if pretax > 0.0 && tax >= 0.0 {
                let rate = (tax / pretax).clamp(config.tax_rate_floor, config.tax_rate_cap);
                return (rate, None);
            }
        }
    }
    (
        config.default_tax_rate,
        Some(format!(
            "effective tax rate unavailable; assuming {:.0}%",
            config.default_tax_rate * 100.0
        )),
    )
}

/// Endpoint CAGR of derivable FCF. Only meaningful when both endpoints are
/// positive; extreme negative rates are treated as noise and dropped.
fn fcf_cagr(financials: &[FinancialPeriod]) -> Option<f64> {
    let series: Vec<(i32, f64)> = financials
        .iter()
        .filter_map(|p| p.fcf().map(|f| (p.fiscal_year, f)))
        .collect();
    if series.len() < 2 {
        return None;
    }
    let (newest_year, newest) = series[0];
    let (oldest_year, oldest) = series[series.len() - 1];
    let years = (newest_year - oldest_year) as f64;
    if years < 1.0 || newest <= 0.0 || oldest <= 0.0 {
        return None;
    }
    let cagr = (newest / oldest).powf(1.0 / years) - 1.0;
    if cagr <= -0.20 {
        return None;
    }
    Some(cagr)
}

/// Latest year-over-year growth of one statement line, requiring both
/// readings to be positive.
fn trailing_growth(
    financials: &[FinancialPeriod],
    field: impl Fn(&FinancialPeriod) -> Option<f64>,
) -> Option<f64> {
    let series: Vec<f64> = financials.iter().filter_map(field).collect();
    if series.len() < 2 {
        return None;
    }
    let (latest, prior) = (series[0], series[1]);
    if latest <= 0.0 || prior <= 0.0 {
        return None;
    }
    Some(latest / prior - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period_with_fcf(fiscal_year: i32, fcf: f64) -> FinancialPeriod {
        FinancialPeriod {
            fiscal_year,
            free_cash_flow: Some(fcf),
            ..Default::default()
        }
    }

    #[test]
    fn test_seed_uses_latest_when_healthy() {
        let financials = vec![
            period_with_fcf(2024, 120.0),
            period_with_fcf(2023, 110.0),
            period_with_fcf(2022, 100.0),
        ];
        let (seed, warnings) = seed_fcf(&financials).unwrap();
        assert_eq!(seed, 120.0);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_seed_smooths_depressed_latest() {
        // Latest is 30, prior average is 100: below the 40% line
        let financials = vec![
            period_with_fcf(2024, 30.0),
            period_with_fcf(2023, 90.0),
            period_with_fcf(2022, 100.0),
            period_with_fcf(2021, 110.0),
        ];
        let (seed, warnings) = seed_fcf(&financials).unwrap();
        assert!((seed - 100.0).abs() < 1e-9);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("40%"));
    }

    #[test]
    fn test_seed_negative_latest_uses_recent_positive_year() {
        let financials = vec![
            period_with_fcf(2024, -50.0),
            period_with_fcf(2023, -10.0),
            period_with_fcf(2022, 80.0),
        ];
        let (seed, warnings) = seed_fcf(&financials).unwrap();
        assert_eq!(seed, 80.0);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_seed_all_negative_proceeds_with_warning() {
        let financials = vec![
            period_with_fcf(2024, -50.0),
            period_with_fcf(2023, -60.0),
        ];
        let (seed, warnings) = seed_fcf(&financials).unwrap();
        assert_eq!(seed, -50.0);
        assert!(warnings[0].contains("no positive FCF"));
    }

    #[test]
    fn test_seed_errors_without_any_fcf() {
        let financials = vec![FinancialPeriod {
            fiscal_year: 2024,
            revenue: Some(1000.0),
            ..Default::default()
        }];
        assert!(matches!(
            seed_fcf(&financials),
            Err(AnalysisError::MissingData(_))
        ));
    }

    #[test]
    fn test_growth_is_median_of_signals() {
        let financials = vec![
            FinancialPeriod {
                fiscal_year: 2024,
                free_cash_flow: Some(130.0),
                revenue: Some(220.0),
                net_income: Some(120.0),
                ..Default::default()
            },
            FinancialPeriod {
                fiscal_year: 2023,
                free_cash_flow: Some(100.0),
                revenue: Some(200.0),
                net_income: Some(100.0),
                ..Default::default()
            },
            FinancialPeriod {
                fiscal_year: 2022,
                free_cash_flow: Some(80.0),
                ..Default::default()
            },
        ];
        let estimate = estimate_growth(&financials, &ValuationConfig::default());
        // fcf cagr = (130/80)^(1/2) - 1 = 27.5%, revenue = 10%, earnings = 20%
        assert!((estimate.fcf_cagr.unwrap() - 0.274755).abs() < 1e-4);
        assert!((estimate.revenue_growth.unwrap() - 0.10).abs() < 1e-9);
        assert!((estimate.earnings_growth.unwrap() - 0.20).abs() < 1e-9);
        assert!((estimate.rate - 0.20).abs() < 1e-9);
        assert!(estimate.warnings.is_empty());
    }

    #[test]
    fn test_growth_defaults_when_history_unusable() {
        let financials = vec![period_with_fcf(2024, -10.0), period_with_fcf(2023, -20.0)];
        let estimate = estimate_growth(&financials, &ValuationConfig::default());
        assert!((estimate.rate - 0.08).abs() < 1e-9);
        assert_eq!(estimate.basis, "default assumption");
        assert_eq!(estimate.warnings.len(), 1);
    }

    #[test]
    fn test_growth_clamped_to_cap() {
        let financials = vec![
            FinancialPeriod {
                fiscal_year: 2024,
                free_cash_flow: Some(200.0),
                revenue: Some(300.0),
                net_income: Some(180.0),
                ..Default::default()
            },
            FinancialPeriod {
                fiscal_year: 2023,
                free_cash_flow: Some(100.0),
                revenue: Some(200.0),
                net_income: Some(100.0),
                ..Default::default()
            },
        ];
        // All three signals land well above 30%
        let estimate = estimate_growth(&financials, &ValuationConfig::default());
        assert!((estimate.rate - 0.30).abs() < 1e-9);
        assert!(estimate.warnings.iter().any(|w| w.contains("clamped")));
    }

    #[test]
    fn test_fcf_cagr_dropped_when_endpoint_negative() {
        let financials = vec![period_with_fcf(2024, 100.0), period_with_fcf(2023, -50.0)];
        assert_eq!(fcf_cagr(&financials), None);
    }

    #[test]
    fn test_tax_rate_from_latest_statement() {
        let financials = vec![FinancialPeriod {
            fiscal_year: 2024,
            tax_paid: Some(25.0),
            pretax_income: Some(100.0),
            ..Default::default()
        }];
        let (rate, warning) = effective_tax_rate(&financials, &ValuationConfig::default());
        assert!((rate - 0.25).abs() < 1e-9);
        assert!(warning.is_none());
    }

    #[test]
    fn test_tax_rate_clamped_and_defaulted() {
        let config = ValuationConfig::default();
        let heavy = vec![FinancialPeriod {
            fiscal_year: 2024,
            tax_paid: Some(90.0),
            pretax_income: Some(100.0),
            ..Default::default()
        }];
        let (rate, _) = effective_tax_rate(&heavy, &config);
        assert!((rate - 0.40).abs() < 1e-9);

        let missing = vec![FinancialPeriod::default()];
        let (rate, warning) = effective_tax_rate(&missing, &config);
        assert!((rate - 0.21).abs() < 1e-9);
        assert!(warning.is_some());
    }
}
