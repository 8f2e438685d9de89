use crate::config::ValuationConfig;
use crate::models::TerminalValueEstimate;
use valuation_core::{median, PeerRatios};

/// Median peer EV/EBITDA when at least one plausible multiple exists,
/// otherwise a sector default. Peer multiples outside (0, 100) are treated
/// as data noise and ignored.
pub fn resolve_exit_multiple(
    peers: &[PeerRatios],
    sector: Option<&str>,
    config: &ValuationConfig,
) -> (f64, String) {
    let multiples: Vec<f64> = peers
        .iter()
        .filter_map(|p| p.ev_to_ebitda)
        .filter(|m| *m > 0.0 && *m < 100.0)
        .collect();

    if let Some(m) = median(&multiples) {
        (
            m,
            format!("median of {} peer EV/EBITDA multiples", multiples.len()),
        )
    } else {
        (
            sector_exit_multiple(sector, config.default_exit_multiple),
            "sector default multiple".to_string(),
        )
    }
}

fn sector_exit_multiple(sector: Option<&str>, generic_default: f64) -> f64 {
    match sector {
        Some("Technology") | Some("Information Technology") => 16.0,
        Some("Health Care") | Some("Healthcare") => 14.0,
        Some("Consumer Staples") => 13.0,
        Some("Communication Services") => 12.0,
        Some("Consumer Discretionary") => 12.0,
        Some("Industrials") => 11.0,
        Some("Utilities") => 10.0,
        Some("Financials") => 10.0,
        Some("Real Estate") => 15.0,
        Some("Materials") => 8.0,
        Some("Energy") => 6.0,
        _ => generic_default,
    }
}

/// Gordon-growth and exit-multiple terminal values, averaged when both are
/// available.
///
/// The caller must already have guarded `wacc > terminal_growth`. The exit
/// leg proxies terminal EBITDA as FCF divided by an assumed conversion
/// ratio, and is skipped entirely when the terminal-year FCF is not
/// positive, leaving the Gordon value alone.
pub fn estimate_terminal_value(
    final_fcf: f64,
    wacc: f64,
    terminal_growth: f64,
    exit_multiple: f64,
    config: &ValuationConfig,
) -> TerminalValueEstimate {
    let gordon = final_fcf * (1.0 + terminal_growth) / (wacc - terminal_growth);

    let exit = if final_fcf > 0.0 {
        Some(final_fcf / config.fcf_to_ebitda_ratio * exit_multiple)
    } else {
        None
    };

    let averaged = match exit {
        Some(e) => (gordon + e) / 2.0,
        None => gordon,
    };

    TerminalValueEstimate {
        gordon_growth_value: gordon,
        exit_multiple_value: exit,
        exit_multiple_used: exit.map(|_| exit_multiple),
        averaged_value: averaged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(ev_to_ebitda: Option<f64>) -> PeerRatios {
        PeerRatios {
            ticker: "PEER".to_string(),
            ev_to_ebitda,
            pe: None,
        }
    }

    #[test]
    fn test_gordon_growth_value() {
        let config = ValuationConfig::default();
        let tv = estimate_terminal_value(36_952_382.82, 0.10, 0.025, 13.0, &config);
        // FCF x 1.025 / 0.075
        assert!((tv.gordon_growth_value - 505_015_898.5).abs() < 100.0);
        assert!((tv.exit_multiple_value.unwrap() - 800_634_961.1).abs() < 100.0);
        assert!((tv.averaged_value - 652_825_429.8).abs() < 100.0);
        assert_eq!(tv.exit_multiple_used, Some(13.0));
    }

    #[test]
    fn test_exit_leg_skipped_for_negative_terminal_fcf() {
        let config = ValuationConfig::default();
        let tv = estimate_terminal_value(-1_000_000.0, 0.10, 0.025, 13.0, &config);
        assert!(tv.exit_multiple_value.is_none());
        assert!(tv.exit_multiple_used.is_none());
        assert!(tv.gordon_growth_value < 0.0);
        assert!((tv.averaged_value - tv.gordon_growth_value).abs() < 1e-9);
    }

    #[test]
    fn test_peer_median_multiple() {
        let config = ValuationConfig::default();
        let peers = vec![peer(Some(10.0)), peer(Some(14.0)), peer(Some(30.0))];
        let (multiple, basis) = resolve_exit_multiple(&peers, None, &config);
        assert!((multiple - 14.0).abs() < 1e-9);
        assert!(basis.contains("3 peer"));
    }

    #[test]
    fn test_implausible_peer_multiples_ignored() {
        let config = ValuationConfig::default();
        let peers = vec![peer(Some(-5.0)), peer(Some(150.0)), peer(Some(12.0))];
        let (multiple, basis) = resolve_exit_multiple(&peers, None, &config);
        assert!((multiple - 12.0).abs() < 1e-9);
        assert!(basis.contains("1 peer"));
    }

    #[test]
    fn test_sector_default_when_no_peers() {
        let config = ValuationConfig::default();
        let (tech, _) = resolve_exit_multiple(&[], Some("Technology"), &config);
        assert!((tech - 16.0).abs() < 1e-9);
        let (generic, basis) = resolve_exit_multiple(&[peer(None)], None, &config);
        assert!((generic - 13.0).abs() < 1e-9);
        assert!(basis.contains("sector default"));
    }
}
